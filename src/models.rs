pub mod company;
pub mod process;
pub mod task;
pub mod validation;
