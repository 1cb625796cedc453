pub mod changes;
pub mod companies;
pub mod processes;
pub mod tasks;
