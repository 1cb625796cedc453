pub mod company_service;
pub use company_service::CompanyService;
pub mod process_service;
pub use process_service::ProcessService;
pub mod task_service;
pub use task_service::TaskService;
