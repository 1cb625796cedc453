pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod process_repo;
pub use process_repo::ProcessRepository;
pub mod task_repo;
pub use task_repo::TaskRepository;

pub mod pg_source;
pub use pg_source::PgSource;
