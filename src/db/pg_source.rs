// src/db/pg_source.rs
//
// Implementação Postgres da fronteira de persistência do quadro: o mesmo
// coordenador que roda sobre `MemorySource` roda direto sobre o banco.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    board::{entity::ProcessScope, DataSource},
    common::error::AppError,
    db::{CompanyRepository, ProcessRepository, TaskRepository},
    models::company::{CompanyPatch, CompanyWithStats, NewCompany},
    models::process::{NewProcess, ProcessPatch, ProcessWithTaskCounts},
    models::task::{NewTask, Task, TaskPatch},
};

#[derive(Clone)]
pub struct PgSource {
    companies: CompanyRepository,
    processes: ProcessRepository,
    tasks: TaskRepository,
}

impl PgSource {
    pub fn new(pool: PgPool) -> Self {
        Self {
            companies: CompanyRepository::new(pool.clone()),
            processes: ProcessRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool),
        }
    }
}

#[async_trait]
impl DataSource<CompanyWithStats> for PgSource {
    async fn list(&self, _scope: &()) -> Result<Vec<CompanyWithStats>, AppError> {
        self.companies.list(None).await
    }

    async fn get(&self, id: Uuid) -> Result<CompanyWithStats, AppError> {
        self.companies.find_by_id(id).await?.ok_or(AppError::NotFound("Empresa"))
    }

    async fn insert(&self, new: &NewCompany) -> Result<CompanyWithStats, AppError> {
        self.companies.create(new).await
    }

    async fn update(&self, id: Uuid, patch: &CompanyPatch) -> Result<CompanyWithStats, AppError> {
        self.companies.update(id, patch).await?.ok_or(AppError::NotFound("Empresa"))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        match self.companies.delete(id).await? {
            true => Ok(()),
            false => Err(AppError::NotFound("Empresa")),
        }
    }
}

#[async_trait]
impl DataSource<ProcessWithTaskCounts> for PgSource {
    async fn list(&self, scope: &ProcessScope) -> Result<Vec<ProcessWithTaskCounts>, AppError> {
        self.processes.list(scope.company_id).await
    }

    async fn get(&self, id: Uuid) -> Result<ProcessWithTaskCounts, AppError> {
        self.processes.find_by_id(id).await?.ok_or(AppError::NotFound("Processo"))
    }

    async fn insert(&self, new: &NewProcess) -> Result<ProcessWithTaskCounts, AppError> {
        self.processes.create(new).await
    }

    async fn update(&self, id: Uuid, patch: &ProcessPatch) -> Result<ProcessWithTaskCounts, AppError> {
        self.processes.update(id, patch).await?.ok_or(AppError::NotFound("Processo"))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        match self.processes.delete(id).await? {
            true => Ok(()),
            false => Err(AppError::NotFound("Processo")),
        }
    }
}

#[async_trait]
impl DataSource<Task> for PgSource {
    async fn list(&self, process_id: &Uuid) -> Result<Vec<Task>, AppError> {
        self.tasks.list_by_process(*process_id).await
    }

    async fn get(&self, id: Uuid) -> Result<Task, AppError> {
        self.tasks.find_by_id(id).await?.ok_or(AppError::NotFound("Tarefa"))
    }

    async fn insert(&self, new: &NewTask) -> Result<Task, AppError> {
        let order_index = match new.order_index {
            Some(index) => index,
            None => self.tasks.column_len(new.process_id, new.status).await?,
        };
        self.tasks.create(new, order_index).await
    }

    async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<Task, AppError> {
        self.tasks.update(id, patch).await?.ok_or(AppError::NotFound("Tarefa"))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        match self.tasks.delete(id).await? {
            true => Ok(()),
            false => Err(AppError::NotFound("Tarefa")),
        }
    }
}
