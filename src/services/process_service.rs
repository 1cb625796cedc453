// src/services/process_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ProcessRepository,
    models::process::{NewProcess, ProcessCategory, ProcessPatch, ProcessSummary, ProcessWithTaskCounts},
};

#[derive(Clone)]
pub struct ProcessService {
    repo: ProcessRepository,
}

impl ProcessService {
    pub fn new(repo: ProcessRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self, company_id: Option<Uuid>) -> Result<Vec<ProcessWithTaskCounts>, AppError> {
        self.repo.list(company_id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<ProcessWithTaskCounts, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Processo"))
    }

    pub async fn summary(&self) -> Result<ProcessSummary, AppError> {
        self.repo.summary().await
    }

    pub async fn categories(&self) -> Result<Vec<ProcessCategory>, AppError> {
        self.repo.list_categories().await
    }

    pub async fn create(&self, new: &NewProcess) -> Result<ProcessWithTaskCounts, AppError> {
        let process = self.repo.create(new).await?;
        tracing::info!(process_id = %process.id, company_id = ?process.company_id, "processo criado");
        Ok(process)
    }

    pub async fn update(&self, id: Uuid, patch: &ProcessPatch) -> Result<ProcessWithTaskCounts, AppError> {
        self.repo.update(id, patch).await?.ok_or(AppError::NotFound("Processo"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Processo"));
        }
        Ok(())
    }
}
