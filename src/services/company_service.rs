// src/services/company_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CompanyRepository,
    models::company::{CompanyPatch, CompanyStatus, CompanyWithStats, NewCompany},
};

#[derive(Clone)]
pub struct CompanyService {
    repo: CompanyRepository,
}

impl CompanyService {
    pub fn new(repo: CompanyRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self, status: Option<CompanyStatus>) -> Result<Vec<CompanyWithStats>, AppError> {
        self.repo.list(status).await
    }

    pub async fn get(&self, id: Uuid) -> Result<CompanyWithStats, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Empresa"))
    }

    pub async fn create(&self, new: &NewCompany) -> Result<CompanyWithStats, AppError> {
        let company = self.repo.create(new).await?;
        tracing::info!(company_id = %company.company.id, status = ?company.company.status, "empresa criada");
        Ok(company)
    }

    pub async fn update(&self, id: Uuid, patch: &CompanyPatch) -> Result<CompanyWithStats, AppError> {
        self.repo.update(id, patch).await?.ok_or(AppError::NotFound("Empresa"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Empresa"));
        }
        tracing::info!(company_id = %id, "empresa excluída (processos e tarefas em cascata)");
        Ok(())
    }
}
