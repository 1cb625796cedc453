// src/db/process_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::db_utils::{map_reference_error, set_if},
    common::error::AppError,
    models::process::{NewProcess, ProcessCategory, ProcessPatch, ProcessSummary, ProcessWithTaskCounts},
};

// Processos são lidos pela view `processes_with_task_counts`: o progresso
// nunca é gravado, só derivado das tarefas.
#[derive(Clone)]
pub struct ProcessRepository {
    pool: PgPool,
}

impl ProcessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, company_id: Option<Uuid>) -> Result<Vec<ProcessWithTaskCounts>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM processes_with_task_counts");
        if let Some(company_id) = company_id {
            query.push(" WHERE company_id = ").push_bind(company_id);
        }
        query.push(" ORDER BY created_at DESC");

        let processes = query
            .build_query_as::<ProcessWithTaskCounts>()
            .fetch_all(&self.pool)
            .await?;
        Ok(processes)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProcessWithTaskCounts>, AppError> {
        let process = sqlx::query_as::<_, ProcessWithTaskCounts>(
            "SELECT * FROM processes_with_task_counts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(process)
    }

    pub async fn summary(&self) -> Result<ProcessSummary, AppError> {
        let summary = sqlx::query_as::<_, ProcessSummary>("SELECT * FROM process_summary")
            .fetch_one(&self.pool)
            .await?;
        Ok(summary)
    }

    pub async fn list_categories(&self) -> Result<Vec<ProcessCategory>, AppError> {
        let categories = sqlx::query_as::<_, ProcessCategory>("SELECT * FROM process_categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn create(&self, new: &NewProcess) -> Result<ProcessWithTaskCounts, AppError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO processes (company_id, title, description, status, color, deadline, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(new.company_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.status)
        .bind(&new.color)
        .bind(new.deadline)
        .bind(new.category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_reference_error(e, "Empresa ou categoria"))?;

        self.find_by_id(id).await?.ok_or(AppError::NotFound("Processo"))
    }

    pub async fn update(&self, id: Uuid, patch: &ProcessPatch) -> Result<Option<ProcessWithTaskCounts>, AppError> {
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut query = QueryBuilder::<Postgres>::new("UPDATE processes SET ");
        {
            let mut set = query.separated(", ");
            set_if!(set, "title", &patch.title);
            set_if!(set, "description", &patch.description);
            set_if!(set, "status", &patch.status);
            set_if!(set, "color", &patch.color);
            set_if!(set, "deadline", &patch.deadline);
            set_if!(set, "category_id", &patch.category_id);
        }
        query.push(" WHERE id = ").push_bind(id).push(" RETURNING id");

        let updated = query
            .build_query_scalar::<Uuid>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_reference_error(e, "Categoria"))?;

        match updated {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM processes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
