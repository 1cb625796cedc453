// src/db/company_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::db_utils::{map_write_error, set_if},
    common::error::AppError,
    models::company::{Company, CompanyPatch, CompanyStatus, CompanyWithStats, NewCompany},
};

const CNPJ_CONFLICT: &str = "CNPJ já cadastrado";

// Leitura sempre pela view `companies_with_stats`; escrita na tabela.
#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Mais recentes primeiro. `status` filtra uma coluna (ex: `closed`
    /// para a lista de projetos).
    pub async fn list(&self, status: Option<CompanyStatus>) -> Result<Vec<CompanyWithStats>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM companies_with_stats");
        if let Some(status) = status {
            query.push(" WHERE status = ").push_bind(status);
        }
        query.push(" ORDER BY created_at DESC");

        let companies = query
            .build_query_as::<CompanyWithStats>()
            .fetch_all(&self.pool)
            .await?;
        Ok(companies)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CompanyWithStats>, AppError> {
        let company = sqlx::query_as::<_, CompanyWithStats>("SELECT * FROM companies_with_stats WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    pub async fn create(&self, new: &NewCompany) -> Result<CompanyWithStats, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (
                name, cnpj, email, phone, contact_person,
                linkedin_url, instagram_url, website_url,
                estimated_value, expected_close_date, lead_source, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.cnpj)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.contact_person)
        .bind(&new.linkedin_url)
        .bind(&new.instagram_url)
        .bind(&new.website_url)
        .bind(new.estimated_value)
        .bind(new.expected_close_date)
        .bind(&new.lead_source)
        .bind(new.status)
        .bind(&new.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, CNPJ_CONFLICT))?;

        // Acabou de nascer: nenhum processo, estatísticas zeradas.
        Ok(CompanyWithStats::without_stats(company))
    }

    /// `None` quando o id não existe.
    pub async fn update(&self, id: Uuid, patch: &CompanyPatch) -> Result<Option<CompanyWithStats>, AppError> {
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut query = QueryBuilder::<Postgres>::new("UPDATE companies SET ");
        {
            let mut set = query.separated(", ");
            set_if!(set, "name", &patch.name);
            set_if!(set, "cnpj", &patch.cnpj);
            set_if!(set, "email", &patch.email);
            set_if!(set, "phone", &patch.phone);
            set_if!(set, "contact_person", &patch.contact_person);
            set_if!(set, "linkedin_url", &patch.linkedin_url);
            set_if!(set, "instagram_url", &patch.instagram_url);
            set_if!(set, "website_url", &patch.website_url);
            set_if!(set, "estimated_value", &patch.estimated_value);
            set_if!(set, "expected_close_date", &patch.expected_close_date);
            set_if!(set, "lead_source", &patch.lead_source);
            set_if!(set, "status", &patch.status);
            set_if!(set, "notes", &patch.notes);
        }
        query.push(" WHERE id = ").push_bind(id).push(" RETURNING id");

        let updated: Option<Uuid> = query
            .build_query_scalar::<Uuid>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, CNPJ_CONFLICT))?;

        match updated {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    /// `false` quando nada foi apagado.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
