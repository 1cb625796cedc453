// src/models/company.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::db_utils::double_option;
use crate::models::validation::{blank_to_none, validate_cnpj, validate_positive};

// --- ENUMS ---

// Mapeia o CREATE TYPE company_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "company_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    Lead,
    Contact,
    Proposal,
    Negotiation,
    Closed,
    Lost,
}

impl CompanyStatus {
    /// Colunas do Kanban de CRM, na ordem de exibição. `Lost` não aparece.
    pub const CRM_COLUMNS: [CompanyStatus; 5] = [
        CompanyStatus::Lead,
        CompanyStatus::Contact,
        CompanyStatus::Proposal,
        CompanyStatus::Negotiation,
        CompanyStatus::Closed,
    ];
}

// --- EMPRESA (a linha da tabela) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Company {
    pub id: Uuid,
    #[schema(example = "Acme")]
    pub name: String,
    #[schema(example = "12.345.678/0001-90")]
    pub cnpj: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub contact_person: Option<String>,

    // Redes sociais
    pub linkedin_url: Option<String>,
    pub instagram_url: Option<String>,
    pub website_url: Option<String>,

    // Informações comerciais
    #[schema(value_type = Option<f64>, example = 15000.0)]
    pub estimated_value: Option<Decimal>,
    pub expected_close_date: Option<NaiveDate>,
    pub lead_source: Option<String>,

    pub status: CompanyStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Linha da view `companies_with_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CompanyWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub company: Company,
    pub total_processes: i32,
    pub completed_processes: i32,
    pub active_processes: i32,
    pub avg_progress: i32,
    pub last_activity: Option<DateTime<Utc>>,
}

impl CompanyWithStats {
    /// Empresa recém-criada: nenhum processo ainda.
    pub fn without_stats(company: Company) -> Self {
        Self {
            company,
            total_processes: 0,
            completed_processes: 0,
            active_processes: 0,
            avg_progress: 0,
            last_activity: None,
        }
    }
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewCompany {
    #[validate(length(min = 1, max = 100, message = "Nome é obrigatório (máx. 100)"))]
    #[schema(example = "Acme")]
    pub name: String,

    #[validate(custom(function = "validate_cnpj"))]
    pub cnpj: Option<String>,

    #[validate(email(message = "Email inválido"))]
    pub email: Option<String>,
    pub phone: Option<String>,

    #[validate(length(max = 100, message = "Nome muito longo"))]
    pub contact_person: Option<String>,

    #[validate(url(message = "URL inválida"))]
    pub linkedin_url: Option<String>,
    #[validate(url(message = "URL inválida"))]
    pub instagram_url: Option<String>,
    #[validate(url(message = "URL inválida"))]
    pub website_url: Option<String>,

    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = Option<f64>)]
    pub estimated_value: Option<Decimal>,
    pub expected_close_date: Option<NaiveDate>,

    #[validate(length(max = 100))]
    pub lead_source: Option<String>,

    #[serde(default = "default_company_status")]
    pub status: CompanyStatus,

    #[validate(length(max = 1000, message = "Observações muito longas"))]
    pub notes: Option<String>,
}

fn default_company_status() -> CompanyStatus {
    CompanyStatus::Lead
}

impl NewCompany {
    pub fn named(name: impl Into<String>, status: CompanyStatus) -> Self {
        Self {
            name: name.into(),
            cnpj: None,
            email: None,
            phone: None,
            contact_person: None,
            linkedin_url: None,
            instagram_url: None,
            website_url: None,
            estimated_value: None,
            expected_close_date: None,
            lead_source: None,
            status,
            notes: None,
        }
    }

    /// Formulários mandam "" para campos opcionais; tratamos como ausentes
    /// (senão o UNIQUE do CNPJ colide em "").
    pub fn normalized(self) -> Self {
        Self {
            cnpj: blank_to_none(self.cnpj),
            email: blank_to_none(self.email),
            phone: blank_to_none(self.phone),
            contact_person: blank_to_none(self.contact_person),
            linkedin_url: blank_to_none(self.linkedin_url),
            instagram_url: blank_to_none(self.instagram_url),
            website_url: blank_to_none(self.website_url),
            lead_source: blank_to_none(self.lead_source),
            notes: blank_to_none(self.notes),
            ..self
        }
    }
}

/// PATCH parcial. Campos anuláveis usam `Option<Option<_>>`:
/// ausente = não mexe, `null` = limpa.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CompanyPatch {
    #[validate(length(min = 1, max = 100, message = "Nome é obrigatório (máx. 100)"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[validate(custom(function = "validate_cnpj"))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub cnpj: Option<Option<String>>,

    #[validate(email(message = "Email inválido"))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,

    #[validate(length(max = 100, message = "Nome muito longo"))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub contact_person: Option<Option<String>>,

    #[validate(url(message = "URL inválida"))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub linkedin_url: Option<Option<String>>,

    #[validate(url(message = "URL inválida"))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub instagram_url: Option<Option<String>>,

    #[validate(url(message = "URL inválida"))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub website_url: Option<Option<String>>,

    #[validate(custom(function = "validate_positive"))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub estimated_value: Option<Option<Decimal>>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<NaiveDate>)]
    pub expected_close_date: Option<Option<NaiveDate>>,

    #[validate(length(max = 100))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub lead_source: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CompanyStatus>,

    #[validate(length(max = 1000, message = "Observações muito longas"))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

impl CompanyPatch {
    pub fn status(status: CompanyStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cnpj.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.contact_person.is_none()
            && self.linkedin_url.is_none()
            && self.instagram_url.is_none()
            && self.website_url.is_none()
            && self.estimated_value.is_none()
            && self.expected_close_date.is_none()
            && self.lead_source.is_none()
            && self.status.is_none()
            && self.notes.is_none()
    }

    /// Limpa strings vazias (viram `null`) antes de validar.
    pub fn normalized(self) -> Self {
        fn blank(v: Option<Option<String>>) -> Option<Option<String>> {
            v.map(blank_to_none)
        }
        Self {
            cnpj: blank(self.cnpj),
            email: blank(self.email),
            phone: blank(self.phone),
            contact_person: blank(self.contact_person),
            linkedin_url: blank(self.linkedin_url),
            instagram_url: blank(self.instagram_url),
            website_url: blank(self.website_url),
            lead_source: blank(self.lead_source),
            notes: blank(self.notes),
            ..self
        }
    }

    /// Mescla o patch na entidade (usado pelo store otimista).
    pub fn apply_to(&self, company: &mut Company) {
        if let Some(name) = &self.name {
            company.name = name.clone();
        }
        if let Some(v) = &self.cnpj {
            company.cnpj = v.clone();
        }
        if let Some(v) = &self.email {
            company.email = v.clone();
        }
        if let Some(v) = &self.phone {
            company.phone = v.clone();
        }
        if let Some(v) = &self.contact_person {
            company.contact_person = v.clone();
        }
        if let Some(v) = &self.linkedin_url {
            company.linkedin_url = v.clone();
        }
        if let Some(v) = &self.instagram_url {
            company.instagram_url = v.clone();
        }
        if let Some(v) = &self.website_url {
            company.website_url = v.clone();
        }
        if let Some(v) = self.estimated_value {
            company.estimated_value = v;
        }
        if let Some(v) = self.expected_close_date {
            company.expected_close_date = v;
        }
        if let Some(v) = &self.lead_source {
            company.lead_source = v.clone();
        }
        if let Some(status) = self.status {
            company.status = status;
        }
        if let Some(v) = &self.notes {
            company.notes = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults_to_lead_and_validates_name() {
        let payload: NewCompany = serde_json::from_str(r#"{"name": "Acme"}"#).unwrap();
        assert_eq!(payload.status, CompanyStatus::Lead);
        assert!(payload.validate().is_ok());

        let empty: NewCompany = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        let errors = empty.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn blank_optional_fields_are_not_validated() {
        let payload: NewCompany =
            serde_json::from_str(r#"{"name": "Acme", "cnpj": "", "website_url": ""}"#).unwrap();
        let payload = payload.normalized();
        assert_eq!(payload.cnpj, None);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn invalid_cnpj_and_url_are_reported_per_field() {
        let payload: NewCompany = serde_json::from_str(
            r#"{"name": "Acme", "cnpj": "123", "website_url": "not a url"}"#,
        )
        .unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("cnpj"));
        assert!(fields.contains_key("website_url"));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&CompanyPatch::status(CompanyStatus::Proposal)).unwrap();
        assert_eq!(json, r#"{"status":"proposal"}"#);
    }

    #[test]
    fn patch_can_clear_nullable_fields() {
        let patch: CompanyPatch = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(patch.notes, Some(None));
        assert!(!patch.is_empty());
        assert!(CompanyPatch::default().is_empty());
    }
}
