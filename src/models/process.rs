// src/models/process.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::db_utils::double_option;
use crate::models::validation::validate_hex_color;

pub const DEFAULT_PROCESS_COLOR: &str = "#6366f1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "process_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Active,
    Paused,
    Completed,
}

impl ProcessStatus {
    pub const COLUMNS: [ProcessStatus; 3] =
        [ProcessStatus::Active, ProcessStatus::Paused, ProcessStatus::Completed];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProcessCategory {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// Linha da view `processes_with_task_counts`.
///
/// `progress` é derivado das tarefas (done / total) e nunca é gravado
/// diretamente: nenhum payload de escrita carrega esse campo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProcessWithTaskCounts {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    #[schema(example = "Onboarding")]
    pub title: String,
    pub description: Option<String>,
    pub status: ProcessStatus,
    #[schema(example = 50)]
    pub progress: i32,
    #[schema(example = "#6366f1")]
    pub color: String,
    pub deadline: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub total_tasks: i32,
    pub todo_count: i32,
    pub in_progress_count: i32,
    pub review_count: i32,
    pub done_count: i32,
}

impl ProcessWithTaskCounts {
    /// Prazo vencido: existe, já passou e o processo não foi concluído.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != ProcessStatus::Completed && self.deadline.is_some_and(|d| d < today)
    }
}

/// Linha única da view `process_summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProcessSummary {
    pub total: i32,
    pub active: i32,
    pub completed: i32,
    pub overdue: i32,
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewProcess {
    // Ausente na variante sem empresa (processo avulso)
    pub company_id: Option<Uuid>,

    #[validate(length(min = 1, max = 100, message = "Título é obrigatório (máx. 100)"))]
    #[schema(example = "Onboarding")]
    pub title: String,

    #[validate(length(max = 500, message = "Descrição muito longa"))]
    pub description: Option<String>,

    #[serde(default = "default_process_status")]
    pub status: ProcessStatus,

    #[validate(custom(function = "validate_hex_color"))]
    #[serde(default = "default_process_color")]
    #[schema(example = "#6366f1")]
    pub color: String,

    pub deadline: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
}

fn default_process_status() -> ProcessStatus {
    ProcessStatus::Active
}

fn default_process_color() -> String {
    DEFAULT_PROCESS_COLOR.to_string()
}

impl NewProcess {
    pub fn titled(company_id: Option<Uuid>, title: impl Into<String>) -> Self {
        Self {
            company_id,
            title: title.into(),
            description: None,
            status: default_process_status(),
            color: default_process_color(),
            deadline: None,
            category_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProcessPatch {
    #[validate(length(min = 1, max = 100, message = "Título é obrigatório (máx. 100)"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[validate(length(max = 500, message = "Descrição muito longa"))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProcessStatus>,

    #[validate(custom(function = "validate_hex_color"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<NaiveDate>)]
    pub deadline: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,
}

impl ProcessPatch {
    pub fn status(status: ProcessStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.color.is_none()
            && self.deadline.is_none()
            && self.category_id.is_none()
    }

    pub fn apply_to(&self, process: &mut ProcessWithTaskCounts) {
        if let Some(title) = &self.title {
            process.title = title.clone();
        }
        if let Some(v) = &self.description {
            process.description = v.clone();
        }
        if let Some(status) = self.status {
            process.status = status;
        }
        if let Some(color) = &self.color {
            process.color = color.clone();
        }
        if let Some(v) = self.deadline {
            process.deadline = v;
        }
        if let Some(v) = self.category_id {
            process.category_id = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_fills_defaults() {
        let payload: NewProcess = serde_json::from_str(r#"{"title": "Onboarding"}"#).unwrap();
        assert_eq!(payload.status, ProcessStatus::Active);
        assert_eq!(payload.color, DEFAULT_PROCESS_COLOR);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn progress_is_not_part_of_the_patch() {
        // Campo desconhecido é ignorado: o cliente não consegue gravar progress.
        let patch: ProcessPatch = serde_json::from_str(r#"{"progress": 90}"#).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn rejects_bad_color() {
        let patch = ProcessPatch { color: Some("red".into()), ..Default::default() };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn overdue_ignores_completed_processes() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut process = ProcessWithTaskCounts {
            id: Uuid::new_v4(),
            company_id: None,
            title: "p".into(),
            description: None,
            status: ProcessStatus::Active,
            progress: 0,
            color: DEFAULT_PROCESS_COLOR.into(),
            deadline: NaiveDate::from_ymd_opt(2025, 3, 9),
            category_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            total_tasks: 0,
            todo_count: 0,
            in_progress_count: 0,
            review_count: 0,
            done_count: 0,
        };
        assert!(process.is_overdue(today));

        process.status = ProcessStatus::Completed;
        assert!(!process.is_overdue(today));

        process.status = ProcessStatus::Paused;
        process.deadline = Some(today);
        assert!(!process.is_overdue(today));
    }
}
