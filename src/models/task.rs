// src/models/task.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::db_utils::double_option;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    /// Colunas do quadro de tarefas, na ordem de exibição.
    pub const COLUMNS: [TaskStatus; 4] =
        [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Review, TaskStatus::Done];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub process_id: Uuid,
    #[schema(example = "Enviar proposta")]
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee: Option<String>,
    pub deadline: Option<NaiveDate>,
    // Denso por (process_id, status): 0..n-1
    #[schema(example = 0)]
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewTask {
    pub process_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Título é obrigatório (máx. 200)"))]
    #[schema(example = "Enviar proposta")]
    pub title: String,

    #[validate(length(max = 1000, message = "Descrição muito longa"))]
    pub description: Option<String>,

    #[serde(default = "default_task_status")]
    pub status: TaskStatus,

    #[serde(default = "default_task_priority")]
    pub priority: TaskPriority,

    #[validate(length(max = 100))]
    pub assignee: Option<String>,

    pub deadline: Option<NaiveDate>,

    // Ausente = fim da coluna (tamanho atual da coluna)
    #[validate(range(min = 0, message = "order_index não pode ser negativo"))]
    pub order_index: Option<i32>,
}

fn default_task_status() -> TaskStatus {
    TaskStatus::Todo
}

fn default_task_priority() -> TaskPriority {
    TaskPriority::Medium
}

impl NewTask {
    pub fn titled(process_id: Uuid, title: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            process_id,
            title: title.into(),
            description: None,
            status,
            priority: default_task_priority(),
            assignee: None,
            deadline: None,
            order_index: None,
        }
    }
}

/// PATCH parcial. Não há `process_id`: tarefa não muda de processo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct TaskPatch {
    #[validate(length(min = 1, max = 200, message = "Título é obrigatório (máx. 200)"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "Descrição muito longa"))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,

    #[validate(length(max = 100))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub assignee: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<NaiveDate>)]
    pub deadline: Option<Option<NaiveDate>>,

    #[validate(range(min = 0, message = "order_index não pode ser negativo"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.deadline.is_none()
            && self.order_index.is_none()
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(v) = &self.description {
            task.description = v.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(v) = &self.assignee {
            task.assignee = v.clone();
        }
        if let Some(v) = self.deadline {
            task.deadline = v;
        }
        if let Some(order_index) = self.order_index {
            task.order_index = order_index;
        }
    }
}

/// Uma posição do lote de reorder: {id, order_index, status}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct TaskPosition {
    pub id: Uuid,
    #[validate(range(min = 0, message = "order_index não pode ser negativo"))]
    pub order_index: i32,
    pub status: TaskStatus,
}

impl From<TaskPosition> for TaskPatch {
    fn from(position: TaskPosition) -> Self {
        TaskPatch {
            status: Some(position.status),
            order_index: Some(position.order_index),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReorderTasks {
    #[validate(nested)]
    pub tasks: Vec<TaskPosition>,
}

/// Movimento vindo do quadro: coluna de destino + índice de inserção.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct MoveTask {
    pub status: TaskStatus,
    #[schema(example = 0)]
    pub index: usize,
}
