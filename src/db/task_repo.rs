// src/db/task_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::db_utils::{map_reference_error, set_if},
    common::error::AppError,
    models::task::{NewTask, Task, TaskPatch, TaskStatus},
};

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ordem do quadro: coluna (ordem do enum) e depois posição.
    pub async fn list_by_process(&self, process_id: Uuid) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE process_id = $1
            ORDER BY status, order_index, created_at
            "#,
        )
        .bind(process_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    /// Quantidade de tarefas numa coluna (= próximo order_index livre).
    pub async fn column_len(&self, process_id: Uuid, status: TaskStatus) -> Result<i32, AppError> {
        let len: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE process_id = $1 AND status = $2")
            .bind(process_id)
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(len as i32)
    }

    /// `order_index` já resolvido pelo serviço.
    pub async fn create(&self, new: &NewTask, order_index: i32) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (process_id, title, description, status, priority, assignee, deadline, order_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new.process_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.status)
        .bind(new.priority)
        .bind(&new.assignee)
        .bind(new.deadline)
        .bind(order_index)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_reference_error(e, "Processo"))?;
        Ok(task)
    }

    pub async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<Option<Task>, AppError> {
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut query = QueryBuilder::<Postgres>::new("UPDATE tasks SET ");
        {
            let mut set = query.separated(", ");
            set_if!(set, "title", &patch.title);
            set_if!(set, "description", &patch.description);
            set_if!(set, "status", &patch.status);
            set_if!(set, "priority", &patch.priority);
            set_if!(set, "assignee", &patch.assignee);
            set_if!(set, "deadline", &patch.deadline);
            set_if!(set, "order_index", &patch.order_index);
        }
        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let task = query.build_query_as::<Task>().fetch_optional(&self.pool).await?;
        Ok(task)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
