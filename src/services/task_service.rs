// src/services/task_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    board::{
        ordering::{self, Move},
        DataSource,
    },
    common::error::AppError,
    models::task::{MoveTask, NewTask, Task, TaskPatch, TaskPosition},
};

/// Opera sobre a mesma fronteira de persistência do quadro; em produção é
/// o `PgSource`.
#[derive(Clone)]
pub struct TaskService {
    source: Arc<dyn DataSource<Task>>,
}

impl TaskService {
    pub fn new(source: Arc<dyn DataSource<Task>>) -> Self {
        Self { source }
    }

    pub async fn list(&self, process_id: Uuid) -> Result<Vec<Task>, AppError> {
        self.source.list(&process_id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Task, AppError> {
        self.source.get(id).await
    }

    /// Sem `order_index`, a tarefa vai para o fim da coluna.
    pub async fn create(&self, new: &NewTask) -> Result<Task, AppError> {
        self.source.insert(new).await
    }

    pub async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<Task, AppError> {
        self.source.update(id, patch).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.source.delete(id).await
    }

    /// Lote best-effort: um UPDATE por linha, todos concorrentes, sem
    /// transação. Linhas que passaram ficam gravadas mesmo se outras
    /// falharem. Id inexistente conta como falha.
    pub async fn reorder(&self, positions: &[TaskPosition]) -> Result<(), AppError> {
        let patches: Vec<(Uuid, TaskPatch)> =
            positions.iter().map(|p| (p.id, TaskPatch::from(*p))).collect();
        let results = self.source.batch_update(&patches).await;

        let total = results.len();
        let failed = results.iter().filter(|r| r.is_err()).count();
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            tracing::error!("Falha no reorder de tarefa: {:?}", err);
        }

        if failed > 0 {
            tracing::warn!(failed, total, "reorder parcial");
            return Err(AppError::PartialBatchFailure { failed, total });
        }
        Ok(())
    }

    /// Arraste feito no servidor: planeja as posições com o motor de
    /// ordenação e grava o lote. Devolve as tarefas do processo já
    /// reordenadas.
    pub async fn move_task(&self, id: Uuid, target: MoveTask) -> Result<Vec<Task>, AppError> {
        let task = self.get(id).await?;
        let tasks = self.source.list(&task.process_id).await?;

        let columns = ordering::task_columns(&tasks);
        let placements = ordering::plan_move(
            &columns,
            &Move { item: id, from: task.status, to: target.status, to_index: target.index },
        );
        let positions: Vec<TaskPosition> = placements.into_iter().map(TaskPosition::from).collect();

        self.reorder(&positions).await?;
        self.source.list(&task.process_id).await
    }
}
