// src/handlers/tasks.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::task::{MoveTask, NewTask, ReorderTasks, Task, TaskPatch},
};

// POST /api/tasks
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Tasks",
    request_body = NewTask,
    responses(
        (status = 201, description = "Tarefa criada no fim da coluna", body = Task),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Processo não encontrado")
    )
)]
pub async fn create_task(
    State(app_state): State<AppState>,
    Json(payload): Json<NewTask>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let task = app_state.task_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

// PATCH /api/tasks/{id}
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    request_body = TaskPatch,
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefa atualizada", body = Task),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Tarefa não encontrada")
    )
)]
pub async fn update_task(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TaskPatch>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let task = app_state.task_service.update(id, &payload).await?;
    Ok(Json(task))
}

// DELETE /api/tasks/{id}
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 204, description = "Tarefa excluída"),
        (status = 404, description = "Tarefa não encontrada")
    )
)]
pub async fn delete_task(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.task_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/tasks/reorder
#[utoipa::path(
    post,
    path = "/api/tasks/reorder",
    tag = "Tasks",
    request_body = ReorderTasks,
    responses(
        (status = 200, description = "Todas as posições gravadas"),
        (status = 400, description = "Posição inválida"),
        (status = 500, description = "Falha parcial: linhas gravadas não são desfeitas")
    )
)]
pub async fn reorder_tasks(
    State(app_state): State<AppState>,
    Json(payload): Json<ReorderTasks>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    app_state.task_service.reorder(&payload.tasks).await?;
    Ok(Json(json!({ "success": true })))
}

// POST /api/tasks/{id}/move
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/move",
    tag = "Tasks",
    request_body = MoveTask,
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefas do processo após o movimento", body = Vec<Task>),
        (status = 404, description = "Tarefa não encontrada"),
        (status = 500, description = "Falha parcial ao gravar as posições")
    )
)]
pub async fn move_task(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveTask>,
) -> Result<impl IntoResponse, AppError> {
    let tasks = app_state.task_service.move_task(id, payload).await?;
    Ok(Json(tasks))
}
