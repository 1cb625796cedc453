// src/handlers/processes.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::process::{NewProcess, ProcessCategory, ProcessPatch, ProcessSummary, ProcessWithTaskCounts},
    models::task::Task,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProcessListQuery {
    pub company_id: Option<Uuid>,
}

// GET /api/processes
#[utoipa::path(
    get,
    path = "/api/processes",
    tag = "Processes",
    params(ProcessListQuery),
    responses(
        (status = 200, description = "Processos com contagem de tarefas e progresso", body = Vec<ProcessWithTaskCounts>)
    )
)]
pub async fn list_processes(
    State(app_state): State<AppState>,
    Query(query): Query<ProcessListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let processes = app_state.process_service.list(query.company_id).await?;
    Ok(Json(processes))
}

// POST /api/processes
#[utoipa::path(
    post,
    path = "/api/processes",
    tag = "Processes",
    request_body = NewProcess,
    responses(
        (status = 201, description = "Processo criado (progresso 0)", body = ProcessWithTaskCounts),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Empresa ou categoria inexistente")
    )
)]
pub async fn create_process(
    State(app_state): State<AppState>,
    Json(payload): Json<NewProcess>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let process = app_state.process_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(process)))
}

// GET /api/processes/summary
#[utoipa::path(
    get,
    path = "/api/processes/summary",
    tag = "Processes",
    responses(
        (status = 200, description = "Totais: ativos, concluídos, atrasados", body = ProcessSummary)
    )
)]
pub async fn get_summary(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.process_service.summary().await?;
    Ok(Json(summary))
}

// GET /api/processes/{id}
#[utoipa::path(
    get,
    path = "/api/processes/{id}",
    tag = "Processes",
    params(("id" = Uuid, Path, description = "ID do processo")),
    responses(
        (status = 200, description = "Processo", body = ProcessWithTaskCounts),
        (status = 404, description = "Processo não encontrado")
    )
)]
pub async fn get_process(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let process = app_state.process_service.get(id).await?;
    Ok(Json(process))
}

// PATCH /api/processes/{id}
#[utoipa::path(
    patch,
    path = "/api/processes/{id}",
    tag = "Processes",
    request_body = ProcessPatch,
    params(("id" = Uuid, Path, description = "ID do processo")),
    responses(
        (status = 200, description = "Processo atualizado", body = ProcessWithTaskCounts),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Processo não encontrado")
    )
)]
pub async fn update_process(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProcessPatch>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let process = app_state.process_service.update(id, &payload).await?;
    Ok(Json(process))
}

// DELETE /api/processes/{id}
#[utoipa::path(
    delete,
    path = "/api/processes/{id}",
    tag = "Processes",
    params(("id" = Uuid, Path, description = "ID do processo")),
    responses(
        (status = 204, description = "Processo excluído com suas tarefas"),
        (status = 404, description = "Processo não encontrado")
    )
)]
pub async fn delete_process(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.process_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/processes/{id}/tasks
#[utoipa::path(
    get,
    path = "/api/processes/{id}/tasks",
    tag = "Processes",
    params(("id" = Uuid, Path, description = "ID do processo")),
    responses(
        (status = 200, description = "Tarefas por coluna e posição", body = Vec<Task>),
        (status = 404, description = "Processo não encontrado")
    )
)]
pub async fn list_process_tasks(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.process_service.get(id).await?;
    let tasks = app_state.task_service.list(id).await?;
    Ok(Json(tasks))
}

// GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Processes",
    responses(
        (status = 200, description = "Categorias de processo", body = Vec<ProcessCategory>)
    )
)]
pub async fn list_categories(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.process_service.categories().await?;
    Ok(Json(categories))
}
