// src/handlers/companies.rs

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
    models::company::{CompanyPatch, CompanyStatus, CompanyWithStats, NewCompany},
    models::process::ProcessWithTaskCounts,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompanyListQuery {
    /// Filtra uma coluna do CRM (`closed` = lista de projetos)
    pub status: Option<CompanyStatus>,
}

// GET /api/companies
#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    params(CompanyListQuery),
    responses(
        (status = 200, description = "Empresas com estatísticas, mais recentes primeiro", body = Vec<CompanyWithStats>)
    )
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    Query(query): Query<CompanyListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let companies = app_state.company_service.list(query.status).await?;
    Ok((StatusCode::OK, Json(companies)))
}

// POST /api/companies
#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = NewCompany,
    responses(
        (status = 201, description = "Empresa criada", body = CompanyWithStats),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "CNPJ já cadastrado")
    )
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    Json(payload): Json<NewCompany>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let company = app_state.company_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

// GET /api/companies/{id}
#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa", body = CompanyWithStats),
        (status = 404, description = "Empresa não encontrada")
    )
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let company = app_state.company_service.get(id).await?;
    Ok(Json(company))
}

// PATCH /api/companies/{id}
#[utoipa::path(
    patch,
    path = "/api/companies/{id}",
    tag = "Companies",
    request_body = CompanyPatch,
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa atualizada", body = CompanyWithStats),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Empresa não encontrada"),
        (status = 409, description = "CNPJ já cadastrado")
    )
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompanyPatch>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let company = app_state.company_service.update(id, &payload).await?;
    Ok(Json(company))
}

// DELETE /api/companies/{id}
#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 204, description = "Empresa excluída com seus processos e tarefas"),
        (status = 404, description = "Empresa não encontrada")
    )
)]
pub async fn delete_company(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.company_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/companies/{id}/processes
#[utoipa::path(
    get,
    path = "/api/companies/{id}/processes",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Processos da empresa", body = Vec<ProcessWithTaskCounts>),
        (status = 404, description = "Empresa não encontrada")
    )
)]
pub async fn list_company_processes(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // 404 explícito em vez de lista vazia para empresa inexistente
    app_state.company_service.get(id).await?;
    let processes = app_state.process_service.list(Some(id)).await?;
    Ok(Json(processes))
}
