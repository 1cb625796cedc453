// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;
use crate::realtime;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Companies ---
        handlers::companies::list_companies,
        handlers::companies::create_company,
        handlers::companies::get_company,
        handlers::companies::update_company,
        handlers::companies::delete_company,
        handlers::companies::list_company_processes,

        // --- Processes ---
        handlers::processes::list_processes,
        handlers::processes::create_process,
        handlers::processes::get_summary,
        handlers::processes::get_process,
        handlers::processes::update_process,
        handlers::processes::delete_process,
        handlers::processes::list_process_tasks,
        handlers::processes::list_categories,

        // --- Tasks ---
        handlers::tasks::create_task,
        handlers::tasks::update_task,
        handlers::tasks::delete_task,
        handlers::tasks::reorder_tasks,
        handlers::tasks::move_task,

        // --- Realtime ---
        handlers::changes::stream_changes,
    ),
    components(
        schemas(
            // --- Companies ---
            models::company::CompanyStatus,
            models::company::Company,
            models::company::CompanyWithStats,
            models::company::NewCompany,
            models::company::CompanyPatch,

            // --- Processes ---
            models::process::ProcessStatus,
            models::process::ProcessCategory,
            models::process::ProcessWithTaskCounts,
            models::process::ProcessSummary,
            models::process::NewProcess,
            models::process::ProcessPatch,

            // --- Tasks ---
            models::task::TaskStatus,
            models::task::TaskPriority,
            models::task::Task,
            models::task::NewTask,
            models::task::TaskPatch,
            models::task::TaskPosition,
            models::task::ReorderTasks,
            models::task::MoveTask,

            // --- Realtime ---
            realtime::Table,
            realtime::TableChange,
        )
    ),
    tags(
        (name = "Companies", description = "CRM: empresas e funil de vendas"),
        (name = "Processes", description = "Processos, progresso e categorias"),
        (name = "Tasks", description = "Quadro de tarefas e ordenação"),
        (name = "Realtime", description = "Sinais de mudança (SSE)")
    )
)]
pub struct ApiDoc;
