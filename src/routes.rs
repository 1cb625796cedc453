// src/routes.rs

use axum::{
    routing::{get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

pub fn router(app_state: AppState) -> Router {
    let company_routes = Router::new()
        .route(
            "/",
            get(handlers::companies::list_companies).post(handlers::companies::create_company),
        )
        .route(
            "/{id}",
            get(handlers::companies::get_company)
                .patch(handlers::companies::update_company)
                .delete(handlers::companies::delete_company),
        )
        .route("/{id}/processes", get(handlers::companies::list_company_processes));

    let process_routes = Router::new()
        .route(
            "/",
            get(handlers::processes::list_processes).post(handlers::processes::create_process),
        )
        .route("/summary", get(handlers::processes::get_summary))
        .route(
            "/{id}",
            get(handlers::processes::get_process)
                .patch(handlers::processes::update_process)
                .delete(handlers::processes::delete_process),
        )
        .route("/{id}/tasks", get(handlers::processes::list_process_tasks));

    let task_routes = Router::new()
        .route("/", post(handlers::tasks::create_task))
        .route("/reorder", post(handlers::tasks::reorder_tasks))
        .route(
            "/{id}",
            patch(handlers::tasks::update_task).delete(handlers::tasks::delete_task),
        )
        .route("/{id}/move", post(handlers::tasks::move_task));

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/categories", get(handlers::processes::list_categories))
        .route("/api/changes", get(handlers::changes::stream_changes))
        .nest("/api/companies", company_routes)
        .nest("/api/processes", process_routes)
        .nest("/api/tasks", task_routes)
        .with_state(app_state)
}
