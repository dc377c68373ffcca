//! Axum router: maps all URL paths to handlers.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{
    api::{api_run_info, api_runs, api_states, api_tags},
    create::{create_code, create_data, create_header, create_image, create_text},
    entries::{by_tag, delete as delete_entry, detail, edit_page, edit_submit, index, setup},
    health::healthz,
    kernel::{
        kernel_delete_workspace, kernel_execute, kernel_memory, kernel_restart, kernel_status,
        kernel_variables, kernel_workspaces,
    },
};
use crate::state::{AppState, SharedState};

/// CSS and JS assets shipped with the crate.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);
    let uploads = ServeDir::new(&shared.upload_dir);
    let body_limit = shared.max_upload_bytes;

    Router::new()
        .route("/", get(|| async { Redirect::to("/entries/") }))

        // Pages
        .route("/entries/",                   get(index))
        .route("/entries/tags/{name}",        get(by_tag))
        .route("/entries/setup",              post(setup))
        .route("/entries/create/text",        post(create_text))
        .route("/entries/create/header",      post(create_header))
        .route("/entries/create/image",       post(create_image))
        .route("/entries/create/data",        post(create_data))
        .route("/entries/create/code",        post(create_code))
        .route("/entries/{id}",               get(detail))
        .route("/entries/{id}/edit",          get(edit_page).post(edit_submit))
        .route("/entries/{id}/delete",        post(delete_entry))

        // Reduced data API
        .route("/entries/api/states",                 get(api_states))
        .route("/entries/api/states/{state_id}/runs", get(api_runs))
        .route("/entries/api/runs/{run}/info",        get(api_run_info))
        .route("/entries/api/tags",                   get(api_tags))

        // Kernel API
        .route("/api/kernel/status",            get(kernel_status))
        .route("/api/kernel/execute",           post(kernel_execute))
        .route("/api/kernel/restart",           post(kernel_restart))
        .route("/api/kernel/workspaces",        get(kernel_workspaces))
        .route("/api/kernel/workspaces/{name}", delete(kernel_delete_workspace))
        .route("/api/kernel/variables",         get(kernel_variables))
        .route("/api/kernel/memory",            get(kernel_memory))

        .route("/healthz", get(healthz))

        // Files
        .nest_service("/entries/uploads", uploads)
        .nest_service("/static", ServeDir::new(STATIC_DIR))

        // Middleware
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
