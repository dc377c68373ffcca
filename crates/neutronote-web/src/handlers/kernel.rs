//! Kernel control and introspection API.

use axum::{
    extract::{Path, State},
    Json,
};
use neutronote_common::ApiError;
use neutronote_kernel::{ExecutionResult, KernelStatus, MemoryInfo, VariableInfo, WorkspaceInfo};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::state::SharedState;

pub async fn kernel_status(State(state): State<SharedState>) -> Json<KernelStatus> {
    Json(state.kernel.status())
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
}

/// Run a cell, starting the kernel first if needed.
pub async fn kernel_execute(
    State(state): State<SharedState>,
    Json(req): Json<ExecuteRequest>,
) -> Result<Json<ExecutionResult>, ApiError> {
    if req.code.trim().is_empty() {
        return Err(ApiError::BadRequest("code is required".to_string()));
    }
    Ok(Json(state.kernel.execute(&req.code).await))
}

pub async fn kernel_restart(State(state): State<SharedState>) -> Result<Json<KernelStatus>, ApiError> {
    info!("kernel restart requested");
    state
        .kernel
        .restart()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(state.kernel.status()))
}

pub async fn kernel_workspaces(State(state): State<SharedState>) -> Json<Vec<WorkspaceInfo>> {
    Json(state.kernel.workspaces().await)
}

pub async fn kernel_delete_workspace(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Json<Value> {
    let (success, message) = state.kernel.delete_workspace(&name).await;
    Json(json!({ "success": success, "message": message }))
}

pub async fn kernel_variables(State(state): State<SharedState>) -> Json<Vec<VariableInfo>> {
    Json(state.kernel.variables().await)
}

pub async fn kernel_memory(State(state): State<SharedState>) -> Json<MemoryInfo> {
    Json(state.kernel.memory_info().await)
}
