//! JSON endpoints used by the create panel to browse reduced data.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use neutronote_common::ApiError;
use neutronote_snap::{filter_runs, is_state_id};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::handlers::blocking;
use crate::state::SharedState;

const NOT_CONFIGURED: &str = "Notebook IPTS not configured";

/// 400 with an empty list under `key`, so the client can still render.
fn not_configured(key: &str) -> Response {
    let mut body = json!({ "error": NOT_CONFIGURED });
    if !key.is_empty() {
        body[key] = json!([]);
    }
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// Instrument states with reductions in the notebook's IPTS.
pub async fn api_states(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let Some(ipts) = state.configured_ipts().await? else {
        return Ok(not_configured("states"));
    };
    let snap = state.snap.clone();
    let lookup = ipts.clone();
    let states = blocking(move || snap.discover_state_ids(&lookup)).await?;
    Ok(Json(json!({
        "ipts": ipts,
        "count": states.len(),
        "states": states,
    }))
    .into_response())
}

fn check_state_id(state_id: &str) -> Result<(), ApiError> {
    if is_state_id(state_id) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Invalid state_id: '{state_id}'")))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RunsQuery {
    pub search: String,
    /// Kept as text so an empty or malformed value means "no limit".
    pub limit: Option<String>,
}

impl RunsQuery {
    fn limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Latest lite reductions for one state, optionally filtered.
pub async fn api_runs(
    State(state): State<SharedState>,
    Path(state_id): Path<String>,
    Query(query): Query<RunsQuery>,
) -> Result<Response, ApiError> {
    let Some(ipts) = state.configured_ipts().await? else {
        return Ok(not_configured("runs"));
    };
    check_state_id(&state_id)?;
    let snap = state.snap.clone();
    let (lookup_ipts, lookup_state) = (ipts.clone(), state_id.clone());
    let runs = blocking(move || snap.discover_reduced_runs(&lookup_ipts, &lookup_state, true, true)).await?;
    let runs = filter_runs(runs, &query.search, query.limit());

    Ok(Json(json!({
        "state_id": state_id,
        "ipts": ipts,
        "count": runs.len(),
        "runs": runs.iter().map(|r| r.to_json()).collect::<Vec<Value>>(),
    }))
    .into_response())
}

#[derive(Debug, Deserialize, Default)]
pub struct RunInfoQuery {
    #[serde(default)]
    pub state_id: String,
}

pub async fn api_run_info(
    State(state): State<SharedState>,
    Path(run_number): Path<u64>,
    Query(query): Query<RunInfoQuery>,
) -> Result<Response, ApiError> {
    let Some(ipts) = state.configured_ipts().await? else {
        return Ok(not_configured(""));
    };
    let state_id = query.state_id.trim().to_string();
    if state_id.is_empty() {
        return Err(ApiError::BadRequest("state_id parameter required".to_string()));
    }
    check_state_id(&state_id)?;

    let snap = state.snap.clone();
    let lookup_state = state_id.clone();
    let runs = blocking(move || snap.discover_reduced_runs(&ipts, &lookup_state, true, true)).await?;
    runs.into_iter()
        .find(|r| r.run_number == run_number)
        .map(|run| Json(run.to_json()).into_response())
        .ok_or_else(|| ApiError::NotFound(format!("Run {run_number} not found in state {state_id}")))
}

/// Hashtags with how many entries carry each.
pub async fn api_tags(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let tags = state.tags.list_with_counts().await?;
    Ok(Json(json!({ "count": tags.len(), "tags": tags })).into_response())
}
