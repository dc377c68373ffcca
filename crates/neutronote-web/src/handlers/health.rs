use axum::{extract::State, http::StatusCode};
use tracing::warn;

use crate::state::SharedState;

/// Liveness probe; fails when the database cannot be queried.
pub async fn healthz(State(state): State<SharedState>) -> (StatusCode, &'static str) {
    match state.db.stats().await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}
