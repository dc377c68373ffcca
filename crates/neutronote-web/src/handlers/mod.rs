//! HTTP handlers for all web routes.

pub mod api;
pub mod create;
pub mod entries;
pub mod health;
pub mod kernel;

use axum::response::Redirect;
use neutronote_common::ApiError;

/// Tabs of the create panel.
pub const TABS: [&str; 5] = ["text", "header", "image", "data", "code"];

/// Back to the timeline, optionally reopening a create tab.
pub fn to_index(tab: Option<&str>) -> Redirect {
    match tab {
        Some(tab) => Redirect::to(&format!("/entries/?tab={tab}")),
        None => Redirect::to("/entries/"),
    }
}

/// Trimmed form value, `None` when blank.
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Run blocking filesystem work off the async runtime.
pub async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("background task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(" Run 1 ").as_deref(), Some("Run 1"));
    }

    #[test]
    fn test_index_redirect_location() {
        let resp = to_index(Some("header")).into_response();
        assert_eq!(resp.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], "/entries/?tab=header");
    }
}
