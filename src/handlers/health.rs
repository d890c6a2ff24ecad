//! Health check endpoint
//!
//! Reports router state for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;
use crate::router::RouterSnapshot;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "OK", or "degraded" when no provider is enabled
    pub status: &'static str,
    #[serde(flatten)]
    pub router: RouterSnapshot,
}

/// Health check handler
///
/// Always 200: a router without providers is still serving, it just cannot
/// generate. Reading the snapshot does not prune rate windows.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let router = state.router().snapshot();
    let status = if router.providers.is_empty() {
        "degraded"
    } else {
        "OK"
    };

    (StatusCode::OK, Json(HealthResponse { status, router }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_degraded_without_providers() {
        let config: Config = toml::from_str(
            r#"
[server]
host = "127.0.0.1"
port = 3000
"#,
        )
        .unwrap();
        let state = AppState::new(Arc::new(config)).expect("should create AppState");

        let (status, Json(body)) = handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "degraded");
        assert!(body.router.providers.is_empty());
        assert_eq!(body.router.cursor, 0);
    }
}
