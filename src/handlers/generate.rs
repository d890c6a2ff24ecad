//! Generation endpoint
//!
//! POST /v1/generate routes one [`GenerationRequest`] through the router,
//! bounded by `server.request_timeout_seconds` across all failover attempts.

use crate::error::AppError;
use crate::generation::{GenerationRequest, GenerationResponse};
use crate::handlers::AppState;
use crate::middleware::RequestId;
use axum::{Extension, Json, extract::State};
use std::time::Duration;

/// POST /v1/generate handler
///
/// Worst-case latency is the server deadline, not the sum of per-provider
/// timeouts: when the deadline fires the in-flight provider call is dropped.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerationResponse>, AppError> {
    tracing::debug!(
        request_id = %request_id,
        messages = request.messages.len(),
        category = request.category.as_str(),
        response_format = ?request.response_format,
        "Received generation request"
    );

    let deadline = Duration::from_secs(state.config().server.request_timeout_seconds);

    let response = state
        .router()
        .generate_with_cancellation(&request, tokio::time::sleep(deadline))
        .await
        .map_err(|e| {
            tracing::warn!(
                request_id = %request_id,
                error = %e,
                "Generation request failed"
            );
            AppError::from(e)
        })?;

    tracing::info!(
        request_id = %request_id,
        provider = %response.provider_name,
        model = %response.model_used,
        "Generation request completed"
    );

    Ok(Json(response))
}
