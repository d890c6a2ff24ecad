//! HTTP surface: /v1/generate, /health, /metrics and request IDs
//!
//! Runs the real axum app over scripted adapters, so no backend is contacted.

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use common::{Behavior, ProviderSpec, config_toml, harness, provider};
use serde_json::{Value, json};
use std::sync::Arc;
use switchyard::config::Config;
use switchyard::error::TRY_AGAIN_MESSAGE;
use switchyard::handlers::{AppState, build_app};
use switchyard::middleware::REQUEST_ID_HEADER;
use tower::ServiceExt;

fn app(specs: &[ProviderSpec], request_timeout_seconds: u64) -> axum::Router {
    let h = harness(specs);
    let mut config: Config = toml::from_str(&config_toml(specs)).unwrap();
    config.server.request_timeout_seconds = request_timeout_seconds;
    build_app(AppState::from_parts(Arc::new(config), h.router, h.metrics))
}

fn generate_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/generate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_generate_success() {
    let app = app(&[provider("alpha", 100)], 30);

    let response = app
        .oneshot(generate_request(json!({
            "messages": [{"role": "user", "content": "hello"}],
            "category": "logic"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["provider_name"], "alpha");
    assert_eq!(body["model_used"], "alpha-logic");
    assert_eq!(body["text"], "alpha says hi");
    assert_eq!(body["tokens_used"], 7);
}

#[tokio::test]
async fn test_all_failed_hides_backend_body() {
    let app = app(
        &[
            provider("alpha", 100).always(Behavior::Transport),
            provider("beta", 100).always(Behavior::Transport),
        ],
        30,
    );

    let response = app
        .oneshot(generate_request(json!({
            "messages": [{"role": "user", "content": "hello"}],
            "category": "content"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!text.contains("sk-live-123"), "backend body leaked: {}", text);
    assert!(!text.contains("exploded"), "backend body leaked: {}", text);
    assert!(text.contains(TRY_AGAIN_MESSAGE));
}

#[tokio::test]
async fn test_empty_messages_is_bad_request() {
    let app = app(&[provider("alpha", 100)], 30);

    let response = app
        .oneshot(generate_request(json!({"messages": [], "category": "logic"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_system_only_messages_is_bad_request() {
    let app = app(&[provider("alpha", 100)], 30);

    let response = app
        .oneshot(generate_request(json!({
            "messages": [{"role": "system", "content": "rules only"}],
            "category": "logic"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_category_is_rejected() {
    let app = app(&[provider("alpha", 100)], 30);

    let response = app
        .oneshot(generate_request(json!({
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_deadline_returns_gateway_timeout() {
    let app = app(&[provider("alpha", 100).always(Behavior::Hang)], 1);

    let response = app
        .oneshot(generate_request(json!({
            "messages": [{"role": "user", "content": "hello"}],
            "category": "content"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = body_json(response).await;
    assert_eq!(body["error"], TRY_AGAIN_MESSAGE);
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = app(&[provider("alpha", 100)], 30);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(REQUEST_ID_HEADER, "trace-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        "trace-abc-123"
    );

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let generated = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn test_health_lists_providers() {
    let app = app(&[provider("alpha", 100), provider("beta", 0).priority(2)], 30);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["cursor"], 0);
    assert_eq!(body["providers"][0]["name"], "alpha");
    assert_eq!(body["providers"][0]["kind"], "openai");
    assert_eq!(body["providers"][1]["rate_limited"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_counts_generations() {
    let app = app(&[provider("alpha", 100)], 30);

    let response = app
        .clone()
        .oneshot(generate_request(json!({
            "messages": [{"role": "user", "content": "hello"}],
            "category": "content"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains("switchyard_generations_total{outcome=\"success\"} 1"));
    let attempts = text
        .lines()
        .find(|l| l.starts_with("switchyard_provider_attempts_total{"))
        .expect("attempt counter should be exported");
    assert!(attempts.contains("provider=\"alpha\""));
    assert!(attempts.contains("outcome=\"success\""));
    assert!(attempts.ends_with(" 1"));
}
