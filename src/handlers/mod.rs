//! HTTP request handlers for the Switchyard API

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::registry::ProviderRegistry;
use crate::router::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod generate;
pub mod health;
pub mod metrics;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    router: Arc<Router>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Build state from configuration, resolving credentials from the environment
    ///
    /// # Errors
    ///
    /// Fails if the metrics registry or a provider's HTTP client cannot be built.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let metrics = Arc::new(Metrics::new().map_err(|e| {
            AppError::Internal(format!("Failed to initialize metrics: {}", e))
        })?);
        let registry = ProviderRegistry::from_config(&config);
        let router = Arc::new(Router::new(&registry, metrics.clone())?);

        Ok(Self {
            config,
            router,
            metrics,
        })
    }

    /// Assemble state from parts built elsewhere (tests, embedding)
    pub fn from_parts(config: Arc<Config>, router: Arc<Router>, metrics: Arc<Metrics>) -> Self {
        Self {
            config,
            router,
            metrics,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the axum application: routes, request IDs and HTTP tracing
pub fn build_app(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/v1/generate", post(generate::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_id_middleware)),
        )
        .with_state(state)
}
