//! Generation router for Switchyard
//!
//! Spreads calls across every enabled provider in round-robin order, skips
//! providers that are over their per-minute budget, and fails over to the
//! next provider when a call fails. Each provider is tried at most once per
//! call.

pub mod provider_name;
pub mod rate_window;
pub mod selector;

pub use provider_name::{ExclusionSet, ProviderName};
pub use rate_window::{RateWindow, WINDOW};
pub use selector::{ProviderSelector, Selection};

use crate::clock::{Clock, SystemClock};
use crate::config::ProviderKind;
use crate::error::{AppError, AppResult, ProviderError, ProviderErrorKind, RouterError};
use crate::generation::{GenerationRequest, GenerationResponse};
use crate::metrics::{AttemptOutcome, GenerationOutcome, Metrics};
use crate::providers::{Adapter, build_adapters};
use crate::registry::{ProviderConfig, ProviderRegistry};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Per-provider line of a [`RouterSnapshot`]
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub kind: ProviderKind,
    pub priority: u32,
    pub requests_per_minute: u32,
    /// Attempts inside the trailing window (stale entries not yet pruned are excluded)
    pub recent_attempts: usize,
    pub rate_limited: bool,
}

/// Point-in-time view of router state, for health output and diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct RouterSnapshot {
    pub cursor: u64,
    pub providers: Vec<ProviderStatus>,
}

/// Multi-provider generation router
///
/// Shared across request handlers behind an `Arc`. All mutable state lives in
/// the [`ProviderSelector`]; adapters are immutable after construction.
pub struct Router {
    selector: ProviderSelector,
    adapters: HashMap<String, Arc<dyn Adapter>>,
    metrics: Arc<Metrics>,
}

impl Router {
    /// Build a router with HTTP adapters for every enabled provider
    pub fn new(registry: &ProviderRegistry, metrics: Arc<Metrics>) -> AppResult<Self> {
        let adapters = build_adapters(&registry.list_enabled())?;
        Self::with_adapters(registry, adapters, Arc::new(SystemClock), metrics)
    }

    /// Build a router from pre-built adapters and an explicit clock
    ///
    /// # Errors
    ///
    /// Fails if an enabled provider has no adapter in `adapters`.
    pub fn with_adapters(
        registry: &ProviderRegistry,
        adapters: HashMap<String, Arc<dyn Adapter>>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
    ) -> AppResult<Self> {
        let enabled = registry.list_enabled();

        if let Some(missing) = enabled.iter().find(|p| !adapters.contains_key(p.name())) {
            return Err(AppError::Config(format!(
                "Enabled provider '{}' has no adapter",
                missing.name()
            )));
        }

        if enabled.is_empty() {
            tracing::warn!(
                declared = registry.all().len(),
                "Router has no enabled providers; every generation will fail until \
                credentials are provided"
            );
        } else {
            tracing::info!(
                providers = ?enabled.iter().map(|p| p.name()).collect::<Vec<_>>(),
                "Router initialized"
            );
        }

        Ok(Self {
            selector: ProviderSelector::new(enabled, clock),
            adapters,
            metrics,
        })
    }

    /// Enabled providers, in declaration order
    pub fn enabled_providers(&self) -> &[ProviderConfig] {
        self.selector.enabled()
    }

    /// Next provider the router would attempt, skipping `exclude`
    ///
    /// Advances the cursor but records no attempt.
    pub fn select(&self, exclude: &ExclusionSet) -> Option<&ProviderConfig> {
        self.selector.select(exclude).map(|s| s.provider)
    }

    /// Whether the named provider is currently at or over its per-minute budget
    ///
    /// Names that are not enabled providers are reported as limited, since
    /// they can never be selected.
    pub fn is_rate_limited(&self, name: &str) -> bool {
        self.selector.is_rate_limited(name)
    }

    pub fn cursor(&self) -> u64 {
        self.selector.cursor()
    }

    /// Current cursor and per-provider window counts
    ///
    /// Does not prune windows or move the cursor.
    pub fn snapshot(&self) -> RouterSnapshot {
        let (cursor, counts) = self.selector.observe();
        let providers = self
            .selector
            .enabled()
            .iter()
            .zip(counts)
            .map(|(p, recent_attempts)| ProviderStatus {
                name: p.name().to_string(),
                kind: p.kind(),
                priority: p.priority(),
                requests_per_minute: p.requests_per_minute(),
                recent_attempts,
                rate_limited: recent_attempts >= p.requests_per_minute() as usize,
            })
            .collect();

        RouterSnapshot { cursor, providers }
    }

    /// Generate text, failing over across providers
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, RouterError> {
        self.generate_with_cancellation(request, std::future::pending())
            .await
    }

    /// Generate text, abandoning the call as soon as `cancel` resolves
    ///
    /// The in-flight provider request is dropped on cancellation and no
    /// further providers are tried.
    pub async fn generate_with_cancellation<C>(
        &self,
        request: &GenerationRequest,
        cancel: C,
    ) -> Result<GenerationResponse, RouterError>
    where
        C: Future<Output = ()>,
    {
        let result = self.dispatch(request, cancel).await;

        let outcome = match &result {
            Ok(_) => GenerationOutcome::Success,
            Err(e) => GenerationOutcome::from(e),
        };
        if let Err(e) = self.metrics.record_generation(outcome) {
            tracing::error!(
                error = %e,
                outcome = outcome.as_str(),
                "Metrics recording failed (non-fatal)"
            );
        }

        result
    }

    async fn dispatch<C>(
        &self,
        request: &GenerationRequest,
        cancel: C,
    ) -> Result<GenerationResponse, RouterError>
    where
        C: Future<Output = ()>,
    {
        request.validate().map_err(RouterError::InvalidRequest)?;

        let total = self.selector.enabled().len();
        if total == 0 {
            tracing::error!("Generation requested but no providers are enabled");
            return Err(RouterError::NoProvidersConfigured);
        }

        tokio::pin!(cancel);

        let mut attempted = ExclusionSet::new();
        let mut last_failure: Option<ProviderError> = None;

        while attempted.len() < total {
            // Between attempts: stop before selecting (and recording) another provider
            tokio::select! {
                biased;
                () = &mut cancel => {
                    tracing::info!(attempts = attempted.len(), "Generation cancelled between attempts");
                    return Err(RouterError::Cancelled { provider: None });
                }
                () = std::future::ready(()) => {}
            }

            let Some(selection) = self.selector.select_and_record(&attempted) else {
                break;
            };
            let provider = selection.provider;
            let name = provider.name();
            attempted.insert(ProviderName::from(provider));

            if selection.fallback {
                if let Err(e) = self.metrics.record_fallback(name) {
                    tracing::error!(error = %e, provider = %name, "Metrics recording failed (non-fatal)");
                }
            }

            let model = provider.model_for(request.category);
            tracing::debug!(
                provider = %name,
                model = %model,
                category = request.category.as_str(),
                attempt = attempted.len(),
                max_attempts = total,
                fallback = selection.fallback,
                "Dispatching generation"
            );

            let started = Instant::now();
            let result = match self.adapters.get(name) {
                Some(adapter) => {
                    tokio::select! {
                        biased;
                        () = &mut cancel => {
                            tracing::info!(
                                provider = %name,
                                attempt = attempted.len(),
                                "Generation cancelled while provider call was in flight"
                            );
                            return Err(RouterError::Cancelled {
                                provider: Some(name.to_string()),
                            });
                        }
                        result = adapter.call(model, request) => result,
                    }
                }
                None => Err(ProviderError::transport(name, "no adapter registered")),
            };
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            let outcome = match &result {
                Ok(_) => AttemptOutcome::Success,
                Err(e) => AttemptOutcome::from(e.kind()),
            };
            if let Err(e) = self.metrics.record_attempt(name, outcome, latency_ms) {
                tracing::error!(
                    error = %e,
                    provider = %name,
                    outcome = outcome.as_str(),
                    "Metrics recording failed (non-fatal)"
                );
            }

            match result {
                Ok(response) => {
                    tracing::info!(
                        provider = %name,
                        model = %model,
                        attempt = attempted.len(),
                        latency_ms = %latency_ms,
                        tokens_used = ?response.tokens_used,
                        "Generation succeeded"
                    );
                    return Ok(response);
                }
                Err(err) => {
                    match err.kind() {
                        ProviderErrorKind::Auth => tracing::warn!(
                            provider = %name,
                            api_key_env = %provider.entry().api_key_env(),
                            error = %err,
                            "Provider rejected credentials; check the API key. Failing over"
                        ),
                        kind => tracing::warn!(
                            provider = %name,
                            kind = kind.as_str(),
                            attempt = attempted.len(),
                            max_attempts = total,
                            error = %err,
                            "Provider call failed; failing over"
                        ),
                    }
                    last_failure = Some(err);
                }
            }
        }

        match last_failure {
            Some(source) => {
                tracing::error!(
                    attempts = attempted.len(),
                    last_provider = %source.provider(),
                    error = %source,
                    "All providers failed"
                );
                Err(RouterError::AllProvidersFailed {
                    last_provider: source.provider().to_string(),
                    attempts: attempted.len(),
                    source,
                })
            }
            None => Err(RouterError::NoProvidersConfigured),
        }
    }
}
