//! Prometheus metrics for Switchyard
//!
//! Tracks:
//! - provider attempts by outcome
//! - whole generation calls by outcome
//! - per-provider call latency
//! - rate-limit fallbacks (every candidate over budget)
//!
//! Exposed via `GET /metrics` in Prometheus text format.

use crate::error::{ProviderErrorKind, RouterError};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Outcome of a single provider attempt, as a metrics label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    RateLimited,
    Transport,
    Auth,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::RateLimited => "rate_limited",
            Self::Transport => "transport",
            Self::Auth => "auth",
        }
    }
}

impl From<ProviderErrorKind> for AttemptOutcome {
    fn from(kind: ProviderErrorKind) -> Self {
        match kind {
            ProviderErrorKind::RateLimited => Self::RateLimited,
            ProviderErrorKind::Transport => Self::Transport,
            ProviderErrorKind::Auth => Self::Auth,
        }
    }
}

/// Outcome of a whole `generate` call, as a metrics label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success,
    AllFailed,
    NoProviders,
    InvalidRequest,
    Cancelled,
}

impl GenerationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AllFailed => "all_failed",
            Self::NoProviders => "no_providers",
            Self::InvalidRequest => "invalid_request",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<&RouterError> for GenerationOutcome {
    fn from(err: &RouterError) -> Self {
        match err {
            RouterError::InvalidRequest(_) => Self::InvalidRequest,
            RouterError::NoProvidersConfigured => Self::NoProviders,
            RouterError::AllProvidersFailed { .. } => Self::AllFailed,
            RouterError::Cancelled { .. } => Self::Cancelled,
        }
    }
}

/// Metrics collector
///
/// Provider labels come from configuration, so cardinality is bounded by the
/// number of configured providers.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    provider_attempts: IntCounterVec,
    generations: IntCounterVec,
    provider_latency: HistogramVec,
    rate_limit_fallbacks: IntCounterVec,
}

impl Metrics {
    /// Create a new registry with every metric registered
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails (e.g. duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let provider_attempts = IntCounterVec::new(
            Opts::new(
                "switchyard_provider_attempts_total",
                "Provider calls by provider and outcome",
            ),
            &["provider", "outcome"],
        )?;

        let generations = IntCounterVec::new(
            Opts::new(
                "switchyard_generations_total",
                "Generation calls by final outcome",
            ),
            &["outcome"],
        )?;

        // Remote LLM calls: tens of ms (errors) up to a minute (long completions)
        let provider_latency = HistogramVec::new(
            HistogramOpts::new(
                "switchyard_provider_latency_ms",
                "Provider call latency in milliseconds",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0, 60000.0,
            ]),
            &["provider"],
        )?;

        let rate_limit_fallbacks = IntCounterVec::new(
            Opts::new(
                "switchyard_rate_limit_fallbacks_total",
                "Selections where every candidate was over budget and the \
                highest-priority provider was attempted anyway",
            ),
            &["provider"],
        )?;

        registry.register(Box::new(provider_attempts.clone()))?;
        registry.register(Box::new(generations.clone()))?;
        registry.register(Box::new(provider_latency.clone()))?;
        registry.register(Box::new(rate_limit_fallbacks.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            provider_attempts,
            generations,
            provider_latency,
            rate_limit_fallbacks,
        })
    }

    /// Record one provider attempt and its latency
    ///
    /// # Errors
    ///
    /// Returns an error if `latency_ms` is NaN, infinite or negative; such
    /// values would corrupt every histogram percentile.
    pub fn record_attempt(
        &self,
        provider: &str,
        outcome: AttemptOutcome,
        latency_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !latency_ms.is_finite() || latency_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Latency must be finite and non-negative, got: {}",
                latency_ms
            )));
        }

        self.provider_attempts
            .get_metric_with_label_values(&[provider, outcome.as_str()])?
            .inc();
        self.provider_latency
            .get_metric_with_label_values(&[provider])?
            .observe(latency_ms);
        Ok(())
    }

    /// Record the final outcome of a generation call
    pub fn record_generation(&self, outcome: GenerationOutcome) -> Result<(), prometheus::Error> {
        self.generations
            .get_metric_with_label_values(&[outcome.as_str()])?
            .inc();
        Ok(())
    }

    /// Record a priority fallback selection
    pub fn record_fallback(&self, provider: &str) -> Result<(), prometheus::Error> {
        self.rate_limit_fallbacks
            .get_metric_with_label_values(&[provider])?
            .inc();
        Ok(())
    }

    /// Attempts recorded so far for a provider/outcome pair
    pub fn attempts_count(&self, provider: &str, outcome: AttemptOutcome) -> u64 {
        self.provider_attempts
            .get_metric_with_label_values(&[provider, outcome.as_str()])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    /// Generations recorded so far with the given outcome
    pub fn generations_count(&self, outcome: GenerationOutcome) -> u64 {
        self.generations
            .get_metric_with_label_values(&[outcome.as_str()])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    metric_family_count = metric_families.len(),
                    "Prometheus text encoder failed"
                );
                e
            })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!(
                "Failed to convert metrics to UTF-8 at byte {}: {}",
                e.utf8_error().valid_up_to(),
                e
            ))
        })
    }
}
