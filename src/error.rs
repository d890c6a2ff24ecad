//! Error types for Switchyard
//!
//! Three layers:
//! - [`ProviderError`]: what a single adapter call can fail with (classified taxonomy)
//! - [`RouterError`]: what a `generate` call can fail with
//! - [`AppError`]: process-level errors; implements `IntoResponse` for Axum handlers

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Maximum number of characters of a backend error body kept for diagnostics
const MAX_ERROR_DETAIL_CHARS: usize = 300;

/// Coarse classification of a provider failure
///
/// Used as a metrics label and for log levels. Closed set so label
/// cardinality stays bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    RateLimited,
    Transport,
    Auth,
}

impl ProviderErrorKind {
    /// Prometheus label / log value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Transport => "transport",
            Self::Auth => "auth",
        }
    }
}

/// Failure of one adapter call against one backend
///
/// Every variant is recoverable by failover: the router moves on to a
/// different provider. `detail` fields hold a truncated backend body and are
/// meant for logs only, never for end users.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Backend rejected the call for rate or quota reasons
    #[error("{provider} rejected the request for rate/quota reasons (HTTP {status}): {detail}")]
    RateLimited {
        provider: String,
        status: u16,
        detail: String,
    },

    /// Network failure, timeout, unexpected HTTP status, or undecodable body
    #[error("transport failure talking to {provider}{}: {reason}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Transport {
        provider: String,
        status: Option<u16>,
        reason: String,
    },

    /// Invalid or expired credential
    #[error("{provider} rejected the credential (HTTP {status}): {detail}")]
    Auth {
        provider: String,
        status: u16,
        detail: String,
    },
}

impl ProviderError {
    /// Name of the provider that produced this error
    pub fn provider(&self) -> &str {
        match self {
            Self::RateLimited { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Auth { provider, .. } => provider,
        }
    }

    /// Classification of this error
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::RateLimited { .. } => ProviderErrorKind::RateLimited,
            Self::Transport { .. } => ProviderErrorKind::Transport,
            Self::Auth { .. } => ProviderErrorKind::Auth,
        }
    }

    /// Build a transport error without an HTTP status
    pub fn transport(provider: &str, reason: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.to_string(),
            status: None,
            reason: reason.into(),
        }
    }

    /// Classify a non-success HTTP response into the closed taxonomy
    ///
    /// - 429, 529 (Anthropic "overloaded"), or a body mentioning rate/quota exhaustion → `RateLimited`
    /// - 401 / 403 otherwise → `Auth`
    /// - anything else → `Transport` with the status attached
    pub fn from_status(provider: &str, status: u16, body: &str) -> Self {
        let detail = truncate_detail(body);
        let lowered = body.to_ascii_lowercase();
        let mentions_quota = lowered.contains("rate limit")
            || lowered.contains("rate_limit")
            || lowered.contains("quota")
            || lowered.contains("resource_exhausted")
            || lowered.contains("too many requests");

        if status == 429 || status == 529 || mentions_quota {
            return Self::RateLimited {
                provider: provider.to_string(),
                status,
                detail,
            };
        }

        if status == 401 || status == 403 {
            return Self::Auth {
                provider: provider.to_string(),
                status,
                detail,
            };
        }

        Self::Transport {
            provider: provider.to_string(),
            status: Some(status),
            reason: detail,
        }
    }

    /// Classify a `reqwest` error raised before or while reading a response
    pub fn from_reqwest(provider: &str, err: &reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_decode() {
            format!("malformed response body: {}", err)
        } else {
            err.to_string()
        };
        Self::Transport {
            provider: provider.to_string(),
            status: err.status().map(|s| s.as_u16()),
            reason,
        }
    }
}

fn truncate_detail(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_DETAIL_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(MAX_ERROR_DETAIL_CHARS).collect();
    cut.push_str("...");
    cut
}

/// Failure of a whole `generate` call
#[derive(Debug, Error)]
pub enum RouterError {
    /// The request itself is unusable (e.g. no messages)
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    /// Zero enabled providers at call time
    #[error("No providers configured: every provider is missing a credential or disabled")]
    NoProvidersConfigured,

    /// Every enabled provider was tried once and failed
    #[error("All {attempts} providers failed; last tried '{last_provider}': {source}")]
    AllProvidersFailed {
        last_provider: String,
        attempts: usize,
        #[source]
        source: ProviderError,
    },

    /// The caller cancelled (or its deadline fired) while a call was in flight
    #[error("Generation cancelled by caller{}", .provider.as_ref().map(|p| format!(" while '{}' was in flight", p)).unwrap_or_default())]
    Cancelled { provider: Option<String> },
}

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error(transparent)]
    Routing(#[from] RouterError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Message shown to end users whenever the router could not produce text
///
/// Backend error bodies can echo credentials or internal diagnostics, so they
/// are never part of a response.
pub const TRY_AGAIN_MESSAGE: &str =
    "The generation service is temporarily unavailable. Please try again.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Routing(RouterError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, format!("Invalid request: {}", msg))
            }
            Self::Routing(RouterError::NoProvidersConfigured) => {
                (StatusCode::SERVICE_UNAVAILABLE, TRY_AGAIN_MESSAGE.to_string())
            }
            Self::Routing(RouterError::AllProvidersFailed { .. }) => {
                (StatusCode::BAD_GATEWAY, TRY_AGAIN_MESSAGE.to_string())
            }
            Self::Routing(RouterError::Cancelled { .. }) => {
                (StatusCode::GATEWAY_TIMEOUT, TRY_AGAIN_MESSAGE.to_string())
            }
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_429_is_rate_limited() {
        let err = ProviderError::from_status("gemini", 429, "slow down");
        assert_eq!(err.kind(), ProviderErrorKind::RateLimited);
        assert_eq!(err.provider(), "gemini");
    }

    #[test]
    fn test_anthropic_overload_is_rate_limited() {
        let err = ProviderError::from_status(
            "claude",
            529,
            r#"{"type":"error","error":{"type":"overloaded_error"}}"#,
        );
        assert_eq!(err.kind(), ProviderErrorKind::RateLimited);
    }

    #[test]
    fn test_403_with_quota_message_is_rate_limited() {
        let err = ProviderError::from_status("gemini", 403, "Quota exceeded for project");
        assert_eq!(err.kind(), ProviderErrorKind::RateLimited);
    }

    #[test]
    fn test_401_and_403_are_auth() {
        assert_eq!(
            ProviderError::from_status("openai", 401, "invalid api key").kind(),
            ProviderErrorKind::Auth
        );
        assert_eq!(
            ProviderError::from_status("openai", 403, "forbidden").kind(),
            ProviderErrorKind::Auth
        );
    }

    #[test]
    fn test_5xx_is_transport_with_status() {
        let err = ProviderError::from_status("groq", 503, "upstream unavailable");
        match err {
            ProviderError::Transport { status, .. } => assert_eq!(status, Some(503)),
            other => panic!("expected Transport, got {:?}", other),
        }
    }

    #[test]
    fn test_detail_is_truncated() {
        let body = "x".repeat(5000);
        let err = ProviderError::from_status("groq", 500, &body);
        let rendered = err.to_string();
        assert!(
            rendered.len() < 500,
            "error text should be truncated, got {} bytes",
            rendered.len()
        );
    }

    #[test]
    fn test_all_failed_names_last_provider() {
        let err = RouterError::AllProvidersFailed {
            last_provider: "claude".to_string(),
            attempts: 2,
            source: ProviderError::transport("claude", "connection refused"),
        };
        let msg = err.to_string();
        assert!(msg.contains("claude"));
        assert!(msg.contains("connection refused"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_all_failed_response_hides_backend_body() {
        let err = AppError::from(RouterError::AllProvidersFailed {
            last_provider: "openai".to_string(),
            attempts: 1,
            source: ProviderError::from_status("openai", 401, "Incorrect API key sk-live-123"),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_no_providers_response_status() {
        let response = AppError::from(RouterError::NoProvidersConfigured).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_invalid_request_response_status() {
        let response =
            AppError::from(RouterError::InvalidRequest("empty".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_cancelled_display_mentions_provider() {
        let err = RouterError::Cancelled {
            provider: Some("gemini".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Generation cancelled by caller while 'gemini' was in flight"
        );
        let err = RouterError::Cancelled { provider: None };
        assert_eq!(err.to_string(), "Generation cancelled by caller");
    }

    #[test]
    fn test_config_error_creates() {
        let err = AppError::Config("test error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }
}
