//! Configuration management for Switchyard
//!
//! Parses TOML configuration files and provides typed access to settings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Upper bound for any timeout value, in seconds
const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Overall deadline for one `/v1/generate` call, across all failover attempts
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    90
}

/// Backend wire family / vendor preset
///
/// The OpenAI-compatible vendors share one adapter and differ only in their
/// default base URL and whether they accept `response_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Anthropic,
    OpenAi,
    Groq,
    Mistral,
    DeepSeek,
    OpenRouter,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Groq => "groq",
            Self::Mistral => "mistral",
            Self::DeepSeek => "deepseek",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Vendor's documented API root
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::Mistral => "https://api.mistral.ai/v1",
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    /// Whether the backend exposes a switch that constrains output to JSON
    pub fn supports_json_output(&self) -> bool {
        match self {
            Self::Gemini | Self::OpenAi | Self::Groq | Self::Mistral | Self::DeepSeek => true,
            Self::Anthropic | Self::OpenRouter => false,
        }
    }
}

/// One `[[providers]]` entry
///
/// All fields are private to enforce invariants. Entries are loaded via
/// deserialization and validated via Config::validate(). After construction,
/// fields cannot be mutated.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderEntry {
    name: String,
    kind: ProviderKind,
    /// Environment variable holding the credential
    api_key_env: String,
    requests_per_minute: u32,
    /// 1 = most preferred; only consulted when every provider is rate-limited
    #[serde(default = "default_priority")]
    priority: u32,
    logic_model: String,
    content_model: String,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    disabled: bool,
    #[serde(default = "default_provider_timeout")]
    timeout_seconds: u64,
    #[serde(default)]
    merge_system_into_user: bool,
    #[serde(default = "default_max_tokens")]
    default_max_tokens: u32,
}

impl ProviderEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn logic_model(&self) -> &str {
        &self.logic_model
    }

    pub fn content_model(&self) -> &str {
        &self.content_model
    }

    /// Configured base URL, or the vendor default
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }

    pub fn disabled(&self) -> bool {
        self.disabled
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    pub fn merge_system_into_user(&self) -> bool {
        self.merge_system_into_user
    }

    pub fn default_max_tokens(&self) -> u32 {
        self.default_max_tokens
    }
}

fn default_priority() -> u32 {
    1
}

fn default_provider_timeout() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    4096
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            crate::error::AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self = toml::from_str(&content).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 3: Validate parsed config
        config
            .validate()
            .map_err(|e| crate::error::AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()`, but can also be called
    /// explicitly when constructing Config via other means (e.g., in tests).
    ///
    /// An empty provider list is accepted: the router reports
    /// `NoProvidersConfigured` per call instead of refusing to start.
    pub fn validate(&self) -> crate::error::AppResult<()> {
        if self.server.request_timeout_seconds == 0
            || self.server.request_timeout_seconds > MAX_TIMEOUT_SECONDS
        {
            return Err(crate::error::AppError::Config(format!(
                "server.request_timeout_seconds must be in (0, {}], got {}",
                MAX_TIMEOUT_SECONDS, self.server.request_timeout_seconds
            )));
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                return Err(crate::error::AppError::Config(
                    "Provider name cannot be empty".to_string(),
                ));
            }

            if !seen.insert(provider.name.as_str()) {
                return Err(crate::error::AppError::Config(format!(
                    "Duplicate provider name '{}'. Provider names must be unique.",
                    provider.name
                )));
            }

            if provider.api_key_env.trim().is_empty() {
                return Err(crate::error::AppError::Config(format!(
                    "Provider '{}' has an empty api_key_env",
                    provider.name
                )));
            }

            if provider.logic_model.trim().is_empty() || provider.content_model.trim().is_empty()
            {
                return Err(crate::error::AppError::Config(format!(
                    "Provider '{}' must set both logic_model and content_model",
                    provider.name
                )));
            }

            if provider.priority == 0 {
                return Err(crate::error::AppError::Config(format!(
                    "Provider '{}' has priority=0. Priority starts at 1 (most preferred).",
                    provider.name
                )));
            }

            if provider.timeout_seconds == 0 || provider.timeout_seconds > MAX_TIMEOUT_SECONDS {
                return Err(crate::error::AppError::Config(format!(
                    "Provider '{}' has timeout_seconds={}; must be in (0, {}]",
                    provider.name, provider.timeout_seconds, MAX_TIMEOUT_SECONDS
                )));
            }

            if provider.default_max_tokens == 0 {
                return Err(crate::error::AppError::Config(format!(
                    "Provider '{}' has default_max_tokens=0; must be greater than 0",
                    provider.name
                )));
            }

            if let Some(url) = &provider.base_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(crate::error::AppError::Config(format!(
                        "Provider '{}' has invalid base_url '{}'. \
                        base_url must start with 'http://' or 'https://'.",
                        provider.name, url
                    )));
                }
                if url.ends_with('/') {
                    return Err(crate::error::AppError::Config(format!(
                        "Provider '{}' has base_url '{}' with a trailing slash. \
                        Remove it; request paths are appended with a leading '/'.",
                        provider.name, url
                    )));
                }
            }

            if provider.requests_per_minute == 0 {
                tracing::warn!(
                    provider = %provider.name,
                    "requests_per_minute=0: provider is permanently rate-limited and only \
                    used as a last-resort fallback"
                );
            }
        }

        if self.providers.is_empty() {
            tracing::warn!("No [[providers]] configured - every generate call will fail");
        }

        Ok(())
    }
}
