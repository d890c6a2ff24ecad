//! Provider registry
//!
//! Static, process-wide list of candidate backends. Built once from
//! configuration plus the process environment; immutable afterwards.

use crate::config::{Config, ProviderEntry, ProviderKind};
use crate::generation::TaskCategory;
use std::fmt;

/// Credential value that never shows up in `Debug` output or logs
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value, for building the outbound auth header only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Static descriptor of one backend
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    entry: ProviderEntry,
    credential: Option<ApiKey>,
}

impl ProviderConfig {
    pub fn new(entry: ProviderEntry, credential: Option<ApiKey>) -> Self {
        Self { entry, credential }
    }

    pub fn name(&self) -> &str {
        self.entry.name()
    }

    pub fn kind(&self) -> ProviderKind {
        self.entry.kind()
    }

    pub fn credential(&self) -> Option<&ApiKey> {
        self.credential.as_ref()
    }

    pub fn credential_present(&self) -> bool {
        self.credential.is_some()
    }

    /// Credential present and not explicitly disabled
    pub fn enabled(&self) -> bool {
        self.credential_present() && !self.entry.disabled()
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.entry.requests_per_minute()
    }

    pub fn priority(&self) -> u32 {
        self.entry.priority()
    }

    pub fn logic_model(&self) -> &str {
        self.entry.logic_model()
    }

    pub fn content_model(&self) -> &str {
        self.entry.content_model()
    }

    /// Model id to use for a task category
    pub fn model_for(&self, category: TaskCategory) -> &str {
        match category {
            TaskCategory::Logic => self.logic_model(),
            TaskCategory::Content => self.content_model(),
        }
    }

    /// Full configuration entry (base URL, timeouts, adapter switches)
    pub fn entry(&self) -> &ProviderEntry {
        &self.entry
    }
}

/// Declared providers, in declaration order
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderConfig>,
}

impl ProviderRegistry {
    /// Build the registry, reading each `api_key_env` from the process environment
    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with_env(config, |var| std::env::var(var).ok())
    }

    /// Build the registry with an injected environment lookup
    ///
    /// Empty or whitespace-only values count as absent.
    pub fn from_config_with_env<F>(config: &Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let providers: Vec<ProviderConfig> = config
            .providers
            .iter()
            .map(|entry| {
                let credential = lookup(entry.api_key_env())
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(ApiKey::new);

                if credential.is_none() {
                    tracing::info!(
                        provider = %entry.name(),
                        env_var = %entry.api_key_env(),
                        "Credential not set; provider disabled"
                    );
                }

                ProviderConfig::new(entry.clone(), credential)
            })
            .collect();

        let registry = Self { providers };
        tracing::info!(
            declared = registry.providers.len(),
            enabled = registry.list_enabled().len(),
            "Provider registry initialized"
        );
        registry
    }

    /// Enabled providers in declaration order
    ///
    /// An empty result is valid here; the router turns it into
    /// `NoProvidersConfigured` at call time.
    pub fn list_enabled(&self) -> Vec<ProviderConfig> {
        self.providers
            .iter()
            .filter(|p| p.enabled())
            .cloned()
            .collect()
    }

    /// Every declared provider, enabled or not
    pub fn all(&self) -> &[ProviderConfig] {
        &self.providers
    }
}
