//! Type-safe provider name wrapper
//!
//! Used in exclusion sets so a single `generate` call never retries a
//! provider it has already attempted.

use crate::registry::ProviderConfig;
use std::collections::HashSet;

/// Provider name, distinct from arbitrary strings
///
/// - `From<&ProviderConfig>`: always a declared provider
/// - `From<&str>` / `From<String>`: unchecked, intended for tests
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct ProviderName(String);

impl From<&ProviderConfig> for ProviderName {
    fn from(provider: &ProviderConfig) -> Self {
        Self(provider.name().to_string())
    }
}

impl From<String> for ProviderName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for ProviderName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Providers already attempted during the current call
pub type ExclusionSet = HashSet<ProviderName>;
