//! Backend adapters
//!
//! Each adapter translates the uniform [`GenerationRequest`] into one
//! backend's wire format and maps the reply (or failure) back. The router only
//! ever sees [`GenerationResponse`] or a classified [`ProviderError`].

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiCompatibleAdapter;

use crate::config::ProviderKind;
use crate::error::{AppError, AppResult, ProviderError};
use crate::generation::{GenerationRequest, GenerationResponse};
use crate::registry::ProviderConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Translation layer between the uniform contract and one backend
///
/// Implementations must convert every well-formed backend error (429, 403,
/// 5xx, ...) into a [`ProviderError`] rather than panicking.
#[async_trait]
pub trait Adapter: Send + Sync {
    async fn call(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError>;
}

/// Build the adapter for one provider
///
/// Fails if the provider has no credential or its HTTP client cannot be built.
pub fn build_adapter(provider: &ProviderConfig) -> AppResult<Arc<dyn Adapter>> {
    let credential = provider.credential().cloned().ok_or_else(|| {
        AppError::Config(format!(
            "Provider '{}' has no credential; cannot build its adapter",
            provider.name()
        ))
    })?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(provider.entry().timeout_seconds()))
        .build()
        .map_err(|e| {
            AppError::Internal(format!(
                "Failed to create HTTP client for provider '{}': {}",
                provider.name(),
                e
            ))
        })?;

    let entry = provider.entry();
    let adapter: Arc<dyn Adapter> = match provider.kind() {
        ProviderKind::Gemini => Arc::new(GeminiAdapter::new(
            provider.name(),
            entry.base_url(),
            credential,
            client,
        )),
        ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(
            provider.name(),
            entry.base_url(),
            credential,
            entry.default_max_tokens(),
            client,
        )),
        kind @ (ProviderKind::OpenAi
        | ProviderKind::Groq
        | ProviderKind::Mistral
        | ProviderKind::DeepSeek
        | ProviderKind::OpenRouter) => Arc::new(OpenAiCompatibleAdapter::new(
            provider.name(),
            entry.base_url(),
            credential,
            kind.supports_json_output(),
            entry.merge_system_into_user(),
            client,
        )),
    };

    tracing::debug!(
        provider = %provider.name(),
        kind = %provider.kind().as_str(),
        base_url = %entry.base_url(),
        "Built provider adapter"
    );

    Ok(adapter)
}

/// Build adapters for every provider, keyed by provider name
pub fn build_adapters(providers: &[ProviderConfig]) -> AppResult<HashMap<String, Arc<dyn Adapter>>> {
    providers
        .iter()
        .map(|p| Ok((p.name().to_string(), build_adapter(p)?)))
        .collect()
}

/// Send a prepared request and decode a JSON success body
///
/// Non-2xx responses are read as text and classified; transport and decode
/// failures become `ProviderError::Transport`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, &e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(provider, status.as_u16(), &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, &e))
}
