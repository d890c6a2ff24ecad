//! Anthropic Messages API adapter
//!
//! System text goes to the top-level `system` field. `max_tokens` is mandatory
//! on this API, so the provider's `default_max_tokens` fills in when the
//! request has none. There is no JSON-mode switch; the hint is dropped.

use super::{Adapter, send_json};
use crate::error::ProviderError;
use crate::generation::{GenerationRequest, GenerationResponse, Role};
use crate::registry::ApiKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Value sent in the `anthropic-version` header
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter {
    provider: String,
    base_url: String,
    api_key: ApiKey,
    default_max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicAdapter {
    pub fn new(
        provider: &str,
        base_url: &str,
        api_key: ApiKey,
        default_max_tokens: u32,
        client: reqwest::Client,
    ) -> Self {
        Self {
            provider: provider.to_string(),
            base_url: base_url.to_string(),
            api_key,
            default_max_tokens,
            client,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl Usage {
    /// Input plus output, clamped at `u32::MAX`
    fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

fn build_body<'a>(
    model: &'a str,
    request: &'a GenerationRequest,
    default_max_tokens: u32,
) -> MessagesBody<'a> {
    let messages = request
        .conversation()
        .map(|m| WireMessage {
            role: match m.role {
                Role::Assistant => "assistant",
                Role::User | Role::System => "user",
            },
            content: &m.content,
        })
        .collect();

    MessagesBody {
        model,
        max_tokens: request.max_tokens.unwrap_or(default_max_tokens),
        messages,
        system: request.combined_system_text(),
        temperature: request.temperature,
    }
}

#[async_trait]
impl Adapter for AnthropicAdapter {
    async fn call(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = build_body(model, request, self.default_max_tokens);

        let reply: MessagesReply = send_json(
            &self.provider,
            self.client
                .post(&url)
                .header("x-api-key", self.api_key.expose())
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body),
        )
        .await?;

        let text = reply
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<String>();

        Ok(GenerationResponse {
            text,
            provider_name: self.provider.clone(),
            model_used: model.to_string(),
            tokens_used: reply.usage.as_ref().map(Usage::total),
        })
    }
}
