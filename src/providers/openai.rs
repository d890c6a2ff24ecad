//! OpenAI-compatible chat completions adapter
//!
//! Serves OpenAI, Groq, Mistral, DeepSeek and OpenRouter: same body, bearer
//! auth, different base URL.

use super::{Adapter, send_json};
use crate::error::ProviderError;
use crate::generation::{GenerationRequest, GenerationResponse, ResponseFormat, Role};
use crate::registry::ApiKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub struct OpenAiCompatibleAdapter {
    provider: String,
    base_url: String,
    api_key: ApiKey,
    supports_json_output: bool,
    merge_system_into_user: bool,
    client: reqwest::Client,
}

impl OpenAiCompatibleAdapter {
    pub fn new(
        provider: &str,
        base_url: &str,
        api_key: ApiKey,
        supports_json_output: bool,
        merge_system_into_user: bool,
        client: reqwest::Client,
    ) -> Self {
        Self {
            provider: provider.to_string(),
            base_url: base_url.to_string(),
            api_key,
            supports_json_output,
            merge_system_into_user,
            client,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: Cow<'a, str>,
}

#[derive(Debug, Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionReply {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: Option<u32>,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

/// Messages with system text kept as `system` turns
fn messages_with_system_role(request: &GenerationRequest) -> Vec<WireMessage<'_>> {
    let instruction = request.system_instruction.as_deref().map(|text| WireMessage {
        role: "system",
        content: Cow::Borrowed(text),
    });

    instruction
        .into_iter()
        .chain(request.messages.iter().map(|m| WireMessage {
            role: role_name(m.role),
            content: Cow::Borrowed(m.content.as_str()),
        }))
        .collect()
}

/// Messages with all system text folded into the first user turn
///
/// If the conversation has no user turn, the system text becomes one.
fn messages_with_system_merged(request: &GenerationRequest) -> Vec<WireMessage<'_>> {
    let mut system = request.combined_system_text();
    let mut messages: Vec<WireMessage<'_>> = Vec::with_capacity(request.messages.len());

    for m in request.conversation() {
        if m.role == Role::User {
            if let Some(prefix) = system.take() {
                messages.push(WireMessage {
                    role: "user",
                    content: Cow::Owned(format!("{}\n\n{}", prefix, m.content)),
                });
                continue;
            }
        }
        messages.push(WireMessage {
            role: role_name(m.role),
            content: Cow::Borrowed(m.content.as_str()),
        });
    }

    if let Some(text) = system {
        messages.insert(
            0,
            WireMessage {
                role: "user",
                content: Cow::Owned(text),
            },
        );
    }

    messages
}

fn build_body<'a>(
    model: &'a str,
    request: &'a GenerationRequest,
    supports_json_output: bool,
    merge_system_into_user: bool,
) -> ChatCompletionBody<'a> {
    let messages = if merge_system_into_user {
        messages_with_system_merged(request)
    } else {
        messages_with_system_role(request)
    };

    let response_format = (supports_json_output
        && request.response_format == ResponseFormat::Json)
        .then_some(WireResponseFormat {
            kind: "json_object",
        });

    ChatCompletionBody {
        model,
        messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        response_format,
    }
}

#[async_trait]
impl Adapter for OpenAiCompatibleAdapter {
    async fn call(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = build_body(
            model,
            request,
            self.supports_json_output,
            self.merge_system_into_user,
        );

        let reply: ChatCompletionReply = send_json(
            &self.provider,
            self.client
                .post(&url)
                .bearer_auth(self.api_key.expose())
                .json(&body),
        )
        .await?;

        let text = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(GenerationResponse {
            text,
            provider_name: self.provider.clone(),
            model_used: model.to_string(),
            tokens_used: reply.usage.and_then(|u| u.total_tokens),
        })
    }
}
