//! Google Gemini adapter (`generateContent`, API-key auth)
//!
//! - `assistant` turns are sent with role `model`
//! - system text (instruction + system-role messages) goes to `systemInstruction`
//! - JSON hint maps to `generationConfig.responseMimeType`

use super::{Adapter, send_json};
use crate::error::ProviderError;
use crate::generation::{GenerationRequest, GenerationResponse, ResponseFormat, Role};
use crate::registry::ApiKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub struct GeminiAdapter {
    provider: String,
    base_url: String,
    api_key: ApiKey,
    client: reqwest::Client,
}

impl GeminiAdapter {
    pub fn new(provider: &str, base_url: &str, api_key: ApiKey, client: reqwest::Client) -> Self {
        Self {
            provider: provider.to_string(),
            base_url: base_url.to_string(),
            api_key,
            client,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: [OwnedTextPart; 1],
}

#[derive(Debug, Serialize)]
struct OwnedTextPart {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: Option<u32>,
}

fn build_body(request: &GenerationRequest) -> GenerateContentBody<'_> {
    let contents = request
        .conversation()
        .map(|m| Content {
            role: match m.role {
                Role::Assistant => "model",
                Role::User | Role::System => "user",
            },
            parts: [TextPart { text: &m.content }],
        })
        .collect();

    let system_instruction = request.combined_system_text().map(|text| SystemInstruction {
        parts: [OwnedTextPart { text }],
    });

    let config = GenerationConfig {
        temperature: request.temperature,
        max_output_tokens: request.max_tokens,
        response_mime_type: (request.response_format == ResponseFormat::Json)
            .then_some("application/json"),
    };
    let generation_config = (config.temperature.is_some()
        || config.max_output_tokens.is_some()
        || config.response_mime_type.is_some())
    .then_some(config);

    GenerateContentBody {
        contents,
        system_instruction,
        generation_config,
    }
}

#[async_trait]
impl Adapter for GeminiAdapter {
    async fn call(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = build_body(request);

        let reply: GenerateContentReply = send_json(
            &self.provider,
            self.client
                .post(&url)
                .header("x-goog-api-key", self.api_key.expose())
                .json(&body),
        )
        .await?;

        // A blocked or empty candidate list is an empty completion, not an error
        let text = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(GenerationResponse {
            text,
            provider_name: self.provider.clone(),
            model_used: model.to_string(),
            tokens_used: reply.usage_metadata.and_then(|u| u.total_token_count),
        })
    }
}
