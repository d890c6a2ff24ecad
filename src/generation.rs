//! Provider-agnostic generation request and response types
//!
//! These are the only shapes callers see. Adapters translate them to and
//! from each backend's wire format.

use serde::{Deserialize, Serialize};

/// Conversational role of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Task class, selects which of a provider's two models is used
///
/// Required on every request; there is no default model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    /// Short, deterministic tasks (classification, extraction, scoring)
    Logic,
    /// Longer free-form generation
    Content,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logic => "logic",
            Self::Content => "content",
        }
    }
}

/// Output format hint
///
/// `Json` is advisory: adapters whose backend has no structured-output switch
/// drop it silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// Uniform generation request
///
/// `messages` order is conversational order and is preserved by every adapter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationRequest {
    pub messages: Vec<Message>,
    pub category: TaskCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl GenerationRequest {
    /// Create a request with defaults for every optional parameter
    pub fn new(messages: Vec<Message>, category: TaskCategory) -> Self {
        Self {
            messages,
            category,
            system_instruction: None,
            temperature: None,
            max_tokens: None,
            response_format: ResponseFormat::Text,
        }
    }

    /// Single user turn
    pub fn from_prompt(prompt: impl Into<String>, category: TaskCategory) -> Self {
        Self::new(vec![Message::user(prompt)], category)
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    /// Check invariants that must hold before any provider is contacted
    pub fn validate(&self) -> Result<(), String> {
        if self.messages.is_empty() {
            return Err("messages must contain at least one entry".to_string());
        }
        if self.conversation().next().is_none() {
            return Err("messages must contain at least one user or assistant turn".to_string());
        }
        if let Some(t) = self.temperature {
            if !t.is_finite() || t < 0.0 {
                return Err(format!(
                    "temperature must be a finite, non-negative number, got {}",
                    t
                ));
            }
        }
        if self.max_tokens == Some(0) {
            return Err("max_tokens must be greater than 0".to_string());
        }
        Ok(())
    }

    /// System content from both `system_instruction` and `system`-role messages
    ///
    /// Used by backends that take system text as a separate field. Returns
    /// `None` when there is no system content at all.
    pub fn combined_system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .system_instruction
            .iter()
            .map(String::as_str)
            .chain(
                self.messages
                    .iter()
                    .filter(|m| m.role == Role::System)
                    .map(|m| m.content.as_str()),
            )
            .filter(|s| !s.trim().is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// Non-system messages, in order
    pub fn conversation(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }
}

/// Uniform generation response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerationResponse {
    /// Generated text; empty when the backend returned an empty completion
    pub text: String,
    /// Which provider served the request
    pub provider_name: String,
    /// Which model served the request
    pub model_used: String,
    /// Total tokens, when the backend reports usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}
