//! OpenAI API data models for request/response handling.
//!
//! Domain types live in `llmgate-core`; this module handles the wire layer
//! mapping and request validation.

use llmgate_core::domain::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use llmgate_core::{ChatMessage, FinishReason, Role, SamplingParams};
use serde::{Deserialize, Serialize};

// =============================================================================
// Chat Completion Request
// =============================================================================

/// A chat message as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// `system`, `user`, `assistant`, or any other role name.
    pub role: String,
    pub content: String,
}

impl From<&WireMessage> for ChatMessage {
    fn from(message: &WireMessage) -> Self {
        Self::new(Role::parse(&message.role), message.content.clone())
    }
}

/// `stop` may be sent as a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StopSequences {
    Single(String),
    Multiple(Vec<String>),
}

impl StopSequences {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(s) => vec![s],
            Self::Multiple(v) => v,
        }
    }
}

/// Request to `/v1/chat/completions`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model name, echoed back in the response.
    #[serde(default)]
    pub model: String,
    /// Conversation in order. Must be non-empty.
    pub messages: Vec<WireMessage>,
    /// Maximum tokens to generate (default 2048).
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Sampling temperature (default 0.2).
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub stop: Option<StopSequences>,
    /// Streaming is not supported; `true` is rejected.
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Check semantic constraints the JSON schema cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.messages.is_empty() {
            return Err("messages must contain at least one message".to_string());
        }
        if self.max_tokens == Some(0) {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if let Some(t) = self.temperature
            && (!t.is_finite() || t < 0.0)
        {
            return Err(format!("temperature must be a finite number >= 0, got {t}"));
        }
        if self.stream {
            return Err("streaming responses are not supported".to_string());
        }
        Ok(())
    }

    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(ChatMessage::from).collect()
    }

    /// Sampling parameters with defaults applied. Empty stop strings are dropped.
    pub fn sampling_params(&self) -> SamplingParams {
        let stop = self
            .stop
            .clone()
            .map(StopSequences::into_vec)
            .unwrap_or_default()
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();

        SamplingParams {
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            stop,
        }
    }
}

// =============================================================================
// Chat Completion Response
// =============================================================================

/// Response from `/v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    /// Unix seconds.
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Always `assistant`.
    pub role: String,
    pub content: String,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// =============================================================================
// Models & Errors
// =============================================================================

/// Response from `/v1/models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub object: String,
    pub owned_by: String,
}

impl ModelsResponse {
    /// List containing only the served model.
    pub fn single(model_id: &str) -> Self {
        Self {
            object: "list".to_string(),
            data: vec![ModelEntry {
                id: model_id.to_string(),
                object: "model".to_string(),
                owned_by: "llmgate".to_string(),
            }],
        }
    }
}

/// JSON error body returned on every failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
