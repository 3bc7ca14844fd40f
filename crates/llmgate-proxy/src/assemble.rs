//! Response assembly: one `GenerationResult` becomes one OpenAI chat response.

use chrono::Utc;
use llmgate_core::GenerationResult;
use uuid::Uuid;

use crate::models::{AssistantMessage, ChatChoice, ChatCompletionResponse, Usage};

/// Build the chat completion envelope for a finished generation.
///
/// Exactly one choice is produced. `total_tokens` is always the sum of the
/// two reported counts.
pub fn assemble_response(model: &str, result: GenerationResult) -> ChatCompletionResponse {
    let usage = Usage {
        prompt_tokens: result.prompt_tokens,
        completion_tokens: result.completion_tokens,
        total_tokens: result.total_tokens(),
    };

    ChatCompletionResponse {
        id: format!("chatcmpl-{}", Uuid::new_v4().simple()),
        object: "chat.completion".to_string(),
        created: Utc::now().timestamp(),
        model: model.to_string(),
        choices: vec![ChatChoice {
            index: 0,
            message: AssistantMessage {
                role: "assistant".to_string(),
                content: result.text,
            },
            finish_reason: result.finish_reason,
        }],
        usage,
    }
}
