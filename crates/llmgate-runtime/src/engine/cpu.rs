//! CPU engine adapter backed by llama.cpp's `llama-server`.
//!
//! A loaded llama.cpp model is not safe for concurrent generation, so every
//! invocation holds `generation` for its full duration. Concurrent callers
//! queue on the lock instead of loading extra model instances.

use async_trait::async_trait;
use llmgate_core::{
    Device, EngineError, FinishReason, GenerationResult, InferenceEngine, SamplingParams,
    apply_stop_sequences,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::read_error_body;
use crate::process::ManagedProcess;

/// Body of llama-server's native `POST /completion`.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    cache_prompt: bool,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    content: String,
    /// Prompt tokens evaluated.
    #[serde(default)]
    tokens_evaluated: Option<u32>,
    /// Tokens generated.
    #[serde(default)]
    tokens_predicted: Option<u32>,
    #[serde(default)]
    stopped_eos: bool,
    #[serde(default)]
    stopped_word: bool,
    #[serde(default)]
    stopped_limit: bool,
}

/// CPU backend.
#[derive(Debug)]
pub struct CpuEngine {
    client: Client,
    base_url: String,
    generation: Mutex<()>,
    process: Option<ManagedProcess>,
}

impl CpuEngine {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            generation: Mutex::new(()),
            process: None,
        }
    }

    /// Take ownership of the engine process so shutdown stops it.
    #[must_use]
    pub fn with_process(mut self, process: ManagedProcess) -> Self {
        self.process = Some(process);
        self
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<CompletionResponse, EngineError> {
        let url = format!("{}/completion", self.base_url);
        let request = CompletionRequest {
            prompt,
            n_predict: params.max_tokens,
            temperature: params.temperature,
            stop: (!params.stop.is_empty()).then_some(params.stop.as_slice()),
            cache_prompt: true,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = read_error_body(response).await;
            return Err(EngineError::from_upstream(status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| EngineError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl InferenceEngine for CpuEngine {
    fn device(&self) -> Device {
        Device::Cpu
    }

    async fn invoke(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<GenerationResult, EngineError> {
        let _guard = self.generation.lock().await;
        debug!(max_tokens = params.max_tokens, "Invoking CPU engine");

        let body = self.complete(prompt, params).await?;
        Ok(normalize(prompt, params, body))
    }

    async fn shutdown(&self) {
        if let Some(process) = &self.process {
            process.shutdown().await;
        }
    }
}

/// Turn a raw llama-server completion into a `GenerationResult`.
///
/// Strips an echoed prompt, applies stop sequences locally, and derives the
/// finish reason: `length` when the token budget was hit, otherwise `stop`.
fn normalize(prompt: &str, params: &SamplingParams, body: CompletionResponse) -> GenerationResult {
    let mut text = match body.content.strip_prefix(prompt) {
        Some(rest) => rest.trim().to_string(),
        None => body.content,
    };

    let completion_tokens = body.tokens_predicted.unwrap_or(0);
    let cut = apply_stop_sequences(&mut text, &params.stop);

    let stopped_naturally = cut || body.stopped_eos || body.stopped_word;
    let finish_reason = if body.stopped_limit
        || (!stopped_naturally && completion_tokens >= params.max_tokens)
    {
        FinishReason::Length
    } else {
        FinishReason::Stop
    };

    GenerationResult {
        text,
        finish_reason,
        prompt_tokens: body.tokens_evaluated.unwrap_or(0),
        completion_tokens,
    }
}
