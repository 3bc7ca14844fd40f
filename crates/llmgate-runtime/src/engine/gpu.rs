//! GPU engine adapter backed by a vLLM OpenAI-compatible server.
//!
//! vLLM batches concurrent requests internally, so calls are forwarded
//! without gateway-side serialization. Generation goes through the
//! `/v1/completions` endpoint with the translated prompt so both backends
//! see identical input.

use async_trait::async_trait;
use llmgate_core::{
    Device, EngineError, FinishReason, GenerationResult, InferenceEngine, SamplingParams,
    apply_stop_sequences,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::read_error_body;
use crate::process::ManagedProcess;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

/// GPU backend.
#[derive(Debug)]
pub struct GpuEngine {
    client: Client,
    base_url: String,
    served_model: String,
    process: Option<ManagedProcess>,
}

impl GpuEngine {
    /// Connect to a vLLM server at `base_url` serving `served_model`.
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        served_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            served_model: served_model.into(),
            process: None,
        }
    }

    /// Take ownership of the engine process so shutdown stops it.
    #[must_use]
    pub fn with_process(mut self, process: ManagedProcess) -> Self {
        self.process = Some(process);
        self
    }
}

#[async_trait]
impl InferenceEngine for GpuEngine {
    fn device(&self) -> Device {
        Device::Gpu
    }

    async fn invoke(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<GenerationResult, EngineError> {
        let url = format!("{}/v1/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.served_model,
            prompt,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stop: (!params.stop.is_empty()).then_some(params.stop.as_slice()),
            stream: false,
        };
        debug!(url = %url, max_tokens = params.max_tokens, "Invoking GPU engine");

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

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| EngineError::InvalidResponse(e.to_string()))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::InvalidResponse("response contained no choices".into()))?;
        let usage = body.usage.unwrap_or_default();

        let mut text = choice.text;
        // vLLM already honours `stop`; this keeps output identical to the CPU path
        let cut = apply_stop_sequences(&mut text, &params.stop);
        let finish_reason = if cut {
            FinishReason::Stop
        } else {
            FinishReason::from_engine(choice.finish_reason.as_deref())
        };

        Ok(GenerationResult {
            text,
            finish_reason,
            prompt_tokens: usage.prompt_tokens.unwrap_or(0),
            completion_tokens: usage.completion_tokens.unwrap_or(0),
        })
    }

    async fn shutdown(&self) {
        if let Some(process) = &self.process {
            process.shutdown().await;
        }
    }
}
