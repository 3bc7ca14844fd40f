//! Inference engine ports.
//!
//! `InferenceEngine` is the capability contract shared by the GPU and CPU
//! backends. `EngineLauncher` brings one of them up at startup. The gateway
//! depends only on these traits, so either backend can be swapped in
//! without touching the HTTP layer.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{BackendSelection, Device, GenerationResult, SamplingParams};
use crate::settings::GatewaySettings;

/// Errors raised by an engine invocation or launch.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached or the transport failed.
    #[error("Engine request failed: {0}")]
    Request(String),

    /// The engine answered with a non-success status.
    #[error("Engine returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The engine refused the request for resource reasons (context, memory).
    #[error("Engine resource limit exceeded: {0}")]
    ResourceExhausted(String),

    /// The engine answered with something we could not interpret.
    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),

    /// The generation was cancelled before it completed.
    #[error("Generation was cancelled")]
    Cancelled,

    /// The engine could not be started.
    #[error("Failed to launch engine: {0}")]
    Launch(String),
}

impl EngineError {
    /// Classify an upstream error body, promoting context overflows.
    pub fn from_upstream(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("context length")
            || lower.contains("context size")
            || lower.contains("out of memory")
        {
            Self::ResourceExhausted(message)
        } else {
            Self::Upstream { status, message }
        }
    }
}

/// An inference backend that turns a prompt into generated text.
#[async_trait]
pub trait InferenceEngine: Send + Sync + fmt::Debug {
    /// Device this engine runs on.
    fn device(&self) -> Device;

    /// Run one generation to completion.
    ///
    /// Token counts the engine fails to report are returned as 0.
    async fn invoke(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<GenerationResult, EngineError>;

    /// Release the engine (stop any owned process). Idempotent.
    async fn shutdown(&self) {}
}

/// Brings up the engine for a backend selection.
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn launch(
        &self,
        selection: &BackendSelection,
        settings: &GatewaySettings,
    ) -> Result<Arc<dyn InferenceEngine>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FinishReason;

    #[derive(Debug)]
    struct EchoEngine;

    #[async_trait]
    impl InferenceEngine for EchoEngine {
        fn device(&self) -> Device {
            Device::Cpu
        }

        async fn invoke(
            &self,
            prompt: &str,
            _params: &SamplingParams,
        ) -> Result<GenerationResult, EngineError> {
            Ok(GenerationResult {
                text: prompt.to_uppercase(),
                finish_reason: FinishReason::Stop,
                prompt_tokens: 1,
                completion_tokens: 1,
            })
        }
    }

    #[tokio::test]
    async fn test_engine_behind_trait_object() {
        let engine: Arc<dyn InferenceEngine> = Arc::new(EchoEngine);
        let result = engine
            .invoke("hi", &SamplingParams::default())
            .await
            .unwrap();
        assert_eq!(result.text, "HI");
        engine.shutdown().await;
    }

    #[test]
    fn test_upstream_context_overflow_is_resource_error() {
        let err = EngineError::from_upstream(
            400,
            "This model's maximum context length is 8192 tokens",
        );
        assert!(matches!(err, EngineError::ResourceExhausted(_)));

        let err = EngineError::from_upstream(503, "busy");
        assert!(matches!(err, EngineError::Upstream { status: 503, .. }));
    }
}
