//! Sampling parameters and generation results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default completion budget when a request omits `max_tokens`.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Default sampling temperature when a request omits `temperature`.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Per-request sampling parameters handed to an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Stop sequences. Empty means none.
    pub stop: Vec<String>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            stop: Vec::new(),
        }
    }
}

/// Why generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReason {
    Stop,
    Length,
    Error,
}

impl FinishReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::Error => "error",
        }
    }

    /// Normalize an engine-reported finish reason.
    ///
    /// An absent signal means the engine stopped on its own.
    pub fn from_engine(reason: Option<&str>) -> Self {
        match reason {
            None | Some("stop" | "eos" | "stop_sequence") => Self::Stop,
            Some("length" | "max_tokens") => Self::Length,
            Some(_) => Self::Error,
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a single engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub text: String,
    pub finish_reason: FinishReason,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl GenerationResult {
    pub const fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// Truncate `text` at the earliest occurrence of any stop sequence.
///
/// The stop sequence itself is removed. Empty stop strings are ignored.
/// Returns `true` if the text was truncated.
pub fn apply_stop_sequences(text: &mut String, stop: &[String]) -> bool {
    let cut = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min();

    match cut {
        Some(index) => {
            text.truncate(index);
            true
        }
        None => false,
    }
}
