//! `InferenceEngine` adapters.
//!
//! Both engines run as local HTTP servers. The adapters translate a
//! prompt plus sampling parameters into the engine's native completion
//! request and normalize the answer into a `GenerationResult`.

mod cpu;
mod gpu;
mod launcher;

pub use cpu::CpuEngine;
pub use gpu::GpuEngine;
pub use launcher::ProcessEngineLauncher;

/// Extract a human-readable message from an engine error response.
///
/// Understands OpenAI-style `{"error": {"message": ..}}`, llama.cpp's
/// `{"error": {..}}` and FastAPI-style `{"detail": ..}` bodies; anything
/// else is returned as raw text.
pub(crate) async fn read_error_body(response: reqwest::Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    error_message(&text).unwrap_or_else(|| {
        if text.trim().is_empty() {
            status.to_string()
        } else {
            text
        }
    })
}

fn error_message(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let candidate = value
        .pointer("/error/message")
        .or_else(|| value.get("error"))
        .or_else(|| value.get("detail"))
        .or_else(|| value.get("message"))?;

    match candidate {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
