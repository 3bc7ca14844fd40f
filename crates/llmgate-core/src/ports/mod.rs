//! Port definitions implemented by adapters.
//!
//! Core owns the traits; `llmgate-runtime` owns the implementations that
//! probe hardware, spawn engines and talk HTTP to them.

mod engine;
mod hardware;

pub use engine::{EngineError, EngineLauncher, InferenceEngine};
pub use hardware::HardwareProbe;
