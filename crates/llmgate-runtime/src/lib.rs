//! OS-facing adapters for llmgate.
//!
//! - [`system`]: GPU detection implementing `HardwareProbe`
//! - [`process`]: engine process spawning, log capture and shutdown
//! - [`engine`]: the GPU and CPU `InferenceEngine` adapters and the launcher
#![deny(unsafe_code)]

pub mod engine;
mod health;
pub mod process;
pub mod system;

pub use engine::{CpuEngine, GpuEngine, ProcessEngineLauncher};
pub use health::{check_http_health, wait_for_http_health};
pub use system::DefaultHardwareProbe;
