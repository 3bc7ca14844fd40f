//! Core domain types and ports for the llmgate inference gateway.
//!
//! This crate is pure: it owns the chat and generation types, backend
//! selection policy, model artifact validation, prompt construction and the
//! startup lifecycle, plus the traits adapters implement. It performs no
//! HTTP and spawns no processes.

pub mod domain;
pub mod paths;
pub mod ports;
pub mod prompt;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    BackendSelection, ChatMessage, Device, DevicePreference, DeviceResolution, FinishReason,
    GatewayPhase, GenerationResult, GpuInfo, Lifecycle, LifecycleError, ParseDeviceError, Role,
    SamplingParams, apply_stop_sequences, resolve_device,
};
pub use paths::{ArtifactKind, LocateError, ModelLocator};
pub use ports::{EngineError, EngineLauncher, HardwareProbe, InferenceEngine};
pub use prompt::build_prompt;
pub use settings::{
    CpuEngineSettings, EngineProcessSettings, GatewaySettings, GpuEngineSettings, SettingsError,
    parse_quantization, validate_settings,
};
