//! Domain types for the inference gateway.

mod backend;
mod chat;
mod generation;
mod hardware;
mod lifecycle;

pub use backend::{
    BackendSelection, Device, DevicePreference, DeviceResolution, ParseDeviceError,
    resolve_device,
};
pub use chat::{ChatMessage, Role};
pub use generation::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, FinishReason, GenerationResult, SamplingParams,
    apply_stop_sequences,
};
pub use hardware::GpuInfo;
pub use lifecycle::{GatewayPhase, Lifecycle, LifecycleError};
