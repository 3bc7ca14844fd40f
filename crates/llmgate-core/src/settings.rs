//! Gateway settings.
//!
//! Settings are read once at startup (see `llmgate-cli`) and are immutable
//! for the process lifetime. Changing backend or model means a restart.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{Device, DevicePreference};
use crate::paths::DEFAULT_MODELS_DIR;

/// Default model served when `MODEL_NAME` is unset.
pub const DEFAULT_MODEL: &str = "TheBloke/Mistral-7B-Instruct-v0.2-AWQ";

/// Default gateway listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default loopback port for a spawned engine.
pub const DEFAULT_ENGINE_PORT: u16 = 8001;

/// Default GPU memory fraction handed to the GPU engine.
pub const DEFAULT_GPU_MEMORY_UTILIZATION: f32 = 0.9;

/// Default quantization scheme for the GPU engine.
pub const DEFAULT_QUANTIZATION: &str = "awq";

/// Default GPU context window in tokens.
pub const DEFAULT_GPU_MAX_MODEL_LEN: u32 = 8192;

/// Default CPU context window in tokens.
pub const DEFAULT_CPU_CONTEXT_SIZE: u32 = 4096;

/// Default time allowed for an engine to report healthy.
pub const DEFAULT_ENGINE_STARTUP_TIMEOUT_SECS: u64 = 600;

/// GPU (tensor-parallel) engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuEngineSettings {
    /// Executable used to start the engine.
    pub binary: PathBuf,
    /// Fraction of GPU memory the engine may claim, in (0, 1].
    pub memory_utilization: f32,
    /// Quantization scheme; `None` loads unquantized weights.
    pub quantization: Option<String>,
    pub tensor_parallel_size: u32,
    /// Context window fixed at process start.
    pub max_model_len: u32,
}

impl Default for GpuEngineSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("vllm"),
            memory_utilization: DEFAULT_GPU_MEMORY_UTILIZATION,
            quantization: Some(DEFAULT_QUANTIZATION.to_string()),
            tensor_parallel_size: 1,
            max_model_len: DEFAULT_GPU_MAX_MODEL_LEN,
        }
    }
}

/// CPU (quantized) engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuEngineSettings {
    pub binary: PathBuf,
    /// Context window fixed at process start.
    pub context_size: u32,
    /// Generation threads; `None` lets the engine decide.
    pub threads: Option<u32>,
}

impl Default for CpuEngineSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("llama-server"),
            context_size: DEFAULT_CPU_CONTEXT_SIZE,
            threads: None,
        }
    }
}

/// How the engine process is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineProcessSettings {
    /// Loopback port a spawned engine listens on.
    pub port: u16,
    /// Attach to an already running engine instead of spawning one.
    pub attach_url: Option<String>,
    pub startup_timeout_secs: u64,
}

impl Default for EngineProcessSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_ENGINE_PORT,
            attach_url: None,
            startup_timeout_secs: DEFAULT_ENGINE_STARTUP_TIMEOUT_SECS,
        }
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySettings {
    /// Model identifier, relative to `models_dir`.
    pub model: String,
    /// Identifier to load instead of `model` when running on CPU.
    pub cpu_model: Option<String>,
    pub models_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub device: DevicePreference,
    pub gpu: GpuEngineSettings,
    pub cpu: CpuEngineSettings,
    pub engine: EngineProcessSettings,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            cpu_model: None,
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            device: DevicePreference::default(),
            gpu: GpuEngineSettings::default(),
            cpu: CpuEngineSettings::default(),
            engine: EngineProcessSettings::default(),
        }
    }
}

impl GatewaySettings {
    /// Model identifier to load on `device`.
    pub fn model_for(&self, device: Device) -> &str {
        match (device, self.cpu_model.as_deref()) {
            (Device::Cpu, Some(cpu_model)) => cpu_model,
            _ => &self.model,
        }
    }

    /// Context window the engine on `device` is started with.
    pub const fn context_window(&self, device: Device) -> u32 {
        match device {
            Device::Gpu => self.gpu.max_model_len,
            Device::Cpu => self.cpu.context_size,
        }
    }
}

/// Normalize a quantization setting: empty or `none` disables it.
pub fn parse_quantization(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("Model identifier cannot be empty")]
    EmptyModel,

    #[error("GPU memory utilization must be in (0, 1], got {0}")]
    InvalidGpuMemoryUtilization(f32),

    #[error("Tensor parallel size must be at least 1")]
    InvalidTensorParallelSize,

    #[error("Context window must be between 256 and 1,048,576 tokens, got {0}")]
    InvalidContextWindow(u32),

    #[error("Engine port {0} is invalid: it must be non-zero and differ from the gateway port")]
    InvalidEnginePort(u16),

    #[error("Engine URL must start with http:// or https://, got '{0}'")]
    InvalidEngineUrl(String),

    #[error("Engine startup timeout must be at least 1 second")]
    InvalidStartupTimeout,
}

/// Validate settings values.
pub fn validate_settings(settings: &GatewaySettings) -> Result<(), SettingsError> {
    if settings.model.trim().is_empty()
        || settings
            .cpu_model
            .as_ref()
            .is_some_and(|m| m.trim().is_empty())
    {
        return Err(SettingsError::EmptyModel);
    }

    let fraction = settings.gpu.memory_utilization;
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(SettingsError::InvalidGpuMemoryUtilization(fraction));
    }

    if settings.gpu.tensor_parallel_size == 0 {
        return Err(SettingsError::InvalidTensorParallelSize);
    }

    for device in [Device::Gpu, Device::Cpu] {
        let ctx = settings.context_window(device);
        if !(256..=1_048_576).contains(&ctx) {
            return Err(SettingsError::InvalidContextWindow(ctx));
        }
    }

    match &settings.engine.attach_url {
        Some(url) => {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(SettingsError::InvalidEngineUrl(url.clone()));
            }
        }
        None => {
            let port = settings.engine.port;
            if port == 0 || port == settings.port {
                return Err(SettingsError::InvalidEnginePort(port));
            }
        }
    }

    if settings.engine.startup_timeout_secs == 0 {
        return Err(SettingsError::InvalidStartupTimeout);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = GatewaySettings::default();
        assert!(validate_settings(&settings).is_ok());
        assert_eq!(settings.gpu.max_model_len, 8192);
        assert_eq!(settings.cpu.context_size, 4096);
        assert_eq!(settings.gpu.quantization.as_deref(), Some("awq"));
    }

    #[test]
    fn test_gpu_memory_bounds() {
        for bad in [0.0, -0.5, 1.01, f32::NAN] {
            let mut settings = GatewaySettings::default();
            settings.gpu.memory_utilization = bad;
            assert!(matches!(
                validate_settings(&settings),
                Err(SettingsError::InvalidGpuMemoryUtilization(_))
            ));
        }
    }

    #[test]
    fn test_engine_port_must_differ() {
        let mut settings = GatewaySettings::default();
        settings.engine.port = settings.port;
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidEnginePort(settings.port))
        );
    }

    #[test]
    fn test_attach_url_skips_port_check() {
        let mut settings = GatewaySettings::default();
        settings.engine.port = settings.port;
        settings.engine.attach_url = Some("http://vllm:8000".to_string());
        assert!(validate_settings(&settings).is_ok());

        settings.engine.attach_url = Some("vllm:8000".to_string());
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_cpu_model_override() {
        let mut settings = GatewaySettings::default();
        assert_eq!(settings.model_for(Device::Cpu), DEFAULT_MODEL);
        settings.cpu_model = Some("mistral-7b.Q4_K_M.gguf".to_string());
        assert_eq!(settings.model_for(Device::Cpu), "mistral-7b.Q4_K_M.gguf");
        assert_eq!(settings.model_for(Device::Gpu), DEFAULT_MODEL);
    }

    #[test]
    fn test_context_window_per_device() {
        let mut settings = GatewaySettings::default();
        settings.cpu.context_size = 2048;
        assert_eq!(settings.context_window(Device::Gpu), 8192);
        assert_eq!(settings.context_window(Device::Cpu), 2048);

        settings.cpu.context_size = 16;
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidContextWindow(16))
        );
    }

    #[test]
    fn test_parse_quantization() {
        assert_eq!(parse_quantization("AWQ"), Some("awq".to_string()));
        assert_eq!(parse_quantization("none"), None);
        assert_eq!(parse_quantization(" "), None);
    }
}
