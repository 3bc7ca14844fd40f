//! Gateway configuration from flags and environment variables.
//!
//! Every option is a long flag backed by an environment variable, so the
//! container deployment configures the gateway through env alone.

use std::path::PathBuf;

use clap::Parser;
use llmgate_core::paths::DEFAULT_MODELS_DIR;
use llmgate_core::settings::{
    DEFAULT_CPU_CONTEXT_SIZE, DEFAULT_ENGINE_PORT, DEFAULT_ENGINE_STARTUP_TIMEOUT_SECS,
    DEFAULT_GPU_MAX_MODEL_LEN, DEFAULT_GPU_MEMORY_UTILIZATION, DEFAULT_MODEL, DEFAULT_PORT,
    DEFAULT_QUANTIZATION,
};
use llmgate_core::{
    CpuEngineSettings, DevicePreference, EngineProcessSettings, GatewaySettings,
    GpuEngineSettings, parse_quantization,
};

/// OpenAI-compatible local inference gateway.
#[derive(Debug, Parser)]
#[command(name = "llmgate")]
#[command(about = "Serve a local LLM behind an OpenAI-compatible chat completion API")]
#[command(version)]
pub struct GatewayArgs {
    /// Model identifier, relative to the models directory
    #[arg(long = "model", env = "MODEL_NAME", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Model identifier to load instead when running on CPU (e.g. a GGUF file)
    #[arg(long = "cpu-model", env = "CPU_MODEL_NAME")]
    pub cpu_model: Option<String>,

    /// Directory the models volume is mounted at
    #[arg(long = "models-dir", env = "MODELS_DIR", default_value = DEFAULT_MODELS_DIR)]
    pub models_dir: PathBuf,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Requested device: cuda (alias gpu) or cpu
    #[arg(long, env = "DEVICE", default_value = "cuda")]
    pub device: DevicePreference,

    /// Fraction of GPU memory the GPU engine may claim
    #[arg(
        long = "gpu-memory-utilization",
        env = "GPU_MEMORY_UTILIZATION",
        default_value_t = DEFAULT_GPU_MEMORY_UTILIZATION
    )]
    pub gpu_memory_utilization: f32,

    /// Quantization scheme for the GPU engine ("none" disables)
    #[arg(long, env = "QUANTIZATION", default_value = DEFAULT_QUANTIZATION)]
    pub quantization: String,

    #[arg(long = "tensor-parallel-size", env = "TENSOR_PARALLEL_SIZE", default_value_t = 1)]
    pub tensor_parallel_size: u32,

    /// GPU context window in tokens
    #[arg(
        long = "gpu-max-model-len",
        env = "GPU_MAX_MODEL_LEN",
        default_value_t = DEFAULT_GPU_MAX_MODEL_LEN
    )]
    pub gpu_max_model_len: u32,

    /// CPU context window in tokens
    #[arg(
        long = "cpu-context-size",
        env = "CPU_CONTEXT_SIZE",
        default_value_t = DEFAULT_CPU_CONTEXT_SIZE
    )]
    pub cpu_context_size: u32,

    /// CPU generation threads (engine default when unset)
    #[arg(long = "cpu-threads", env = "CPU_THREADS")]
    pub cpu_threads: Option<u32>,

    #[arg(long = "vllm-bin", env = "VLLM_BIN", default_value = "vllm")]
    pub vllm_bin: PathBuf,

    #[arg(long = "llama-server-bin", env = "LLAMA_SERVER_BIN", default_value = "llama-server")]
    pub llama_server_bin: PathBuf,

    /// Loopback port for the spawned engine
    #[arg(long = "engine-port", env = "ENGINE_PORT", default_value_t = DEFAULT_ENGINE_PORT)]
    pub engine_port: u16,

    /// Attach to an already running engine instead of spawning one
    #[arg(long = "engine-url", env = "ENGINE_URL")]
    pub engine_url: Option<String>,

    /// Seconds to wait for the engine to report healthy
    #[arg(
        long = "engine-startup-timeout",
        env = "ENGINE_STARTUP_TIMEOUT_SECS",
        default_value_t = DEFAULT_ENGINE_STARTUP_TIMEOUT_SECS
    )]
    pub engine_startup_timeout_secs: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl GatewayArgs {
    /// Convert parsed arguments into gateway settings. Values are not validated here.
    pub fn into_settings(self) -> GatewaySettings {
        GatewaySettings {
            model: self.model.trim().to_string(),
            cpu_model: self.cpu_model.map(|m| m.trim().to_string()),
            models_dir: self.models_dir,
            host: self.host,
            port: self.port,
            device: self.device,
            gpu: GpuEngineSettings {
                binary: self.vllm_bin,
                memory_utilization: self.gpu_memory_utilization,
                quantization: parse_quantization(&self.quantization),
                tensor_parallel_size: self.tensor_parallel_size,
                max_model_len: self.gpu_max_model_len,
            },
            cpu: CpuEngineSettings {
                binary: self.llama_server_bin,
                context_size: self.cpu_context_size,
                threads: self.cpu_threads,
            },
            engine: EngineProcessSettings {
                port: self.engine_port,
                attach_url: self.engine_url.filter(|url| !url.trim().is_empty()),
                startup_timeout_secs: self.engine_startup_timeout_secs,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_parser_builds() {
        GatewayArgs::command().debug_assert();
    }

    #[test]
    fn test_flags_map_to_settings() {
        let args = GatewayArgs::parse_from([
            "llmgate",
            "--model",
            "org/model-awq",
            "--cpu-model",
            "model.Q4_K_M.gguf",
            "--models-dir",
            "/data/models",
            "--port",
            "9000",
            "--device",
            "CPU",
            "--quantization",
            "none",
            "--cpu-threads",
            "8",
            "--engine-url",
            "http://127.0.0.1:7000",
        ]);
        let settings = args.into_settings();

        assert_eq!(settings.model, "org/model-awq");
        assert_eq!(settings.cpu_model.as_deref(), Some("model.Q4_K_M.gguf"));
        assert_eq!(settings.models_dir, PathBuf::from("/data/models"));
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.device, DevicePreference::Cpu);
        assert_eq!(settings.gpu.quantization, None);
        assert_eq!(settings.cpu.threads, Some(8));
        assert_eq!(
            settings.engine.attach_url.as_deref(),
            Some("http://127.0.0.1:7000")
        );
    }

    #[test]
    fn test_invalid_device_rejected() {
        let result = GatewayArgs::try_parse_from(["llmgate", "--device", "tpu"]);
        assert!(result.is_err());
    }
}
