//! Command builder and log streaming for engine processes.
//!
//! The GPU backend is a vLLM OpenAI-compatible server, the CPU backend a
//! llama.cpp `llama-server`. Both bind to loopback only; the gateway is
//! the public surface.

use std::path::PathBuf;
use std::process::Stdio;

use llmgate_core::{BackendSelection, Device, EngineError, GatewaySettings};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Fully resolved engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Short engine name used in logs.
    pub label: &'static str,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl EngineCommand {
    /// Build the invocation for the selected backend.
    pub fn for_selection(selection: &BackendSelection, settings: &GatewaySettings) -> Self {
        match selection.device {
            Device::Gpu => Self::vllm(selection, settings),
            Device::Cpu => Self::llama_server(selection, settings),
        }
    }

    fn vllm(selection: &BackendSelection, settings: &GatewaySettings) -> Self {
        let gpu = &settings.gpu;
        let mut args = vec![
            "serve".to_string(),
            selection.model_path.to_string_lossy().into_owned(),
            "--host".to_string(),
            "127.0.0.1".to_string(),
            "--port".to_string(),
            settings.engine.port.to_string(),
            "--tensor-parallel-size".to_string(),
            gpu.tensor_parallel_size.to_string(),
            "--gpu-memory-utilization".to_string(),
            gpu.memory_utilization.to_string(),
            "--max-model-len".to_string(),
            settings.context_window(Device::Gpu).to_string(),
            "--served-model-name".to_string(),
            selection.model_id.clone(),
        ];

        if let Some(quantization) = &gpu.quantization {
            args.push("--quantization".to_string());
            args.push(quantization.clone());
        }

        Self {
            label: "vllm",
            program: gpu.binary.clone(),
            args,
        }
    }

    fn llama_server(selection: &BackendSelection, settings: &GatewaySettings) -> Self {
        let cpu = &settings.cpu;
        let mut args = vec![
            "-m".to_string(),
            selection.model_path.to_string_lossy().into_owned(),
            "--host".to_string(),
            "127.0.0.1".to_string(),
            "--port".to_string(),
            settings.engine.port.to_string(),
            "-c".to_string(),
            settings.context_window(Device::Cpu).to_string(),
            // One slot: generations on the loaded model never overlap
            "--parallel".to_string(),
            "1".to_string(),
            // Keep the engine off the GPU even if it was built with CUDA
            "-ngl".to_string(),
            "0".to_string(),
        ];

        if let Some(threads) = cpu.threads {
            args.push("-t".to_string());
            args.push(threads.to_string());
        }

        Self {
            label: "llama-server",
            program: cpu.binary.clone(),
            args,
        }
    }

    /// Spawn the engine with piped output. The child dies with the gateway.
    pub fn spawn(&self) -> Result<Child, EngineError> {
        info!(
            engine = self.label,
            program = %self.program.display(),
            args = %self.args.join(" "),
            "Spawning engine"
        );

        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EngineError::Launch(format!(
                    "failed to spawn {} ({}): {e}",
                    self.label,
                    self.program.display()
                ))
            })
    }
}

/// Spawn background tasks forwarding stdout/stderr lines into tracing.
///
/// The tasks exit when the streams close.
pub fn spawn_log_readers(child: &mut Child, engine: &'static str) {
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(text)) = lines.next_line().await {
                debug!(engine, "stdout: {}", text);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(text)) = lines.next_line().await {
                debug!(engine, "stderr: {}", text);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(device: Device, path: &str) -> BackendSelection {
        BackendSelection {
            device,
            model_id: "org/model".to_string(),
            model_path: PathBuf::from(path),
            port: 8000,
        }
    }

    fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_vllm_command() {
        let settings = GatewaySettings::default();
        let cmd = EngineCommand::for_selection(
            &selection(Device::Gpu, "/models/org/model"),
            &settings,
        );

        assert_eq!(cmd.label, "vllm");
        assert_eq!(cmd.program, PathBuf::from("vllm"));
        assert_eq!(&cmd.args[..2], ["serve", "/models/org/model"]);
        assert_eq!(flag_value(&cmd.args, "--tensor-parallel-size"), Some("1"));
        assert_eq!(flag_value(&cmd.args, "--gpu-memory-utilization"), Some("0.9"));
        assert_eq!(flag_value(&cmd.args, "--quantization"), Some("awq"));
        assert_eq!(flag_value(&cmd.args, "--max-model-len"), Some("8192"));
        assert_eq!(flag_value(&cmd.args, "--port"), Some("8001"));
        assert_eq!(flag_value(&cmd.args, "--served-model-name"), Some("org/model"));
    }

    #[test]
    fn test_vllm_without_quantization() {
        let mut settings = GatewaySettings::default();
        settings.gpu.quantization = None;
        let cmd = EngineCommand::for_selection(&selection(Device::Gpu, "/m"), &settings);
        assert!(!cmd.args.iter().any(|a| a == "--quantization"));
    }

    #[test]
    fn test_llama_server_command() {
        let mut settings = GatewaySettings::default();
        settings.cpu.threads = Some(6);
        let cmd = EngineCommand::for_selection(
            &selection(Device::Cpu, "/models/model.gguf"),
            &settings,
        );

        assert_eq!(cmd.label, "llama-server");
        assert_eq!(flag_value(&cmd.args, "-m"), Some("/models/model.gguf"));
        assert_eq!(flag_value(&cmd.args, "-c"), Some("4096"));
        assert_eq!(flag_value(&cmd.args, "--parallel"), Some("1"));
        assert_eq!(flag_value(&cmd.args, "-t"), Some("6"));
        assert_eq!(flag_value(&cmd.args, "--host"), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_is_launch_error() {
        let mut settings = GatewaySettings::default();
        settings.cpu.binary = PathBuf::from("/nonexistent/llama-server");
        let cmd = EngineCommand::for_selection(&selection(Device::Cpu, "/m.gguf"), &settings);

        let err = cmd.spawn().unwrap_err();
        assert!(matches!(err, EngineError::Launch(_)));
    }
}
