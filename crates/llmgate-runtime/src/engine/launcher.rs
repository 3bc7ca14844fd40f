//! Engine launcher: spawn (or attach to) the engine for the selected backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use llmgate_core::{
    BackendSelection, Device, EngineError, EngineLauncher, GatewaySettings, InferenceEngine,
};
use reqwest::Client;
use tracing::{info, warn};

use super::{CpuEngine, GpuEngine};
use crate::health::wait_for_http_health;
use crate::process::{EngineCommand, ManagedProcess, is_port_available, spawn_log_readers};

/// Launches engines as child processes, or attaches to a running one when
/// `settings.engine.attach_url` is set.
#[derive(Debug, Clone)]
pub struct ProcessEngineLauncher {
    client: Client,
}

impl ProcessEngineLauncher {
    pub fn new() -> Result<Self, EngineError> {
        let client = Client::builder()
            .build()
            .map_err(|e| EngineError::Launch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Use a caller-provided HTTP client.
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build_engine(
        &self,
        selection: &BackendSelection,
        base_url: String,
        process: Option<ManagedProcess>,
    ) -> Arc<dyn InferenceEngine> {
        match selection.device {
            Device::Gpu => {
                let engine = GpuEngine::new(self.client.clone(), base_url, &selection.model_id);
                Arc::new(match process {
                    Some(p) => engine.with_process(p),
                    None => engine,
                })
            }
            Device::Cpu => {
                let engine = CpuEngine::new(self.client.clone(), base_url);
                Arc::new(match process {
                    Some(p) => engine.with_process(p),
                    None => engine,
                })
            }
        }
    }
}

#[async_trait]
impl EngineLauncher for ProcessEngineLauncher {
    async fn launch(
        &self,
        selection: &BackendSelection,
        settings: &GatewaySettings,
    ) -> Result<Arc<dyn InferenceEngine>, EngineError> {
        let timeout = Duration::from_secs(settings.engine.startup_timeout_secs);

        if let Some(url) = &settings.engine.attach_url {
            let base_url = url.trim_end_matches('/').to_string();
            info!(device = %selection.device, url = %base_url, "Attaching to running engine");
            wait_for_http_health(&self.client, &base_url, timeout, None).await?;
            return Ok(self.build_engine(selection, base_url, None));
        }

        let port = settings.engine.port;
        if !is_port_available(port) {
            return Err(EngineError::Launch(format!(
                "engine port {port} is already in use"
            )));
        }

        let command = EngineCommand::for_selection(selection, settings);
        let mut child = command.spawn()?;
        spawn_log_readers(&mut child, command.label);
        let process = ManagedProcess::new(command.label, child);
        info!(
            engine = command.label,
            pid = ?process.pid(),
            model = %selection.model_id,
            "Engine process started"
        );

        let base_url = format!("http://127.0.0.1:{port}");
        if let Err(e) = wait_for_http_health(&self.client, &base_url, timeout, Some(&process)).await
        {
            warn!(engine = command.label, "Engine failed to become ready: {e}");
            process.shutdown().await;
            return Err(e);
        }

        Ok(self.build_engine(selection, base_url, Some(process)))
    }
}
