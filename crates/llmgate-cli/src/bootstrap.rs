//! Gateway bootstrap - the composition root.
//!
//! Startup is strictly sequential: resolve the device, validate the model
//! artifact, bring up the engine, bind the listener. Each step advances the
//! lifecycle; the first failure moves it to `Failed` and aborts startup, so
//! the HTTP listener is never bound for a gateway that cannot serve.

use std::net::SocketAddr;
use std::sync::Arc;

use llmgate_core::{
    ArtifactKind, BackendSelection, EngineLauncher, GatewayPhase, GatewaySettings, GpuInfo,
    HardwareProbe, InferenceEngine, Lifecycle, ModelLocator, resolve_device,
};
use llmgate_proxy::{AppState, serve};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::StartupError;

/// Drives the gateway from `Starting` to `Serving`.
pub struct Bootstrap {
    settings: GatewaySettings,
    probe: Arc<dyn HardwareProbe>,
    launcher: Arc<dyn EngineLauncher>,
    lifecycle: Lifecycle,
}

impl Bootstrap {
    pub fn new(
        settings: GatewaySettings,
        probe: Arc<dyn HardwareProbe>,
        launcher: Arc<dyn EngineLauncher>,
    ) -> Self {
        Self {
            settings,
            probe,
            launcher,
            lifecycle: Lifecycle::new(),
        }
    }

    pub const fn phase(&self) -> GatewayPhase {
        self.lifecycle.phase()
    }

    /// Run startup. On success the gateway is `Serving` with a bound listener.
    pub async fn start(&mut self) -> Result<Gateway, StartupError> {
        info!(
            model = %self.settings.model,
            models_dir = %self.settings.models_dir.display(),
            device = %self.settings.device,
            "Starting gateway"
        );

        let probe = Arc::clone(&self.probe);
        let gpu = tokio::task::spawn_blocking(move || probe.detect_gpu())
            .await
            .unwrap_or_else(|e| {
                warn!("GPU probe task failed: {e}");
                GpuInfo::none()
            });
        let resolution = resolve_device(self.settings.device, &gpu);
        let device = resolution.device;
        if resolution.downgraded && self.settings.cpu_model.is_none() {
            warn!(
                model = %self.settings.model,
                "Running on CPU without a CPU model override; the model must be a GGUF artifact"
            );
        }

        // Starting -> ModelValidated
        let model_id = self.settings.model_for(device).to_string();
        let locator = ModelLocator::new(&self.settings.models_dir);
        let model_path = match locator.locate(&model_id, ArtifactKind::for_device(device)) {
            Ok(path) => path,
            Err(e) => return Err(self.fail(e)),
        };
        info!(model = %model_id, path = %model_path.display(), "Model artifact found");
        self.lifecycle.advance(GatewayPhase::ModelValidated)?;

        // ModelValidated -> BackendReady
        let selection = BackendSelection {
            device,
            model_id,
            model_path,
            port: self.settings.port,
        };
        let engine = match self.launcher.launch(&selection, &self.settings).await {
            Ok(engine) => engine,
            Err(e) => return Err(self.fail(e)),
        };
        self.lifecycle.advance(GatewayPhase::BackendReady)?;

        // BackendReady -> Serving
        let addr = format!("{}:{}", self.settings.host, self.settings.port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(source) => {
                engine.shutdown().await;
                return Err(self.fail(StartupError::Bind { addr, source }));
            }
        };
        self.lifecycle.advance(GatewayPhase::Serving)?;

        Ok(Gateway {
            listener,
            engine,
            selection,
            downgraded: resolution.downgraded,
        })
    }

    fn fail(&mut self, err: impl Into<StartupError>) -> StartupError {
        let err = err.into();
        if let Err(e) = self.lifecycle.fail(&err.to_string()) {
            warn!("{e}");
        }
        err
    }
}

/// A started gateway: engine ready and listener bound.
pub struct Gateway {
    listener: TcpListener,
    engine: Arc<dyn InferenceEngine>,
    selection: BackendSelection,
    downgraded: bool,
}

impl Gateway {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub const fn selection(&self) -> &BackendSelection {
        &self.selection
    }

    /// GPU was requested but the gateway fell back to CPU.
    pub const fn downgraded(&self) -> bool {
        self.downgraded
    }

    /// Serve until `cancel` fires, then stop the engine.
    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<()> {
        let state = AppState::new(Arc::clone(&self.engine), self.selection.model_id.as_str());
        let served = serve(self.listener, state, cancel).await;

        self.engine.shutdown().await;
        served
    }
}
