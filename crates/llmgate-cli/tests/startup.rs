//! Startup lifecycle tests with a fixed hardware probe and a fake launcher.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use llmgate_cli::{Bootstrap, StartupError};
use llmgate_core::{
    BackendSelection, Device, DevicePreference, EngineError, EngineLauncher, FinishReason,
    GatewayPhase, GatewaySettings, GenerationResult, GpuInfo, HardwareProbe, InferenceEngine,
    SamplingParams,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct FixedProbe(GpuInfo);

impl HardwareProbe for FixedProbe {
    fn detect_gpu(&self) -> GpuInfo {
        self.0.clone()
    }
}

#[derive(Debug, Default)]
struct EchoEngine {
    stopped: AtomicBool,
}

#[async_trait]
impl InferenceEngine for EchoEngine {
    fn device(&self) -> Device {
        Device::Cpu
    }

    async fn invoke(
        &self,
        prompt: &str,
        _params: &SamplingParams,
    ) -> Result<GenerationResult, EngineError> {
        Ok(GenerationResult {
            text: format!("{} chars", prompt.len()),
            finish_reason: FinishReason::Stop,
            prompt_tokens: 3,
            completion_tokens: 2,
        })
    }

    async fn shutdown(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Records launch requests; optionally fails them.
#[derive(Default)]
struct FakeLauncher {
    fail: bool,
    launched: Mutex<Vec<BackendSelection>>,
    engine: Arc<EchoEngine>,
}

impl FakeLauncher {
    fn launched(&self) -> Vec<BackendSelection> {
        self.launched.lock().unwrap().clone()
    }
}

#[async_trait]
impl EngineLauncher for FakeLauncher {
    async fn launch(
        &self,
        selection: &BackendSelection,
        _settings: &GatewaySettings,
    ) -> Result<Arc<dyn InferenceEngine>, EngineError> {
        self.launched.lock().unwrap().push(selection.clone());
        if self.fail {
            return Err(EngineError::Launch("engine exited during startup".into()));
        }
        Ok(Arc::clone(&self.engine) as Arc<dyn InferenceEngine>)
    }
}

fn settings(models_dir: &Path, model: &str) -> GatewaySettings {
    GatewaySettings {
        model: model.to_string(),
        models_dir: models_dir.to_path_buf(),
        host: "127.0.0.1".to_string(),
        port: 0,
        device: DevicePreference::Cuda,
        ..GatewaySettings::default()
    }
}

fn models_with_gguf() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("model.gguf"), b"GGUF").unwrap();
    dir
}

#[tokio::test]
async fn gpu_unavailable_downgrades_and_reaches_serving() {
    let models = models_with_gguf();
    let launcher = Arc::new(FakeLauncher::default());
    let mut bootstrap = Bootstrap::new(
        settings(models.path(), "model.gguf"),
        Arc::new(FixedProbe(GpuInfo::none())),
        Arc::clone(&launcher) as Arc<dyn EngineLauncher>,
    );

    let gateway = bootstrap.start().await.unwrap();

    assert_eq!(bootstrap.phase(), GatewayPhase::Serving);
    assert_eq!(gateway.selection().device, Device::Cpu);
    assert!(gateway.downgraded());
    let launched = launcher.launched();
    assert_eq!(launched.len(), 1);
    assert_eq!(launched[0].device, Device::Cpu);
    assert_eq!(launched[0].model_path, models.path().join("model.gguf"));
}

#[tokio::test]
async fn missing_model_fails_without_launching() {
    let models = TempDir::new().unwrap();
    let launcher = Arc::new(FakeLauncher::default());
    let mut bootstrap = Bootstrap::new(
        settings(models.path(), "org/absent-model"),
        Arc::new(FixedProbe(GpuInfo::none())),
        Arc::clone(&launcher) as Arc<dyn EngineLauncher>,
    );

    let Err(err) = bootstrap.start().await else {
        panic!("startup should fail for a missing model");
    };

    assert!(matches!(err, StartupError::Model(_)));
    assert!(err.to_string().contains("absent-model"));
    assert_eq!(bootstrap.phase(), GatewayPhase::Failed);
    assert!(launcher.launched().is_empty());
}

#[tokio::test]
async fn gpu_device_expects_model_directory() {
    let models = TempDir::new().unwrap();
    std::fs::create_dir_all(models.path().join("org/model-awq")).unwrap();
    let launcher = Arc::new(FakeLauncher::default());
    let gpu = GpuInfo {
        has_nvidia_gpu: true,
        driver_gpu_count: 1,
        cuda_version: None,
    };
    let mut bootstrap = Bootstrap::new(
        settings(models.path(), "org/model-awq"),
        Arc::new(FixedProbe(gpu)),
        Arc::clone(&launcher) as Arc<dyn EngineLauncher>,
    );

    let gateway = bootstrap.start().await.unwrap();
    assert_eq!(gateway.selection().device, Device::Gpu);
    assert!(!gateway.downgraded());
    assert_eq!(gateway.selection().model_id, "org/model-awq");
}

#[tokio::test]
async fn cpu_model_override_used_after_downgrade() {
    let models = models_with_gguf();
    let mut settings = settings(models.path(), "org/gpu-only-model");
    settings.cpu_model = Some("model.gguf".to_string());

    let launcher = Arc::new(FakeLauncher::default());
    let mut bootstrap = Bootstrap::new(
        settings,
        Arc::new(FixedProbe(GpuInfo::none())),
        Arc::clone(&launcher) as Arc<dyn EngineLauncher>,
    );

    let gateway = bootstrap.start().await.unwrap();
    assert_eq!(gateway.selection().model_id, "model.gguf");
}

#[tokio::test]
async fn engine_launch_failure_is_fatal() {
    let models = models_with_gguf();
    let launcher = Arc::new(FakeLauncher {
        fail: true,
        ..FakeLauncher::default()
    });
    let mut bootstrap = Bootstrap::new(
        settings(models.path(), "model.gguf"),
        Arc::new(FixedProbe(GpuInfo::none())),
        launcher,
    );

    let Err(err) = bootstrap.start().await else {
        panic!("startup should fail when the engine cannot launch");
    };
    assert!(matches!(err, StartupError::Engine(EngineError::Launch(_))));
    assert_eq!(bootstrap.phase(), GatewayPhase::Failed);
}

#[tokio::test]
async fn serving_gateway_answers_and_stops_engine() {
    let models = models_with_gguf();
    let launcher = Arc::new(FakeLauncher::default());
    let engine = Arc::clone(&launcher.engine);
    let mut bootstrap = Bootstrap::new(
        settings(models.path(), "model.gguf"),
        Arc::new(FixedProbe(GpuInfo::none())),
        launcher,
    );

    let gateway = bootstrap.start().await.unwrap();
    let base = format!("http://{}", gateway.local_addr().unwrap());
    let cancel = CancellationToken::new();
    let server = tokio::spawn(gateway.run(cancel.clone()));

    let client = reqwest::Client::new();
    let health: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok"}));

    let response = client
        .post(format!("{base}/v1/chat/completions"))
        .json(&json!({
            "model": "model.gguf",
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["usage"]["total_tokens"], 5);

    cancel.cancel();
    server.await.unwrap().unwrap();
    assert!(engine.stopped.load(Ordering::SeqCst));
}
