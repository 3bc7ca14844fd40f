//! Health check utilities for engine processes.
//!
//! Both vLLM and llama-server answer `GET /health` with 200 once the model
//! is loaded.

use std::time::{Duration, Instant};

use llmgate_core::EngineError;
use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::process::ManagedProcess;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Make a single request to `<base_url>/health`.
pub async fn check_http_health(client: &Client, base_url: &str) -> bool {
    let health_url = format!("{base_url}/health");
    match client
        .get(&health_url)
        .timeout(Duration::from_secs(2))
        .send()
        .await
    {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            debug!("Health check failed: {e}");
            false
        }
    }
}

/// Poll `<base_url>/health` until it returns 200 OK or `timeout` elapses.
///
/// When `process` is given, an early exit of that process aborts the wait
/// instead of waiting out the full timeout.
pub async fn wait_for_http_health(
    client: &Client,
    base_url: &str,
    timeout: Duration,
    process: Option<&ManagedProcess>,
) -> Result<(), EngineError> {
    info!("Waiting for engine to be ready at {base_url}/health");
    let started = Instant::now();

    loop {
        if check_http_health(client, base_url).await {
            info!(
                elapsed_secs = started.elapsed().as_secs(),
                "Engine is ready at {base_url}"
            );
            return Ok(());
        }

        if let Some(process) = process
            && let Some(status) = process.exit_status().await
        {
            return Err(EngineError::Launch(format!(
                "{} exited during startup ({status})",
                process.label()
            )));
        }

        if started.elapsed() >= timeout {
            return Err(EngineError::Launch(format!(
                "engine at {base_url} did not become healthy within {}s",
                timeout.as_secs()
            )));
        }

        sleep(POLL_INTERVAL).await;
    }
}
