//! `llmgate` entry point.
//!
//! Reads configuration, initialises tracing, runs the startup lifecycle and
//! serves until Ctrl-C or SIGTERM. Startup failures exit non-zero.

use std::sync::Arc;

use clap::Parser;
use llmgate_cli::{Bootstrap, GatewayArgs, StartupError};
use llmgate_core::{GatewaySettings, validate_settings};
use llmgate_runtime::{DefaultHardwareProbe, ProcessEngineLauncher};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads the environment
    dotenvy::dotenv().ok();

    let args = GatewayArgs::parse();
    init_tracing(&args.log_level);

    let settings = args.into_settings();
    let mut bootstrap = match prepare(settings) {
        Ok(bootstrap) => bootstrap,
        Err(e) => exit_with(&e),
    };

    let gateway = match bootstrap.start().await {
        Ok(gateway) => gateway,
        Err(e) => exit_with(&e),
    };

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    gateway.run(cancel).await?;
    info!("Gateway stopped");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn prepare(settings: GatewaySettings) -> Result<Bootstrap, StartupError> {
    validate_settings(&settings)?;
    let launcher = ProcessEngineLauncher::new()?;
    Ok(Bootstrap::new(
        settings,
        Arc::new(DefaultHardwareProbe),
        Arc::new(launcher),
    ))
}

fn exit_with(err: &StartupError) -> ! {
    error!("{err}");
    std::process::exit(err.exit_code());
}

/// Cancel `cancel` on Ctrl-C or SIGTERM.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    cancel.cancel();
}
