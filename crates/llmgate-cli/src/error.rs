//! Startup error types and exit codes.

use llmgate_core::{EngineError, LifecycleError, LocateError, SettingsError};
use thiserror::Error;

/// A fatal startup failure. The gateway never serves after one of these.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Settings(#[from] SettingsError),

    /// The model artifact is missing or unusable.
    #[error("Model validation failed: {0}")]
    Model(#[from] LocateError),

    #[error("Engine startup failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl StartupError {
    /// Map error to a process exit code (sysexits.h conventions).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Settings(_) => 78, // EX_CONFIG
            Self::Model(_) => 66,    // EX_NOINPUT
            Self::Engine(_) => 69,   // EX_UNAVAILABLE
            Self::Bind { .. } => 71, // EX_OSERR
            Self::Lifecycle(_) => 70, // EX_SOFTWARE
        }
    }
}
