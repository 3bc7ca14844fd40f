//! Gateway startup lifecycle.
//!
//! `Starting -> ModelValidated -> BackendReady -> Serving`, with `Failed` as
//! the terminal state for any startup error. Once `Serving`, individual
//! request failures never move the gateway out of it.

use std::fmt;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayPhase {
    Starting,
    ModelValidated,
    BackendReady,
    Serving,
    Failed,
}

impl GatewayPhase {
    const fn next(self) -> Option<Self> {
        match self {
            Self::Starting => Some(Self::ModelValidated),
            Self::ModelValidated => Some(Self::BackendReady),
            Self::BackendReady => Some(Self::Serving),
            Self::Serving | Self::Failed => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for GatewayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Starting => "starting",
            Self::ModelValidated => "model_validated",
            Self::BackendReady => "backend_ready",
            Self::Serving => "serving",
            Self::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("invalid lifecycle transition {from} -> {to}")]
    InvalidTransition { from: GatewayPhase, to: GatewayPhase },
}

/// Tracks the current startup phase and enforces legal transitions.
#[derive(Debug)]
pub struct Lifecycle {
    phase: GatewayPhase,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub const fn new() -> Self {
        Self {
            phase: GatewayPhase::Starting,
        }
    }

    pub const fn phase(&self) -> GatewayPhase {
        self.phase
    }

    /// Move to `to`, which must be the direct successor of the current phase.
    pub fn advance(&mut self, to: GatewayPhase) -> Result<(), LifecycleError> {
        if self.phase.next() != Some(to) {
            return Err(LifecycleError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        info!(from = %self.phase, to = %to, "Gateway lifecycle transition");
        self.phase = to;
        Ok(())
    }

    /// Enter the terminal `Failed` phase. Only legal before `Serving`.
    pub fn fail(&mut self, reason: &str) -> Result<(), LifecycleError> {
        if matches!(self.phase, GatewayPhase::Serving | GatewayPhase::Failed) {
            return Err(LifecycleError::InvalidTransition {
                from: self.phase,
                to: GatewayPhase::Failed,
            });
        }
        error!(from = %self.phase, reason, "Gateway startup failed");
        self.phase = GatewayPhase::Failed;
        Ok(())
    }
}
