//! Engine process management.
//!
//! Provides spawning of the engine child process with log capture, a
//! loopback port check, and graceful SIGTERM → SIGKILL shutdown.

mod command;
mod managed;
mod ports;

pub use command::{EngineCommand, spawn_log_readers};
pub use managed::ManagedProcess;
pub use ports::is_port_available;
