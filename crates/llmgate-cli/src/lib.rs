//! Composition root for the llmgate gateway.
//!
//! [`config`] turns environment/flags into `GatewaySettings`, [`bootstrap`]
//! walks the startup lifecycle and [`error`] maps startup failures to exit
//! codes. The binary in `main.rs` only wires these together.

pub mod bootstrap;
pub mod config;
pub mod error;

pub use bootstrap::{Bootstrap, Gateway};
pub use config::GatewayArgs;
pub use error::StartupError;
