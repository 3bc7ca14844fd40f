//! OpenAI-compatible HTTP surface for llmgate.
//!
//! Routes:
//! - `POST /v1/chat/completions`: prompt translation, one engine call, response assembly
//! - `GET /v1/models`: the single served model
//! - `GET /health`: liveness
#![deny(unsafe_code)]

pub mod assemble;
pub mod error;
pub mod models;
pub mod server;

pub use assemble::assemble_response;
pub use error::GatewayError;
pub use server::{AppState, create_router, serve};
