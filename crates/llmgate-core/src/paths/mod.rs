//! Model artifact path resolution and validation.

mod error;
mod models;

pub use error::LocateError;
pub use models::{ArtifactKind, DEFAULT_MODELS_DIR, ModelLocator};
