//! Model locator error types.

use std::path::PathBuf;
use thiserror::Error;

use super::models::ArtifactKind;

/// Errors raised while validating the configured model artifact.
#[derive(Debug, Error)]
pub enum LocateError {
    /// The identifier cannot be mapped to a path under the models directory.
    #[error("Invalid model identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },

    /// Nothing exists at the expected path.
    #[error("Model artifact not found at {}", path.display())]
    NotFound { path: PathBuf },

    /// Something exists at the expected path, but of the wrong kind.
    #[error("Model artifact at {} is not a {expected}", path.display())]
    WrongKind { path: PathBuf, expected: ArtifactKind },

    /// The filesystem refused to tell us.
    #[error("Cannot inspect model artifact at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LocateError {
    /// The path the error is about, when there is one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::InvalidIdentifier { .. } => None,
            Self::NotFound { path } | Self::WrongKind { path, .. } | Self::Io { path, .. } => {
                Some(path)
            }
        }
    }
}
