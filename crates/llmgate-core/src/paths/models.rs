//! Model artifact location.
//!
//! The models volume is mounted by the deployment; this module only maps a
//! model identifier to its expected path and checks that the artifact is
//! there before any engine is started.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use super::error::LocateError;
use crate::domain::Device;

/// Default mount point of the models volume.
pub const DEFAULT_MODELS_DIR: &str = "/models";

/// Shape of the artifact a backend loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A model repository directory (weights, config, tokenizer).
    Directory,
    /// A single weights file such as a GGUF.
    File,
}

impl ArtifactKind {
    /// The GPU engine loads a repository directory, the CPU engine a single file.
    pub const fn for_device(device: Device) -> Self {
        match device {
            Device::Gpu => Self::Directory,
            Device::Cpu => Self::File,
        }
    }

    fn matches(self, metadata: &std::fs::Metadata) -> bool {
        match self {
            Self::Directory => metadata.is_dir(),
            Self::File => metadata.is_file(),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Directory => "directory",
            Self::File => "file",
        })
    }
}

/// Resolves model identifiers against the models directory.
#[derive(Debug, Clone)]
pub struct ModelLocator {
    models_dir: PathBuf,
}

impl ModelLocator {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    /// Compute where the artifact for `model_id` is expected to live.
    ///
    /// Identifiers are relative paths such as `org/model-awq` or
    /// `model.Q4_K_M.gguf`. Absolute paths and `..` are rejected.
    pub fn expected_path(&self, model_id: &str) -> Result<PathBuf, LocateError> {
        let invalid = |reason: &str| LocateError::InvalidIdentifier {
            id: model_id.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = model_id.trim();
        if trimmed.is_empty() {
            return Err(invalid("identifier is empty"));
        }

        let relative = Path::new(trimmed);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => return Err(invalid("'..' is not allowed")),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid("identifier must be relative to the models directory"));
                }
            }
        }

        Ok(self.models_dir.join(relative))
    }

    /// Validate that the artifact for `model_id` exists and has the right shape.
    pub fn locate(&self, model_id: &str, kind: ArtifactKind) -> Result<PathBuf, LocateError> {
        let path = self.expected_path(model_id)?;
        debug!(path = %path.display(), expected = %kind, "Checking model artifact");

        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LocateError::NotFound { path });
            }
            Err(source) => return Err(LocateError::Io { path, source }),
        };

        if !kind.matches(&metadata) {
            return Err(LocateError::WrongKind {
                path,
                expected: kind,
            });
        }

        info!(model = %model_id, path = %path.display(), "Model artifact validated");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_expected_path_joins_nested_identifier() {
        let locator = ModelLocator::new("/models");
        let path = locator.expected_path("TheBloke/Mistral-7B-AWQ").unwrap();
        assert_eq!(path, PathBuf::from("/models/TheBloke/Mistral-7B-AWQ"));
    }

    #[test]
    fn test_rejects_empty_identifier() {
        let locator = ModelLocator::new("/models");
        assert!(matches!(
            locator.expected_path("  "),
            Err(LocateError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_rejects_traversal_and_absolute() {
        let locator = ModelLocator::new("/models");
        assert!(locator.expected_path("../etc/passwd").is_err());
        assert!(locator.expected_path("org/../../x").is_err());
        assert!(locator.expected_path("/etc/passwd").is_err());
    }

    #[test]
    fn test_locate_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("org/model-awq")).unwrap();
        let locator = ModelLocator::new(dir.path());

        let path = locator
            .locate("org/model-awq", ArtifactKind::Directory)
            .unwrap();
        assert_eq!(path, dir.path().join("org/model-awq"));
    }

    #[test]
    fn test_locate_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("model.Q4_K_M.gguf"), b"GGUF").unwrap();
        let locator = ModelLocator::new(dir.path());

        assert!(
            locator
                .locate("model.Q4_K_M.gguf", ArtifactKind::File)
                .is_ok()
        );
    }

    #[test]
    fn test_missing_artifact_reports_path() {
        let dir = tempdir().unwrap();
        let locator = ModelLocator::new(dir.path());

        let err = locator
            .locate("missing-model", ArtifactKind::Directory)
            .unwrap_err();
        assert!(matches!(err, LocateError::NotFound { .. }));
        assert_eq!(err.path(), Some(dir.path().join("missing-model").as_path()));
        assert!(err.to_string().contains("missing-model"));
    }

    #[test]
    fn test_wrong_kind() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("weights.gguf"), b"GGUF").unwrap();
        let locator = ModelLocator::new(dir.path());

        let err = locator
            .locate("weights.gguf", ArtifactKind::Directory)
            .unwrap_err();
        assert!(matches!(
            err,
            LocateError::WrongKind {
                expected: ArtifactKind::Directory,
                ..
            }
        ));
    }

    #[test]
    fn test_kind_for_device() {
        assert_eq!(ArtifactKind::for_device(Device::Gpu), ArtifactKind::Directory);
        assert_eq!(ArtifactKind::for_device(Device::Cpu), ArtifactKind::File);
    }
}
