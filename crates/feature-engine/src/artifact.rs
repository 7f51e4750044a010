//! Persisted Artifact Loading

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors while loading a persisted training artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read {artifact} artifact at {}: {source}", .path.display())]
    Io {
        artifact: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {artifact} artifact at {}: {source}", .path.display())]
    Parse {
        artifact: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {artifact} artifact: {reason}")]
    Invalid {
        artifact: &'static str,
        reason: String,
    },
}

impl ArtifactError {
    /// Shorthand for a structurally invalid artifact
    pub fn invalid(artifact: &'static str, reason: impl Into<String>) -> Self {
        ArtifactError::Invalid {
            artifact,
            reason: reason.into(),
        }
    }
}

/// Read and deserialize a JSON artifact
pub fn read_json<T: DeserializeOwned>(artifact: &'static str, path: &Path) -> Result<T, ArtifactError> {
    debug!(artifact, path = %path.display(), "Reading artifact");

    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        artifact,
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        artifact,
        path: path.to_path_buf(),
        source,
    })
}
