//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use quiz_core::SessionError;
use quiz_core::model::ConfigError;

/// Errors emitted by quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read quiz pack {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed quiz pack: {0}")]
    Json(#[from] serde_json::Error),
}
