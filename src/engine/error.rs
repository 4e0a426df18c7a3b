//! Error taxonomy for engine operations.

use std::path::PathBuf;

use crate::data::DatabaseError;

/// Error returned by caller-initiated engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Missing or malformed caller input. Nothing was mutated.
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist. Nothing was mutated.
    #[error("{0}")]
    NotFound(String),

    /// A persistence operation failed. Earlier steps of the same operation are
    /// not rolled back.
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    /// A filesystem operation failed for a reason other than the file being absent.
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Filesystem {
            path: path.into(),
            source,
        }
    }
}
