//! Error kinds surfaced by packaging, catalog and extraction operations.
//!
//! Operations return `anyhow::Result` and wrap these kinds with context on the
//! way up. Callers that need to branch on the kind use
//! `err.downcast_ref::<SyncError>()`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Local filesystem failure (open, read, walk).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed or incomplete JSON document.
    #[error("Invalid document {path:?}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Remote open/create/copy failure.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Zero bytes written to remote file {path}")]
    ZeroBytesWritten { path: String },

    #[error("Invalid version '{0}': not a number")]
    InvalidVersion(String),

    #[error("Invalid version constraint '{0}'")]
    InvalidConstraint(String),

    /// Archive entry would land outside the extraction root.
    #[error("Archive entry '{entry}' escapes the destination directory")]
    PathTraversal { entry: String },
}

impl SyncError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        SyncError::ConfigParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for the transfer family (`Transfer`, `ZeroBytesWritten`).
    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            SyncError::Transfer(_) | SyncError::ZeroBytesWritten { .. }
        )
    }
}
