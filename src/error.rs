//! Error types for the tree synchronizer.

use crate::types::ProjectId;
use std::path::PathBuf;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    /// Wrap a database or codec failure with the operation that produced it.
    pub(crate) fn database(context: &str, err: impl std::fmt::Display) -> Self {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{}: {}", context, err),
        ))
    }

    pub(crate) fn codec(context: &str, err: impl std::fmt::Display) -> Self {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{}: {}", context, err),
        ))
    }
}

/// Failures of a single git invocation
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with code {code}: {stderr}")]
    Failed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("`{command}` timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("Cannot derive a working copy directory from clone URL '{0}'")]
    InvalidCloneUrl(String),

    #[error("`{0}` produced no output")]
    EmptyOutput(String),

    #[error(
        "Working copy {} tracks {}, expected {expected}",
        .path.display(),
        .found.as_deref().unwrap_or("no origin")
    )]
    RemoteMismatch {
        path: PathBuf,
        expected: String,
        found: Option<String>,
    },
}

/// Pass-level failures of a project sync.
///
/// Every variant except `Finalize` leaves the project's commit marker and
/// tree rows exactly as they were before the pass.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Cloning repository failed: {0}")]
    CloneFailed(#[source] GitError),

    #[error("Working copy belongs to another repository: {0}")]
    WorkingCopyConflict(#[source] GitError),

    #[error("Resolving the current commit failed: {0}")]
    CommitResolutionFailed(#[source] GitError),

    #[error("Scanning working copy failed: {0}")]
    Scan(#[source] StorageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Persisting commit marker failed: {0}")]
    Finalize(#[source] StorageError),

    #[error("Sync task failed: {0}")]
    Task(String),
}

/// Application-level errors surfaced by the CLI and setup code
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Sync error: {0}")]
    SyncError(#[from] SyncError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("{output}\n{failed} of {total} sync(s) failed")]
    SyncBatchFailed {
        output: String,
        failed: usize,
        total: usize,
    },
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
