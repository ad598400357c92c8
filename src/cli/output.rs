//! CLI output: format selection and error mapping to the CLI surface.

use crate::error::{ApiError, SyncError};
use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::SyncError(SyncError::ProjectNotFound(id))
        | ApiError::StorageError(crate::error::StorageError::ProjectNotFound(id)) => {
            format!("Project {} does not exist", id)
        }
        ApiError::SyncBatchFailed { .. } => e.to_string(),
        other => format!("Error: {}", other),
    }
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(value)?)
}
