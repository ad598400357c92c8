//! Configuration System
//!
//! Layered configuration: built-in defaults, a global config file, workspace
//! config files and `TREESYNC__SECTION__KEY` environment variables, merged
//! with the `config` crate and deserialized into [`TreeSyncConfig`].

use crate::logging::LoggingConfig;
use crate::tree::walker::WalkerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::git::GitConfig;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeSyncConfig {
    /// Git invocation settings
    #[serde(default)]
    pub git: GitConfig,

    /// Index storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Reconciliation settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Index storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".treesync/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

/// Reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Entry names pruned from every walk
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Follow symlinks while walking (default: false)
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Upper bound on passes running at the same time
    #[serde(default = "default_max_concurrent_syncs")]
    pub max_concurrent_syncs: usize,

    /// Advance the commit marker even when some entry writes failed
    #[serde(default = "default_true")]
    pub finalize_on_partial_failure: bool,
}

fn default_ignore() -> Vec<String> {
    vec![".git".to_string()]
}

fn default_max_concurrent_syncs() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
            follow_symlinks: false,
            max_concurrent_syncs: default_max_concurrent_syncs(),
            finalize_on_partial_failure: default_true(),
        }
    }
}

impl SyncConfig {
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            follow_symlinks: self.follow_symlinks,
            ignore_patterns: self.ignore.clone(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Git(String),
    Storage(String),
    Sync(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Git(msg) => write!(f, "Git: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Sync(msg) => write!(f, "Sync: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl TreeSyncConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.git.executable.as_os_str().is_empty() {
            errors.push(ValidationError::Git("Executable cannot be empty".to_string()));
        }
        if self.git.clone_root.as_os_str().is_empty() {
            errors.push(ValidationError::Git("Clone root cannot be empty".to_string()));
        }
        if self.git.timeout_secs == 0 {
            errors.push(ValidationError::Git("Timeout must be positive".to_string()));
        }
        if let Some(branch) = &self.git.default_branch {
            if branch.trim().is_empty() {
                errors.push(ValidationError::Git(
                    "Default branch cannot be blank".to_string(),
                ));
            }
        }
        if self.storage.store_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "Store path cannot be empty".to_string(),
            ));
        }
        if self.sync.max_concurrent_syncs == 0 {
            errors.push(ValidationError::Sync(
                "max_concurrent_syncs must be at least 1".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Make relative clone and store paths relative to `workspace_root`.
    pub fn resolve_paths(&mut self, workspace_root: &Path) {
        if self.git.clone_root.is_relative() {
            self.git.clone_root = workspace_root.join(&self.git.clone_root);
        }
        if self.storage.store_path.is_relative() {
            self.storage.store_path = workspace_root.join(&self.storage.store_path);
        }
        if let Some(file) = &self.logging.file {
            if file.is_relative() {
                self.logging.file = Some(workspace_root.join(file));
            }
        }
    }
}
