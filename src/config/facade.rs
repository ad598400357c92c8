//! Config loader facade: one entry point that applies every source in order.

use crate::config::{merge, sources, TreeSyncConfig};
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

/// Loads [`TreeSyncConfig`] from the layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// `config/config.toml`, `config/{TREESYNC_ENV}.toml`, environment.
    /// Relative paths are resolved against `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<TreeSyncConfig, ConfigError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::environment::add_to_builder(builder);

        let mut config: TreeSyncConfig = builder.build()?.try_deserialize()?;
        config.resolve_paths(workspace_root);
        Ok(config)
    }

    /// Load configuration from a single file plus environment overrides.
    ///
    /// Relative paths are resolved against the file's directory.
    pub fn load_from_file(path: &Path) -> Result<TreeSyncConfig, ConfigError> {
        let builder = merge::builder_with_defaults()?.add_source(File::from(path).required(true));
        let builder = sources::environment::add_to_builder(builder);

        let mut config: TreeSyncConfig = builder.build()?.try_deserialize()?;
        if let Some(parent) = path.parent() {
            config.resolve_paths(parent);
        }
        Ok(config)
    }

    /// Path of the global config file, whether or not it exists
    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }
}
