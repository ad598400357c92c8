//! CLI route: single route table and run context. Dispatches to the
//! reconciler and store, then to presentation.

use crate::cli::output::OutputFormat;
use crate::cli::parse::{Commands, ProjectCommands};
use crate::cli::presentation::{
    format_entries_json, format_entries_text, format_project_list_json, format_project_list_text,
    format_sync_results_json, format_sync_results_text,
};
use crate::config::{ConfigLoader, TreeSyncConfig};
use crate::error::{ApiError, SyncError};
use crate::git::RepoSync;
use crate::store::{Project, ProjectStore, SledStore, TreeEntryStore};
use crate::sync::{SyncService, TreeReconciler};
use crate::tree::path;
use crate::types::ProjectId;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace, config, store and sync service.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: TreeSyncConfig,
    store: Arc<SledStore>,
    service: SyncService<SledStore>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::with_config(workspace_root, config)
    }

    /// Create run context from an already loaded configuration.
    pub fn with_config(workspace_root: PathBuf, config: TreeSyncConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|errors| {
            ApiError::ConfigError(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

        std::fs::create_dir_all(&config.storage.store_path)
            .map_err(|e| ApiError::StorageError(crate::error::StorageError::IoError(e)))?;
        let store = Arc::new(SledStore::new(&config.storage.store_path)?);
        debug!(store_path = %config.storage.store_path.display(), "Opened index store");

        let repo_sync = Arc::new(RepoSync::new(config.git.clone()));
        let reconciler = Arc::new(TreeReconciler::new(
            store.clone(),
            repo_sync,
            config.sync.clone(),
        ));
        let service = SyncService::new(reconciler, config.sync.max_concurrent_syncs);

        Ok(Self {
            workspace_root,
            config,
            store,
            service,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &TreeSyncConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SledStore> {
        &self.store
    }

    fn runtime() -> Result<Runtime, ApiError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::Runtime(format!("Failed to create runtime: {}", e)))
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let result = match command {
            Commands::Project { command } => self.handle_project_command(command),
            Commands::Sync { ids, all, format } => self.handle_sync(ids, *all, *format),
            Commands::Purge { id, yes } => self.handle_purge(*id, *yes),
            Commands::Ls { id, path, format } => self.handle_ls(*id, path, *format),
        };
        self.store.flush()?;
        result
    }

    fn handle_project_command(&self, command: &ProjectCommands) -> Result<String, ApiError> {
        match command {
            ProjectCommands::Add { id, name, url } => {
                if name.trim().is_empty() {
                    return Err(ApiError::InvalidArgument(
                        "Project name cannot be empty".to_string(),
                    ));
                }
                if self.store.get_project(*id)?.is_some() {
                    return Err(ApiError::InvalidArgument(format!(
                        "Project {} already exists",
                        id
                    )));
                }
                self.store
                    .put_project(&Project::new(*id, name.trim(), url.trim()))?;
                info!(project_id = id, name = %name, "Project added");
                Ok(format!("Added project {} ({})", id, name.trim()))
            }
            ProjectCommands::List { format } => {
                let projects = self.store.list_projects()?;
                match format {
                    OutputFormat::Json => format_project_list_json(&projects),
                    OutputFormat::Text => Ok(format_project_list_text(&projects)),
                }
            }
            ProjectCommands::Remove { id } => {
                let removed = self.store.remove_project(*id)?;
                if !removed {
                    return Err(SyncError::ProjectNotFound(*id).into());
                }
                info!(project_id = id, "Project removed");
                Ok(format!("Removed project {}", id))
            }
        }
    }

    fn handle_sync(
        &self,
        ids: &[ProjectId],
        all: bool,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        let runtime = Self::runtime()?;
        let results = runtime.block_on(async {
            if all {
                self.service.sync_all().await
            } else {
                Ok(self.service.sync_many(ids).await)
            }
        })?;

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        let output = match format {
            OutputFormat::Json => format_sync_results_json(&results)?,
            OutputFormat::Text if results.is_empty() => "No projects to sync.".to_string(),
            OutputFormat::Text => format_sync_results_text(&results),
        };

        if failed > 0 {
            return Err(ApiError::SyncBatchFailed {
                output,
                failed,
                total: results.len(),
            });
        }
        Ok(output)
    }

    fn handle_purge(&self, id: ProjectId, yes: bool) -> Result<String, ApiError> {
        let project = self.store.require_project(id)?;
        if !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Remove every indexed entry of project '{}' ({})?",
                    project.name, id
                ))
                .default(false)
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;

            if !confirmed {
                return Ok("Purge cancelled".to_string());
            }
        }

        let runtime = Self::runtime()?;
        let removed = runtime.block_on(self.service.reconciler().purge_all(id))?;
        Ok(format!(
            "Purged project {}: {} entr{} removed, next sync rebuilds the tree",
            id,
            removed,
            if removed == 1 { "y" } else { "ies" }
        ))
    }

    fn handle_ls(&self, id: ProjectId, dir: &str, format: OutputFormat) -> Result<String, ApiError> {
        let project = self.store.require_project(id)?;
        let dir = path::normalize_dir_path(dir);
        let entries = self.store.list_children(id, &dir)?;
        match format {
            OutputFormat::Json => format_entries_json(&project, &dir, &entries),
            OutputFormat::Text => Ok(format_entries_text(&project, &dir, &entries)),
        }
    }
}
