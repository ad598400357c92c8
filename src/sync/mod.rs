//! Tree reconciliation
//!
//! One pass per project: bring the working copy up to date, stop early when
//! the checked-out commit is the one the index was built from, otherwise
//! scan the working copy, diff it against the stored rows, apply the
//! differences and advance the project's commit marker.

pub mod apply;
pub mod diff;
pub mod service;

pub use apply::{EntryWriteFailure, WriteOperation};
pub use diff::SyncPlan;
pub use service::SyncService;

use crate::concurrency::{ProjectLockManager, WorkingCopyLockManager};
use crate::config::SyncConfig;
use crate::error::{StorageError, SyncError};
use crate::git::WorkingCopy;
use crate::store::{Project, ProjectStore, TreeEntryStore};
use crate::tree::{LocalTree, LocalTreeBuilder};
use crate::types::ProjectId;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Counts and non-fatal problems of a pass that reached the apply step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub commit: String,
    pub previous_commit: Option<String>,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Files left out of the scan because they could not be read
    pub skipped: usize,
    /// Checkout/pull failures that did not stop the pass
    pub warnings: Vec<String>,
    pub failures: Vec<EntryWriteFailure>,
    /// Whether the commit marker was advanced
    pub finalized: bool,
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.failures.is_empty()
    }
}

/// Result of one project pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Project has no clone URL; nothing was touched
    Skipped,
    /// Working copy is at the commit the index was built from
    UpToDate { commit: String },
    Synced(SyncReport),
}

fn task_error(err: tokio::task::JoinError) -> SyncError {
    SyncError::Task(err.to_string())
}

/// Keeps a project's tree rows in line with its working copy
pub struct TreeReconciler<S> {
    store: Arc<S>,
    working_copy: Arc<dyn WorkingCopy>,
    config: SyncConfig,
    locks: ProjectLockManager,
    working_copy_locks: WorkingCopyLockManager,
}

impl<S> TreeReconciler<S>
where
    S: ProjectStore + TreeEntryStore + 'static,
{
    pub fn new(store: Arc<S>, working_copy: Arc<dyn WorkingCopy>, config: SyncConfig) -> Self {
        Self {
            store,
            working_copy,
            config,
            locks: ProjectLockManager::new(),
            working_copy_locks: WorkingCopyLockManager::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn load_project(&self, project_id: ProjectId) -> Result<Project, SyncError> {
        self.store
            .get_project(project_id)?
            .ok_or(SyncError::ProjectNotFound(project_id))
    }

    /// Run one pass for a project.
    ///
    /// Passes for the same project are serialized, and so are passes whose
    /// projects resolve to the same working-copy directory. Locks are always
    /// taken project first. Any error before the finalize step leaves the
    /// commit marker as it was.
    #[instrument(skip(self))]
    pub async fn sync_project(&self, project_id: ProjectId) -> Result<SyncOutcome, SyncError> {
        let _guard = self.locks.acquire(project_id).await;
        let project = self.load_project(project_id)?;

        if project.clone_url.trim().is_empty() {
            warn!(project = %project.name, "Project has no clone URL, skipping");
            return Ok(SyncOutcome::Skipped);
        }

        let dir = self.working_copy.working_copy_path(&project)?;
        let _copy_guard = self.working_copy_locks.acquire(dir).await;

        let checkout = self.working_copy.ensure_up_to_date(&project).await?;

        if project.file_tree_commit.as_deref() == Some(checkout.commit.as_str()) {
            info!(commit = %checkout.commit, "File tree already at current commit");
            return Ok(SyncOutcome::UpToDate {
                commit: checkout.commit,
            });
        }

        let start = Instant::now();
        let local = self.scan(&checkout.path).await?;
        let skipped = local.skipped;

        let store = self.store.clone();
        let root = checkout.path.clone();
        let (plan, applied) = tokio::task::spawn_blocking(move || {
            let existing = store.list_entries(project_id)?;
            let plan = diff::plan(project_id, &local, existing, &root);
            let applied = apply::apply(&*store, &plan);
            Ok::<_, StorageError>((plan, applied))
        })
        .await
        .map_err(task_error)??;

        let finalized =
            applied.failures.is_empty() || self.config.finalize_on_partial_failure;
        if finalized {
            self.finalize(project_id, &checkout.commit).await?;
        } else {
            warn!(
                failures = applied.failures.len(),
                "Entry writes failed, commit marker left unchanged"
            );
        }

        let report = SyncReport {
            commit: checkout.commit,
            previous_commit: project.file_tree_commit,
            created: applied.created,
            updated: applied.updated,
            deleted: applied.deleted,
            unchanged: plan.unchanged,
            skipped,
            warnings: checkout.warnings,
            failures: applied.failures,
            finalized,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            commit = %report.commit,
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            unchanged = report.unchanged,
            failures = report.failures.len(),
            duration_ms = report.duration_ms,
            "File tree synchronized"
        );

        Ok(SyncOutcome::Synced(report))
    }

    async fn scan(&self, root: &Path) -> Result<LocalTree, SyncError> {
        let builder = LocalTreeBuilder::new(root.to_path_buf())
            .with_walker_config(self.config.walker_config());
        tokio::task::spawn_blocking(move || builder.build())
            .await
            .map_err(task_error)?
            .map_err(SyncError::Scan)
    }

    async fn finalize(&self, project_id: ProjectId, commit: &str) -> Result<(), SyncError> {
        let store = self.store.clone();
        let commit = commit.to_string();
        tokio::task::spawn_blocking(move || {
            let mut project = store.require_project(project_id)?;
            project.file_tree_commit = Some(commit);
            project.file_tree_updated = Some(Utc::now());
            store.put_project(&project)
        })
        .await
        .map_err(task_error)?
        .map_err(SyncError::Finalize)
    }

    /// Drop lock entries for projects and working copies no pass holds
    pub fn prune_locks(&self) -> usize {
        self.locks.prune() + self.working_copy_locks.prune()
    }

    /// Forget everything indexed for a project.
    ///
    /// The commit marker is cleared before rows are removed, so an
    /// interrupted purge still forces a full rescan. The working copy is
    /// left on disk. Returns the number of rows removed.
    #[instrument(skip(self))]
    pub async fn purge_all(&self, project_id: ProjectId) -> Result<usize, SyncError> {
        let _guard = self.locks.acquire(project_id).await;
        let mut project = self.load_project(project_id)?;

        let store = self.store.clone();
        let removed = tokio::task::spawn_blocking(move || {
            project.file_tree_commit = None;
            project.file_tree_updated = None;
            store.put_project(&project)?;
            store.remove_all_entries(project_id)
        })
        .await
        .map_err(task_error)??;

        info!(removed, "Purged file tree");
        Ok(removed)
    }
}
