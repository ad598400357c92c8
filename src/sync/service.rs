//! Concurrent sync passes across projects.

use crate::error::SyncError;
use crate::store::{ProjectStore, TreeEntryStore};
use crate::sync::{SyncOutcome, TreeReconciler};
use crate::types::ProjectId;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Runs reconciler passes on the tokio runtime, at most
/// `max_concurrent` at a time.
pub struct SyncService<S> {
    reconciler: Arc<TreeReconciler<S>>,
    semaphore: Arc<Semaphore>,
}

impl<S> Clone for SyncService<S> {
    fn clone(&self) -> Self {
        Self {
            reconciler: self.reconciler.clone(),
            semaphore: self.semaphore.clone(),
        }
    }
}

impl<S> SyncService<S>
where
    S: ProjectStore + TreeEntryStore + 'static,
{
    pub fn new(reconciler: Arc<TreeReconciler<S>>, max_concurrent: usize) -> Self {
        Self {
            reconciler,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn reconciler(&self) -> &Arc<TreeReconciler<S>> {
        &self.reconciler
    }

    /// Run one pass once a slot is free
    pub async fn sync(&self, project_id: ProjectId) -> Result<SyncOutcome, SyncError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| SyncError::Task("Sync service closed".to_string()))?;
        self.reconciler.sync_project(project_id).await
    }

    /// Queue a pass in the background
    pub fn spawn_sync(&self, project_id: ProjectId) -> JoinHandle<Result<SyncOutcome, SyncError>> {
        let reconciler = self.reconciler.clone();
        let semaphore = self.semaphore.clone();
        tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| SyncError::Task("Sync service closed".to_string()))?;
            debug!(project_id, "Sync slot acquired");
            reconciler.sync_project(project_id).await
        })
    }

    /// Run passes for a batch of projects; results keep the input order.
    ///
    /// Lock entries left idle by the batch are dropped once it completes.
    pub async fn sync_many(
        &self,
        project_ids: &[ProjectId],
    ) -> Vec<(ProjectId, Result<SyncOutcome, SyncError>)> {
        let handles: Vec<_> = project_ids
            .iter()
            .map(|&id| self.spawn_sync(id))
            .collect();

        let results = join_all(handles)
            .await
            .into_iter()
            .zip(project_ids.iter().copied())
            .map(|(joined, id)| {
                let result = joined.unwrap_or_else(|e| Err(SyncError::Task(e.to_string())));
                (id, result)
            })
            .collect();

        let pruned = self.reconciler.prune_locks();
        debug!(pruned, "Pruned idle sync locks");
        results
    }

    /// Run passes for every stored project
    pub async fn sync_all(&self) -> Result<Vec<(ProjectId, Result<SyncOutcome, SyncError>)>, SyncError> {
        let ids: Vec<ProjectId> = self
            .reconciler
            .store()
            .list_projects()?
            .into_iter()
            .map(|p| p.id)
            .collect();
        info!(projects = ids.len(), "Syncing all projects");
        Ok(self.sync_many(&ids).await)
    }
}
