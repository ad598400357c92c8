//! Serialization of sync passes per project and per working copy.

use crate::types::ProjectId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Hands out one async mutex per key.
///
/// Holders of different keys never contend. Entries stay in the map until
/// [`LockManager::prune`] drops the ones nobody holds or waits on.
#[derive(Debug)]
pub struct LockManager<K> {
    locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

/// A pass holds its project's guard from clone/update through finalize, so
/// two passes (or a pass and a purge) for the same project never interleave.
pub type ProjectLockManager = LockManager<ProjectId>;

/// Keyed by working-copy directory. Projects whose clone URLs share a
/// basename resolve to the same directory and must not update it at once.
pub type WorkingCopyLockManager = LockManager<PathBuf>;

impl<K> Default for LockManager<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> LockManager<K>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: K) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to `key`
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        self.lock_for(key).lock_owned().await
    }

    /// Drop entries nobody holds or waits on; returns how many were dropped
    pub fn prune(&self) -> usize {
        let mut locks = self.locks.lock();
        let before = locks.len();
        // Guards and waiters each keep a clone of the Arc
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }
}
