//! Shared test utilities for integration tests
//!
//! A scripted working copy that stands in for git, a store wrapper that
//! rejects selected writes, and small filesystem helpers.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use treesync::error::{StorageError, SyncError};
use treesync::git::{Checkout, WorkingCopy};
use treesync::store::{
    EntryKey, Project, ProjectStore, SledStore, TreeEntry, TreeEntryStore,
};
use treesync::types::ProjectId;

/// Working copy at a fixed directory whose commit the test controls
pub struct ScriptedWorkingCopy {
    path: PathBuf,
    commit: Mutex<String>,
    warnings: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedWorkingCopy {
    pub fn new(path: PathBuf, commit: &str) -> Self {
        Self {
            path,
            commit: Mutex::new(commit.to_string()),
            warnings: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_commit(&self, commit: &str) {
        *self.commit.lock() = commit.to_string();
    }

    /// Warnings reported by the next checkout only
    pub fn warn_once(&self, warning: &str) {
        self.warnings.lock().push(warning.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkingCopy for ScriptedWorkingCopy {
    fn working_copy_path(&self, _project: &Project) -> Result<PathBuf, SyncError> {
        Ok(self.path.clone())
    }

    async fn ensure_up_to_date(&self, _project: &Project) -> Result<Checkout, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Checkout {
            path: self.path.clone(),
            commit: self.commit.lock().clone(),
            warnings: std::mem::take(&mut *self.warnings.lock()),
        })
    }
}

/// Sled store that counts writes and fails entry writes for chosen names
pub struct FlakyStore {
    inner: SledStore,
    failing_names: Mutex<HashSet<String>>,
    entry_writes: AtomicUsize,
    entry_reads: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: SledStore) -> Self {
        Self {
            inner,
            failing_names: Mutex::new(HashSet::new()),
            entry_writes: AtomicUsize::new(0),
            entry_reads: AtomicUsize::new(0),
        }
    }

    pub fn fail_writes_for(&self, name: &str) {
        self.failing_names.lock().insert(name.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing_names.lock().clear();
    }

    pub fn entry_writes(&self) -> usize {
        self.entry_writes.load(Ordering::SeqCst)
    }

    pub fn entry_reads(&self) -> usize {
        self.entry_reads.load(Ordering::SeqCst)
    }

    fn check(&self, name: &str) -> Result<(), StorageError> {
        self.entry_writes.fetch_add(1, Ordering::SeqCst);
        if self.failing_names.lock().contains(name) {
            return Err(StorageError::InvalidPath(format!("rejected write for {}", name)));
        }
        Ok(())
    }
}

impl ProjectStore for FlakyStore {
    fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError> {
        self.inner.get_project(id)
    }

    fn put_project(&self, project: &Project) -> Result<(), StorageError> {
        self.inner.put_project(project)
    }

    fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        self.inner.list_projects()
    }

    fn remove_project(&self, id: ProjectId) -> Result<bool, StorageError> {
        self.inner.remove_project(id)
    }
}

impl TreeEntryStore for FlakyStore {
    fn get_entry(&self, key: &EntryKey) -> Result<Option<TreeEntry>, StorageError> {
        self.inner.get_entry(key)
    }

    fn put_entry(&self, entry: &TreeEntry) -> Result<(), StorageError> {
        self.check(&entry.name)?;
        self.inner.put_entry(entry)
    }

    fn remove_entry(&self, key: &EntryKey) -> Result<bool, StorageError> {
        self.check(&key.name)?;
        self.inner.remove_entry(key)
    }

    fn list_entries(&self, project_id: ProjectId) -> Result<Vec<TreeEntry>, StorageError> {
        self.entry_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.list_entries(project_id)
    }

    fn remove_all_entries(&self, project_id: ProjectId) -> Result<usize, StorageError> {
        self.inner.remove_all_entries(project_id)
    }
}

pub fn write_file(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

pub fn lfs_pointer(oid: &str, size: u64) -> String {
    format!(
        "version https://git-lfs.github.com/spec/v1\noid sha256:{}\nsize {}\n",
        oid, size
    )
}

/// Entries of a project as (full path, size) pairs
pub fn snapshot<S: TreeEntryStore + ?Sized>(
    store: &S,
    project_id: ProjectId,
) -> Vec<(String, Option<u64>)> {
    store
        .list_entries(project_id)
        .unwrap()
        .into_iter()
        .map(|e| (e.full_path(), e.size))
        .collect()
}
