//! Project and tree-entry storage
//!
//! The index keeps one [`TreeEntry`] per persisted file or folder of a
//! project, keyed by (project id, normalized parent path, name). Stores are
//! reached through traits so the reconciler does not care what backs them.

pub mod persistence;

pub use persistence::SledStore;

use crate::error::StorageError;
use crate::tree::path;
use crate::types::{EntryKind, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote repository whose file tree is indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub clone_url: String,
    /// Commit the index was last built from; None forces a full resync
    pub file_tree_commit: Option<String>,
    pub file_tree_updated: Option<DateTime<Utc>>,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>, clone_url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            clone_url: clone_url.into(),
            file_tree_commit: None,
            file_tree_updated: None,
        }
    }
}

/// Unique location of an entry within a project
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey {
    pub project_id: ProjectId,
    pub path: String,
    pub name: String,
}

impl EntryKey {
    /// Build a key, normalizing the directory path.
    pub fn new(project_id: ProjectId, path: &str, name: impl Into<String>) -> Self {
        Self {
            project_id,
            path: path::normalize_dir_path(path),
            name: name.into(),
        }
    }
}

/// Persisted index row for one file or folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub project_id: ProjectId,
    pub name: String,
    /// Normalized parent directory
    pub path: String,
    pub kind: EntryKind,
    /// Present only for LFS pointer files
    pub lfs_oid: Option<String>,
    /// Byte size for files, direct child count for folders
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.project_id, &self.path, self.name.clone())
    }

    /// Path of the entry itself, e.g. `/assets/model.fbx`
    pub fn full_path(&self) -> String {
        path::join_stored(&self.path, &self.name)
    }
}

/// Project storage interface
pub trait ProjectStore: Send + Sync {
    fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError>;
    fn put_project(&self, project: &Project) -> Result<(), StorageError>;
    fn list_projects(&self) -> Result<Vec<Project>, StorageError>;

    /// Remove a project and all of its entries. Returns false if absent.
    fn remove_project(&self, id: ProjectId) -> Result<bool, StorageError>;

    /// Fetch a project or fail with `ProjectNotFound`.
    fn require_project(&self, id: ProjectId) -> Result<Project, StorageError> {
        self.get_project(id)?
            .ok_or(StorageError::ProjectNotFound(id))
    }
}

/// Tree entry storage interface
pub trait TreeEntryStore: Send + Sync {
    fn get_entry(&self, key: &EntryKey) -> Result<Option<TreeEntry>, StorageError>;

    /// Insert or replace the entry at its key
    fn put_entry(&self, entry: &TreeEntry) -> Result<(), StorageError>;

    /// Remove the entry at `key`. Returns false if nothing was stored there.
    fn remove_entry(&self, key: &EntryKey) -> Result<bool, StorageError>;

    /// All entries of a project, ordered by (path, name)
    fn list_entries(&self, project_id: ProjectId) -> Result<Vec<TreeEntry>, StorageError>;

    /// Remove every entry of a project. Returns the number removed.
    fn remove_all_entries(&self, project_id: ProjectId) -> Result<usize, StorageError>;

    /// Entries directly inside `dir`, folders first, then by name
    fn list_children(
        &self,
        project_id: ProjectId,
        dir: &str,
    ) -> Result<Vec<TreeEntry>, StorageError> {
        let dir = path::normalize_dir_path(dir);
        let mut children: Vec<TreeEntry> = self
            .list_entries(project_id)?
            .into_iter()
            .filter(|entry| path::normalize_dir_path(&entry.path) == dir)
            .collect();
        children.sort_by(|a, b| {
            let a_rank = a.kind != EntryKind::Folder;
            let b_rank = b.kind != EntryKind::Folder;
            (a_rank, &a.name).cmp(&(b_rank, &b.name))
        });
        Ok(children)
    }
}
