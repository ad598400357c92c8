//! Sled-backed persistence for projects and tree entries

use crate::error::StorageError;
use crate::store::{EntryKey, Project, ProjectStore, TreeEntry, TreeEntryStore};
use crate::types::ProjectId;
use std::path::Path;

const PROJECTS_TREE: &str = "projects";
const ENTRIES_TREE: &str = "entries";

/// Sled-based implementation of [`ProjectStore`] and [`TreeEntryStore`]
///
/// Projects are keyed by their big-endian id. Entries are keyed by
/// `id ‖ path ‖ 0x00 ‖ name`, which makes (project, path, name) unique and
/// lets a prefix scan enumerate one project in (path, name) order.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
    projects: sled::Tree,
    entries: sled::Tree,
}

impl SledStore {
    /// Open (or create) a store at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)
            .map_err(|e| StorageError::database("Failed to open sled database", e))?;
        Self::from_db(db)
    }

    /// Wrap an already opened database
    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let projects = db
            .open_tree(PROJECTS_TREE)
            .map_err(|e| StorageError::database("Failed to open projects tree", e))?;
        let entries = db
            .open_tree(ENTRIES_TREE)
            .map_err(|e| StorageError::database("Failed to open entries tree", e))?;
        Ok(Self {
            db,
            projects,
            entries,
        })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| StorageError::database("Failed to flush database", e))?;
        Ok(())
    }

    fn project_key(id: ProjectId) -> [u8; 8] {
        id.to_be_bytes()
    }

    fn entry_key(key: &EntryKey) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + key.path.len() + 1 + key.name.len());
        bytes.extend_from_slice(&key.project_id.to_be_bytes());
        bytes.extend_from_slice(key.path.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(key.name.as_bytes());
        bytes
    }

    fn decode_entry(value: &[u8]) -> Result<TreeEntry, StorageError> {
        bincode::deserialize(value)
            .map_err(|e| StorageError::codec("Failed to deserialize tree entry", e))
    }
}

impl ProjectStore for SledStore {
    fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError> {
        match self
            .projects
            .get(Self::project_key(id))
            .map_err(|e| StorageError::database("Failed to get project", e))?
        {
            Some(value) => {
                let project: Project = bincode::deserialize(&value)
                    .map_err(|e| StorageError::codec("Failed to deserialize project", e))?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    fn put_project(&self, project: &Project) -> Result<(), StorageError> {
        let value = bincode::serialize(project)
            .map_err(|e| StorageError::codec("Failed to serialize project", e))?;
        self.projects
            .insert(Self::project_key(project.id), value)
            .map_err(|e| StorageError::database("Failed to put project", e))?;
        Ok(())
    }

    fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        let mut projects = Vec::new();
        for item in self.projects.iter() {
            let (_, value) =
                item.map_err(|e| StorageError::database("Failed to iterate projects", e))?;
            let project: Project = bincode::deserialize(&value)
                .map_err(|e| StorageError::codec("Failed to deserialize project", e))?;
            projects.push(project);
        }
        Ok(projects)
    }

    fn remove_project(&self, id: ProjectId) -> Result<bool, StorageError> {
        self.remove_all_entries(id)?;
        let removed = self
            .projects
            .remove(Self::project_key(id))
            .map_err(|e| StorageError::database("Failed to remove project", e))?;
        Ok(removed.is_some())
    }
}

impl TreeEntryStore for SledStore {
    fn get_entry(&self, key: &EntryKey) -> Result<Option<TreeEntry>, StorageError> {
        match self
            .entries
            .get(Self::entry_key(key))
            .map_err(|e| StorageError::database("Failed to get tree entry", e))?
        {
            Some(value) => Ok(Some(Self::decode_entry(&value)?)),
            None => Ok(None),
        }
    }

    fn put_entry(&self, entry: &TreeEntry) -> Result<(), StorageError> {
        let value = bincode::serialize(entry)
            .map_err(|e| StorageError::codec("Failed to serialize tree entry", e))?;
        self.entries
            .insert(Self::entry_key(&entry.key()), value)
            .map_err(|e| StorageError::database("Failed to put tree entry", e))?;
        Ok(())
    }

    fn remove_entry(&self, key: &EntryKey) -> Result<bool, StorageError> {
        let removed = self
            .entries
            .remove(Self::entry_key(key))
            .map_err(|e| StorageError::database("Failed to remove tree entry", e))?;
        Ok(removed.is_some())
    }

    fn list_entries(&self, project_id: ProjectId) -> Result<Vec<TreeEntry>, StorageError> {
        let mut entries = Vec::new();
        for item in self.entries.scan_prefix(Self::project_key(project_id)) {
            let (_, value) =
                item.map_err(|e| StorageError::database("Failed to iterate tree entries", e))?;
            entries.push(Self::decode_entry(&value)?);
        }
        Ok(entries)
    }

    fn remove_all_entries(&self, project_id: ProjectId) -> Result<usize, StorageError> {
        let mut batch = sled::Batch::default();
        let mut count = 0;
        for item in self.entries.scan_prefix(Self::project_key(project_id)) {
            let (key, _) =
                item.map_err(|e| StorageError::database("Failed to iterate tree entries", e))?;
            batch.remove(key);
            count += 1;
        }
        self.entries
            .apply_batch(batch)
            .map_err(|e| StorageError::database("Failed to apply batch", e))?;
        Ok(count)
    }
}
