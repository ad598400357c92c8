//! Local tree builder
//!
//! Walks a working copy and produces the in-memory description of every
//! entry that belongs in the index: all files, plus the folders that
//! recursively contain at least one file.

use crate::error::StorageError;
use crate::tree::aggregate::{self, FolderAggregation};
use crate::tree::path;
use crate::tree::pointer::{self, FileClass};
use crate::tree::walker::{Entry, Walker, WalkerConfig};
use crate::types::EntryKind;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// One entry of the local tree, valid for a single sync pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTreeNode {
    /// Normalized parent directory
    pub path: String,
    /// Basename
    pub name: String,
    pub kind: EntryKind,
    pub lfs_oid: Option<String>,
    /// Byte size for files, direct child count for folders
    pub size: Option<u64>,
}

impl LocalTreeNode {
    fn file(path: String, name: String, class: FileClass) -> Self {
        let size = class.size();
        let lfs_oid = match class {
            FileClass::Lfs { oid, .. } => oid,
            FileClass::Plain { .. } => None,
        };
        Self {
            path,
            name,
            kind: EntryKind::File,
            lfs_oid,
            size,
        }
    }

    fn folder(path: String, name: String, direct_children: u64) -> Self {
        Self {
            path,
            name,
            kind: EntryKind::Folder,
            lfs_oid: None,
            size: Some(direct_children),
        }
    }
}

/// Result of scanning a working copy
#[derive(Debug, Clone, Default)]
pub struct LocalTree {
    /// Files and non-empty folders, sorted by (path, name)
    pub nodes: Vec<LocalTreeNode>,
    pub folders: FolderAggregation,
    /// Files that could not be classified and were left out
    pub skipped: usize,
}

impl LocalTree {
    pub fn files(&self) -> impl Iterator<Item = &LocalTreeNode> {
        self.nodes.iter().filter(|n| n.kind == EntryKind::File)
    }

    pub fn folders(&self) -> impl Iterator<Item = &LocalTreeNode> {
        self.nodes.iter().filter(|n| n.kind == EntryKind::Folder)
    }
}

/// Builds a [`LocalTree`] from a working copy on disk
pub struct LocalTreeBuilder {
    root: PathBuf,
    walker_config: Option<WalkerConfig>,
}

impl LocalTreeBuilder {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            walker_config: None,
        }
    }

    /// Set walker config (ignore names, symlink policy).
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = Some(config);
        self
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn build(&self) -> Result<LocalTree, StorageError> {
        let start = Instant::now();

        let root = path::canonicalize_path(&self.root)?;
        let walker = match &self.walker_config {
            Some(config) => Walker::with_config(root.clone(), config.clone()),
            None => Walker::new(root.clone()),
        };
        let entries = walker.walk()?;
        debug!(entry_count = entries.len(), "Walked working copy");

        let mut nodes = Vec::new();
        let mut unreadable = HashSet::new();

        for entry in &entries {
            let Entry::File {
                path: file_path,
                size,
                symlink,
            } = entry
            else {
                continue;
            };

            let stored = path::stored_path(&root, file_path)?;
            let (parent, name) = path::split_parent(&stored);

            let class = if *symlink {
                FileClass::Plain { size: *size }
            } else {
                match pointer::detect(file_path) {
                    Ok(class) => class,
                    Err(e) => {
                        warn!(path = %file_path.display(), error = %e, "Skipping unreadable file");
                        unreadable.insert(file_path.clone());
                        continue;
                    }
                }
            };

            nodes.push(LocalTreeNode::file(parent, name, class));
        }

        // Skipped files count neither as content nor as children
        let skipped = unreadable.len();
        let kept: Vec<Entry> = entries
            .into_iter()
            .filter(|entry| !unreadable.contains(entry.path()))
            .collect();
        let folders = aggregate::aggregate(&root, &kept)?;

        for (dir, stats) in folders.materialized() {
            let (parent, name) = path::split_parent(dir);
            nodes.push(LocalTreeNode::folder(parent, name, stats.direct_children));
        }

        nodes.sort_by(|a, b| (&a.path, &a.name).cmp(&(&b.path, &b.name)));

        info!(
            node_count = nodes.len(),
            folder_count = folders.len(),
            skipped,
            duration_ms = start.elapsed().as_millis(),
            "Local tree built"
        );

        Ok(LocalTree {
            nodes,
            folders,
            skipped,
        })
    }
}
