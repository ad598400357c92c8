//! Folder aggregation
//!
//! Git leaves structurally empty directories behind after checkouts and
//! pulls. To keep them out of the index every directory gets two counters:
//! the number of direct children and the number of regular files anywhere
//! beneath it. Only directories with a non-zero recursive count are worth
//! persisting.
//!
//! Counting runs in two passes: the walked entries are first reduced to
//! stored paths, then the counters are accumulated from those paths into an
//! explicit map. No counter depends on the order entries were walked in.

use crate::error::StorageError;
use crate::tree::path::{self, ROOT};
use crate::tree::walker::Entry;
use std::collections::BTreeMap;
use std::path::Path;

/// Counters for one directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderStats {
    /// Files and directories directly inside this directory
    pub direct_children: u64,
    /// Regular files anywhere beneath this directory
    pub recursive_files: u64,
}

impl FolderStats {
    pub fn has_content(&self) -> bool {
        self.recursive_files > 0
    }
}

/// A walked entry reduced to its stored path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedPath {
    pub path: String,
    pub is_file: bool,
}

/// Per-directory counters keyed by stored directory path
#[derive(Debug, Clone, Default)]
pub struct FolderAggregation {
    folders: BTreeMap<String, FolderStats>,
}

impl FolderAggregation {
    pub fn get(&self, dir: &str) -> Option<&FolderStats> {
        self.folders.get(&path::normalize_dir_path(dir))
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FolderStats)> {
        self.folders.iter()
    }

    /// Directories that qualify as persisted folder entries.
    ///
    /// The root is aggregated but never materialized.
    pub fn materialized(&self) -> impl Iterator<Item = (&String, &FolderStats)> {
        self.folders
            .iter()
            .filter(|(dir, stats)| dir.as_str() != ROOT && stats.has_content())
    }
}

/// Pass one: reduce walked entries to stored paths.
pub fn collect_paths(root: &Path, entries: &[Entry]) -> Result<Vec<WalkedPath>, StorageError> {
    entries
        .iter()
        .map(|entry| {
            Ok(WalkedPath {
                path: path::stored_path(root, entry.path())?,
                is_file: entry.is_file(),
            })
        })
        .collect()
}

/// Pass two: accumulate counters from stored paths.
pub fn aggregate_paths(paths: &[WalkedPath]) -> FolderAggregation {
    let mut folders: BTreeMap<String, FolderStats> = BTreeMap::new();
    folders.insert(ROOT.to_string(), FolderStats::default());

    for walked in paths {
        if !walked.is_file {
            folders.entry(walked.path.clone()).or_default();
        }

        let (parent, _) = path::split_parent(&walked.path);
        folders.entry(parent.clone()).or_default().direct_children += 1;

        if walked.is_file {
            for ancestor in path::ancestors(&parent) {
                folders.entry(ancestor).or_default().recursive_files += 1;
            }
        }
    }

    FolderAggregation { folders }
}

/// Aggregate the walked entries of the working copy at `root`.
pub fn aggregate(root: &Path, entries: &[Entry]) -> Result<FolderAggregation, StorageError> {
    let paths = collect_paths(root, entries)?;
    Ok(aggregate_paths(&paths))
}
