//! Diff between a scanned local tree and the persisted rows of a project.

use crate::store::TreeEntry;
use crate::tree::path;
use crate::tree::{LocalTree, LocalTreeNode};
use crate::types::{EntryKind, ProjectId};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use tracing::warn;

/// Writes needed to bring the index in line with a local tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub creates: Vec<TreeEntry>,
    pub updates: Vec<TreeEntry>,
    pub deletes: Vec<TreeEntry>,
    pub unchanged: usize,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn write_count(&self) -> usize {
        self.creates.len() + self.updates.len() + self.deletes.len()
    }
}

fn to_entry(project_id: ProjectId, node: &LocalTreeNode) -> TreeEntry {
    TreeEntry {
        project_id,
        name: node.name.clone(),
        path: node.path.clone(),
        kind: node.kind,
        lfs_oid: node.lfs_oid.clone(),
        size: node.size,
    }
}

fn differs(existing: &TreeEntry, node: &LocalTreeNode) -> bool {
    existing.kind != node.kind || existing.size != node.size || existing.lfs_oid != node.lfs_oid
}

/// Compute the plan for one pass.
///
/// Rows are matched by (normalized path, name). Rows the walk did not
/// produce are deleted only when they are files whose path is gone from
/// `root`; folder rows are never deleted here. A path that cannot be
/// inspected counts as present.
pub fn plan(
    project_id: ProjectId,
    local: &LocalTree,
    existing: Vec<TreeEntry>,
    root: &Path,
) -> SyncPlan {
    let mut by_key: HashMap<(String, String), TreeEntry> = existing
        .into_iter()
        .map(|entry| ((path::normalize_dir_path(&entry.path), entry.name.clone()), entry))
        .collect();

    let mut plan = SyncPlan::default();
    for node in &local.nodes {
        match by_key.remove(&(node.path.clone(), node.name.clone())) {
            None => plan.creates.push(to_entry(project_id, node)),
            Some(existing) if differs(&existing, node) => {
                plan.updates.push(to_entry(project_id, node))
            }
            Some(_) => plan.unchanged += 1,
        }
    }

    let mut leftovers: Vec<TreeEntry> = by_key.into_values().collect();
    leftovers.sort_by(|a, b| (&a.path, &a.name).cmp(&(&b.path, &b.name)));
    for entry in leftovers {
        if entry.kind != EntryKind::File {
            continue;
        }
        let on_disk = path::local_path(root, &entry.path, &entry.name);
        match std::fs::symlink_metadata(&on_disk) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => plan.deletes.push(entry),
            Err(e) => {
                warn!(path = %on_disk.display(), error = %e, "Cannot inspect indexed file, keeping its row");
            }
        }
    }

    plan
}
