//! Applies a [`SyncPlan`] as independent writes.

use crate::store::{TreeEntry, TreeEntryStore};
use crate::sync::diff::SyncPlan;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOperation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOperation::Create => write!(f, "create"),
            WriteOperation::Update => write!(f, "update"),
            WriteOperation::Delete => write!(f, "delete"),
        }
    }
}

/// A single entry write that failed; the rest of the pass went on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryWriteFailure {
    pub operation: WriteOperation,
    pub path: String,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyResult {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failures: Vec<EntryWriteFailure>,
}

fn record_failure(
    failures: &mut Vec<EntryWriteFailure>,
    operation: WriteOperation,
    entry: &TreeEntry,
    error: impl fmt::Display,
) {
    warn!(%operation, path = %entry.path, name = %entry.name, error = %error, "Entry write failed");
    failures.push(EntryWriteFailure {
        operation,
        path: entry.path.clone(),
        name: entry.name.clone(),
        error: error.to_string(),
    });
}

/// Run every write in the plan. A failed write never stops the others.
pub fn apply<S>(store: &S, plan: &SyncPlan) -> ApplyResult
where
    S: TreeEntryStore + ?Sized,
{
    let mut result = ApplyResult::default();

    for entry in &plan.creates {
        match store.put_entry(entry) {
            Ok(()) => result.created += 1,
            Err(e) => record_failure(&mut result.failures, WriteOperation::Create, entry, e),
        }
    }

    for entry in &plan.updates {
        match store.put_entry(entry) {
            Ok(()) => result.updated += 1,
            Err(e) => record_failure(&mut result.failures, WriteOperation::Update, entry, e),
        }
    }

    for entry in &plan.deletes {
        match store.remove_entry(&entry.key()) {
            Ok(true) => result.deleted += 1,
            Ok(false) => {
                debug!(path = %entry.path, name = %entry.name, "Entry already gone");
            }
            Err(e) => record_failure(&mut result.failures, WriteOperation::Delete, entry, e),
        }
    }

    result
}
