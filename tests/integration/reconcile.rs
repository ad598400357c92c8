//! End-to-end reconciliation passes against a scripted working copy

use super::test_utils::{lfs_pointer, snapshot, write_file, FlakyStore, ScriptedWorkingCopy};
use std::sync::Arc;
use tempfile::TempDir;
use treesync::config::SyncConfig;
use treesync::store::{Project, ProjectStore, SledStore, TreeEntryStore};
use treesync::sync::{SyncOutcome, SyncReport, TreeReconciler, WriteOperation};
use treesync::types::EntryKind;

struct Harness {
    _temp_dir: TempDir,
    work: std::path::PathBuf,
    store: Arc<FlakyStore>,
    copy: Arc<ScriptedWorkingCopy>,
    reconciler: TreeReconciler<FlakyStore>,
}

fn harness(config: SyncConfig) -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path().join("work");
    std::fs::create_dir_all(&work).unwrap();

    let sled = SledStore::new(temp_dir.path().join("store")).unwrap();
    let store = Arc::new(FlakyStore::new(sled));
    store
        .put_project(&Project::new(1, "assets", "https://example.com/org/assets.git"))
        .unwrap();

    let copy = Arc::new(ScriptedWorkingCopy::new(work.clone(), "c1"));
    let reconciler = TreeReconciler::new(store.clone(), copy.clone(), config);

    Harness {
        _temp_dir: temp_dir,
        work,
        store,
        copy,
        reconciler,
    }
}

fn synced(outcome: SyncOutcome) -> SyncReport {
    match outcome {
        SyncOutcome::Synced(report) => report,
        other => panic!("expected a synced pass, got {:?}", other),
    }
}

fn marker(store: &FlakyStore) -> Option<String> {
    store.get_project(1).unwrap().unwrap().file_tree_commit
}

#[tokio::test]
async fn test_first_pass_indexes_files_and_nonempty_folders() {
    let h = harness(SyncConfig::default());
    write_file(&h.work, "README.md", b"hello");
    write_file(&h.work, "art/hero.psd", lfs_pointer("abc123", 4_000_000).as_bytes());
    std::fs::create_dir_all(h.work.join("art/empty/deeper")).unwrap();
    write_file(&h.work, ".git/HEAD", b"ref: refs/heads/main\n");

    let report = synced(h.reconciler.sync_project(1).await.unwrap());
    assert_eq!(report.created, 3);
    assert!(report.finalized);

    let rows = h.store.list_entries(1).unwrap();
    let names: Vec<String> = rows.iter().map(|e| e.full_path()).collect();
    assert_eq!(names, vec!["/README.md", "/art", "/art/hero.psd"]);

    let hero = rows.iter().find(|e| e.name == "hero.psd").unwrap();
    assert_eq!(hero.kind, EntryKind::File);
    assert_eq!(hero.lfs_oid.as_deref(), Some("abc123"));
    assert_eq!(hero.size, Some(4_000_000));

    let art = rows.iter().find(|e| e.name == "art").unwrap();
    assert_eq!(art.kind, EntryKind::Folder);
    assert_eq!(art.size, Some(2));

    let project = h.store.get_project(1).unwrap().unwrap();
    assert_eq!(project.file_tree_commit.as_deref(), Some("c1"));
    assert!(project.file_tree_updated.is_some());
}

#[tokio::test]
async fn test_same_commit_short_circuits() {
    let h = harness(SyncConfig::default());
    write_file(&h.work, "a.txt", b"a");
    h.reconciler.sync_project(1).await.unwrap();

    let reads = h.store.entry_reads();
    let writes = h.store.entry_writes();
    write_file(&h.work, "b.txt", b"not seen until the commit moves");

    let outcome = h.reconciler.sync_project(1).await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::UpToDate {
            commit: "c1".to_string()
        }
    );
    assert_eq!(h.store.entry_reads(), reads);
    assert_eq!(h.store.entry_writes(), writes);
    assert_eq!(h.copy.calls(), 2);
}

#[tokio::test]
async fn test_create_update_delete_once_each() {
    let h = harness(SyncConfig::default());
    write_file(&h.work, "keep.txt", b"same");
    write_file(&h.work, "grow.txt", b"1");
    write_file(&h.work, "drop.txt", b"bye");
    h.reconciler.sync_project(1).await.unwrap();

    write_file(&h.work, "new.txt", b"fresh");
    write_file(&h.work, "grow.txt", b"123456");
    std::fs::remove_file(h.work.join("drop.txt")).unwrap();
    h.copy.set_commit("c2");

    let report = synced(h.reconciler.sync_project(1).await.unwrap());
    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.previous_commit.as_deref(), Some("c1"));
    assert!(report.failures.is_empty());

    assert_eq!(
        snapshot(h.store.as_ref(), 1),
        vec![
            ("/grow.txt".to_string(), Some(6)),
            ("/keep.txt".to_string(), Some(4)),
            ("/new.txt".to_string(), Some(5)),
        ]
    );
    assert_eq!(marker(&h.store).as_deref(), Some("c2"));
}

#[tokio::test]
async fn test_marker_advances_despite_write_failures() {
    let h = harness(SyncConfig::default());
    write_file(&h.work, "ok.txt", b"ok");
    write_file(&h.work, "broken.txt", b"broken");
    h.store.fail_writes_for("broken.txt");

    let report = synced(h.reconciler.sync_project(1).await.unwrap());
    assert_eq!(report.created, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].operation, WriteOperation::Create);
    assert_eq!(report.failures[0].name, "broken.txt");
    assert!(report.finalized);
    assert_eq!(marker(&h.store).as_deref(), Some("c1"));

    // Same commit: the missing row stays missing until the next commit
    assert!(matches!(
        h.reconciler.sync_project(1).await.unwrap(),
        SyncOutcome::UpToDate { .. }
    ));
}

#[tokio::test]
async fn test_partial_failure_can_hold_the_marker() {
    let config = SyncConfig {
        finalize_on_partial_failure: false,
        ..SyncConfig::default()
    };
    let h = harness(config);
    write_file(&h.work, "broken.txt", b"broken");
    h.store.fail_writes_for("broken.txt");

    let report = synced(h.reconciler.sync_project(1).await.unwrap());
    assert!(!report.finalized);
    assert_eq!(marker(&h.store), None);

    // Next run rescans the same commit and picks the row up
    h.store.clear_failures();
    let report = synced(h.reconciler.sync_project(1).await.unwrap());
    assert_eq!(report.created, 1);
    assert!(report.finalized);
    assert_eq!(marker(&h.store).as_deref(), Some("c1"));
}

#[tokio::test]
async fn test_removed_folder_keeps_its_row() {
    let h = harness(SyncConfig::default());
    write_file(&h.work, "docs/guide.md", b"guide");
    h.reconciler.sync_project(1).await.unwrap();

    std::fs::remove_dir_all(h.work.join("docs")).unwrap();
    h.copy.set_commit("c2");

    let report = synced(h.reconciler.sync_project(1).await.unwrap());
    assert_eq!(report.deleted, 1);

    let rows = h.store.list_entries(1).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, EntryKind::Folder);
    assert_eq!(rows[0].full_path(), "/docs");
}

#[tokio::test]
async fn test_update_warnings_are_reported() {
    let h = harness(SyncConfig::default());
    write_file(&h.work, "a.txt", b"a");
    h.copy.warn_once("`git pull` exited with code 1: no network");

    let report = synced(h.reconciler.sync_project(1).await.unwrap());
    assert_eq!(report.warnings.len(), 1);
    assert!(!report.is_clean());
    assert_eq!(report.created, 1);
}

#[tokio::test]
async fn test_configured_ignore_names_are_not_indexed() {
    let config = SyncConfig {
        ignore: vec![".git".to_string(), "node_modules".to_string()],
        ..SyncConfig::default()
    };
    let h = harness(config);
    write_file(&h.work, "node_modules/pkg/index.js", b"x");
    write_file(&h.work, "src/main.rs", b"fn main() {}");

    h.reconciler.sync_project(1).await.unwrap();
    let paths: Vec<String> = snapshot(h.store.as_ref(), 1)
        .into_iter()
        .map(|(p, _)| p)
        .collect();
    assert_eq!(paths, vec!["/src", "/src/main.rs"]);
}

#[tokio::test]
async fn test_purge_then_full_rebuild() {
    let h = harness(SyncConfig::default());
    write_file(&h.work, "a/b.txt", b"b");
    h.reconciler.sync_project(1).await.unwrap();

    let removed = h.reconciler.purge_all(1).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(marker(&h.store), None);
    assert!(h.work.join("a/b.txt").exists());

    let report = synced(h.reconciler.sync_project(1).await.unwrap());
    assert_eq!(report.created, 2);
}
