//! Integration tests for the sled-backed index store

use tempfile::TempDir;
use treesync::store::{EntryKey, Project, ProjectStore, SledStore, TreeEntry, TreeEntryStore};
use treesync::types::{EntryKind, ProjectId};

fn entry(project_id: ProjectId, path: &str, name: &str, kind: EntryKind) -> TreeEntry {
    TreeEntry {
        project_id,
        name: name.to_string(),
        path: path.to_string(),
        kind,
        lfs_oid: None,
        size: Some(1),
    }
}

/// Test that projects and entries survive reopening the database
#[test]
fn test_store_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("store");

    {
        let store = SledStore::new(&store_path).unwrap();
        let mut project = Project::new(9, "textures", "git@host:textures.git");
        project.file_tree_commit = Some("deadbeef".to_string());
        store.put_project(&project).unwrap();
        store
            .put_entry(&entry(9, "/maps", "height.exr", EntryKind::File))
            .unwrap();
        store.flush().unwrap();
    }

    let store = SledStore::new(&store_path).unwrap();
    let project = store.require_project(9).unwrap();
    assert_eq!(project.file_tree_commit.as_deref(), Some("deadbeef"));
    assert!(store
        .get_entry(&EntryKey::new(9, "maps", "height.exr"))
        .unwrap()
        .is_some());
}

/// Test that projects never see each other's rows
#[test]
fn test_projects_are_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let store = SledStore::new(temp_dir.path().join("store")).unwrap();
    for id in [1, 256, 257] {
        store.put_project(&Project::new(id, format!("p{}", id), "u")).unwrap();
        store.put_entry(&entry(id, "/", "shared.txt", EntryKind::File)).unwrap();
    }

    assert_eq!(store.list_entries(256).unwrap().len(), 1);
    assert_eq!(store.remove_all_entries(256).unwrap(), 1);
    assert_eq!(store.list_entries(1).unwrap().len(), 1);
    assert_eq!(store.list_entries(257).unwrap().len(), 1);

    assert!(store.remove_project(1).unwrap());
    assert!(store.list_entries(1).unwrap().is_empty());
    assert_eq!(store.list_projects().unwrap().len(), 2);
}

/// Test that children are listed folders first, then by name
#[test]
fn test_list_children_order() {
    let temp_dir = TempDir::new().unwrap();
    let store = SledStore::new(temp_dir.path().join("store")).unwrap();
    store.put_entry(&entry(1, "/", "b.txt", EntryKind::File)).unwrap();
    store.put_entry(&entry(1, "/", "z_dir", EntryKind::Folder)).unwrap();
    store.put_entry(&entry(1, "/", "a.txt", EntryKind::File)).unwrap();
    store.put_entry(&entry(1, "/", "c_dir", EntryKind::Folder)).unwrap();
    store.put_entry(&entry(1, "/c_dir", "inner.txt", EntryKind::File)).unwrap();

    let names: Vec<String> = store
        .list_children(1, "/")
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["c_dir", "z_dir", "a.txt", "b.txt"]);

    let inner = store.list_children(1, "c_dir/").unwrap();
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].name, "inner.txt");
}
