//! Checkpoint round trips through a real directory on disk

use idmesh_directory::{CheckpointStore, DirectoryStore, checkpoint::BY_IDENTIFIER_FILE};

fn populated_store() -> DirectoryStore {
    let store = DirectoryStore::new();
    store
        .create("alice", "Alice A", vec![0, 1, 2, 255])
        .unwrap();
    store.create("bob", "Bob B", b"bob-hash".to_vec()).unwrap();
    store
        .create("carol@corp", "Carol C", Vec::new())
        .unwrap();
    store
}

#[test]
fn test_checkpoint_round_trips_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoints = CheckpointStore::new(dir.path());
    let store = populated_store();
    let snapshot = store.snapshot();

    checkpoints.save(&snapshot).unwrap();

    let restored = DirectoryStore::new();
    restored.restore(checkpoints.load().unwrap().unwrap());
    assert_eq!(restored.snapshot(), snapshot);

    let alice = restored.lookup("alice").unwrap();
    assert_eq!(alice.credential_hash, vec![0, 1, 2, 255]);
    assert_eq!(alice, store.lookup("alice").unwrap());
}

#[test]
fn test_checkpoint_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoints = CheckpointStore::new(dir.path());
    let store = populated_store();

    checkpoints.save(&store.snapshot()).unwrap();
    let first = checkpoints.load().unwrap().unwrap();
    checkpoints.save(&store.snapshot()).unwrap();
    let second = checkpoints.load().unwrap().unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_checkpoint_replaces_previous() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoints = CheckpointStore::new(dir.path()).without_sync();
    let store = populated_store();
    checkpoints.save(&store.snapshot()).unwrap();

    assert!(store.delete("bob", b"bob-hash"));
    assert!(store.modify("alice", "alicia", &[0, 1, 2, 255]));
    checkpoints.save(&store.snapshot()).unwrap();

    let loaded = checkpoints.load().unwrap().unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(loaded.by_login_name.contains_key("alicia"));
    assert!(!loaded.by_login_name.contains_key("bob"));
    assert!(loaded.is_consistent());
}

#[test]
fn test_checkpoint_loadable_from_other_location() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = populated_store().snapshot();
    CheckpointStore::new(dir.path().join("node-a"))
        .save(&snapshot)
        .unwrap();

    let copy = dir.path().join("node-b");
    std::fs::create_dir_all(&copy).unwrap();
    for entry in std::fs::read_dir(dir.path().join("node-a")).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), copy.join(entry.file_name())).unwrap();
    }

    assert_eq!(
        CheckpointStore::new(&copy).load().unwrap().unwrap(),
        snapshot
    );
}

#[test]
fn test_interrupted_checkpoint_rebuilds_from_login_names() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoints = CheckpointStore::new(dir.path());
    let store = populated_store();
    checkpoints.save(&store.snapshot()).unwrap();

    std::fs::remove_file(dir.path().join(BY_IDENTIFIER_FILE)).unwrap();

    let loaded = checkpoints.load().unwrap().unwrap();
    assert!(loaded.is_consistent());
    assert_eq!(loaded, store.snapshot());
}
