use super::*;

fn store_in(dir: &tempfile::TempDir) -> FileStore {
    FileStore::new(dir.path().join("nested").join("credentials.json"))
}

#[test]
fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    assert_eq!(store.get("accessToken").unwrap(), None);
}

#[test]
fn set_creates_parent_dirs_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.set("accessToken", "T1").unwrap();
    assert!(store.path().exists());

    let reopened = store_in(&dir);
    assert_eq!(reopened.get("accessToken").unwrap().as_deref(), Some("T1"));
}

#[test]
fn remove_keeps_other_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();
    store.remove("a").unwrap();
    assert_eq!(store.get("a").unwrap(), None);
    assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
}

#[test]
fn remove_without_file_does_not_create_it() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.remove("a").unwrap();
    assert!(!store.path().exists());
}

#[test]
fn corrupt_file_errors_on_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "{not json").unwrap();
    let store = FileStore::new(&path);
    assert!(matches!(store.get("a"), Err(StorageError::Serialize(_))));
}

#[test]
fn corrupt_file_is_replaced_on_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "{not json").unwrap();
    let store = FileStore::new(&path);
    store.set("a", "1").unwrap();
    assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
}

#[test]
fn blank_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "  \n").unwrap();
    let store = FileStore::new(&path);
    assert_eq!(store.get("a").unwrap(), None);
}

#[test]
fn no_temp_file_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    let store = FileStore::new(&path);
    store.set("a", "1").unwrap();
    assert!(!path.with_extension("tmp").exists());
}
