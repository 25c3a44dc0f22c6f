use modeswitch::store::{self, FileStore, PersistedActiveMode, ScopedStore, StateStore};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_missing_file_is_empty_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");

    let store = FileStore::open(&path);
    assert!(store.keys().is_empty());
    assert_eq!(PersistedActiveMode::read(&store), PersistedActiveMode::Absent);
    assert!(!path.exists());
}

#[test]
fn test_values_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");

    let mut store = FileStore::open(&path);
    PersistedActiveMode::Mode("records".to_string())
        .write(&mut store)
        .unwrap();
    store.set("records.records", json!({ "max_line": 3 })).unwrap();

    let reopened = FileStore::open(&path);
    assert_eq!(
        PersistedActiveMode::read(&reopened),
        PersistedActiveMode::Mode("records".to_string())
    );
    assert_eq!(
        reopened.get("records.records"),
        Some(json!({ "max_line": 3 }))
    );
    assert_eq!(
        reopened.keys(),
        vec!["modeswitch.activeMode", "records.records"]
    );
}

#[test]
fn test_file_is_a_json_object() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");

    let mut store = FileStore::open(&path);
    PersistedActiveMode::Disabled.write(&mut store).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let value: Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(value, json!({ "modeswitch.activeMode": "none" }));
}

#[test]
fn test_corrupt_file_starts_empty_and_is_replaced() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");
    fs::write(&path, "{ this is not json").unwrap();

    let mut store = FileStore::open(&path);
    assert!(store.keys().is_empty());

    store.set("position.seen", json!(true)).unwrap();
    let reopened = FileStore::open(&path);
    assert_eq!(reopened.get("position.seen"), Some(json!(true)));
}

#[test]
fn test_non_object_file_starts_empty() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");
    fs::write(&path, "[1, 2, 3]").unwrap();

    let store = FileStore::open(&path);
    assert!(store.keys().is_empty());
}

#[test]
fn test_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("state.json");

    let mut store = FileStore::open(&path);
    store.set("k", json!(1)).unwrap();

    assert!(path.exists());
    assert_eq!(store.path(), path.as_path());
}

#[test]
fn test_remove_missing_key_does_not_write() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");

    let mut store = FileStore::open(&path);
    store.remove("never.set").unwrap();
    assert!(!path.exists());

    store.set("a", json!("b")).unwrap();
    store.remove("a").unwrap();
    assert_eq!(FileStore::open(&path).get("a"), None);
}

#[test]
fn test_scoped_store_on_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");

    let shared = store::shared(FileStore::open(&path));
    let scoped = ScopedStore::new(shared, "line-length");
    scoped.set("limit", &120usize).unwrap();
    assert_eq!(scoped.scope(), "line-length");

    let reopened = FileStore::open(&path);
    assert_eq!(reopened.get("line-length.limit"), Some(json!(120)));

    scoped.remove("limit").unwrap();
    assert_eq!(scoped.get::<usize>("limit"), None);
}

#[test]
fn test_empty_active_mode_reads_as_absent() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");
    fs::write(&path, r#"{ "modeswitch.activeMode": "" }"#).unwrap();

    let store = FileStore::open(&path);
    assert_eq!(PersistedActiveMode::read(&store), PersistedActiveMode::Absent);
}

#[test]
fn test_writes_leave_no_temp_file_behind() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");

    let mut store = FileStore::open(&path);
    store.set("a", json!(1)).unwrap();
    store.set("b", json!(2)).unwrap();

    let names: Vec<String> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["state.json"]);
    assert_eq!(FileStore::open(&path).get("b"), Some(json!(2)));
}
