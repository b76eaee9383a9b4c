use serde_json::json;
use tempfile::tempdir;

use super::*;

struct FullDisk;

impl StorageTier for FullDisk {
    fn label(&self) -> &'static str {
        "full-disk"
    }
    fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }
    fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("no space left".into()))
    }
    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

fn file_store(dir: &std::path::Path) -> (ConfigStore, FileTier) {
    let tier = FileTier::new(dir);
    let store = ConfigStore::new(StorageTiers::new(
        Box::new(tier.clone()),
        Box::new(SessionTier::new()),
    ));
    (store, tier)
}

#[test]
fn absent_config_loads_and_persists_defaults() {
    let dir = tempdir().unwrap();
    let (store, tier) = file_store(dir.path());
    let config = store.load();
    assert_eq!(config, default_config());
    let stored = tier.read(DEFAULT_CONFIG_KEY).unwrap().unwrap();
    assert_eq!(Config::from_json(&stored).unwrap(), default_config());
}

#[test]
fn outdated_config_is_replaced() {
    let dir = tempdir().unwrap();
    let (store, tier) = file_store(dir.path());
    tier.write(DEFAULT_CONFIG_KEY, r#"{"epochs": 3, "config_version": 0}"#)
        .unwrap();
    let config = store.load();
    assert_eq!(config.get("epochs"), Some(&json!(50)));
    assert_eq!(config.stored_version(), f64::from(DEFAULT_CONFIG_VERSION));
}

#[test]
fn malformed_config_is_replaced() {
    let dir = tempdir().unwrap();
    let (store, tier) = file_store(dir.path());
    tier.write(DEFAULT_CONFIG_KEY, "{oops").unwrap();
    assert_eq!(store.load(), default_config());
    let stored = tier.read(DEFAULT_CONFIG_KEY).unwrap().unwrap();
    assert!(Config::from_json(&stored).is_ok());
}

#[test]
fn current_config_is_kept_as_stored() {
    let dir = tempdir().unwrap();
    let (store, tier) = file_store(dir.path());
    tier.write(DEFAULT_CONFIG_KEY, r#"{"epochs": 3, "config_version": 1}"#)
        .unwrap();
    let config = store.load();
    assert_eq!(config.get("epochs"), Some(&json!(3)));
    assert_eq!(config.len(), 2);
}

#[test]
fn save_stamps_version() {
    let store = ConfigStore::in_memory();
    let mut config = Config::from_json(r#"{"epochs": 9}"#).unwrap();
    assert_eq!(store.save(&mut config), SaveOutcome::Primary);
    assert!(config.is_current());
    assert_eq!(store.load().get("epochs"), Some(&json!(9)));
}

#[test]
fn reset_discards_edits() {
    let store = ConfigStore::in_memory();
    let mut config = default_config();
    config.set("epochs", 1);
    store.save(&mut config);
    assert_eq!(store.reset(), default_config());
    assert_eq!(store.load(), default_config());
}

#[test]
fn editor_commit_merges_and_saves() {
    let store = ConfigStore::in_memory();
    let mut current = store.load();
    let mut editor = ConfigEditor::open(&current);
    assert_eq!(editor.pending(), Some(current.clone()));

    editor.set_text(r#"{"epochs": 12, "name": "run-a"}"#);
    let outcome = editor.commit(&store, &mut current).unwrap();
    assert_eq!(outcome, SaveOutcome::Primary);
    assert_eq!(current.get("epochs"), Some(&json!(12)));
    assert_eq!(current.name(), Some("run-a"));
    assert_eq!(current.get("batch"), Some(&json!(16)), "untouched keys survive");
    assert_eq!(store.load(), current);
}

#[test]
fn editor_rejects_invalid_json_without_side_effects() {
    let store = ConfigStore::in_memory();
    let mut current = store.load();
    let before = current.clone();
    let mut editor = ConfigEditor::open(&current);
    editor.set_text("{\"epochs\": ");
    assert!(editor.pending().is_none());
    assert!(editor.commit(&store, &mut current).is_err());
    assert!(editor.error().is_some());
    assert_eq!(current, before);
    assert_eq!(store.load(), before);
}

#[test]
fn editor_applies_in_memory_when_storage_is_full() {
    let store = ConfigStore::new(StorageTiers::new(Box::new(FullDisk), Box::new(FullDisk)));
    let mut current = default_config();
    let mut editor = ConfigEditor::open(&current);
    editor.set_text(r#"{"epochs": 2}"#);
    let outcome = editor.commit(&store, &mut current).unwrap();
    assert_eq!(outcome, SaveOutcome::Failed);
    assert_eq!(current.get("epochs"), Some(&json!(2)));
}

#[test]
fn session_fallback_survives_reload_within_process() {
    let store = ConfigStore::new(StorageTiers::new(
        Box::new(FullDisk),
        Box::new(SessionTier::new()),
    ));
    let mut config = default_config();
    config.set("epochs", 77);
    assert_eq!(store.save(&mut config), SaveOutcome::Session);
    assert_eq!(store.load().get("epochs"), Some(&json!(77)));
}
