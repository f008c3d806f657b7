//! Key-value persistence abstraction.
//!
//! The adaptive state (session counters, feedback log, locale) lives
//! behind a small get/set contract so the ranking logic never touches a
//! concrete storage backend. An absent key is the zero state; no schema
//! migration exists.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// Durable JSON key-value storage
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// File-backed store keeping one `<key>.json` per key.
///
/// Writes go to a sibling temp file first and are renamed into place so a
/// reader never observes a half-written value.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Store rooted at the default state directory (~/.leafadvisor/state)
    pub fn open_default() -> Result<Self> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(Self::new(home.join(".leafadvisor").join("state")))
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        let value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file {}", path.display()))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create state directory {}", self.dir.display()))?;
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{key}.json.tmp"));
        let content = serde_json::to_string_pretty(&value)?;
        std::fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write state file {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to replace state file {}", path.display()))?;
        debug!(key = %key, path = %path.display(), "State written");
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("stats").unwrap().is_none());

        store.set("stats", json!({"analyzed": 3})).unwrap();
        let value = store.get("stats").unwrap().unwrap();
        assert_eq!(value["analyzed"], 3);
    }

    #[test]
    fn test_memory_store_overwrites() {
        let store = MemoryStore::new();
        store.set("locale", json!("en")).unwrap();
        store.set("locale", json!("kn")).unwrap();
        assert_eq!(store.get("locale").unwrap().unwrap(), json!("kn"));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf());

        assert!(store.get("feedback").unwrap().is_none());

        store.set("feedback", json!([{"treatmentId": "t1"}])).unwrap();
        let value = store.get("feedback").unwrap().unwrap();
        assert_eq!(value[0]["treatmentId"], "t1");
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonFileStore::new(dir.path().to_path_buf());
            store.set("stats", json!({"analyzed": 7})).unwrap();
        }
        let store = JsonFileStore::new(dir.path().to_path_buf());
        assert_eq!(store.get("stats").unwrap().unwrap()["analyzed"], 7);
    }

    #[test]
    fn test_file_store_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf());
        store.set("stats", json!({})).unwrap();

        assert!(dir.path().join("stats.json").exists());
        assert!(!dir.path().join("stats.json.tmp").exists());
    }

    #[test]
    fn test_file_store_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stats.json"), "{broken").unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf());
        assert!(store.get("stats").is_err());
    }
}
