//! Key-value persistence for the exclusion list.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store path: {0}")]
    Xdg(#[from] xdg::BaseDirectoriesError),
}

/// Minimal persistent key-value store.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError>;
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// Store backed by one JSON object file. A missing or unparsable file reads as empty.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default path: `~/.local/state/reptyle/storage.json`.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("reptyle")?;
        // The prefix is already part of the state home.
        Ok(xdg_dirs.get_state_home().join("storage.json"))
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                tracing::warn!(path = %self.path.display(), "store file is not a JSON object; treating as empty");
                Ok(Map::new())
            }
        }
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let mut map = self.read_all()?;
        map.insert(key.to_string(), value.clone());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(map))?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_path_is_one_level_under_state_home() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("XDG_STATE_HOME", dir.path());
        let path = JsonFileStore::default_path().unwrap();
        assert_eq!(path, dir.path().join("reptyle").join("storage.json"));
    }

    #[test]
    fn file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("storage.json"));
        assert!(store.get("anything").unwrap().is_none());
    }

    #[test]
    fn file_store_set_then_get_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("storage.json"));
        store.set("a", &json!([1, 2])).unwrap();
        store.set("b", &json!("x")).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(json!([1, 2])));
        assert_eq!(store.get("b").unwrap(), Some(json!("x")));
    }

    #[test]
    fn file_store_garbage_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, b"not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(store.get("excludedActors").unwrap().is_none());
    }
}
