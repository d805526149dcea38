//! Durable key-value storage for the sync queue

use crate::error::SyncError;
use std::collections::HashMap;
use std::fs::{self, rename, File};
use std::io::Write;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// String key-value contract of the local durable store.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), SyncError>;

    fn remove(&mut self, key: &str) -> Result<(), SyncError>;
}

/// In-process store, for tests and hosts that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SyncError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SyncError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SyncError> {
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(value.as_bytes())?;
            file.flush()?;
            file.sync_all()?;
        }

        // Atomic replace
        rename(&temp_path, &path)?;
        tracing::trace!(key, bytes = value.len(), "store entry written");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SyncError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Memory store whose writes to `failing_key` error while `broken` is set.
/// Clones share state, so a test keeps a handle after boxing one.
#[cfg(test)]
#[derive(Clone)]
pub(crate) struct FlakyStore {
    inner: Arc<Mutex<MemoryStore>>,
    failing_key: Option<String>,
    broken: Arc<Mutex<bool>>,
}

#[cfg(test)]
impl FlakyStore {
    pub(crate) fn failing_on(key: Option<&str>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryStore::new())),
            failing_key: key.map(str::to_string),
            broken: Arc::new(Mutex::new(false)),
        }
    }

    pub(crate) fn set_broken(&self, broken: bool) {
        *self.broken.lock().unwrap() = broken;
    }
}

#[cfg(test)]
impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        self.inner.lock().unwrap().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SyncError> {
        let hits = self.failing_key.as_deref().map_or(true, |k| k == key);
        if *self.broken.lock().unwrap() && hits {
            return Err(SyncError::Io(std::io::Error::other("disk full")));
        }
        self.inner.lock().unwrap().set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), SyncError> {
        self.inner.lock().unwrap().remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "[]").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("[]"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = FileStore::new(temp_dir.path()).unwrap();
            store.set("economy_sync_queue", r#"[{"a":1}]"#).unwrap();
        }

        let store = FileStore::new(temp_dir.path()).unwrap();
        assert_eq!(store.get("economy_sync_queue").unwrap().as_deref(), Some(r#"[{"a":1}]"#));
        assert!(!temp_dir.path().join("economy_sync_queue.tmp").exists());
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::new(temp_dir.path()).unwrap();
        store.set("../escape", "x").unwrap();
        assert!(temp_dir.path().join("___escape.json").exists());
        store.remove("../escape").unwrap();
        assert_eq!(store.get("../escape").unwrap(), None);
    }
}
