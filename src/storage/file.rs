//! Persistent storage backed by a JSON object on disk.

use anyhow::{Context, Result, anyhow};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::Storage;

/// Default file name inside the storage directory.
pub const STORAGE_FILE: &str = "storage.json";

/// Persistent key-value storage.
///
/// The whole map is rewritten on every mutation; writes go to a sibling
/// temporary file first and are renamed into place. A missing file reads as
/// an empty storage, and `clear` removes the file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Storage located at `<dir>/storage.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse storage file {}", self.path.display()))
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).context("Failed to write storage file")?;
        fs::rename(&tmp, &self.path).context("Failed to move storage file into place")?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("Storage lock poisoned"))?;
        let mut entries = self.load()?;
        f(&mut entries);
        self.save(&entries)
    }
}

impl Storage for FileStorage {
    #[tracing::instrument(skip(self))]
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("Storage lock poisoned"))?;
        Ok(self.load()?.remove(key))
    }

    #[tracing::instrument(skip(self, value))]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|e| {
            e.insert(key.to_string(), value.to_string());
        })
    }

    #[tracing::instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<()> {
        self.update(|e| {
            e.remove(key);
        })
    }

    #[tracing::instrument(skip(self))]
    fn clear(&self) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("Storage lock poisoned"))?;
        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to remove storage file")?;
            debug!("Cleared persistent storage at {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_empty() -> Result<()> {
        let dir = tempdir()?;
        let storage = FileStorage::in_dir(dir.path());
        assert_eq!(storage.get("token")?, None);
        assert!(!storage.path().exists());
        Ok(())
    }

    #[test]
    fn test_values_survive_new_instance() -> Result<()> {
        let dir = tempdir()?;
        FileStorage::in_dir(dir.path()).set("token", "abc123")?;

        let reopened = FileStorage::in_dir(dir.path());
        assert_eq!(reopened.get("token")?, Some("abc123".to_string()));
        Ok(())
    }

    #[test]
    fn test_creates_parent_directories() -> Result<()> {
        let dir = tempdir()?;
        let storage = FileStorage::in_dir(&dir.path().join("nested").join("deeper"));
        storage.set("k", "v")?;
        assert!(storage.path().exists());
        Ok(())
    }

    #[test]
    fn test_remove_keeps_other_keys() -> Result<()> {
        let dir = tempdir()?;
        let storage = FileStorage::in_dir(dir.path());
        storage.set("token", "abc")?;
        storage.set("org", "default")?;

        storage.remove("token")?;

        assert_eq!(storage.get("token")?, None);
        assert_eq!(storage.get("org")?, Some("default".to_string()));
        Ok(())
    }

    #[test]
    fn test_clear_removes_file_and_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let storage = FileStorage::in_dir(dir.path());
        storage.set("token", "abc")?;

        storage.clear()?;
        assert!(!storage.path().exists());
        assert_eq!(storage.get("token")?, None);

        storage.clear()?;
        Ok(())
    }

    #[test]
    fn test_corrupt_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let storage = FileStorage::in_dir(dir.path());
        fs::write(storage.path(), "not json")?;

        let err = storage.get("token").unwrap_err();
        assert!(err.to_string().contains("Failed to parse storage file"));
        Ok(())
    }
}
