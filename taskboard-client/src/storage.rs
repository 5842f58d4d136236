/// Persistent key-value storage for session data
///
/// String keys to string values, the same contract as a browser's
/// `localStorage`. [`MemoryStorage`] lives for the process;
/// [`FileStorage`] writes a JSON object to disk after every change.

use crate::error::ClientResult;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait KeyValueStorage: Send {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&mut self, key: &str, value: String) -> ClientResult<()>;

    fn remove_item(&mut self, key: &str) -> ClientResult<()>;

    /// Removes every key
    fn clear(&mut self) -> ClientResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) -> ClientResult<()> {
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> ClientResult<()> {
        self.items.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> ClientResult<()> {
        self.items.clear();
        Ok(())
    }
}

/// Storage backed by a JSON file
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,

    items: BTreeMap<String, String>,
}

impl FileStorage {
    /// Opens the file, starting empty when it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();

        let items = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), keys = items.len(), "Opened session storage");

        Ok(Self { path, items })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, serde_json::to_string_pretty(&self.items)?)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) -> ClientResult<()> {
        self.items.insert(key.to_string(), value);
        self.persist()
    }

    fn remove_item(&mut self, key: &str) -> ClientResult<()> {
        if self.items.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> ClientResult<()> {
        self.items.clear();
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("taskboard-storage-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        assert!(storage.get_item("token").is_none());

        storage.set_item("token", "abc".to_string()).unwrap();
        assert_eq!(storage.get_item("token").as_deref(), Some("abc"));

        storage.remove_item("token").unwrap();
        assert!(storage.is_empty());

        storage.set_item("a", "1".to_string()).unwrap();
        storage.set_item("b", "2".to_string()).unwrap();
        storage.clear().unwrap();
        assert_eq!(storage.len(), 0);
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let path = temp_path();

        let mut storage = FileStorage::open(&path).unwrap();
        assert!(storage.get_item("token").is_none());
        storage.set_item("token", "abc".to_string()).unwrap();
        storage.set_item("userId", "7".to_string()).unwrap();
        drop(storage);

        let mut reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("token").as_deref(), Some("abc"));
        assert_eq!(reopened.get_item("userId").as_deref(), Some("7"));

        reopened.clear().unwrap();
        drop(reopened);
        assert!(FileStorage::open(&path).unwrap().get_item("token").is_none());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_storage_rejects_corrupt_file() {
        let path = temp_path();
        fs::write(&path, "not json").unwrap();

        assert!(FileStorage::open(&path).is_err());

        fs::remove_file(&path).unwrap();
    }
}
