use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Result;

pub const COLLECTION_KEY: &str = "vocab.collection";
pub const PREFS_KEY: &str = "vocab.prefs";
pub const FAVORITES_KEY: &str = "vocab.favorites";

/// Durable key/value text storage.
pub trait Storage {
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// One `<key>.json` file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(tmp, path)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

pub fn save<T: Serialize + ?Sized>(storage: &dyn Storage, key: &str, value: &T) -> Result<()> {
    let text = serde_json::to_string(value)?;
    storage.write(key, &text)?;
    tracing::debug!(key, bytes = text.len(), "saved");
    Ok(())
}

/// Returns `fallback` when the key is missing, unreadable, or corrupt.
pub fn load<T: DeserializeOwned>(storage: &dyn Storage, key: &str, fallback: T) -> T {
    let text = match storage.read(key) {
        Ok(Some(text)) => text,
        Ok(None) => return fallback,
        Err(e) => {
            tracing::warn!(key, error = %e, "could not read stored state, using default");
            return fallback;
        }
    };

    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "stored state is corrupt, using default");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_returns_fallback() {
        let storage = MemoryStorage::default();
        assert_eq!(load(&storage, "nope", vec![1, 2]), vec![1, 2]);
    }

    #[test]
    fn corrupt_text_returns_fallback() {
        let storage = MemoryStorage::default();
        storage.write(PREFS_KEY, "{not json").unwrap();
        assert_eq!(load(&storage, PREFS_KEY, 7u32), 7);
    }

    #[test]
    fn keys_are_independent() {
        let storage = MemoryStorage::default();
        save(&storage, COLLECTION_KEY, &vec!["a"]).unwrap();
        storage.write(FAVORITES_KEY, "garbage").unwrap();

        assert_eq!(load(&storage, COLLECTION_KEY, Vec::<String>::new()), ["a"]);
        assert!(load(&storage, FAVORITES_KEY, Vec::<String>::new()).is_empty());
    }

    #[test]
    fn file_storage_round_trip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.read(COLLECTION_KEY).unwrap(), None);
        save(&storage, COLLECTION_KEY, &[1, 2, 3]).unwrap();
        assert_eq!(load(&storage, COLLECTION_KEY, Vec::<u8>::new()), vec![1, 2, 3]);

        storage.remove(COLLECTION_KEY).unwrap();
        storage.remove(COLLECTION_KEY).unwrap();
        assert_eq!(storage.read(COLLECTION_KEY).unwrap(), None);
    }
}
