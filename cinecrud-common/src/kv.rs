//! Key-value storage seam
//!
//! The snapshot store persists through a [`KeyValueStore`]. Two backends:
//! [`MemoryStore`] for tests and ephemeral sessions, [`FileStore`] for the
//! shipped binary (one JSON file per key).

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::{Error, Result};

/// String-keyed, string-valued persistence
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, or `None` when unset
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an unset key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store with an optional byte quota
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys plus values exceed `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota: Some(quota),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| Error::LockPoisoned("memory store read"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::LockPoisoned("memory store write"))?;

        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let used = others + key.len() + value.len();
            if used > quota {
                return Err(Error::QuotaExceeded { used, quota });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::LockPoisoned("memory store write"))?;
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store: each key is a `<encoded key>.json` file under one directory
///
/// Keys may be any non-empty string. Bytes outside `[A-Za-z0-9_-]` are written
/// as `%XX`, so `tmdb_work_my movies` lands in `tmdb_work_my%20movies.json`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(Error::InvalidInput("Storage key must not be empty".to_string()));
        }
        Ok(self.dir.join(format!("{}.json", encode_key(key))))
    }
}

/// File name stem for `key`; distinct keys always map to distinct stems
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let temp_path = path.with_extension("json.tmp");

        // Write to temp file then rename so readers never see a partial value
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        if let Err(err) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::Io(err));
        }

        debug!(key = %key, bytes = value.len(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_get_set_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap(), Some("2".to_string()));

        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_memory_store_quota_rejects_oversized_write() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "12345").unwrap();

        let err = store.set("other", "123456").unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { quota: 10, .. }));

        // Failed write leaves previous contents intact
        assert_eq!(store.get("k").unwrap(), Some("12345".to_string()));
        assert_eq!(store.get("other").unwrap(), None);
    }

    #[test]
    fn test_memory_store_quota_counts_replacement_not_sum() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "123456789").unwrap();
        // Replacing the same key only counts the new value
        store.set("k", "987654321").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("987654321".to_string()));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let tmp = TempDir::new().expect("temp dir");

        let store = FileStore::new(tmp.path()).unwrap();
        store.set("crud_work_movies", "[1,2]").unwrap();
        drop(store);

        let reopened = FileStore::new(tmp.path()).unwrap();
        assert_eq!(
            reopened.get("crud_work_movies").unwrap(),
            Some("[1,2]".to_string())
        );
        assert!(!tmp.path().join("crud_work_movies.json.tmp").exists());
    }

    #[test]
    fn test_file_store_missing_key_is_none() {
        let tmp = TempDir::new().expect("temp dir");
        let store = FileStore::new(tmp.path()).unwrap();
        assert_eq!(store.get("nothing").unwrap(), None);
        store.remove("nothing").unwrap();
    }

    #[test]
    fn test_file_store_accepts_any_collection_name() {
        let tmp = TempDir::new().expect("temp dir");
        let store = FileStore::new(tmp.path()).unwrap();

        store.set("tmdb_work_my movies", "[]").unwrap();
        store.set("tmdb_work_Amélie/2001", "[1]").unwrap();

        assert_eq!(store.get("tmdb_work_my movies").unwrap(), Some("[]".to_string()));
        assert_eq!(store.get("tmdb_work_Amélie/2001").unwrap(), Some("[1]".to_string()));
        assert!(tmp.path().join("tmdb_work_my%20movies.json").exists());

        store.remove("tmdb_work_my movies").unwrap();
        assert_eq!(store.get("tmdb_work_my movies").unwrap(), None);
    }

    #[test]
    fn test_file_store_keeps_path_like_keys_inside_dir() {
        let tmp = TempDir::new().expect("temp dir");
        let dir = tmp.path().join("store");
        let store = FileStore::new(&dir).unwrap();

        store.set("../escape", "x").unwrap();

        assert!(dir.join("%2E%2E%2Fescape.json").exists());
        assert!(!tmp.path().join("escape.json").exists());
        assert!(matches!(store.get(""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_encode_key_is_injective_on_escapes() {
        assert_eq!(encode_key("crud_work_movies"), "crud_work_movies");
        assert_eq!(encode_key("a b"), "a%20b");
        assert_ne!(encode_key("a%20b"), encode_key("a b"));
    }
}
