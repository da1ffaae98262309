//! JSON-file backed store.
//!
//! The whole store is one JSON object on disk. Every mutation rewrites the
//! file through a sibling temporary file followed by a rename, so a crash
//! mid-write leaves either the old or the new contents.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    kv::KvStore,
};

/// Store persisted as a single JSON object file.
#[derive(Debug)]
pub struct JsonFileStore {
    /// Destination file.
    path: PathBuf,
    /// In-memory mirror of the file contents.
    cache: Mutex<BTreeMap<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file yields an empty store; the
    /// file is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| Error::Malformed {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "store file missing; starting empty");
                BTreeMap::new()
            }
            Err(source) => return Err(Error::Io { path, source }),
        };
        Ok(Self {
            path,
            cache: Mutex::new(cache),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling path writes are staged in.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Attach this store's path to an I/O error.
    fn io_err(&self, source: io::Error) -> Error {
        Error::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Write `contents` to disk, replacing the file atomically.
    fn persist(&self, contents: &BTreeMap<String, Value>) -> Result<()> {
        let text = serde_json::to_string_pretty(contents).map_err(|source| Error::Shape {
            key: String::new(),
            source,
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, text).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        trace!(path = %self.path.display(), keys = contents.len(), "store persisted");
        Ok(())
    }

    /// Apply `f` to a copy of the contents, persist it, then commit it to the
    /// cache. The cache is untouched when persisting fails.
    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, Value>)) -> Result<()> {
        let mut cache = self.cache.lock();
        let mut next = cache.clone();
        f(&mut next);
        self.persist(&next)?;
        *cache = next;
        Ok(())
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.cache.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.mutate(|m| {
            m.insert(key.to_string(), value);
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        if !self.cache.lock().contains_key(key) {
            return Ok(());
        }
        self.mutate(|m| {
            m.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.cache.lock().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_file_starts_empty_and_is_created_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("window-state.json");
        let s = JsonFileStore::open(&path).unwrap();
        assert!(s.keys().unwrap().is_empty());
        assert!(!path.exists());

        s.set("win1", json!({"x": 10})).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("nested").join("window-state.json.tmp").exists());
    }

    #[test]
    fn contents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        {
            let s = JsonFileStore::open(&path).unwrap();
            s.set("a", json!(1)).unwrap();
            s.set("b", json!("two")).unwrap();
            s.delete("a").unwrap();
        }
        let s = JsonFileStore::open(&path).unwrap();
        assert_eq!(s.keys().unwrap(), vec!["b".to_string()]);
        assert_eq!(s.get("b").unwrap(), Some(json!("two")));
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(Error::Malformed { .. })
        ));
    }
}
