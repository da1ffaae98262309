//! The key-value contract every persistence backend implements.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::{Error, Result};

/// Minimal synchronous key-value store holding JSON values.
///
/// Writes are visible to subsequent reads on the same instance as soon as the
/// call returns. Implementations must be usable from any thread.
pub trait KvStore: Send + Sync {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// All keys currently present, in ascending order.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Typed helpers layered over [`KvStore`].
pub trait KvStoreExt: KvStore {
    /// Decode the value under `key` into `T`.
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(v) => serde_json::from_value(v)
                .map(Some)
                .map_err(|source| Error::Shape {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Encode `value` and store it under `key`.
    fn set_as<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let v = serde_json::to_value(value).map_err(|source| Error::Shape {
            key: key.to_string(),
            source,
        })?;
        self.set(key, v)
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Stored values.
    map: Mutex<BTreeMap<String, Value>>,
    /// When set, writes and deletes fail with [`Error::Unavailable`].
    fail_writes: AtomicBool,
    /// Number of successful writes.
    writes: Mutex<usize>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle write failure injection.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }

    /// Snapshot of the current contents.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.map.lock().clone()
    }

    /// Fail when writes are disabled.
    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.map.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.check_writable()?;
        self.map.lock().insert(key.to_string(), value);
        *self.writes.lock() += 1;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.map.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.map.lock().keys().cloned().collect())
    }
}
