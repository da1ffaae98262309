//! winkeep-store: persistence for window geometry and the window registry.
//!
//! Everything is stored as JSON values behind the [`KvStore`] trait. Two
//! stores are normally used: one for per-window [`WindowState`] keyed by
//! window id, and one holding the [`WindowRegistry`] map and id counter.

mod error;
mod file;
mod kv;
mod registry;
mod state;

pub use error::{Error, Result};
pub use file::JsonFileStore;
pub use kv::{KvStore, KvStoreExt, MemoryStore};
pub use registry::{
    COUNTER_KEY, LEGACY_LIST_KEY, REGISTRY_KEY, RegistryMap, RegistryStats, WindowRegistry,
    cleanup_orphaned_states,
};
pub use state::{WindowMetadata, WindowState, now_rfc3339};
