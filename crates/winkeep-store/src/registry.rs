//! Persistent registry of windows that should be recreated on startup.
//!
//! The registry is a single map stored under [`REGISTRY_KEY`]. The window id
//! counter lives alongside it under [`COUNTER_KEY`]. The main window's entry
//! is never removed.

use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;
use tracing::debug;
use winkeep_ids::{GENERATED_ID_PREFIX, WindowId};

use crate::{
    error::Result,
    kv::{KvStore, KvStoreExt},
    state::{WindowMetadata, now_rfc3339},
};

/// Store key holding the registry map.
pub const REGISTRY_KEY: &str = "window-registry";
/// Store key holding the last issued window number.
pub const COUNTER_KEY: &str = "window-counter";
/// Key of the list format older versions wrote; never treated as window state.
pub const LEGACY_LIST_KEY: &str = "window-list";

/// Registry contents keyed by window id.
pub type RegistryMap = BTreeMap<WindowId, WindowMetadata>;

/// Summary counts over the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    /// Live windows, as counted by the caller.
    pub active: usize,
    /// Registered windows including main.
    pub registered: usize,
    /// 1 when the main window is registered.
    pub main: usize,
    /// Registered windows other than main.
    pub regular: usize,
    /// The id the next call to [`WindowRegistry::next_window_id`] returns.
    pub next_id: WindowId,
}

/// Typed access to the persisted registry.
#[derive(Clone)]
pub struct WindowRegistry {
    /// Backing store for the map and the counter.
    store: Arc<dyn KvStore>,
}

impl WindowRegistry {
    /// Registry persisted in `store`.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Backing store.
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Full registry map; empty when nothing was stored yet.
    pub fn all(&self) -> Result<RegistryMap> {
        Ok(self.store.get_as(REGISTRY_KEY)?.unwrap_or_default())
    }

    /// Write the whole map back.
    fn save(&self, map: &RegistryMap) -> Result<()> {
        self.store.set_as(REGISTRY_KEY, map)
    }

    /// Add or replace the entry for `id`, stamping its registration time.
    pub fn register(&self, id: &WindowId, mut meta: WindowMetadata) -> Result<()> {
        let mut map = self.all()?;
        meta.id = id.clone();
        meta.registered_at = Some(now_rfc3339());
        map.insert(id.clone(), meta);
        self.save(&map)
    }

    /// Remove `id`. Returns false for the main window, which stays registered.
    pub fn unregister(&self, id: &WindowId) -> Result<bool> {
        if id.is_main() {
            debug!("refusing to unregister main window");
            return Ok(false);
        }
        let mut map = self.all()?;
        if map.remove(id).is_none() {
            return Ok(false);
        }
        self.save(&map)?;
        Ok(true)
    }

    /// Merge `meta` into an existing entry. Returns false when `id` is absent.
    pub fn update(&self, id: &WindowId, meta: WindowMetadata) -> Result<bool> {
        let mut map = self.all()?;
        let Some(entry) = map.get_mut(id) else {
            return Ok(false);
        };
        entry.merge_from(meta);
        entry.id = id.clone();
        self.save(&map)?;
        Ok(true)
    }

    /// Merge into an existing entry, or register a new one.
    pub fn upsert(&self, id: &WindowId, meta: WindowMetadata) -> Result<()> {
        if self.is_registered(id)? {
            self.update(id, meta).map(|_| ())
        } else {
            self.register(id, meta)
        }
    }

    /// Ids of every registered window.
    pub fn all_ids(&self) -> Result<Vec<WindowId>> {
        Ok(self.all()?.into_keys().collect())
    }

    /// True when `id` has an entry.
    pub fn is_registered(&self, id: &WindowId) -> Result<bool> {
        Ok(self.all()?.contains_key(id))
    }

    /// Metadata for `id`.
    pub fn get(&self, id: &WindowId) -> Result<Option<WindowMetadata>> {
        Ok(self.all()?.remove(id))
    }

    /// Last issued generated-id number.
    fn counter(&self) -> Result<u64> {
        Ok(self.store.get_as::<u64>(COUNTER_KEY)?.unwrap_or(0))
    }

    /// Issue a new unique id (`win1`, `win2`, ...) and persist the counter.
    pub fn next_window_id(&self) -> Result<WindowId> {
        let n = self.counter()? + 1;
        self.store.set_as(COUNTER_KEY, &n)?;
        Ok(WindowId::generated(n))
    }

    /// The id [`Self::next_window_id`] would issue, without consuming it.
    pub fn peek_next_id(&self) -> Result<WindowId> {
        Ok(WindowId::generated(self.counter()? + 1))
    }

    /// Summary counts; `active` is supplied by the caller.
    pub fn stats(&self, active: usize) -> Result<RegistryStats> {
        let map = self.all()?;
        let main = usize::from(map.contains_key(&WindowId::main()));
        Ok(RegistryStats {
            active,
            registered: map.len(),
            main,
            regular: map.len() - main,
            next_id: self.peek_next_id()?,
        })
    }
}

/// Delete saved states whose window is no longer registered.
///
/// Only keys that look like generated ids are considered, and the registry's
/// own bookkeeping keys are always kept. Returns the deleted keys.
pub fn cleanup_orphaned_states(
    states: &dyn KvStore,
    registry: &WindowRegistry,
) -> Result<Vec<String>> {
    let registered = registry.all()?;
    let orphans: Vec<String> = states
        .keys()?
        .into_iter()
        .filter(|k| {
            k.starts_with(GENERATED_ID_PREFIX)
                && k != LEGACY_LIST_KEY
                && k != REGISTRY_KEY
                && k != COUNTER_KEY
                && !registered.contains_key(k.as_str())
        })
        .collect();
    for key in &orphans {
        states.delete(key)?;
        debug!(key = %key, "deleted orphaned window state");
    }
    Ok(orphans)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::kv::MemoryStore;

    fn registry() -> WindowRegistry {
        WindowRegistry::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn ids_are_sequential_and_persisted() {
        let reg = registry();
        assert_eq!(reg.peek_next_id().unwrap().as_str(), "win1");
        assert_eq!(reg.next_window_id().unwrap().as_str(), "win1");
        assert_eq!(reg.next_window_id().unwrap().as_str(), "win2");
        let again = WindowRegistry::new(Arc::clone(reg.store()));
        assert_eq!(again.next_window_id().unwrap().as_str(), "win3");
    }

    #[test]
    fn main_is_never_unregistered() {
        let reg = registry();
        let main = WindowId::main();
        reg.register(&main, WindowMetadata::new(main.clone(), "Main"))
            .unwrap();
        assert!(!reg.unregister(&main).unwrap());
        assert!(reg.is_registered(&main).unwrap());
    }

    #[test]
    fn register_stamps_time_and_upsert_merges() {
        let reg = registry();
        let id = WindowId::new("win4");
        reg.register(&id, WindowMetadata::new(id.clone(), "Notes"))
            .unwrap();
        let first = reg.get(&id).unwrap().unwrap();
        assert!(first.registered_at.is_some());

        let mut patch = WindowMetadata::new(id.clone(), "Renamed");
        patch.manual_z_order = Some(3);
        reg.upsert(&id, patch).unwrap();
        let merged = reg.get(&id).unwrap().unwrap();
        assert_eq!(merged.title, "Renamed");
        assert_eq!(merged.manual_z_order, Some(3));
        assert_eq!(merged.registered_at, first.registered_at);
    }

    #[test]
    fn update_of_unknown_id_is_noop() {
        let reg = registry();
        let id = WindowId::new("win9");
        assert!(!reg.update(&id, WindowMetadata::new(id.clone(), "x")).unwrap());
        assert!(reg.all_ids().unwrap().is_empty());
    }

    #[test]
    fn stats_do_not_consume_ids() {
        let reg = registry();
        let main = WindowId::main();
        reg.register(&main, WindowMetadata::new(main.clone(), "Main"))
            .unwrap();
        let id = reg.next_window_id().unwrap();
        reg.register(&id, WindowMetadata::new(id.clone(), "Other"))
            .unwrap();
        let s = reg.stats(1).unwrap();
        assert_eq!((s.active, s.registered, s.main, s.regular), (1, 2, 1, 1));
        assert_eq!(s.next_id.as_str(), "win2");
        assert_eq!(reg.stats(1).unwrap().next_id.as_str(), "win2");
    }

    #[test]
    fn cleanup_removes_only_unregistered_window_states() {
        let reg = registry();
        let kept = WindowId::new("win1");
        reg.register(&kept, WindowMetadata::new(kept.clone(), "Kept"))
            .unwrap();
        let states = MemoryStore::new();
        for key in ["win1", "win2", "window-list", "main", "settings"] {
            states.set(key, json!({})).unwrap();
        }
        let removed = cleanup_orphaned_states(&states, &reg).unwrap();
        assert_eq!(removed, vec!["win2".to_string()]);
        assert_eq!(
            states.keys().unwrap(),
            vec!["main", "settings", "win1", "window-list"]
        );
    }
}
