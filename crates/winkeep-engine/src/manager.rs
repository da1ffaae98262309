//! The window manager: lifecycle, persistence and stacking for every window
//! the application opens.
//!
//! All public methods are synchronous and safe to call from the host's event
//! thread. Delayed work (debounced saves, stack re-assertion, staggered focus)
//! runs on the ambient tokio runtime when there is one and inline otherwise.
//! Internal state is snapshotted under a short lock; host and store calls are
//! made after the lock is released.

use std::{
    cmp::Reverse,
    collections::BTreeMap,
    sync::{Arc, Weak},
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{runtime::Handle, sync::broadcast, time};
use tracing::{debug, info, trace, warn};
use winkeep_config::ManagerCfg;
use winkeep_geom::{
    BoundsReconciler, BoundsRequest, Display, DisplayId, Rect, RestorePlan, SnapDetector,
    display_matching,
};
use winkeep_ids::WindowId;
use winkeep_store::{
    KvStore, KvStoreExt, RegistryStats, WindowMetadata, WindowRegistry, WindowState, now_rfc3339,
};

use crate::{
    error::{Error, Result},
    host::{CreateOptions, WindowEvent, WindowHandle, WindowHost},
    report::{DisplaySummary, RelativePosition, WindowFlags, WindowSummary, ZOrderInfo},
    scheduler::PersistenceScheduler,
    stack::{
        MANUAL_DEFAULT, MANUAL_MAX, MANUAL_MIN, Priority, StackOrderController, normalize_manual,
    },
};

/// Horizontal and vertical step between cascaded new windows.
const CASCADE_STEP: i32 = 30;
/// Cascade origin offset from the display's top-left corner.
const CASCADE_OFFSET: i32 = 50;
/// Windows per cascade row.
const CASCADE_ROW: usize = 5;

/// Notices buffered per subscriber.
const NOTICE_CAPACITY: usize = 64;

/// Options for [`WindowManager::create_or_restore_window`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WindowOptions {
    /// Requested bounds. Used only when the window has no saved position.
    pub bounds: BoundsRequest,
    /// Display for a new window; the primary display when absent.
    pub display_id: Option<DisplayId>,
    /// Manual stacking band. Overrides the band stored in metadata.
    pub manual_z_order: Option<i64>,
}

/// Broadcast when the set of windows or their summaries change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// The window list or a window's summary changed.
    WindowListChanged,
}

/// Geometry to apply once the host reports the window ready.
#[derive(Clone, Copy, Debug)]
struct PendingRestore {
    /// What to do with the saved geometry.
    plan: RestorePlan,
    /// Saved normal bounds, applied before maximizing.
    normal: Option<Rect>,
    /// Saved menu bar visibility.
    menu_bar_visible: Option<bool>,
}

/// A window the manager created.
struct Managed {
    /// Native window.
    handle: Arc<dyn WindowHandle>,
    /// In-memory metadata, written to the registry on save.
    meta: WindowMetadata,
    /// Restore waiting for `ReadyToShow`.
    pending: Option<PendingRestore>,
}

/// State guarded by the manager lock.
#[derive(Default)]
struct Shared {
    /// Managed windows by id. Destroyed handles linger until `Closed`.
    windows: BTreeMap<WindowId, Managed>,
    /// Ranks and bands.
    stack: StackOrderController,
    /// Set once the application starts quitting.
    quitting: bool,
}

/// Shared core behind every [`WindowManager`] clone.
struct Inner {
    /// Toolkit adapter.
    host: Arc<dyn WindowHost>,
    /// Window geometry store.
    states: Arc<dyn KvStore>,
    /// Window metadata and id counter.
    registry: WindowRegistry,
    /// Tunables.
    cfg: ManagerCfg,
    /// Snap classification for saves.
    detector: SnapDetector,
    /// Placement for new and restored windows.
    reconciler: BoundsReconciler,
    /// Save cadence.
    scheduler: PersistenceScheduler,
    /// Mutable state.
    shared: Mutex<Shared>,
    /// Change notifications.
    notices: broadcast::Sender<Notice>,
}

/// One live window as seen at snapshot time.
struct Entry {
    /// Window id.
    id: WindowId,
    /// Native window.
    handle: Arc<dyn WindowHandle>,
    /// Metadata copy.
    meta: WindowMetadata,
    /// Effective priority at snapshot time.
    priority: Priority,
}

/// Position of the `index`-th cascaded window, cycling through `displays`.
#[must_use]
pub fn cascade_origin(index: usize, displays: &[Display]) -> Option<(DisplayId, i32, i32)> {
    if displays.is_empty() {
        return None;
    }
    let d = &displays[index % displays.len()];
    let col = i32::try_from(index % CASCADE_ROW).unwrap_or(0);
    let row = i32::try_from(index / CASCADE_ROW).unwrap_or(0);
    Some((
        d.id,
        d.bounds.x + CASCADE_OFFSET + col * CASCADE_STEP,
        d.bounds.y + CASCADE_OFFSET + row * CASCADE_STEP,
    ))
}

/// Live flags of `handle`.
fn flags(handle: &dyn WindowHandle) -> WindowFlags {
    WindowFlags {
        is_maximized: handle.is_maximized(),
        is_full_screen: handle.is_full_screen(),
        is_minimized: handle.is_minimized(),
        is_visible: handle.is_visible(),
    }
}

/// Owns every managed window. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct WindowManager {
    /// Shared core.
    inner: Arc<Inner>,
}

impl WindowManager {
    /// Build a manager over `host`, saving geometry into `states` and window
    /// metadata into `registry_store`. The two stores may be the same.
    pub fn new(
        host: Arc<dyn WindowHost>,
        states: Arc<dyn KvStore>,
        registry_store: Arc<dyn KvStore>,
        cfg: ManagerCfg,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                host,
                states,
                registry: WindowRegistry::new(registry_store),
                detector: cfg.snap_detector(),
                reconciler: cfg.reconciler(),
                scheduler: PersistenceScheduler::new(cfg.debounce()),
                cfg,
                shared: Mutex::new(Shared::default()),
                notices,
            }),
        }
    }

    /// Rebuild a manager from a task's weak reference.
    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Configuration the manager was built with.
    pub fn config(&self) -> &ManagerCfg {
        &self.inner.cfg
    }

    /// The window registry.
    pub fn registry(&self) -> &WindowRegistry {
        &self.inner.registry
    }

    /// Subscribe to change notices.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    /// Broadcast a list change. No subscribers is fine.
    fn notify(&self) {
        // No receivers is fine.
        self.inner.notices.send(Notice::WindowListChanged).ok();
    }

    /// Live handle for `id`. Destroyed windows count as absent.
    pub fn window(&self, id: &WindowId) -> Option<Arc<dyn WindowHandle>> {
        let handle = self
            .inner
            .shared
            .lock()
            .windows
            .get(id)
            .map(|m| Arc::clone(&m.handle))?;
        (!handle.is_destroyed()).then_some(handle)
    }

    /// Ids of all live windows, in id order.
    pub fn live_ids(&self) -> Vec<WindowId> {
        self.entries().into_iter().map(|e| e.id).collect()
    }

    /// In-memory metadata for a live window.
    pub fn metadata(&self, id: &WindowId) -> Option<WindowMetadata> {
        self.inner
            .shared
            .lock()
            .windows
            .get(id)
            .map(|m| m.meta.clone())
    }

    /// Effective stacking priority of a managed window.
    pub fn priority(&self, id: &WindowId) -> Option<Priority> {
        let shared = self.inner.shared.lock();
        shared
            .windows
            .contains_key(id)
            .then(|| shared.stack.priority(id))
    }

    /// True while a debounced save for `id` is waiting.
    pub fn save_pending(&self, id: &WindowId) -> bool {
        self.inner.scheduler.pending(id)
    }

    /// Snapshot of live windows in id order.
    fn entries(&self) -> Vec<Entry> {
        let all: Vec<Entry> = {
            let shared = self.inner.shared.lock();
            shared
                .windows
                .iter()
                .map(|(id, m)| Entry {
                    id: id.clone(),
                    handle: Arc::clone(&m.handle),
                    meta: m.meta.clone(),
                    priority: shared.stack.priority(id),
                })
                .collect()
        };
        all.into_iter()
            .filter(|e| !e.handle.is_destroyed())
            .collect()
    }

    /// Saved state for `id`. Read failures are logged and read as absent.
    pub fn saved_state(&self, id: &WindowId) -> Option<WindowState> {
        match self.inner.states.get_as::<WindowState>(id.as_str()) {
            Ok(state) => state,
            Err(e) => {
                warn!(window = %id, error = %e, "failed to read saved window state");
                None
            }
        }
    }

    /// Registry entry for `id`, logging read failures.
    fn stored_metadata(&self, id: &WindowId) -> Option<WindowMetadata> {
        match self.inner.registry.get(id) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(window = %id, error = %e, "failed to read window registry");
                None
            }
        }
    }

    /// Write `meta` to the registry. Returns false on failure.
    fn store_metadata(&self, id: &WindowId, meta: WindowMetadata) -> bool {
        match self.inner.registry.upsert(id, meta) {
            Ok(()) => true,
            Err(e) => {
                warn!(window = %id, error = %e, "failed to save window metadata");
                false
            }
        }
    }

    /// Run `f` after `delay` if the manager is still alive, or inline when
    /// there is no runtime.
    fn after<F>(&self, delay: Duration, f: F)
    where
        F: FnOnce(&Self) + Send + 'static,
    {
        let Ok(rt) = Handle::try_current() else {
            f(self);
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        rt.spawn(async move {
            time::sleep(delay).await;
            if let Some(manager) = Self::upgrade(&weak) {
                f(&manager);
            }
        });
    }

    /// Restack after `delay`.
    fn schedule_enforce(&self, delay: Duration) {
        self.after(delay, |m| {
            m.enforce_hierarchy();
        });
    }

    // ----- lifecycle -----

    /// Create the window for `id`, or return the existing live one.
    ///
    /// With saved state the window is created at a placeholder and the saved
    /// geometry is applied when the host reports [`WindowEvent::ReadyToShow`].
    /// Without it, the window gets safe bounds derived from
    /// `options.bounds`. The window is registered either way.
    pub fn create_or_restore_window(
        &self,
        id: WindowId,
        options: WindowOptions,
        meta: WindowMetadata,
    ) -> Arc<dyn WindowHandle> {
        if let Some(existing) = self.window(&id) {
            debug!(window = %id, "window already live");
            return existing;
        }

        let saved = self.saved_state(&id);
        let geometry = saved.as_ref().map(WindowState::geometry);
        let displays = self.inner.host.displays();
        let reconciler = &self.inner.reconciler;
        let restored = geometry.as_ref().is_some_and(|g| g.has_position());

        let initial = match &geometry {
            Some(g) if restored => reconciler.initial_bounds(Some(g), &options.bounds, &displays),
            _ => reconciler.safe_bounds(options.display_id, &options.bounds, &displays),
        };
        let plan = geometry
            .as_ref()
            .map_or(RestorePlan::Nothing, |g| reconciler.restore_plan(g, &displays));

        let stored = self.stored_metadata(&id);
        let manual = normalize_manual(options.manual_z_order)
            .or(meta.manual_z_order)
            .or_else(|| stored.as_ref().and_then(|s| s.manual_z_order));
        let menu_bar_visible = meta
            .menu_bar_visible
            .or_else(|| stored.as_ref().and_then(|s| s.menu_bar_visible));

        let mut meta = match stored {
            Some(mut base) => {
                let title = base.title.clone();
                base.merge_from(meta);
                if base.title.is_empty() {
                    base.title = title;
                }
                base
            }
            None => meta,
        };
        meta.id = id.clone();
        meta.is_main |= id.is_main();
        if meta.title.is_empty() {
            meta.title = format!("Window {id}");
        }
        if meta.created_at.is_none() {
            meta.created_at = Some(now_rfc3339());
        }
        meta.display_id = saved
            .as_ref()
            .and_then(|s| s.display_id)
            .or(meta.display_id)
            .or(options.display_id);
        meta.manual_z_order = manual;
        meta.menu_bar_visible = menu_bar_visible;

        let handle = self.inner.host.create_window(&CreateOptions {
            id: id.clone(),
            title: meta.title.clone(),
            bounds: initial,
            show: false,
        });

        {
            let mut shared = self.inner.shared.lock();
            if let Some(band) = manual {
                shared.stack.set_manual(&id, band);
            }
            shared.windows.insert(
                id.clone(),
                Managed {
                    handle: Arc::clone(&handle),
                    meta: meta.clone(),
                    pending: Some(PendingRestore {
                        plan,
                        normal: saved.as_ref().and_then(WindowState::bounds),
                        menu_bar_visible,
                    }),
                },
            );
        }
        self.store_metadata(&id, meta);

        info!(window = %id, ?initial, restored, ?manual, "window created");
        self.notify();
        handle
    }

    /// Create a window with a fresh id, cascaded across the displays.
    pub fn open_window(&self, title: Option<String>) -> Result<(WindowId, Arc<dyn WindowHandle>)> {
        let id = self.generate_window_id()?;
        let index = self.inner.registry.all_ids()?.len();
        let displays = self.inner.host.displays();
        let limits = self.inner.reconciler.limits();
        let width = f64::from(limits.default_width);
        let height = f64::from(limits.default_height);
        let options = match cascade_origin(index, &displays) {
            Some((display_id, x, y)) => WindowOptions {
                bounds: BoundsRequest::at(f64::from(x), f64::from(y), width, height),
                display_id: Some(display_id),
                manual_z_order: None,
            },
            None => WindowOptions {
                bounds: BoundsRequest::sized(width, height),
                ..WindowOptions::default()
            },
        };
        let title = title.unwrap_or_else(|| format!("Window {id}"));
        let meta = WindowMetadata::new(id.clone(), title);
        let handle = self.create_or_restore_window(id.clone(), options, meta);
        Ok((id, handle))
    }

    /// Issue a new unique window id.
    pub fn generate_window_id(&self) -> Result<WindowId> {
        Ok(self.inner.registry.next_window_id()?)
    }

    /// Apply saved geometry and show the window.
    fn apply_pending_restore(&self, id: &WindowId) {
        let found = {
            let mut shared = self.inner.shared.lock();
            shared
                .windows
                .get_mut(id)
                .map(|m| (Arc::clone(&m.handle), m.pending.take()))
        };
        let Some((handle, pending)) = found else {
            return;
        };
        if handle.is_destroyed() {
            return;
        }
        if let Some(p) = pending {
            match p.plan {
                RestorePlan::Maximize => {
                    if let Some(normal) = p.normal {
                        handle.set_bounds(normal);
                    }
                    handle.maximize();
                }
                RestorePlan::FullScreen => {
                    if let Some(normal) = p.normal {
                        handle.set_bounds(normal);
                    }
                    handle.set_full_screen(true);
                }
                RestorePlan::Exact(rect) => handle.set_bounds(rect),
                RestorePlan::Recomputed { rect, snap_type } => {
                    debug!(
                        window = %id,
                        snap = %snap_type,
                        ?rect,
                        "layout recomputed for new work area"
                    );
                    handle.set_bounds(rect);
                }
                RestorePlan::Nothing => {}
            }
            if let Some(visible) = p.menu_bar_visible {
                handle.set_menu_bar_visible(visible);
            }
        }
        handle.show();
    }

    /// Ask a window to close. The main window is never closed this way.
    pub fn close_window(&self, id: &WindowId) -> bool {
        if id.is_main() {
            debug!("refusing to close main window");
            return false;
        }
        match self.window(id) {
            Some(handle) => {
                handle.close();
                true
            }
            None => false,
        }
    }

    /// Change a window's title and persist it.
    pub fn rename_window(&self, id: &WindowId, title: &str) -> bool {
        let Some(handle) = self.window(id) else {
            return false;
        };
        handle.set_title(title);
        let meta = {
            let mut shared = self.inner.shared.lock();
            shared.windows.get_mut(id).map(|m| {
                m.meta.title = title.to_string();
                m.meta.clone()
            })
        };
        if let Some(meta) = meta {
            self.store_metadata(id, meta);
        }
        self.notify();
        true
    }

    /// Show and focus the main window.
    pub fn focus_main(&self) -> bool {
        let Some(handle) = self.window(&WindowId::main()) else {
            return false;
        };
        handle.show();
        handle.focus();
        true
    }

    /// Call `open` with the metadata of every registered non-main window, for
    /// recreating a session. Returns how many were offered.
    pub fn restore_all_windows<F>(&self, mut open: F) -> usize
    where
        F: FnMut(WindowMetadata),
    {
        let map = match self.inner.registry.all() {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "failed to read window registry");
                return 0;
            }
        };
        let mut n = 0;
        for (id, meta) in map {
            if id.is_main() {
                continue;
            }
            open(meta);
            n += 1;
        }
        info!(count = n, "restoring windows");
        n
    }

    /// Mark the application as quitting. Closed windows then stay registered.
    pub fn set_quitting(&self, on: bool) {
        self.inner.shared.lock().quitting = on;
    }

    /// True once quitting.
    pub fn is_quitting(&self) -> bool {
        self.inner.shared.lock().quitting
    }

    /// Stop pending work and save every window. Closing windows after this
    /// keeps their registry entries.
    pub fn shutdown(&self) -> usize {
        self.set_quitting(true);
        let saved = self.force_save_all();
        info!(saved, "window manager shut down");
        saved
    }

    // ----- events -----

    /// Feed a host event for window `id`.
    pub fn handle_event(&self, id: &WindowId, event: WindowEvent) {
        trace!(window = %id, ?event, "window event");
        match event {
            WindowEvent::ReadyToShow => self.apply_pending_restore(id),
            WindowEvent::Closed => self.on_closed(id),
            WindowEvent::Focused => {
                self.update_z_order(id);
                self.schedule_enforce(self.inner.cfg.restore_enforce_delay());
            }
            WindowEvent::Shown => self.update_z_order(id),
            WindowEvent::Restored => {
                self.on_geometry(id, true);
                self.schedule_enforce(self.inner.cfg.restore_enforce_delay());
            }
            e => self.on_geometry(id, e.is_immediate()),
        }
    }

    /// Route a geometry change to the scheduler.
    fn on_geometry(&self, id: &WindowId, immediate: bool) {
        let Some(handle) = self.window(id) else {
            trace!(window = %id, "geometry event for unknown window");
            return;
        };
        let snapped = !immediate && {
            let bounds = handle.bounds();
            let displays = self.inner.host.displays();
            display_matching(&displays, &bounds)
                .is_some_and(|d| self.inner.detector.detect(&bounds, d).is_snapped)
        };
        let weak = Arc::downgrade(&self.inner);
        let key = id.clone();
        self.inner
            .scheduler
            .on_geometry_event(id, immediate, snapped, move || {
                if let Some(manager) = Self::upgrade(&weak) {
                    manager.save_logged(&key);
                }
            });
    }

    /// Give a focused or shown window the next rank.
    fn update_z_order(&self, id: &WindowId) {
        if self.window(id).is_none() {
            return;
        }
        let changed = self.inner.shared.lock().stack.note_focus(id);
        self.schedule_enforce(self.inner.cfg.focus_enforce_delay());
        if changed {
            self.notify();
            self.on_geometry(id, true);
        }
    }

    /// Forget a destroyed window.
    fn on_closed(&self, id: &WindowId) {
        self.inner.scheduler.cancel(id);
        let (removed, quitting) = {
            let mut shared = self.inner.shared.lock();
            let removed = shared.windows.remove(id).is_some();
            shared.stack.forget(id);
            (removed, shared.quitting)
        };
        if !removed {
            return;
        }
        info!(window = %id, "window closed");
        if id.is_main() {
            if !quitting {
                self.shutdown();
            }
            for e in self.entries() {
                e.handle.close();
            }
        } else if !quitting {
            if let Err(e) = self.inner.registry.unregister(id) {
                warn!(window = %id, error = %e, "failed to unregister window");
            }
        }
        self.notify();
    }

    // ----- persistence -----

    /// Read the live geometry of `handle` into a saved record.
    fn capture_state(&self, handle: &dyn WindowHandle, z_order: i64) -> WindowState {
        let full = handle.is_full_screen();
        let maximized = !full && handle.is_maximized();
        let bounds = if full || maximized {
            handle.normal_bounds()
        } else {
            handle.bounds()
        };
        let mut state = WindowState {
            is_maximized: maximized,
            is_full_screen: full,
            z_order,
            is_always_on_top: handle.is_always_on_top(),
            ..WindowState::default()
        };
        state.set_bounds(bounds);
        let displays = self.inner.host.displays();
        if let Some(d) = display_matching(&displays, &bounds) {
            let info = self.inner.detector.detect(&bounds, d);
            state.display_id = Some(d.id);
            state.is_snapped = info.is_snapped;
            state.snap_type = info.snap_type;
            state.is_third_party = info.is_third_party;
            state.work_area = Some(info.work_area);
            state.native_snap = self.inner.detector.is_native_snap(&bounds, d);
        }
        state
    }

    /// Write state and metadata for `id`. Both writes are attempted even when
    /// the first fails.
    fn save_now(&self, id: &WindowId) -> Result<()> {
        let (handle, meta, z_order) = {
            let shared = self.inner.shared.lock();
            let m = shared
                .windows
                .get(id)
                .ok_or_else(|| Error::StaleHandle(id.clone()))?;
            (
                Arc::clone(&m.handle),
                m.meta.clone(),
                shared.stack.priority(id).legacy_value(),
            )
        };
        if handle.is_destroyed() {
            return Err(Error::StaleHandle(id.clone()));
        }

        let state = self.capture_state(handle.as_ref(), z_order);
        let mut meta = meta;
        if let Some(d) = state.display_id {
            meta.display_id = Some(d);
            if let Some(m) = self.inner.shared.lock().windows.get_mut(id) {
                m.meta.display_id = Some(d);
            }
        }

        let mut errors = Vec::new();
        if let Err(e) = self.inner.states.set_as(id.as_str(), &state) {
            warn!(window = %id, error = %e, "failed to save window state");
            errors.push(e);
        }
        if let Err(e) = self.inner.registry.upsert(id, meta) {
            warn!(window = %id, error = %e, "failed to save window metadata");
            errors.push(e);
        }
        debug!(
            window = %id,
            bounds = ?state.bounds(),
            snap = ?state.snap_type,
            maximized = state.is_maximized,
            "window state saved"
        );
        match errors.len() {
            0 => Ok(()),
            1 => Err(Error::Store(errors.remove(0))),
            _ => Err(Error::Partial(errors)),
        }
    }

    /// Save `id`, logging failures. Returns true on success.
    fn save_logged(&self, id: &WindowId) -> bool {
        match self.save_now(id) {
            Ok(()) => true,
            Err(Error::StaleHandle(_)) => {
                trace!(window = %id, "skipping save for closed window");
                false
            }
            Err(_) => false,
        }
    }

    /// Save `id` now, superseding any pending debounced save.
    pub fn save_state(&self, id: &WindowId) -> Result<()> {
        self.inner.scheduler.cancel(id);
        self.save_now(id)
    }

    /// Save every live window. Returns how many saved cleanly.
    pub fn save_all(&self) -> usize {
        self.live_ids()
            .iter()
            .filter(|id| self.save_logged(id))
            .count()
    }

    /// Drop pending debounced saves and save every live window now.
    pub fn force_save_all(&self) -> usize {
        self.inner.scheduler.cancel_all();
        self.save_all()
    }

    /// Delete saved states that no registered window owns.
    pub fn cleanup_orphaned_states(&self) -> Result<Vec<String>> {
        let removed = winkeep_store::cleanup_orphaned_states(
            self.inner.states.as_ref(),
            &self.inner.registry,
        )?;
        if !removed.is_empty() {
            info!(count = removed.len(), "removed orphaned window states");
        }
        Ok(removed)
    }

    // ----- queries -----

    /// Summaries of every live window.
    pub fn list_windows(&self) -> Vec<WindowSummary> {
        let displays = self.inner.host.displays();
        self.entries()
            .into_iter()
            .map(|e| {
                let bounds = self
                    .saved_state(&e.id)
                    .and_then(|s| s.bounds())
                    .unwrap_or_else(|| e.handle.bounds());
                let display = display_matching(&displays, &bounds);
                WindowSummary {
                    state: flags(e.handle.as_ref()),
                    display: display.map(DisplaySummary::from),
                    relative_position: display.map(|d| RelativePosition::within(&bounds, d)),
                    focus_order: e.priority.legacy_value(),
                    bounds,
                    title: e.meta.title,
                    created_at: e.meta.created_at,
                    display_id: e.meta.display_id,
                    is_main: e.meta.is_main,
                    manual_z_order: e.meta.manual_z_order,
                    id: e.id,
                }
            })
            .collect()
    }

    /// Current displays with labels filled in.
    pub fn get_displays(&self) -> Vec<Display> {
        self.inner
            .host
            .displays()
            .into_iter()
            .map(|mut d| {
                d.label = Some(d.label_or_default());
                d
            })
            .collect()
    }

    /// Registry counts.
    pub fn stats(&self) -> Result<RegistryStats> {
        Ok(self.inner.registry.stats(self.live_ids().len())?)
    }

    // ----- placement -----

    /// Move a window onto `display_id` with safe bounds derived from
    /// `bounds`. Returns the applied rectangle.
    pub fn move_to_display(
        &self,
        id: &WindowId,
        display_id: DisplayId,
        bounds: &BoundsRequest,
    ) -> Option<Rect> {
        let handle = self.window(id)?;
        let displays = self.inner.host.displays();
        let rect = self
            .inner
            .reconciler
            .safe_bounds(Some(display_id), bounds, &displays);
        handle.set_bounds(rect);
        info!(window = %id, display = display_id, ?rect, "moved to display");
        self.inner.scheduler.cancel(id);
        self.save_logged(id);
        Some(rect)
    }

    /// Show or hide the menu bar of `id` and remember the choice.
    pub fn set_menu_bar_visibility(&self, id: &WindowId, visible: bool) -> bool {
        let Some(handle) = self.window(id) else {
            return false;
        };
        handle.set_menu_bar_visible(visible);
        let meta = {
            let mut shared = self.inner.shared.lock();
            shared.windows.get_mut(id).map(|m| {
                m.meta.menu_bar_visible = Some(visible);
                m.meta.clone()
            })
        };
        if let Some(meta) = meta {
            self.store_metadata(id, meta);
        }
        true
    }

    /// Live menu bar visibility of `id`.
    pub fn menu_bar_visibility(&self, id: &WindowId) -> Option<bool> {
        self.window(id).map(|h| h.is_menu_bar_visible())
    }

    // ----- stacking -----

    /// Give `id` the next automatic rank and restack every live window. A
    /// manual band is kept and still wins.
    pub fn bring_to_top(&self, id: &WindowId) -> bool {
        if self.window(id).is_none() {
            return false;
        }
        self.inner.shared.lock().stack.bring_to_top(id);
        self.enforce_hierarchy();
        self.save_logged(id);
        self.notify();
        true
    }

    /// Pin `id` to a manual band, or clear the band for `None` and values
    /// outside `1..=100`.
    pub fn set_manual_order(&self, id: &WindowId, requested: Option<i64>) -> bool {
        let Some(band) = normalize_manual(requested) else {
            return self.clear_manual_order(id);
        };
        if self.window(id).is_none() {
            return false;
        }
        {
            let mut shared = self.inner.shared.lock();
            shared.stack.set_manual(id, band);
            if let Some(m) = shared.windows.get_mut(id) {
                m.meta.manual_z_order = Some(band);
            }
        }
        info!(window = %id, band, "manual stacking band set");
        self.enforce_hierarchy();
        self.save_logged(id);
        self.notify();
        true
    }

    /// Return `id` to the automatic tier on top of the other automatic
    /// windows, re-rank the tier, and re-focus windows bottom-to-top.
    pub fn clear_manual_order(&self, id: &WindowId) -> bool {
        if self.window(id).is_none() {
            return false;
        }
        let live = self.live_ids();
        let order = {
            let mut shared = self.inner.shared.lock();
            shared.stack.clear_manual(id);
            if let Some(m) = shared.windows.get_mut(id) {
                m.meta.manual_z_order = None;
            }
            shared.stack.rerank_automatic(&live, Some(id));
            shared.stack.order(&live)
        };
        info!(window = %id, "manual stacking band cleared");
        self.save_logged(id);
        self.focus_in_order(order);
        self.notify();
        true
    }

    /// Shift the manual band of `id` by `delta`. A window without a band
    /// starts from the default band.
    pub fn adjust_manual_order(&self, id: &WindowId, delta: i64) -> bool {
        let current = {
            let shared = self.inner.shared.lock();
            if !shared.windows.contains_key(id) {
                return false;
            }
            shared.stack.manual(id).unwrap_or(MANUAL_DEFAULT)
        };
        let next = (i64::from(current) + delta).clamp(i64::from(MANUAL_MIN), i64::from(MANUAL_MAX));
        self.set_manual_order(id, Some(next))
    }

    /// Focus `order` bottom-to-top with a stagger, then restack.
    fn focus_in_order(&self, order: Vec<WindowId>) {
        let stagger = self.inner.cfg.focus_stagger();
        let settle = self.inner.cfg.restore_enforce_delay();
        let Ok(rt) = Handle::try_current() else {
            for id in &order {
                if let Some(h) = self.window(id) {
                    h.focus();
                }
            }
            self.enforce_hierarchy();
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        rt.spawn(async move {
            let start = time::Instant::now();
            let n = u32::try_from(order.len()).unwrap_or(u32::MAX);
            for (i, id) in order.into_iter().enumerate() {
                let step = u32::try_from(i).unwrap_or(u32::MAX);
                time::sleep_until(start + stagger.saturating_mul(step)).await;
                let Some(manager) = Self::upgrade(&weak) else {
                    return;
                };
                if let Some(h) = manager.window(&id) {
                    h.focus();
                }
            }
            time::sleep_until(start + stagger.saturating_mul(n) + settle).await;
            if let Some(manager) = Self::upgrade(&weak) {
                manager.enforce_hierarchy();
            }
        });
    }

    /// Raise every live window bottom-to-top in priority order. Returns how
    /// many windows were raised.
    pub fn enforce_hierarchy(&self) -> usize {
        let entries = self.entries();
        let ids: Vec<WindowId> = entries.iter().map(|e| e.id.clone()).collect();
        let order = self.inner.shared.lock().stack.order(&ids);
        let handles: BTreeMap<&WindowId, &Arc<dyn WindowHandle>> =
            entries.iter().map(|e| (&e.id, &e.handle)).collect();
        for id in &order {
            if let Some(h) = handles.get(id) {
                h.move_top();
            }
        }
        trace!(count = order.len(), "stack enforced");
        order.len()
    }

    /// Re-apply saved stacking after a session restore. Manual bands come from
    /// metadata; automatic windows without a rank this session adopt their
    /// saved value, so later enforcement keeps the restored order. Windows
    /// saved as always-on-top get that flag back.
    pub fn restore_z_order(&self) -> usize {
        let mut items = Vec::new();
        for e in self.entries() {
            let saved = self.saved_state(&e.id).unwrap_or_default();
            let priority = {
                let mut shared = self.inner.shared.lock();
                match e.meta.manual_z_order {
                    Some(band) => {
                        shared.stack.set_manual(&e.id, band);
                        Priority::Manual(band)
                    }
                    None => match shared.stack.rank(&e.id) {
                        0 => match Priority::from_legacy(saved.z_order) {
                            Priority::Automatic(rank) => {
                                if rank > 0 {
                                    shared.stack.restore_rank(&e.id, rank);
                                }
                                Priority::Automatic(rank)
                            }
                            Priority::Manual(_) => Priority::Automatic(0),
                        },
                        rank => Priority::Automatic(rank),
                    },
                }
            };
            items.push((priority, e.handle, saved.is_always_on_top));
        }
        items.sort_by_key(|(p, ..)| *p);
        for (_, handle, on_top) in &items {
            if *on_top {
                handle.set_always_on_top(true);
            } else {
                handle.move_top();
            }
        }
        debug!(count = items.len(), "stacking restored");
        items.len()
    }

    /// Toggle always-on-top. Turning it on also gives the next rank.
    pub fn set_always_on_top(&self, id: &WindowId, on: bool) -> bool {
        let Some(handle) = self.window(id) else {
            return false;
        };
        handle.set_always_on_top(on);
        if on {
            self.inner.shared.lock().stack.bring_to_top(id);
        }
        self.save_logged(id);
        true
    }

    /// Stacking details for every live window, most recent first.
    pub fn z_order_info(&self) -> Vec<ZOrderInfo> {
        let mut entries = self.entries();
        entries.sort_by_key(|e| Reverse(e.priority));
        entries
            .into_iter()
            .map(|e| ZOrderInfo {
                z_order: self.saved_state(&e.id).map_or(0, |s| s.z_order),
                priority: e.priority,
                current_focus_order: e.priority.legacy_value(),
                is_always_on_top: e.handle.is_always_on_top(),
                is_focused: e.handle.is_focused(),
                is_visible: e.handle.is_visible(),
                title: e.meta.title,
                id: e.id,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use winkeep_store::MemoryStore;

    use super::*;
    use crate::mock::MockHost;

    fn setup() -> (Arc<MockHost>, Arc<MemoryStore>, WindowManager) {
        let host = Arc::new(MockHost::single_display());
        let store = Arc::new(MemoryStore::new());
        let m = WindowManager::new(
            host.clone(),
            store.clone(),
            store.clone(),
            ManagerCfg::default(),
        );
        (host, store, m)
    }

    fn open(m: &WindowManager, id: &str) -> WindowId {
        let id = WindowId::new(id);
        m.create_or_restore_window(
            id.clone(),
            WindowOptions::default(),
            WindowMetadata::new(id.clone(), ""),
        );
        m.handle_event(&id, WindowEvent::ReadyToShow);
        id
    }

    #[test]
    fn cascade_wraps_rows_and_displays() {
        let displays = vec![
            Display::new(1, Rect::new(0, 0, 1920, 1080), Rect::new(0, 0, 1920, 1040)),
            Display::new(2, Rect::new(1920, 0, 1920, 1080), Rect::new(1920, 0, 1920, 1040)),
        ];
        assert_eq!(cascade_origin(0, &displays), Some((1, 50, 50)));
        assert_eq!(cascade_origin(3, &displays), Some((2, 1920 + 50 + 90, 50)));
        assert_eq!(cascade_origin(6, &displays), Some((1, 50 + 30, 80)));
        assert_eq!(cascade_origin(0, &[]), None);
    }

    #[test]
    fn new_window_is_centered_and_titled() {
        let (host, _, m) = setup();
        let id = open(&m, "win7");
        let w = host.window("win7").unwrap();
        assert_eq!(w.bounds(), Rect::new(560, 220, 800, 600));
        assert_eq!(w.title(), "Window win7");
        assert!(w.is_visible());
        assert!(m.registry().is_registered(&id).unwrap());
    }

    #[test]
    fn creating_a_live_window_twice_returns_it() {
        let (host, _, m) = setup();
        open(&m, "win1");
        host.clear_calls();
        let id = WindowId::new("win1");
        m.create_or_restore_window(
            id.clone(),
            WindowOptions::default(),
            WindowMetadata::new(id, ""),
        );
        assert!(!host.calls().iter().any(|c| c.starts_with("create:")));
    }

    #[test]
    fn close_refuses_main() {
        let (host, _, m) = setup();
        open(&m, "main");
        assert!(!m.close_window(&WindowId::main()));
        assert!(!host.calls_contains("close:main"));
    }

    #[test]
    fn closed_window_is_unregistered() {
        let (host, _, m) = setup();
        let id = open(&m, "win2");
        host.window("win2").unwrap().destroy();
        m.handle_event(&id, WindowEvent::Closed);
        assert!(m.window(&id).is_none());
        assert!(!m.registry().is_registered(&id).unwrap());
    }

    #[test]
    fn main_close_saves_and_closes_others_but_keeps_registry() {
        let (host, store, m) = setup();
        open(&m, "main");
        let other = open(&m, "win1");
        host.window("main").unwrap().destroy();
        m.handle_event(&WindowId::main(), WindowEvent::Closed);
        assert!(m.is_quitting());
        assert!(host.calls_contains("close:win1"));
        assert!(store.snapshot().contains_key("win1"));
        host.window("win1").unwrap().destroy();
        m.handle_event(&other, WindowEvent::Closed);
        assert!(m.registry().is_registered(&other).unwrap());
    }

    #[test]
    fn rename_persists_title() {
        let (host, _, m) = setup();
        let id = open(&m, "win1");
        assert!(m.rename_window(&id, "Notes"));
        assert_eq!(host.window("win1").unwrap().title(), "Notes");
        assert_eq!(m.registry().get(&id).unwrap().unwrap().title, "Notes");
    }

    #[test]
    fn untitled_reopen_keeps_renamed_title() {
        let (_, store, m) = setup();
        let id = open(&m, "win1");
        assert!(m.rename_window(&id, "Notes"));

        let host2 = Arc::new(MockHost::single_display());
        let m2 = WindowManager::new(host2.clone(), store.clone(), store, ManagerCfg::default());
        open(&m2, "win1");
        assert_eq!(host2.window("win1").unwrap().title(), "Notes");
        assert_eq!(m2.metadata(&id).unwrap().title, "Notes");
    }

    #[test]
    fn menu_bar_visibility_is_restored_on_next_launch() {
        let (_, store, m) = setup();
        let id = open(&m, "main");
        assert!(m.set_menu_bar_visibility(&id, false));
        assert_eq!(m.menu_bar_visibility(&id), Some(false));
        assert_eq!(
            m.registry().get(&id).unwrap().unwrap().menu_bar_visible,
            Some(false)
        );

        let host2 = Arc::new(MockHost::single_display());
        let m2 = WindowManager::new(host2.clone(), store.clone(), store, ManagerCfg::default());
        open(&m2, "main");
        assert!(host2.calls_contains("menu_bar_off:main"));
    }

    #[test]
    fn adjust_starts_from_default_band_and_clamps() {
        let (_, _, m) = setup();
        let id = open(&m, "win1");
        assert!(m.adjust_manual_order(&id, 5));
        assert_eq!(m.priority(&id), Some(Priority::Manual(55)));
        assert!(m.adjust_manual_order(&id, 500));
        assert_eq!(m.priority(&id), Some(Priority::Manual(100)));
        assert!(m.adjust_manual_order(&id, -500));
        assert_eq!(m.priority(&id), Some(Priority::Manual(1)));
    }

    #[test]
    fn restore_all_skips_main() {
        let (_, _, m) = setup();
        open(&m, "main");
        open(&m, "win1");
        open(&m, "win2");
        let mut seen = Vec::new();
        assert_eq!(m.restore_all_windows(|meta| seen.push(meta.id)), 2);
        assert_eq!(seen, vec![WindowId::new("win1"), WindowId::new("win2")]);
    }

    #[test]
    fn list_reports_relative_position() {
        let (host, _, m) = setup();
        let id = open(&m, "win1");
        host.window("win1").unwrap().user_set_bounds(Rect::new(480, 270, 800, 600));
        m.handle_event(&id, WindowEvent::Close);
        let list = m.list_windows();
        assert_eq!(list.len(), 1);
        let rel = list[0].relative_position.unwrap();
        assert_eq!((rel.percent_x, rel.percent_y), (25, 25));
        assert_eq!(list[0].display.as_ref().map(|d| d.id), Some(1));
    }
}
