//! In-memory host for tests.
//!
//! Records every call as a short string (`"move_top:win1"`) and keeps a
//! shared bottom-to-top stack so tests can assert on native stacking.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use winkeep_geom::{Display, Rect, primary_display};
use winkeep_ids::WindowId;

use crate::host::{CreateOptions, WindowHandle, WindowHost};

/// Shared call log.
type Log = Arc<Mutex<Vec<String>>>;
/// Shared native stack, bottom first.
type Stack = Arc<Mutex<Vec<WindowId>>>;

/// Mutable window properties.
#[derive(Clone, Debug, Default)]
struct MockWindowState {
    /// Current bounds.
    bounds: Rect,
    /// Bounds outside maximize and fullscreen.
    normal_bounds: Rect,
    /// Maximized flag.
    maximized: bool,
    /// Fullscreen flag.
    full_screen: bool,
    /// Minimized flag.
    minimized: bool,
    /// Visible flag.
    visible: bool,
    /// Focus flag.
    focused: bool,
    /// Always-on-top flag.
    always_on_top: bool,
    /// Menu bar flag.
    menu_bar_visible: bool,
    /// Title.
    title: String,
}

/// Fake native window.
pub struct MockWindow {
    /// Id the window was created for.
    id: WindowId,
    /// Mutable properties.
    state: Mutex<MockWindowState>,
    /// Set by `destroy`.
    destroyed: AtomicBool,
    /// Bounds applied when maximizing.
    maximized_bounds: Rect,
    /// Host-wide call log.
    calls: Log,
    /// Host-wide native stack.
    stack: Stack,
}

impl MockWindow {
    /// Window id this mock was created for.
    pub fn id(&self) -> &WindowId {
        &self.id
    }

    /// Record `op` against this window.
    fn note(&self, op: &str) {
        self.calls.lock().push(format!("{op}:{}", self.id));
    }

    /// Move this window to the top of the native stack.
    fn raise(&self) {
        let mut stack = self.stack.lock();
        stack.retain(|w| w != &self.id);
        stack.push(self.id.clone());
    }

    /// Simulate the user dragging or resizing the window. No call is logged.
    pub fn user_set_bounds(&self, bounds: Rect) {
        let mut s = self.state.lock();
        s.bounds = bounds;
        if !s.maximized && !s.full_screen {
            s.normal_bounds = bounds;
        }
    }

    /// Simulate the user minimizing the window.
    pub fn user_minimize(&self, on: bool) {
        self.state.lock().minimized = on;
    }

    /// Simulate the user leaving maximize.
    pub fn user_unmaximize(&self) {
        let mut s = self.state.lock();
        s.maximized = false;
        s.bounds = s.normal_bounds;
    }

    /// Mark the native window destroyed, as after the host's `closed` event.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.stack.lock().retain(|w| w != &self.id);
    }
}

impl WindowHandle for MockWindow {
    fn bounds(&self) -> Rect {
        self.state.lock().bounds
    }

    fn normal_bounds(&self) -> Rect {
        self.state.lock().normal_bounds
    }

    fn set_bounds(&self, bounds: Rect) {
        self.note("set_bounds");
        if !self.is_destroyed() {
            self.user_set_bounds(bounds);
        }
    }

    fn is_maximized(&self) -> bool {
        self.state.lock().maximized
    }

    fn maximize(&self) {
        self.note("maximize");
        let mut s = self.state.lock();
        if !s.maximized {
            s.maximized = true;
            s.bounds = self.maximized_bounds;
        }
    }

    fn is_full_screen(&self) -> bool {
        self.state.lock().full_screen
    }

    fn set_full_screen(&self, on: bool) {
        self.note(if on { "fullscreen_on" } else { "fullscreen_off" });
        let mut s = self.state.lock();
        s.full_screen = on;
        s.bounds = if on {
            self.maximized_bounds
        } else {
            s.normal_bounds
        };
    }

    fn is_minimized(&self) -> bool {
        self.state.lock().minimized
    }

    fn is_visible(&self) -> bool {
        self.state.lock().visible
    }

    fn is_focused(&self) -> bool {
        self.state.lock().focused
    }

    fn is_always_on_top(&self) -> bool {
        self.state.lock().always_on_top
    }

    fn set_always_on_top(&self, on: bool) {
        self.note(if on { "always_on_top_on" } else { "always_on_top_off" });
        self.state.lock().always_on_top = on;
    }

    fn is_menu_bar_visible(&self) -> bool {
        self.state.lock().menu_bar_visible
    }

    fn set_menu_bar_visible(&self, visible: bool) {
        self.note(if visible { "menu_bar_on" } else { "menu_bar_off" });
        self.state.lock().menu_bar_visible = visible;
    }

    fn title(&self) -> String {
        self.state.lock().title.clone()
    }

    fn set_title(&self, title: &str) {
        self.note("set_title");
        self.state.lock().title = title.to_string();
    }

    fn show(&self) {
        self.note("show");
        self.state.lock().visible = true;
    }

    fn focus(&self) {
        self.note("focus");
        if !self.is_destroyed() {
            self.state.lock().focused = true;
            self.raise();
        }
    }

    fn move_top(&self) {
        self.note("move_top");
        if !self.is_destroyed() {
            self.raise();
        }
    }

    fn close(&self) {
        self.note("close");
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

/// Fake toolkit holding a display list and every window it created.
pub struct MockHost {
    /// Reported displays.
    displays: Mutex<Vec<Display>>,
    /// Every window created, oldest first.
    windows: Mutex<Vec<Arc<MockWindow>>>,
    /// Call log shared with windows.
    calls: Log,
    /// Native stack shared with windows.
    stack: Stack,
}

impl MockHost {
    /// Host reporting `displays`.
    pub fn new(displays: Vec<Display>) -> Self {
        Self {
            displays: Mutex::new(displays),
            windows: Mutex::new(Vec::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
            stack: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A single 1920x1080 primary display with a 40px taskbar.
    pub fn single_display() -> Self {
        Self::new(vec![
            Display::new(1, Rect::new(0, 0, 1920, 1080), Rect::new(0, 0, 1920, 1040)).primary(),
        ])
    }

    /// Replace the display list, as after a monitor change.
    pub fn set_displays(&self, displays: Vec<Display>) {
        *self.displays.lock() = displays;
    }

    /// Most recently created window for `id`.
    pub fn window(&self, id: &str) -> Option<Arc<MockWindow>> {
        self.windows
            .lock()
            .iter()
            .rev()
            .find(|w| w.id.as_str() == id)
            .cloned()
    }

    /// Every call recorded so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// True when `s` was recorded.
    pub fn calls_contains(&self, s: &str) -> bool {
        self.calls.lock().iter().any(|x| x == s)
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Native stack, bottom first.
    pub fn stack(&self) -> Vec<WindowId> {
        self.stack.lock().clone()
    }
}

impl WindowHost for MockHost {
    fn displays(&self) -> Vec<Display> {
        self.displays.lock().clone()
    }

    fn create_window(&self, opts: &CreateOptions) -> Arc<dyn WindowHandle> {
        self.calls.lock().push(format!("create:{}", opts.id));
        let maximized_bounds = primary_display(&self.displays.lock())
            .map(|d| d.work_area)
            .unwrap_or(opts.bounds);
        let win = Arc::new(MockWindow {
            id: opts.id.clone(),
            state: Mutex::new(MockWindowState {
                bounds: opts.bounds,
                normal_bounds: opts.bounds,
                visible: opts.show,
                menu_bar_visible: true,
                title: opts.title.clone(),
                ..MockWindowState::default()
            }),
            destroyed: AtomicBool::new(false),
            maximized_bounds,
            calls: Arc::clone(&self.calls),
            stack: Arc::clone(&self.stack),
        });
        win.raise();
        self.windows.lock().push(Arc::clone(&win));
        win
    }
}
