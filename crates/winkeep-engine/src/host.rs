//! Seam between the engine and the desktop toolkit.
//!
//! The toolkit implements [`WindowHost`] and [`WindowHandle`] and pushes
//! [`WindowEvent`]s into the manager. Nothing in the engine calls an OS API
//! directly.

use std::sync::Arc;

use winkeep_geom::{Display, Rect, primary_display};
use winkeep_ids::WindowId;

/// Parameters for creating a native window.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateOptions {
    /// Identifier the window is created for.
    pub id: WindowId,
    /// Initial title.
    pub title: String,
    /// Initial bounds. For restored windows this is a placeholder.
    pub bounds: Rect,
    /// Whether the window is shown immediately. The manager always passes
    /// false and shows the window once the host reports it ready.
    pub show: bool,
}

/// A live native window.
///
/// Every method must be safe to call after the window was destroyed; getters
/// then return defaults and setters do nothing.
pub trait WindowHandle: Send + Sync {
    /// Current outer bounds.
    fn bounds(&self) -> Rect;
    /// Bounds the window returns to when leaving maximize or fullscreen.
    fn normal_bounds(&self) -> Rect;
    /// Move and resize.
    fn set_bounds(&self, bounds: Rect);

    /// True while maximized.
    fn is_maximized(&self) -> bool;
    /// Maximize on the current display.
    fn maximize(&self);
    /// True while fullscreen.
    fn is_full_screen(&self) -> bool;
    /// Enter or leave fullscreen.
    fn set_full_screen(&self, on: bool);
    /// True while minimized.
    fn is_minimized(&self) -> bool;
    /// True once shown and not hidden.
    fn is_visible(&self) -> bool;
    /// True while the window has keyboard focus.
    fn is_focused(&self) -> bool;

    /// True while pinned above normal windows.
    fn is_always_on_top(&self) -> bool;
    /// Pin or unpin above normal windows.
    fn set_always_on_top(&self, on: bool);
    /// True when the menu bar is shown.
    fn is_menu_bar_visible(&self) -> bool;
    /// Show or hide the menu bar.
    fn set_menu_bar_visible(&self, visible: bool);

    /// Current title.
    fn title(&self) -> String;
    /// Replace the title.
    fn set_title(&self, title: &str);

    /// Make the window visible.
    fn show(&self);
    /// Give the window keyboard focus, raising it.
    fn focus(&self);
    /// Raise the window to the top of the stack without focusing it.
    fn move_top(&self);
    /// Request closing; the host later reports `Close` and `Closed`.
    fn close(&self);
    /// True once the native window is gone.
    fn is_destroyed(&self) -> bool;
}

/// The desktop toolkit.
pub trait WindowHost: Send + Sync {
    /// All connected displays.
    fn displays(&self) -> Vec<Display>;

    /// The primary display.
    fn primary_display(&self) -> Option<Display> {
        primary_display(&self.displays()).cloned()
    }

    /// Create a native window. It must stay hidden until `show` is called
    /// when `opts.show` is false.
    fn create_window(&self, opts: &CreateOptions) -> Arc<dyn WindowHandle>;
}

/// Window lifecycle and geometry notifications delivered by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WindowEvent {
    /// The window finished loading and can be positioned and shown.
    ReadyToShow,
    /// The user finished moving the window.
    Moved,
    /// The user finished resizing the window.
    Resized,
    /// The window was maximized.
    Maximized,
    /// The window left maximize.
    Unmaximized,
    /// The window entered fullscreen.
    EnteredFullScreen,
    /// The window left fullscreen.
    LeftFullScreen,
    /// The window returned from minimized.
    Restored,
    /// The window gained focus.
    Focused,
    /// The window became visible.
    Shown,
    /// The window is about to close; the handle is still valid.
    Close,
    /// The window is gone; the handle is destroyed.
    Closed,
}

impl WindowEvent {
    /// True for discrete state changes that are saved without debouncing.
    #[must_use]
    pub const fn is_immediate(self) -> bool {
        matches!(
            self,
            Self::Close
                | Self::Maximized
                | Self::Unmaximized
                | Self::EnteredFullScreen
                | Self::LeftFullScreen
                | Self::Restored
                | Self::Focused
                | Self::Shown
        )
    }

    /// True for continuous geometry changes.
    #[must_use]
    pub const fn is_continuous(self) -> bool {
        matches!(self, Self::Moved | Self::Resized)
    }
}
