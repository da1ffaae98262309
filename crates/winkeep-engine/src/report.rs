//! Serializable views returned by listing operations.

use serde::Serialize;
use winkeep_geom::{Display, Rect};
use winkeep_ids::{DisplayId, WindowId};

use crate::stack::Priority;

/// Live window flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowFlags {
    /// Maximized.
    pub is_maximized: bool,
    /// Fullscreen.
    pub is_full_screen: bool,
    /// Minimized.
    pub is_minimized: bool,
    /// Visible.
    pub is_visible: bool,
}

/// Display fields included in listings.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySummary {
    /// Display id.
    pub id: DisplayId,
    /// Full display bounds.
    pub bounds: Rect,
    /// Usable area.
    pub work_area: Rect,
    /// Pixel scale.
    pub scale_factor: f64,
    /// True for the primary display.
    pub primary: bool,
    /// Human-readable name.
    pub label: String,
}

impl From<&Display> for DisplaySummary {
    fn from(d: &Display) -> Self {
        Self {
            id: d.id,
            bounds: d.bounds,
            work_area: d.work_area,
            scale_factor: d.scale_factor,
            primary: d.is_primary,
            label: d.label_or_default(),
        }
    }
}

/// Window origin relative to its display, in pixels and rounded percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativePosition {
    /// Horizontal offset from the display origin.
    pub x: i32,
    /// Vertical offset from the display origin.
    pub y: i32,
    /// `x` as a percentage of display width.
    pub percent_x: i32,
    /// `y` as a percentage of display height.
    pub percent_y: i32,
}

/// `offset` as a rounded percentage of `extent`; 0 for empty extents.
fn percent(offset: i32, extent: i32) -> i32 {
    if extent <= 0 {
        return 0;
    }
    (f64::from(offset) / f64::from(extent) * 100.0).round() as i32
}

impl RelativePosition {
    /// Position of `bounds` within `display`'s full bounds.
    #[must_use]
    pub fn within(bounds: &Rect, display: &Display) -> Self {
        let x = bounds.x - display.bounds.x;
        let y = bounds.y - display.bounds.y;
        Self {
            x,
            y,
            percent_x: percent(x, display.bounds.width),
            percent_y: percent(y, display.bounds.height),
        }
    }
}

/// One entry of [`crate::WindowManager::list_windows`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSummary {
    /// Window id.
    pub id: WindowId,
    /// Title from metadata.
    pub title: String,
    /// Creation time.
    pub created_at: Option<String>,
    /// Display from metadata.
    pub display_id: Option<DisplayId>,
    /// True for the main window.
    pub is_main: bool,
    /// Manual band, if pinned.
    pub manual_z_order: Option<u8>,
    /// Legacy numeric stacking value.
    pub focus_order: i64,
    /// Saved bounds when complete, live bounds otherwise.
    pub bounds: Rect,
    /// Live flags.
    pub state: WindowFlags,
    /// Display the window is on.
    pub display: Option<DisplaySummary>,
    /// Origin relative to that display.
    pub relative_position: Option<RelativePosition>,
}

/// One entry of [`crate::WindowManager::z_order_info`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZOrderInfo {
    /// Window id.
    pub id: WindowId,
    /// Title from metadata.
    pub title: String,
    /// Stacking value from the last save.
    pub z_order: i64,
    /// Effective priority.
    pub priority: Priority,
    /// Legacy numeric value of `priority`.
    pub current_focus_order: i64,
    /// Pinned above normal windows.
    pub is_always_on_top: bool,
    /// Has keyboard focus.
    pub is_focused: bool,
    /// Visible.
    pub is_visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_position_rounds_percentages() {
        let d = Display::new(2, Rect::new(1920, 0, 2560, 1440), Rect::new(1920, 0, 2560, 1400));
        let rel = RelativePosition::within(&Rect::new(2560, 360, 800, 600), &d);
        assert_eq!(rel, RelativePosition { x: 640, y: 360, percent_x: 25, percent_y: 25 });
        let rel = RelativePosition::within(&Rect::new(1921, 1, 10, 10), &d);
        assert_eq!((rel.percent_x, rel.percent_y), (0, 0));
    }

    #[test]
    fn summary_serializes_camel_case() {
        let d = Display::new(1, Rect::new(0, 0, 100, 100), Rect::new(0, 0, 100, 90));
        let v = serde_json::to_value(DisplaySummary::from(&d)).unwrap();
        assert_eq!(v["workArea"]["height"], 90);
        assert_eq!(v["label"], "Display 1");
        assert_eq!(v["primary"], false);
    }
}
