//! Persisted per-window records.

use std::time::SystemTime;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use winkeep_geom::{Rect, SavedGeometry, SnapType};
use winkeep_ids::{DisplayId, WindowId};

/// Saved geometry and stacking for one window, keyed by its id.
///
/// When `is_maximized` or `is_full_screen` is set, the rectangle holds the
/// window's normal (restored) bounds rather than the maximized ones.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowState {
    /// Left edge.
    pub x: Option<i32>,
    /// Top edge.
    pub y: Option<i32>,
    /// Outer width.
    pub width: Option<i32>,
    /// Outer height.
    pub height: Option<i32>,
    /// Maximized at save time.
    pub is_maximized: bool,
    /// Fullscreen at save time.
    pub is_full_screen: bool,
    /// Display the bounds overlapped most.
    pub display_id: Option<DisplayId>,
    /// True when the bounds matched a layout.
    pub is_snapped: bool,
    /// Unknown layout names from other versions decode as `None`.
    #[serde(deserialize_with = "lenient_snap_type")]
    pub snap_type: Option<SnapType>,
    /// Work area of the display at save time.
    pub work_area: Option<Rect>,
    /// Origin sat on a grid boundary.
    pub native_snap: bool,
    /// Matched by the edge heuristic rather than the grid.
    pub is_third_party: bool,
    /// Legacy numeric encoding of the last effective stacking priority.
    pub z_order: i64,
    /// Always-on-top flag at save time.
    pub is_always_on_top: bool,
}

/// Decode a layout name, reading unknown names as `None`.
fn lenient_snap_type<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SnapType>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

impl WindowState {
    /// Saved rectangle when all four components are present.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        Some(Rect::new(self.x?, self.y?, self.width?, self.height?))
    }

    /// Set the saved rectangle.
    pub fn set_bounds(&mut self, r: Rect) {
        self.x = Some(r.x);
        self.y = Some(r.y);
        self.width = Some(r.width);
        self.height = Some(r.height);
    }

    /// The view of this record used for bounds reconciliation.
    #[must_use]
    pub fn geometry(&self) -> SavedGeometry {
        SavedGeometry {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            display_id: self.display_id,
            is_maximized: self.is_maximized,
            is_full_screen: self.is_full_screen,
            is_snapped: self.is_snapped,
            snap_type: self.snap_type,
            work_area: self.work_area,
        }
    }
}

/// Current wall-clock time as an RFC 3339 string.
#[must_use]
pub fn now_rfc3339() -> String {
    humantime::format_rfc3339_millis(SystemTime::now()).to_string()
}

/// Registry entry describing a window independent of its geometry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowMetadata {
    /// Window id.
    pub id: WindowId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// True for the application's main window.
    #[serde(default)]
    pub is_main: bool,
    /// RFC 3339 time the window was first created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// RFC 3339 time of the last registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<String>,
    /// Display the window was last saved on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_id: Option<DisplayId>,
    /// Manual stacking band in `1..=100`.
    #[serde(default, deserialize_with = "valid_manual_order")]
    pub manual_z_order: Option<u8>,
    /// Menu bar visibility chosen for the window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_bar_visible: Option<bool>,
    /// Fields written by callers that this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept any number (or null) and keep it only when it names a valid band.
fn valid_manual_order<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u8>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw
        .and_then(|v| v.as_f64())
        .filter(|n| (1.0..=100.0).contains(n))
        .map(|n| n as u8))
}

impl WindowMetadata {
    /// Metadata for a fresh window created now.
    #[must_use]
    pub fn new(id: WindowId, title: impl Into<String>) -> Self {
        Self {
            is_main: id.is_main(),
            id,
            title: title.into(),
            created_at: Some(now_rfc3339()),
            ..Self::default()
        }
    }

    /// Overlay `newer` onto this record.
    ///
    /// Interpreted fields take `newer`'s values. Timestamps fall back to the
    /// existing ones when `newer` has none, and uninterpreted fields are merged
    /// key by key.
    pub fn merge_from(&mut self, newer: Self) {
        let Self {
            id,
            title,
            is_main,
            created_at,
            registered_at,
            display_id,
            manual_z_order,
            menu_bar_visible,
            extra,
        } = newer;
        self.id = id;
        self.title = title;
        self.is_main = is_main;
        self.created_at = created_at.or(self.created_at.take());
        self.registered_at = registered_at.or(self.registered_at.take());
        self.display_id = display_id;
        self.manual_z_order = manual_z_order;
        self.menu_bar_visible = menu_bar_visible;
        self.extra.extend(extra);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn state_uses_camel_case_keys() {
        let mut st = WindowState {
            is_full_screen: true,
            snap_type: Some(SnapType::RightThird),
            ..WindowState::default()
        };
        st.set_bounds(Rect::new(1, 2, 3, 4));
        let v = serde_json::to_value(&st).unwrap();
        assert_eq!(v["isFullScreen"], json!(true));
        assert_eq!(v["snapType"], json!("right-third"));
        assert_eq!(v["width"], json!(3));
        assert_eq!(st.bounds(), Some(Rect::new(1, 2, 3, 4)));
    }

    #[test]
    fn partial_and_unknown_state_decodes() {
        let st: WindowState =
            serde_json::from_value(json!({"x": 5, "snapType": "diagonal", "isSnapped": true}))
                .unwrap();
        assert_eq!(st.x, Some(5));
        assert_eq!(st.snap_type, None);
        assert!(st.bounds().is_none());
        assert!(!st.geometry().has_position());
    }

    #[test]
    fn manual_order_outside_band_is_dropped() {
        let m: WindowMetadata =
            serde_json::from_value(json!({"id": "win1", "manualZOrder": 250})).unwrap();
        assert_eq!(m.manual_z_order, None);
        let m: WindowMetadata =
            serde_json::from_value(json!({"id": "win1", "manualZOrder": 7})).unwrap();
        assert_eq!(m.manual_z_order, Some(7));
    }

    #[test]
    fn merge_keeps_timestamps_and_extra_fields() {
        let mut old: WindowMetadata = serde_json::from_value(json!({
            "id": "win2",
            "title": "Old",
            "createdAt": "2024-01-01T00:00:00Z",
            "registeredAt": "2024-01-01T00:00:01Z",
            "manualZOrder": 10,
            "color": "blue"
        }))
        .unwrap();
        let mut newer = WindowMetadata::new(WindowId::new("win2"), "New");
        newer.created_at = None;
        newer.extra.insert("pinned".into(), json!(true));
        old.merge_from(newer);

        assert_eq!(old.title, "New");
        assert_eq!(old.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(old.registered_at.as_deref(), Some("2024-01-01T00:00:01Z"));
        assert_eq!(old.manual_z_order, None);
        assert_eq!(old.extra.get("color"), Some(&json!("blue")));
        assert_eq!(old.extra.get("pinned"), Some(&json!(true)));
    }
}
