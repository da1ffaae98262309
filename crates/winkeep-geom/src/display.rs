//! Display topology as reported by the host.
//!
//! Displays are read-only inputs. They can appear, disappear or change their
//! work area between sessions, so every lookup here has a fallback.

use serde::{Deserialize, Serialize};
use tracing::debug;
use winkeep_ids::DisplayId;

use crate::geom::Rect;

/// A physical or virtual display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Display {
    /// Host-assigned identifier.
    pub id: DisplayId,
    /// Full display rectangle in global coordinates.
    pub bounds: Rect,
    /// Usable rectangle excluding taskbars, docks and menu bars.
    pub work_area: Rect,
    /// Backing scale factor.
    #[serde(default = "default_scale")]
    pub scale_factor: f64,
    /// True for the display the host considers primary.
    #[serde(default)]
    pub is_primary: bool,
    /// Human-readable label, if the host provides one.
    #[serde(default)]
    pub label: Option<String>,
}

/// Scale assumed when the host omits one.
fn default_scale() -> f64 {
    1.0
}

impl Display {
    /// Construct a display with unit scale and no label.
    #[must_use]
    pub fn new(id: DisplayId, bounds: Rect, work_area: Rect) -> Self {
        Self {
            id,
            bounds,
            work_area,
            scale_factor: 1.0,
            is_primary: false,
            label: None,
        }
    }

    /// Mark this display as primary.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Label, or a generated `Display <id>` when the host gave none.
    #[must_use]
    pub fn label_or_default(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("Display {}", self.id))
    }
}

/// The primary display, falling back to the first one listed.
#[must_use]
pub fn primary_display(displays: &[Display]) -> Option<&Display> {
    displays
        .iter()
        .find(|d| d.is_primary)
        .or_else(|| displays.first())
}

/// Display with the given id, falling back to the primary display.
#[must_use]
pub fn display_or_primary(displays: &[Display], id: Option<DisplayId>) -> Option<&Display> {
    if let Some(id) = id {
        if let Some(d) = displays.iter().find(|d| d.id == id) {
            return Some(d);
        }
        debug!(display_id = id, "saved display not present; using primary");
    }
    primary_display(displays)
}

/// Display sharing the largest area with `rect`; the primary display when the
/// rectangle is entirely off-screen.
#[must_use]
pub fn display_matching<'a>(displays: &'a [Display], rect: &Rect) -> Option<&'a Display> {
    let mut best: Option<(&Display, i64)> = None;
    for d in displays {
        let area = d.bounds.intersection_area(rect);
        if area > 0 && best.is_none_or(|(_, a)| area > a) {
            best = Some((d, area));
        }
    }
    best.map(|(d, _)| d).or_else(|| primary_display(displays))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_displays() -> Vec<Display> {
        vec![
            Display::new(1, Rect::new(0, 0, 1920, 1080), Rect::new(0, 0, 1920, 1040)).primary(),
            Display::new(
                2,
                Rect::new(1920, 0, 2560, 1440),
                Rect::new(1920, 0, 2560, 1400),
            ),
        ]
    }

    #[test]
    fn missing_id_falls_back_to_primary() {
        let displays = two_displays();
        assert_eq!(display_or_primary(&displays, Some(99)).map(|d| d.id), Some(1));
        assert_eq!(display_or_primary(&displays, Some(2)).map(|d| d.id), Some(2));
        assert_eq!(display_or_primary(&displays, None).map(|d| d.id), Some(1));
    }

    #[test]
    fn matching_picks_largest_overlap() {
        let displays = two_displays();
        let straddling = Rect::new(1800, 100, 800, 600);
        assert_eq!(
            display_matching(&displays, &straddling).map(|d| d.id),
            Some(2)
        );
        let offscreen = Rect::new(-5000, -5000, 10, 10);
        assert_eq!(
            display_matching(&displays, &offscreen).map(|d| d.id),
            Some(1)
        );
    }

    #[test]
    fn primary_defaults_to_first() {
        let displays = vec![Display::new(
            7,
            Rect::new(0, 0, 800, 600),
            Rect::new(0, 0, 800, 600),
        )];
        assert_eq!(primary_display(&displays).map(|d| d.id), Some(7));
        assert!(primary_display(&[]).is_none());
    }
}
