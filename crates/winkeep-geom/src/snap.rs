//! Snap layout classification.
//!
//! Detection runs in two passes:
//! - **Grid**: the window bounds are compared for exact equality against the
//!   thirteen layouts the OS computes from the display work area with floor
//!   division. The first match in [`GRID_ORDER`] wins.
//! - **Edge heuristic**: when no grid cell matches, bounds that hug display
//!   edges with roughly half or full work-area dimensions (within a pixel
//!   tolerance) are reported as one of the `third-party-*` layouts.
//!
//! Grid matches are reproducible from the work area alone, which is what lets
//! a restore recompute them for a different display. Third-party matches are
//! not, so they are restored verbatim.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    display::Display,
    geom::{Rect, approx_eq, grid_cell_rect, grid_span_rect},
};

/// Default pixel tolerance for the third-party edge heuristic.
pub const DEFAULT_SNAP_TOLERANCE: i32 = 10;

/// Prefix shared by all heuristic layout names.
pub const THIRD_PARTY_PREFIX: &str = "third-party-";

/// Named partition of a work area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapType {
    /// Left half of the work area.
    LeftHalf,
    /// Right half.
    RightHalf,
    /// Top half.
    TopHalf,
    /// Bottom half.
    BottomHalf,
    /// Top-left quarter.
    TopLeft,
    /// Top-right quarter.
    TopRight,
    /// Bottom-left quarter.
    BottomLeft,
    /// Bottom-right quarter.
    BottomRight,
    /// Left third.
    LeftThird,
    /// Middle third.
    MiddleThird,
    /// Right third.
    RightThird,
    /// Left two thirds.
    LeftTwoThirds,
    /// Right two thirds.
    RightTwoThirds,
    /// Left half placed by a tiling tool, within tolerance.
    ThirdPartyLeftHalf,
    /// Right half placed by a tiling tool, within tolerance.
    ThirdPartyRightHalf,
    /// Top half placed by a tiling tool, within tolerance.
    ThirdPartyTopHalf,
    /// Bottom half placed by a tiling tool, within tolerance.
    ThirdPartyBottomHalf,
    /// Top-left quarter placed by a tiling tool, within tolerance.
    ThirdPartyTopLeft,
    /// Top-right quarter placed by a tiling tool, within tolerance.
    ThirdPartyTopRight,
    /// Bottom-left quarter placed by a tiling tool, within tolerance.
    ThirdPartyBottomLeft,
    /// Bottom-right quarter placed by a tiling tool, within tolerance.
    ThirdPartyBottomRight,
}

/// Grid layouts in detection priority order.
pub const GRID_ORDER: [SnapType; 13] = [
    SnapType::LeftHalf,
    SnapType::RightHalf,
    SnapType::TopHalf,
    SnapType::BottomHalf,
    SnapType::TopLeft,
    SnapType::TopRight,
    SnapType::BottomLeft,
    SnapType::BottomRight,
    SnapType::LeftThird,
    SnapType::MiddleThird,
    SnapType::RightThird,
    SnapType::LeftTwoThirds,
    SnapType::RightTwoThirds,
];

/// Every layout, for name lookup.
const ALL: [SnapType; 21] = [
    SnapType::LeftHalf,
    SnapType::RightHalf,
    SnapType::TopHalf,
    SnapType::BottomHalf,
    SnapType::TopLeft,
    SnapType::TopRight,
    SnapType::BottomLeft,
    SnapType::BottomRight,
    SnapType::LeftThird,
    SnapType::MiddleThird,
    SnapType::RightThird,
    SnapType::LeftTwoThirds,
    SnapType::RightTwoThirds,
    SnapType::ThirdPartyLeftHalf,
    SnapType::ThirdPartyRightHalf,
    SnapType::ThirdPartyTopHalf,
    SnapType::ThirdPartyBottomHalf,
    SnapType::ThirdPartyTopLeft,
    SnapType::ThirdPartyTopRight,
    SnapType::ThirdPartyBottomLeft,
    SnapType::ThirdPartyBottomRight,
];

impl SnapType {
    /// Stable kebab-case name, identical to the persisted form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeftHalf => "left-half",
            Self::RightHalf => "right-half",
            Self::TopHalf => "top-half",
            Self::BottomHalf => "bottom-half",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::LeftThird => "left-third",
            Self::MiddleThird => "middle-third",
            Self::RightThird => "right-third",
            Self::LeftTwoThirds => "left-two-thirds",
            Self::RightTwoThirds => "right-two-thirds",
            Self::ThirdPartyLeftHalf => "third-party-left-half",
            Self::ThirdPartyRightHalf => "third-party-right-half",
            Self::ThirdPartyTopHalf => "third-party-top-half",
            Self::ThirdPartyBottomHalf => "third-party-bottom-half",
            Self::ThirdPartyTopLeft => "third-party-top-left",
            Self::ThirdPartyTopRight => "third-party-top-right",
            Self::ThirdPartyBottomLeft => "third-party-bottom-left",
            Self::ThirdPartyBottomRight => "third-party-bottom-right",
        }
    }

    /// True for layouts produced by the edge heuristic.
    #[must_use]
    pub fn is_third_party(self) -> bool {
        self.as_str().starts_with(THIRD_PARTY_PREFIX)
    }

    /// Grid rectangle for this layout within `work_area`.
    ///
    /// Returns `None` for third-party layouts, which have no canonical formula.
    #[must_use]
    pub fn bounds_in(self, work_area: &Rect) -> Option<Rect> {
        let wa = work_area;
        let r = match self {
            Self::LeftHalf => grid_cell_rect(wa, 2, 1, 0, 0),
            Self::RightHalf => grid_cell_rect(wa, 2, 1, 1, 0),
            Self::TopHalf => grid_cell_rect(wa, 1, 2, 0, 0),
            Self::BottomHalf => grid_cell_rect(wa, 1, 2, 0, 1),
            Self::TopLeft => grid_cell_rect(wa, 2, 2, 0, 0),
            Self::TopRight => grid_cell_rect(wa, 2, 2, 1, 0),
            Self::BottomLeft => grid_cell_rect(wa, 2, 2, 0, 1),
            Self::BottomRight => grid_cell_rect(wa, 2, 2, 1, 1),
            Self::LeftThird => grid_cell_rect(wa, 3, 1, 0, 0),
            Self::MiddleThird => grid_cell_rect(wa, 3, 1, 1, 0),
            Self::RightThird => grid_cell_rect(wa, 3, 1, 2, 0),
            Self::LeftTwoThirds => grid_span_rect(wa, 3, 1, (0, 0), (2, 1)),
            Self::RightTwoThirds => grid_span_rect(wa, 3, 1, (1, 0), (2, 1)),
            _ => return None,
        };
        Some(r)
    }
}

impl fmt::Display for SnapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown layout name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown snap type: {0}")]
pub struct UnknownSnapType(pub String);

impl FromStr for SnapType {
    type Err = UnknownSnapType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL.iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownSnapType(s.to_string()))
    }
}

/// Result of classifying a window's bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapInfo {
    /// True when any layout matched.
    pub is_snapped: bool,
    /// The matched layout.
    pub snap_type: Option<SnapType>,
    /// True when the match came from the edge heuristic.
    pub is_third_party: bool,
    /// Work area used for the classification.
    pub work_area: Rect,
}

impl SnapInfo {
    /// Classification for a matched layout, or none.
    fn from_type(snap_type: Option<SnapType>, work_area: Rect) -> Self {
        Self {
            is_snapped: snap_type.is_some(),
            snap_type,
            is_third_party: snap_type.is_some_and(SnapType::is_third_party),
            work_area,
        }
    }
}

/// All grid candidates for `work_area`, in detection order.
#[must_use]
pub fn grid_candidates(work_area: &Rect) -> Vec<(SnapType, Rect)> {
    GRID_ORDER
        .iter()
        .filter_map(|t| t.bounds_in(work_area).map(|r| (*t, r)))
        .collect()
}

/// Grid rectangle for `snap_type` within `work_area`, if it has one.
#[must_use]
pub fn snap_bounds(snap_type: SnapType, work_area: &Rect) -> Option<Rect> {
    snap_type.bounds_in(work_area)
}

/// Classifies window bounds against a display's snap layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapDetector {
    /// Pixel slack for the edge heuristic.
    tolerance: i32,
}

impl Default for SnapDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SNAP_TOLERANCE)
    }
}

impl SnapDetector {
    /// Detector using `tolerance` pixels for the edge heuristic.
    #[must_use]
    pub const fn new(tolerance: i32) -> Self {
        Self { tolerance }
    }

    /// Tolerance applied by the edge heuristic.
    #[must_use]
    pub const fn tolerance(&self) -> i32 {
        self.tolerance
    }

    /// Classify `bounds` on `display`.
    #[must_use]
    pub fn detect(&self, bounds: &Rect, display: &Display) -> SnapInfo {
        let wa = display.work_area;
        let grid = GRID_ORDER
            .iter()
            .copied()
            .find(|t| t.bounds_in(&wa).as_ref() == Some(bounds));
        let snap_type = grid.or_else(|| self.edge_heuristic(bounds, display));
        SnapInfo::from_type(snap_type, wa)
    }

    /// Match edges flush with the work area within the tolerance.
    fn edge_heuristic(&self, bounds: &Rect, display: &Display) -> Option<SnapType> {
        let t = self.tolerance;
        let db = &display.bounds;
        let wa = &display.work_area;

        let at_left = approx_eq(bounds.left(), db.left(), t);
        let at_right = approx_eq(bounds.right(), db.right(), t);
        let at_top = approx_eq(bounds.top(), db.top(), t);
        let at_bottom = approx_eq(bounds.bottom(), db.bottom(), t);

        let half_w = approx_eq(bounds.width, wa.width.div_euclid(2), t);
        let half_h = approx_eq(bounds.height, wa.height.div_euclid(2), t);
        let full_w = approx_eq(bounds.width, wa.width, t);
        let full_h = approx_eq(bounds.height, wa.height, t);

        let patterns = [
            (at_left && half_w && full_h, SnapType::ThirdPartyLeftHalf),
            (at_right && half_w && full_h, SnapType::ThirdPartyRightHalf),
            (at_top && full_w && half_h, SnapType::ThirdPartyTopHalf),
            (at_bottom && full_w && half_h, SnapType::ThirdPartyBottomHalf),
            (at_left && at_top && half_w && half_h, SnapType::ThirdPartyTopLeft),
            (at_right && at_top && half_w && half_h, SnapType::ThirdPartyTopRight),
            (
                at_left && at_bottom && half_w && half_h,
                SnapType::ThirdPartyBottomLeft,
            ),
            (
                at_right && at_bottom && half_w && half_h,
                SnapType::ThirdPartyBottomRight,
            ),
        ];
        patterns.iter().find(|(hit, _)| *hit).map(|(_, t)| *t)
    }

    /// True when `bounds` is an exact grid cell whose origin also sits on one
    /// of the grid's column and row boundaries.
    ///
    /// Separates layouts the OS produced from applications that merely sized
    /// themselves identically.
    #[must_use]
    pub fn is_native_snap(&self, bounds: &Rect, display: &Display) -> bool {
        let wa = display.work_area;
        let matches_cell = grid_candidates(&wa).iter().any(|(_, r)| r == bounds);
        let half_w = wa.width.div_euclid(2);
        let third_w = wa.width.div_euclid(3);
        let half_h = wa.height.div_euclid(2);
        let col_ok = [wa.x, wa.x + half_w, wa.x + third_w, wa.x + 2 * third_w].contains(&bounds.x);
        let row_ok = [wa.y, wa.y + half_h].contains(&bounds.y);
        matches_cell && col_ok && row_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(wa: Rect) -> Display {
        Display::new(1, Rect::new(wa.x, wa.y, wa.width, wa.height + 40), wa)
    }

    #[test]
    fn every_grid_cell_round_trips() {
        let wa = Rect::new(0, 0, 1921, 1041);
        let d = display(wa);
        let det = SnapDetector::default();
        for (t, r) in grid_candidates(&wa) {
            let info = det.detect(&r, &d);
            assert!(info.is_snapped, "{t} not detected");
            assert!(!info.is_third_party);
            assert_eq!(info.snap_type, Some(t));
        }
    }

    #[test]
    fn left_half_of_standard_work_area() {
        let wa = Rect::new(0, 0, 1920, 1040);
        let info = SnapDetector::default().detect(&Rect::new(0, 0, 960, 1040), &display(wa));
        assert_eq!(info.snap_type, Some(SnapType::LeftHalf));
        assert_eq!(info.work_area, wa);
    }

    #[test]
    fn right_third_absorbs_remainder() {
        let wa = Rect::new(0, 0, 1800, 1000);
        assert_eq!(
            SnapType::RightThird.bounds_in(&wa),
            Some(Rect::new(1200, 0, 600, 1000))
        );
        let wa = Rect::new(0, 0, 1801, 1000);
        assert_eq!(
            SnapType::RightThird.bounds_in(&wa),
            Some(Rect::new(1200, 0, 601, 1000))
        );
    }

    #[test]
    fn approximate_left_half_is_third_party() {
        let wa = Rect::new(0, 0, 1920, 1040);
        let bounds = Rect::new(0, 0, 965, 1040);
        let info = SnapDetector::default().detect(&bounds, &display(wa));
        assert_eq!(info.snap_type, Some(SnapType::ThirdPartyLeftHalf));
        assert!(info.is_third_party);
        assert!(info.is_snapped);
    }

    #[test]
    fn corner_heuristics_need_both_edges() {
        let wa = Rect::new(0, 0, 1920, 1040);
        let d = Display::new(1, Rect::new(0, 0, 1920, 1080), wa);
        let det = SnapDetector::default();
        // Bottom-right corner measured against the full display bounds.
        let br = Rect::new(962, 562, 958, 518);
        assert_eq!(
            det.detect(&br, &d).snap_type,
            Some(SnapType::ThirdPartyBottomRight)
        );
        let floating = Rect::new(400, 300, 958, 518);
        assert_eq!(det.detect(&floating, &d).snap_type, None);
    }

    #[test]
    fn unsnapped_bounds() {
        let wa = Rect::new(0, 0, 1920, 1040);
        let info = SnapDetector::default().detect(&Rect::new(200, 150, 800, 600), &display(wa));
        assert!(!info.is_snapped);
        assert!(info.snap_type.is_none());
        assert!(!info.is_third_party);
    }

    #[test]
    fn third_party_types_have_no_formula() {
        let wa = Rect::new(0, 0, 100, 100);
        assert!(SnapType::ThirdPartyLeftHalf.bounds_in(&wa).is_none());
        assert!(snap_bounds(SnapType::BottomHalf, &wa).is_some());
    }

    #[test]
    fn names_parse_back() {
        for t in ALL {
            assert_eq!(t.as_str().parse::<SnapType>(), Ok(t));
        }
        assert!("sideways".parse::<SnapType>().is_err());
    }

    #[test]
    fn native_snap_requires_grid_origin() {
        let wa = Rect::new(0, 0, 1920, 1040);
        let d = display(wa);
        let det = SnapDetector::default();
        assert!(det.is_native_snap(&Rect::new(960, 0, 960, 1040), &d));
        assert!(det.is_native_snap(&Rect::new(640, 0, 640, 1040), &d));
        assert!(!det.is_native_snap(&Rect::new(5, 0, 960, 1040), &d));
    }
}
