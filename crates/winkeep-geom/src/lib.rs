//! winkeep-geom: geometry for persisted desktop windows.
//!
//! Pure functions only. Nothing here talks to a windowing system; callers hand
//! in [`Display`] snapshots and window rectangles and get back snap
//! classifications and the bounds to apply.
#![warn(missing_docs)]

mod display;
mod geom;
mod reconcile;
mod snap;

pub use display::{Display, display_matching, display_or_primary, primary_display};
pub use geom::{Rect, approx_eq, grid_cell_rect, grid_span_rect, overlap_1d};
pub use reconcile::{BoundsReconciler, BoundsRequest, Limits, RestorePlan, SavedGeometry};
pub use snap::{
    DEFAULT_SNAP_TOLERANCE, GRID_ORDER, SnapDetector, SnapInfo, SnapType, THIRD_PARTY_PREFIX,
    UnknownSnapType, grid_candidates, snap_bounds,
};
pub use winkeep_ids::DisplayId;
