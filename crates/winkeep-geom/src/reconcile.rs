//! Bounds reconciliation for window creation and restoration.
//!
//! Two paths exist and they deliberately treat constraints differently:
//! - **New windows** get a safe rectangle: default size, minimum size floor,
//!   work-area ceiling, and either centering or clamping into the work area.
//! - **Restored windows** get their saved rectangle back unmodified. The only
//!   adjustment is recomputing an OS grid layout when the work area changed.
//!
//! Creating a window with saved state first uses a placeholder near the target
//! display's origin; the real rectangle is applied by [`BoundsReconciler::restore_bounds`]
//! once the host reports the window ready.

use tracing::debug;
use winkeep_ids::DisplayId;

use crate::{
    display::{Display, display_or_primary},
    geom::Rect,
    snap::SnapType,
};

/// Geometry limits and defaults used when sanitizing bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Width used when none (or an invalid one) is supplied.
    pub default_width: i32,
    /// Height used when none (or an invalid one) is supplied.
    pub default_height: i32,
    /// Minimum width for brand-new windows.
    pub min_width: i32,
    /// Minimum height for brand-new windows.
    pub min_height: i32,
    /// Offset from the work-area origin for the creation placeholder.
    pub placeholder_offset: i32,
    /// Horizontal position substituted for non-finite input.
    pub fallback_x: i32,
    /// Vertical position substituted for non-finite input.
    pub fallback_y: i32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            default_width: 800,
            default_height: 600,
            min_width: 200,
            min_height: 150,
            placeholder_offset: 50,
            fallback_x: 100,
            fallback_y: 100,
        }
    }
}

/// Caller-requested bounds. Any field may be absent or non-finite.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundsRequest {
    /// Requested left edge.
    pub x: Option<f64>,
    /// Requested top edge.
    pub y: Option<f64>,
    /// Requested width.
    pub width: Option<f64>,
    /// Requested height.
    pub height: Option<f64>,
}

impl BoundsRequest {
    /// Request only a size.
    #[must_use]
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Request an explicit position and size.
    #[must_use]
    pub fn at(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
        }
    }

    /// True when both coordinates were given.
    fn has_position(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }
}

impl From<Rect> for BoundsRequest {
    fn from(r: Rect) -> Self {
        Self::at(
            f64::from(r.x),
            f64::from(r.y),
            f64::from(r.width),
            f64::from(r.height),
        )
    }
}

/// The subset of persisted window state the reconciler needs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SavedGeometry {
    /// Saved left edge.
    pub x: Option<i32>,
    /// Saved top edge.
    pub y: Option<i32>,
    /// Saved width.
    pub width: Option<i32>,
    /// Saved height.
    pub height: Option<i32>,
    /// Display the window was saved on.
    pub display_id: Option<DisplayId>,
    /// Saved maximized.
    pub is_maximized: bool,
    /// Saved fullscreen.
    pub is_full_screen: bool,
    /// Saved as a recognized layout.
    pub is_snapped: bool,
    /// The recognized layout.
    pub snap_type: Option<SnapType>,
    /// Work area at save time.
    pub work_area: Option<Rect>,
}

impl SavedGeometry {
    /// True when a position was saved; size alone does not count.
    #[must_use]
    pub fn has_position(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }
}

/// What to apply once a restored window is ready to be shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestorePlan {
    /// Maximize; saved bounds are kept for the next un-maximize.
    Maximize,
    /// Enter fullscreen; saved bounds are kept for leaving it.
    FullScreen,
    /// Apply the saved rectangle verbatim.
    Exact(Rect),
    /// Apply a grid layout recomputed for the current work area.
    Recomputed {
        /// Rectangle computed from the new work area.
        rect: Rect,
        /// Layout that was recomputed.
        snap_type: SnapType,
    },
    /// Nothing was saved; keep whatever the window was created with.
    Nothing,
}

impl RestorePlan {
    /// Rectangle this plan applies, if any.
    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        match self {
            Self::Exact(r) | Self::Recomputed { rect: r, .. } => Some(*r),
            Self::Maximize | Self::FullScreen | Self::Nothing => None,
        }
    }
}

/// Computes creation and restoration bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundsReconciler {
    /// Size floors and defaults.
    limits: Limits,
}

/// Drop non-finite values.
fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|f| f.is_finite())
}

/// Round into `i32` range.
fn round_i32(v: f64) -> i32 {
    v.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

impl BoundsReconciler {
    /// Reconciler using `limits`.
    #[must_use]
    pub const fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Configured limits.
    #[must_use]
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Bounds for creating a window.
    ///
    /// With saved state this is a placeholder at the target display's origin
    /// (plus a small offset) carrying the saved size. Without it, the safe
    /// bounds for a new window on the primary display.
    #[must_use]
    pub fn initial_bounds(
        &self,
        saved: Option<&SavedGeometry>,
        requested: &BoundsRequest,
        displays: &[Display],
    ) -> Rect {
        match saved.filter(|s| s.has_position()) {
            Some(saved) => {
                let size_w = saved
                    .width
                    .filter(|w| *w > 0)
                    .or_else(|| finite(requested.width).map(round_i32))
                    .unwrap_or(self.limits.default_width);
                let size_h = saved
                    .height
                    .filter(|h| *h > 0)
                    .or_else(|| finite(requested.height).map(round_i32))
                    .unwrap_or(self.limits.default_height);
                let origin = display_or_primary(displays, saved.display_id)
                    .map(|d| (d.work_area.x, d.work_area.y))
                    .unwrap_or((0, 0));
                let off = self.limits.placeholder_offset;
                Rect::new(origin.0 + off, origin.1 + off, size_w, size_h)
            }
            None => self.safe_bounds(saved.and_then(|s| s.display_id), requested, displays),
        }
    }

    /// Safe bounds for a brand-new window on `display_id` (or the primary).
    ///
    /// Size is floored at the minimum and capped at the work area. Without an
    /// explicit position the window is centered; otherwise it is clamped so it
    /// fits entirely inside the work area.
    #[must_use]
    pub fn safe_bounds(
        &self,
        display_id: Option<DisplayId>,
        requested: &BoundsRequest,
        displays: &[Display],
    ) -> Rect {
        let l = &self.limits;
        let mut width = finite(requested.width)
            .map(round_i32)
            .unwrap_or(l.default_width)
            .max(l.min_width);
        let mut height = finite(requested.height)
            .map(round_i32)
            .unwrap_or(l.default_height)
            .max(l.min_height);

        let Some(display) = display_or_primary(displays, display_id) else {
            debug!("safe_bounds: no displays; using sanitized request");
            return self.sanitize_new(requested);
        };
        let wa = display.work_area;
        width = width.min(wa.width);
        height = height.min(wa.height);

        if !requested.has_position() {
            return Rect::new(
                wa.x + (wa.width - width).div_euclid(2),
                wa.y + (wa.height - height).div_euclid(2),
                width,
                height,
            );
        }

        let x = finite(requested.x).map(round_i32).unwrap_or(l.fallback_x);
        let y = finite(requested.y).map(round_i32).unwrap_or(l.fallback_y);
        let x = x.min(wa.x + wa.width - width).max(wa.x);
        let y = y.min(wa.y + wa.height - height).max(wa.y);
        Rect::new(x, y, width, height)
    }

    /// Bounds to apply to a restored window on `display`.
    ///
    /// Never clamps: the size floor and work-area ceiling only exist for new
    /// windows.
    #[must_use]
    pub fn restore_bounds(&self, saved: &SavedGeometry, display: &Display) -> RestorePlan {
        if saved.is_maximized {
            return RestorePlan::Maximize;
        }
        if saved.is_full_screen {
            return RestorePlan::FullScreen;
        }
        let Some(exact) = self.saved_rect(saved) else {
            return RestorePlan::Nothing;
        };

        let grid_type = saved
            .snap_type
            .filter(|t| saved.is_snapped && !t.is_third_party());
        let Some(snap_type) = grid_type else {
            return RestorePlan::Exact(exact);
        };

        if saved.work_area == Some(display.work_area) {
            return RestorePlan::Exact(exact);
        }
        match snap_type.bounds_in(&display.work_area) {
            Some(rect) => {
                debug!(
                    snap = %snap_type,
                    ?rect,
                    "work area changed; recomputed snap bounds"
                );
                RestorePlan::Recomputed { rect, snap_type }
            }
            None => RestorePlan::Exact(exact),
        }
    }

    /// Like [`Self::restore_bounds`], resolving the saved display first.
    #[must_use]
    pub fn restore_plan(&self, saved: &SavedGeometry, displays: &[Display]) -> RestorePlan {
        match display_or_primary(displays, saved.display_id) {
            Some(display) => self.restore_bounds(saved, display),
            None => {
                if saved.is_maximized {
                    RestorePlan::Maximize
                } else if saved.is_full_screen {
                    RestorePlan::FullScreen
                } else {
                    self.saved_rect(saved)
                        .map_or(RestorePlan::Nothing, RestorePlan::Exact)
                }
            }
        }
    }

    /// Saved rectangle, filling a missing or empty size from defaults.
    fn saved_rect(&self, saved: &SavedGeometry) -> Option<Rect> {
        let (x, y) = (saved.x?, saved.y?);
        let width = saved
            .width
            .filter(|w| *w > 0)
            .unwrap_or(self.limits.default_width);
        let height = saved
            .height
            .filter(|h| *h > 0)
            .unwrap_or(self.limits.default_height);
        Some(Rect::new(x, y, width, height))
    }

    /// Replace non-finite or missing values with defaults, without clamping.
    #[must_use]
    pub fn sanitize_exact(&self, req: &BoundsRequest) -> Rect {
        let l = &self.limits;
        Rect::new(
            finite(req.x).map(round_i32).unwrap_or(l.fallback_x),
            finite(req.y).map(round_i32).unwrap_or(l.fallback_y),
            finite(req.width).map(round_i32).unwrap_or(l.default_width),
            finite(req.height).map(round_i32).unwrap_or(l.default_height),
        )
    }

    /// [`Self::sanitize_exact`] plus the new-window size floor.
    #[must_use]
    pub fn sanitize_new(&self, req: &BoundsRequest) -> Rect {
        let mut r = self.sanitize_exact(req);
        r.width = r.width.max(self.limits.min_width);
        r.height = r.height.max(self.limits.min_height);
        r
    }
}
