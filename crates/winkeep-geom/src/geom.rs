//! Integer geometry primitives in device pixels.
//! Origin is top-left; `y` grows downward as reported by desktop toolkits.

use serde::{Deserialize, Serialize};

/// Pixel-space rectangle with integer coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Horizontal origin in pixels.
    pub x: i32,
    /// Vertical origin in pixels.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Construct a rectangle from origin and size.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge.
    #[inline]
    #[must_use]
    pub const fn left(&self) -> i32 {
        self.x
    }

    /// Right edge, saturating for out-of-range saved bounds.
    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Top edge.
    #[inline]
    #[must_use]
    pub const fn top(&self) -> i32 {
        self.y
    }

    /// Bottom edge, saturating like [`Rect::right`].
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Area in square pixels, zero for degenerate rectangles.
    #[must_use]
    pub fn area(&self) -> i64 {
        i64::from(self.width.max(0)) * i64::from(self.height.max(0))
    }

    /// Area shared with `other`, zero when they do not overlap.
    #[must_use]
    pub fn intersection_area(&self, other: &Self) -> i64 {
        let w = overlap_1d(self.left(), self.right(), other.left(), other.right());
        let h = overlap_1d(self.top(), self.bottom(), other.top(), other.bottom());
        i64::from(w) * i64::from(h)
    }

    /// Inclusive point containment.
    #[must_use]
    pub fn contains_point(&self, px: i32, py: i32) -> bool {
        px >= self.left() && px <= self.right() && py >= self.top() && py <= self.bottom()
    }

    /// Center point, rounded toward the origin.
    #[must_use]
    pub fn center(&self) -> (i32, i32) {
        (
            self.x.saturating_add(self.width.div_euclid(2)),
            self.y.saturating_add(self.height.div_euclid(2)),
        )
    }
}

/// True when `a` and `b` differ by at most `eps`.
#[inline]
pub fn approx_eq(a: i32, b: i32, eps: i32) -> bool {
    (i64::from(a) - i64::from(b)).abs() <= i64::from(eps)
}

/// Length shared by the intervals `[a1, a2]` and `[b1, b2]`, zero when disjoint.
#[inline]
pub fn overlap_1d(a1: i32, a2: i32, b1: i32, b2: i32) -> i32 {
    let l = a1.max(b1);
    let r = a2.min(b2);
    r.saturating_sub(l).max(0)
}

// Grid helpers ----------------------------------------------------------------

/// Rectangle covering `span` columns starting at `col` (and likewise rows) of a
/// `cols` x `rows` grid laid over `area`.
///
/// Tiles use floor division; whichever cell touches the right or bottom edge
/// absorbs the remainder so the grid always covers `area` exactly.
#[must_use]
pub fn grid_span_rect(
    area: &Rect,
    cols: i32,
    rows: i32,
    (col, row): (i32, i32),
    (col_span, row_span): (i32, i32),
) -> Rect {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let tile_w = area.width.div_euclid(cols);
    let tile_h = area.height.div_euclid(rows);

    let x = area.x + tile_w * col;
    let width = if col + col_span >= cols {
        area.width - tile_w * col
    } else {
        tile_w * col_span
    };
    let y = area.y + tile_h * row;
    let height = if row + row_span >= rows {
        area.height - tile_h * row
    } else {
        tile_h * row_span
    };
    Rect::new(x, y, width, height)
}

/// Single-cell convenience wrapper around [`grid_span_rect`].
#[must_use]
pub fn grid_cell_rect(area: &Rect, cols: i32, rows: i32, col: i32, row: i32) -> Rect {
    grid_span_rect(area, cols, rows, (col, row), (1, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_eq_works() {
        assert!(approx_eq(1, 1, 0));
        assert!(approx_eq(10, 20, 10));
        assert!(!approx_eq(10, 21, 10));
    }

    #[test]
    fn rect_edges_and_center() {
        let r = Rect::new(10, 20, 30, 40);
        assert_eq!(r.left(), 10);
        assert_eq!(r.right(), 40);
        assert_eq!(r.top(), 20);
        assert_eq!(r.bottom(), 60);
        assert_eq!(r.center(), (25, 40));
    }

    #[test]
    fn edges_saturate_for_out_of_range_bounds() {
        let r = Rect::new(i32::MAX - 5, i32::MAX - 5, 100, 100);
        assert_eq!(r.right(), i32::MAX);
        assert_eq!(r.bottom(), i32::MAX);
        let work = Rect::new(0, 0, 1920, 1040);
        assert_eq!(r.intersection_area(&work), 0);
        assert_eq!(overlap_1d(i32::MIN, i32::MAX, i32::MIN, 0), i32::MAX);
        assert!(!approx_eq(i32::MIN, i32::MAX, 10));
    }

    #[test]
    fn point_in_rect_inclusive() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains_point(0, 0));
        assert!(r.contains_point(10, 10));
        assert!(!r.contains_point(-1, 0));
        assert!(!r.contains_point(0, 11));
    }

    #[test]
    fn intersection_area_counts_overlap_only() {
        let a = Rect::new(0, 0, 50, 50);
        let b = Rect::new(40, 10, 50, 50);
        assert_eq!(a.intersection_area(&b), 10 * 40);
        let c = Rect::new(100, 100, 5, 5);
        assert_eq!(a.intersection_area(&c), 0);
    }

    #[test]
    fn grid_cell_rect_corners_and_remainders() {
        let area = Rect::new(0, 0, 100, 100);
        assert_eq!(grid_cell_rect(&area, 3, 2, 0, 0), Rect::new(0, 0, 33, 50));
        assert_eq!(grid_cell_rect(&area, 3, 2, 2, 0), Rect::new(66, 0, 34, 50));
        assert_eq!(grid_cell_rect(&area, 3, 2, 0, 1).y, 50);
    }

    #[test]
    fn grid_span_covers_to_far_edge() {
        let area = Rect::new(5, 0, 1000, 700);
        assert_eq!(
            grid_span_rect(&area, 3, 1, (0, 0), (2, 1)),
            Rect::new(5, 0, 666, 700)
        );
        assert_eq!(
            grid_span_rect(&area, 3, 1, (1, 0), (2, 1)),
            Rect::new(338, 0, 667, 700)
        );
    }
}
