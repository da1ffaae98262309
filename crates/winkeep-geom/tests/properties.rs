//! Round-trip and invariant properties of the grid, detector and reconciler.

use proptest::prelude::*;
use winkeep_geom::{
    BoundsReconciler, BoundsRequest, Display, Rect, RestorePlan, SavedGeometry, SnapDetector,
    SnapType, grid_candidates,
};

fn work_area_strategy() -> impl Strategy<Value = Rect> {
    (-3000i32..3000, -3000i32..3000, 600i32..5000, 400i32..3000)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn display_for(wa: Rect) -> Display {
    Display::new(1, Rect::new(wa.x, wa.y, wa.width, wa.height + 40), wa).primary()
}

proptest! {
    #[test]
    fn grid_cells_classify_as_themselves(wa in work_area_strategy()) {
        let d = display_for(wa);
        let det = SnapDetector::default();
        for (t, r) in grid_candidates(&wa) {
            let info = det.detect(&r, &d);
            prop_assert_eq!(info.snap_type, Some(t));
            prop_assert!(!info.is_third_party);
            prop_assert_eq!(info.work_area, wa);
        }
    }
}

proptest! {
    #[test]
    fn offset_beyond_tolerance_is_not_snapped(
        wa in work_area_strategy(),
        shift in 11i32..100,
    ) {
        let d = display_for(wa);
        let det = SnapDetector::default();
        let left_half = SnapType::LeftHalf.bounds_in(&wa).unwrap_or_default();
        let moved = Rect::new(left_half.x + shift, left_half.y, left_half.width, left_half.height);
        let info = det.detect(&moved, &d);
        prop_assert!(!info.is_snapped);
        prop_assert_eq!(info.snap_type, None);
    }
}

proptest! {
    #[test]
    fn new_window_bounds_fit_work_area(
        wa in work_area_strategy(),
        w in prop::option::of(-100.0f64..8000.0),
        h in prop::option::of(-100.0f64..8000.0),
        pos in prop::option::of((-9000.0f64..9000.0, -9000.0f64..9000.0)),
    ) {
        let r = BoundsReconciler::default();
        let req = BoundsRequest {
            x: pos.map(|p| p.0),
            y: pos.map(|p| p.1),
            width: w,
            height: h,
        };
        let b = r.safe_bounds(None, &req, &[display_for(wa)]);
        prop_assert!(b.width >= 200 && b.height >= 150);
        prop_assert!(b.left() >= wa.left() && b.right() <= wa.right());
        prop_assert!(b.top() >= wa.top() && b.bottom() <= wa.bottom());
    }
}

proptest! {
    #[test]
    fn unsnapped_restore_is_verbatim(
        x in -10000i32..10000,
        y in -10000i32..10000,
        w in 1i32..6000,
        h in 1i32..6000,
        wa in work_area_strategy(),
    ) {
        let r = BoundsReconciler::default();
        let saved = SavedGeometry {
            x: Some(x),
            y: Some(y),
            width: Some(w),
            height: Some(h),
            work_area: Some(Rect::new(0, 0, 1920, 1040)),
            ..SavedGeometry::default()
        };
        prop_assert_eq!(
            r.restore_bounds(&saved, &display_for(wa)),
            RestorePlan::Exact(Rect::new(x, y, w, h))
        );
    }
}

proptest! {
    #[test]
    fn grid_layout_follows_work_area_change(
        old in work_area_strategy(),
        new in work_area_strategy(),
        idx in 0usize..13,
    ) {
        prop_assume!(old != new);
        let t = winkeep_geom::GRID_ORDER[idx];
        let saved_rect = t.bounds_in(&old).unwrap_or_default();
        let saved = SavedGeometry {
            x: Some(saved_rect.x),
            y: Some(saved_rect.y),
            width: Some(saved_rect.width),
            height: Some(saved_rect.height),
            is_snapped: true,
            snap_type: Some(t),
            work_area: Some(old),
            ..SavedGeometry::default()
        };
        let plan = BoundsReconciler::default().restore_bounds(&saved, &display_for(new));
        prop_assert_eq!(plan.rect(), t.bounds_in(&new));
    }
}

proptest! {
    #[test]
    fn near_edge_halves_and_corners_are_third_party(
        wa in work_area_strategy(),
        inset in 1i32..6,
    ) {
        let d = display_for(wa);
        let db = d.bounds;
        let det = SnapDetector::default();
        let half_w = wa.width / 2 - inset;
        let half_h = wa.height / 2 - inset;

        let left = Rect::new(db.x + inset, db.y, half_w, wa.height - inset);
        prop_assert_eq!(det.detect(&left, &d).snap_type, Some(SnapType::ThirdPartyLeftHalf));

        let corner = Rect::new(
            db.right() - inset - half_w,
            db.bottom() - inset - half_h,
            half_w,
            half_h,
        );
        let info = det.detect(&corner, &d);
        prop_assert_eq!(info.snap_type, Some(SnapType::ThirdPartyBottomRight));
        prop_assert!(info.is_third_party);
    }
}
