//! Two-tier stacking order.
//!
//! Windows with a manual band (1..=100) always stack above windows ordered by
//! focus recency. Within the automatic tier, the most recently focused window
//! is highest. [`Priority`] encodes the tiers directly; the numeric value
//! older versions persisted is still produced by [`Priority::legacy_value`].

use std::{cmp::Reverse, collections::HashMap};

use serde::Serialize;
use winkeep_ids::WindowId;

/// Lowest manual band.
pub const MANUAL_MIN: u8 = 1;
/// Highest manual band.
pub const MANUAL_MAX: u8 = 100;
/// Band assumed by relative adjustments on a window without one.
pub const MANUAL_DEFAULT: u8 = 50;

/// Legacy value below which priorities are automatic.
const LEGACY_MANUAL_BASE: i64 = 100_000;
/// Legacy distance between adjacent manual bands.
const LEGACY_MANUAL_STEP: i64 = 1_000;

/// Effective stacking priority. Variant order is tier order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "tier", content = "rank", rename_all = "camelCase")]
pub enum Priority {
    /// Ordered by focus recency counter value.
    Automatic(u64),
    /// Pinned band.
    Manual(u8),
}

impl Priority {
    /// Numeric encoding used in persisted state: `100000 + n * 1000` for
    /// manual bands, the rank itself otherwise.
    #[must_use]
    pub fn legacy_value(self) -> i64 {
        match self {
            Self::Automatic(rank) => i64::try_from(rank).unwrap_or(i64::MAX),
            Self::Manual(n) => LEGACY_MANUAL_BASE + i64::from(n) * LEGACY_MANUAL_STEP,
        }
    }

    /// Decode a persisted numeric value. Negative values read as rank 0.
    #[must_use]
    pub fn from_legacy(value: i64) -> Self {
        if value > LEGACY_MANUAL_BASE {
            let band = (value - LEGACY_MANUAL_BASE) / LEGACY_MANUAL_STEP;
            let band = band.clamp(i64::from(MANUAL_MIN), i64::from(MANUAL_MAX));
            Self::Manual(u8::try_from(band).unwrap_or(MANUAL_MAX))
        } else {
            Self::Automatic(u64::try_from(value).unwrap_or(0))
        }
    }

    /// True for the manual tier.
    #[must_use]
    pub const fn is_manual(self) -> bool {
        matches!(self, Self::Manual(_))
    }
}

/// Normalize a requested manual band. Missing values and values outside
/// `1..=100` clear the band.
#[must_use]
pub fn normalize_manual(requested: Option<i64>) -> Option<u8> {
    requested
        .filter(|n| (i64::from(MANUAL_MIN)..=i64::from(MANUAL_MAX)).contains(n))
        .and_then(|n| u8::try_from(n).ok())
}

/// Tracks automatic ranks and manual bands for live windows.
///
/// Pure bookkeeping: callers apply the resulting order to native windows.
#[derive(Debug, Default)]
pub struct StackOrderController {
    /// Last issued automatic rank.
    counter: u64,
    /// Automatic ranks; absent means 0.
    ranks: HashMap<WindowId, u64>,
    /// Manual bands.
    manual: HashMap<WindowId, u8>,
}

impl StackOrderController {
    /// Empty controller; the counter starts at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last issued counter value.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Issue the next automatic rank.
    fn next_rank(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    /// Give `id` the next automatic rank. A manual band is left in place and
    /// still dominates.
    pub fn bring_to_top(&mut self, id: &WindowId) -> u64 {
        let rank = self.next_rank();
        self.ranks.insert(id.clone(), rank);
        rank
    }

    /// Record a focus or show. Manual windows keep their rank; returns whether
    /// the automatic rank changed.
    pub fn note_focus(&mut self, id: &WindowId) -> bool {
        if self.manual.contains_key(id) {
            return false;
        }
        self.bring_to_top(id);
        true
    }

    /// Pin `id` to `band`, clamped to `1..=100`.
    pub fn set_manual(&mut self, id: &WindowId, band: u8) {
        self.manual.insert(id.clone(), band.clamp(MANUAL_MIN, MANUAL_MAX));
    }

    /// Adopt a rank carried over from a previous session. The counter is
    /// raised so later focus still lands above it.
    pub fn restore_rank(&mut self, id: &WindowId, rank: u64) {
        self.ranks.insert(id.clone(), rank);
        self.counter = self.counter.max(rank);
    }

    /// Drop the manual band. Returns the previous band.
    pub fn clear_manual(&mut self, id: &WindowId) -> Option<u8> {
        self.manual.remove(id)
    }

    /// Manual band of `id`, if pinned.
    pub fn manual(&self, id: &WindowId) -> Option<u8> {
        self.manual.get(id).copied()
    }

    /// Current automatic rank; 0 when never focused.
    pub fn rank(&self, id: &WindowId) -> u64 {
        self.ranks.get(id).copied().unwrap_or(0)
    }

    /// Effective priority of `id`.
    pub fn priority(&self, id: &WindowId) -> Priority {
        match self.manual(id) {
            Some(n) => Priority::Manual(n),
            None => Priority::Automatic(self.rank(id)),
        }
    }

    /// Forget everything about `id`.
    pub fn forget(&mut self, id: &WindowId) {
        self.ranks.remove(id);
        self.manual.remove(id);
    }

    /// `ids` sorted bottom-to-top. Ties keep their input order.
    pub fn order(&self, ids: &[WindowId]) -> Vec<WindowId> {
        let mut out = ids.to_vec();
        out.sort_by_key(|id| self.priority(id));
        out
    }

    /// Reassign fresh consecutive ranks to the automatic windows in `live`,
    /// keeping their relative order. `most_recent`, if automatic, is placed
    /// above the others. Manual windows are untouched.
    pub fn rerank_automatic(&mut self, live: &[WindowId], most_recent: Option<&WindowId>) {
        let mut auto: Vec<&WindowId> = live
            .iter()
            .filter(|id| !self.manual.contains_key(*id))
            .collect();
        auto.sort_by_key(|id| (Some(*id) == most_recent, self.rank(id)));
        for id in auto {
            let rank = self.next_rank();
            self.ranks.insert(id.clone(), rank);
        }
    }

    /// `ids` sorted most recent first.
    pub fn most_recent_first(&self, ids: &[WindowId]) -> Vec<WindowId> {
        let mut out = ids.to_vec();
        out.sort_by_key(|id| Reverse(self.priority(id)));
        out
    }
}
