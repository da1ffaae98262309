//! Save cadence for geometry changes.
//!
//! Discrete state changes and snapped positions are saved at once; ordinary
//! drags and resizes are coalesced into one save after a quiet period.

use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, trace};
use winkeep_ids::WindowId;

use crate::ticker::Ticker;

/// How a geometry change was persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    /// Saved before returning.
    Immediate,
    /// A debounced save is pending.
    Debounced,
}

/// Pick the cadence for one event.
#[must_use]
pub const fn cadence_for(immediate: bool, snapped: bool) -> Cadence {
    if immediate || snapped {
        Cadence::Immediate
    } else {
        Cadence::Debounced
    }
}

/// Owns one debounce timer per window.
#[derive(Clone)]
pub struct PersistenceScheduler {
    /// Per-window debounce timers.
    ticker: Ticker,
    /// Quiet period before a continuous change is saved.
    debounce: Duration,
}

impl PersistenceScheduler {
    /// Scheduler with the given debounce window.
    pub fn new(debounce: Duration) -> Self {
        Self {
            ticker: Ticker::new(),
            debounce,
        }
    }

    /// Configured debounce window.
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Persist a geometry change for `id`.
    ///
    /// Immediate changes cancel any pending save and run `save` now. Otherwise
    /// `save` replaces the pending timer. Without a runtime to host the timer,
    /// the save runs now.
    pub fn on_geometry_event<F>(
        &self,
        id: &WindowId,
        immediate: bool,
        snapped: bool,
        save: F,
    ) -> Cadence
    where
        F: FnOnce() + Send + 'static,
    {
        match cadence_for(immediate, snapped) {
            Cadence::Immediate => {
                if self.ticker.stop(id.as_str()) {
                    trace!(window = %id, "pending save superseded");
                }
                if snapped && !immediate {
                    debug!(window = %id, "snap detected; saving immediately");
                }
                save();
                Cadence::Immediate
            }
            Cadence::Debounced if Handle::try_current().is_err() => {
                debug!(window = %id, "no runtime for debounce; saving immediately");
                save();
                Cadence::Immediate
            }
            Cadence::Debounced => {
                self.ticker.start(id.as_str(), self.debounce, save);
                Cadence::Debounced
            }
        }
    }

    /// Drop the pending save for `id`, if any.
    pub fn cancel(&self, id: &WindowId) -> bool {
        self.ticker.stop(id.as_str())
    }

    /// Drop every pending save.
    pub fn cancel_all(&self) {
        self.ticker.clear();
    }

    /// True while a debounced save for `id` is waiting.
    pub fn pending(&self, id: &WindowId) -> bool {
        self.ticker.is_active(id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use tokio::time;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let make = move || {
            let h = Arc::clone(&h);
            Box::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (hits, make)
    }

    #[test]
    fn cadence_table() {
        assert_eq!(cadence_for(true, false), Cadence::Immediate);
        assert_eq!(cadence_for(false, true), Cadence::Immediate);
        assert_eq!(cadence_for(false, false), Cadence::Debounced);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn burst_of_moves_saves_once() {
        let s = PersistenceScheduler::new(Duration::from_millis(1000));
        let id = WindowId::new("win1");
        let (hits, make) = counter();
        assert_eq!(s.on_geometry_event(&id, false, false, make()), Cadence::Debounced);
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(s.on_geometry_event(&id, false, false, make()), Cadence::Debounced);
        time::sleep(Duration::from_millis(999)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        time::sleep(Duration::from_millis(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!s.pending(&id));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn immediate_event_supersedes_pending_save() {
        let s = PersistenceScheduler::new(Duration::from_millis(1000));
        let id = WindowId::new("win1");
        let (hits, make) = counter();
        s.on_geometry_event(&id, false, false, make());
        assert!(s.pending(&id));
        assert_eq!(s.on_geometry_event(&id, true, false, make()), Cadence::Immediate);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!s.pending(&id));
        time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn without_runtime_debounced_saves_run_now() {
        let s = PersistenceScheduler::new(Duration::from_millis(1000));
        let (hits, make) = counter();
        let id = WindowId::new("win1");
        assert_eq!(s.on_geometry_event(&id, false, false, make()), Cadence::Immediate);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!s.pending(&id));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn cancel_all_drops_every_timer() {
        let s = PersistenceScheduler::new(Duration::from_millis(10));
        let (hits, make) = counter();
        for n in 1..=3 {
            s.on_geometry_event(&WindowId::generated(n), false, false, make());
        }
        s.cancel_all();
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
