//! Keyed one-shot timers with cancellation.
//!
//! Each key has at most one pending timer. Scheduling again replaces the
//! previous timer, which is how debouncing falls out: only the last of a
//! burst of calls fires.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{runtime::Handle, time};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// A pending timer.
struct TickerEntry {
    /// Cancels the sleeping task.
    token: CancellationToken,
    /// Distinguishes a replaced timer from its successor.
    generation: u64,
}

/// Pending timers and the generation counter.
#[derive(Default)]
struct Entries {
    /// Pending timers by key.
    map: HashMap<String, TickerEntry>,
    /// Generation for the next timer.
    next_generation: u64,
}

/// Schedules a closure after a delay, per key, with replace-on-reschedule.
#[derive(Clone, Default)]
pub struct Ticker {
    /// Shared timer table.
    entries: Arc<Mutex<Entries>>,
}

impl Ticker {
    /// Ticker with no pending timers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a timer is pending for the given id.
    pub fn is_active(&self, id: &str) -> bool {
        self.entries.lock().map.contains_key(id)
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start or replace the timer for `id`. `on_fire` runs once after `delay`
    /// unless the timer is stopped or replaced first.
    ///
    /// Returns false without scheduling when called outside a tokio runtime.
    pub fn start<F>(&self, id: &str, delay: Duration, on_fire: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(rt) = Handle::try_current() else {
            return false;
        };

        let token = CancellationToken::new();
        let generation = {
            let mut entries = self.entries.lock();
            entries.next_generation += 1;
            let generation = entries.next_generation;
            let prev = entries.map.insert(
                id.to_string(),
                TickerEntry {
                    token: token.clone(),
                    generation,
                },
            );
            if let Some(prev) = prev {
                prev.token.cancel();
                trace!("ticker_replace" = %id);
            }
            generation
        };

        let entries = Arc::clone(&self.entries);
        let key = id.to_string();
        rt.spawn(async move {
            trace!("ticker_start" = %key, delay_ms = delay.as_millis());
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = token.cancelled() => {
                    trace!("ticker_cancelled" = %key);
                    return;
                }
            }
            {
                let mut entries = entries.lock();
                match entries.map.get(&key) {
                    Some(e) if e.generation == generation => {
                        entries.map.remove(&key);
                    }
                    _ => return,
                }
            }
            trace!("ticker_fire" = %key);
            on_fire();
        });
        true
    }

    /// Stop a timer if present. Returns true when one was pending.
    pub fn stop(&self, id: &str) -> bool {
        match self.entries.lock().map.remove(id) {
            Some(entry) => {
                entry.token.cancel();
                trace!("ticker_stop" = %id);
                true
            }
            None => false,
        }
    }

    /// Cancel every pending timer.
    pub fn clear(&self) {
        let drained: Vec<TickerEntry> = {
            let mut entries = self.entries.lock();
            entries.map.drain().map(|(_, e)| e).collect()
        };
        for e in &drained {
            e.token.cancel();
        }
        trace!("ticker_clear" = drained.len());
    }
}
