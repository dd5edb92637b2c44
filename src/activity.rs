//! Shared activity bookkeeping.
//!
//! One lock guards both timestamps so a tick always sees a consistent pair:
//! a notification that finishes before the tick acquires the lock is visible
//! to that tick.

use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Instant;

/// Consistent copy of both timestamps, taken under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySnapshot {
    /// When human input was last observed.
    pub last_activity: Instant,

    /// When the scheduler last jiggled. `None` until the first jiggle,
    /// so the first eligible tick fires immediately.
    pub last_jiggle: Option<Instant>,
}

/// Record of last observed input and last emitted jiggle.
///
/// Written by the input watcher thread and read/written by the polling loop.
#[derive(Debug)]
pub struct ActivityTracker {
    inner: Mutex<ActivitySnapshot>,
}

impl ActivityTracker {
    /// Create a tracker that treats `now` as the most recent activity.
    pub fn new(now: Instant) -> Self {
        Self {
            inner: Mutex::new(ActivitySnapshot {
                last_activity: now,
                last_jiggle: None,
            }),
        }
    }

    /// Record that human input was observed at `now`.
    ///
    /// Callable concurrently from any notification source; last write wins.
    pub fn record_activity(&self, now: Instant) {
        self.lock().last_activity = now;
    }

    /// Record that a jiggle was emitted at `now`.
    ///
    /// Only the scheduler calls this, immediately after a triggered tick.
    pub fn record_jiggle(&self, now: Instant) {
        self.lock().last_jiggle = Some(now);
    }

    /// Take a consistent snapshot of both timestamps.
    pub fn snapshot(&self) -> ActivitySnapshot {
        *self.lock()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ActivitySnapshot> {
        // A poisoned lock only means another thread panicked mid-write of a
        // plain timestamp; the value is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
