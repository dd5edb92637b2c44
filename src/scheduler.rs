//! Jiggle scheduling.
//!
//! Implements the per-tick decision:
//! - jiggle once idle time reaches the threshold
//! - then at most once per interval while inactivity continues

use crate::activity::ActivityTracker;
use crate::pointer::PointerSink;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Policy parameters for the scheduler.
///
/// Zero thresholds are valid and mean "always eligible".
#[derive(Debug, Clone, Copy)]
pub struct JigglePolicy {
    /// Idle time before jiggling becomes eligible.
    pub idle_threshold: Duration,

    /// Minimum spacing between jiggles.
    pub jiggle_interval: Duration,

    /// Pixels moved per jiggle, out and back.
    pub pixels: i16,
}

/// Result of one scheduler evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A jiggle was emitted, with the idle duration observed at the time.
    Jiggled { idle_for: Duration },
    /// Nothing to do this tick.
    Quiet,
}

/// Decides, once per tick, whether to emit a jiggle.
pub struct JiggleScheduler<R: Rng> {
    policy: JigglePolicy,
    tracker: Arc<ActivityTracker>,
    sink: Box<dyn PointerSink>,
    rng: R,
}

impl<R: Rng> JiggleScheduler<R> {
    /// Create a scheduler over the given tracker and motion sink.
    ///
    /// The RNG only picks the direction of each jiggle; it never affects
    /// whether a tick triggers.
    pub fn new(
        policy: JigglePolicy,
        tracker: Arc<ActivityTracker>,
        sink: Box<dyn PointerSink>,
        rng: R,
    ) -> Self {
        Self {
            policy,
            tracker,
            sink,
            rng,
        }
    }

    /// Run one scheduling evaluation at `now`.
    ///
    /// Triggers iff the idle threshold and the jiggle interval are both
    /// satisfied. A single evaluation, no internal retry. `now` is injected
    /// so tests can drive the scheduler with simulated time.
    ///
    /// The tracker lock is released before any pointer motion; a motion
    /// failure is logged and swallowed so the polling loop never dies over
    /// a transient display error, and the jiggle is still recorded.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let snapshot = self.tracker.snapshot();

        let idle_for = now.saturating_duration_since(snapshot.last_activity);
        let interval_elapsed = match snapshot.last_jiggle {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= self.policy.jiggle_interval,
        };

        if idle_for < self.policy.idle_threshold || !interval_elapsed {
            return TickOutcome::Quiet;
        }

        let dx = if self.rng.gen_bool(0.5) {
            self.policy.pixels
        } else {
            -self.policy.pixels
        };
        if let Err(e) = self.sink.jiggle(dx) {
            warn!("Pointer motion failed, continuing: {e}");
        }
        self.tracker.record_jiggle(now);

        debug!("Jiggle (idle {}s)", idle_for.as_secs());
        TickOutcome::Jiggled { idle_for }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::{NullPointer, PointerError};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Mutex;

    /// Sink that records every jiggle delta it is asked to emit.
    struct RecordingSink {
        moves: Arc<Mutex<Vec<i16>>>,
    }

    impl PointerSink for RecordingSink {
        fn jiggle(&mut self, dx: i16) -> Result<(), PointerError> {
            self.moves.lock().unwrap().push(dx);
            Ok(())
        }
    }

    /// Sink whose motion always fails, for the swallow contract.
    struct FailingSink;

    impl PointerSink for FailingSink {
        fn jiggle(&mut self, _dx: i16) -> Result<(), PointerError> {
            Err(PointerError::MotionFailed("no display".to_string()))
        }
    }

    fn policy(idle: u64, interval: u64, pixels: i16) -> JigglePolicy {
        JigglePolicy {
            idle_threshold: Duration::from_secs(idle),
            jiggle_interval: Duration::from_secs(interval),
            pixels,
        }
    }

    fn recording_scheduler(
        policy: JigglePolicy,
        base: Instant,
    ) -> (
        JiggleScheduler<StdRng>,
        Arc<ActivityTracker>,
        Arc<Mutex<Vec<i16>>>,
    ) {
        let tracker = Arc::new(ActivityTracker::new(base));
        let moves = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink {
            moves: moves.clone(),
        };
        let scheduler = JiggleScheduler::new(
            policy,
            tracker.clone(),
            Box::new(sink),
            StdRng::seed_from_u64(7),
        );
        (scheduler, tracker, moves)
    }

    #[test]
    fn test_quiet_before_idle_threshold() {
        let base = Instant::now();
        let (mut scheduler, tracker, moves) = recording_scheduler(policy(10, 5, 1), base);

        let outcome = scheduler.tick(base + Duration::from_secs(9));

        assert_eq!(outcome, TickOutcome::Quiet);
        assert!(tracker.snapshot().last_jiggle.is_none());
        assert!(moves.lock().unwrap().is_empty());
    }

    #[test]
    fn test_first_eligible_tick_triggers() {
        let base = Instant::now();
        let (mut scheduler, tracker, moves) = recording_scheduler(policy(10, 5, 1), base);

        let now = base + Duration::from_secs(11);
        let outcome = scheduler.tick(now);

        assert_eq!(
            outcome,
            TickOutcome::Jiggled {
                idle_for: Duration::from_secs(11)
            }
        );
        assert_eq!(tracker.snapshot().last_jiggle, Some(now));
        assert_eq!(moves.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_interval_gates_repeat_jiggles() {
        let base = Instant::now();
        let (mut scheduler, tracker, _moves) = recording_scheduler(policy(10, 5, 1), base);

        let first = base + Duration::from_secs(11);
        assert!(matches!(scheduler.tick(first), TickOutcome::Jiggled { .. }));

        // Within the interval: quiet regardless of idle duration.
        assert_eq!(
            scheduler.tick(base + Duration::from_secs(12)),
            TickOutcome::Quiet
        );
        assert_eq!(tracker.snapshot().last_jiggle, Some(first));

        // Interval elapsed and still idle: trigger again.
        let second = base + Duration::from_secs(17);
        assert!(matches!(scheduler.tick(second), TickOutcome::Jiggled { .. }));
        assert_eq!(tracker.snapshot().last_jiggle, Some(second));
    }

    #[test]
    fn test_activity_resets_eligibility() {
        let base = Instant::now();
        let (mut scheduler, tracker, _moves) = recording_scheduler(policy(10, 5, 1), base);

        tracker.record_activity(base + Duration::from_secs(8));

        // 11s after start but only 3s after the latest activity.
        assert_eq!(
            scheduler.tick(base + Duration::from_secs(11)),
            TickOutcome::Quiet
        );
        // 10s after the latest activity.
        assert!(matches!(
            scheduler.tick(base + Duration::from_secs(18)),
            TickOutcome::Jiggled { .. }
        ));
    }

    #[test]
    fn test_zero_thresholds_always_eligible() {
        let base = Instant::now();
        let (mut scheduler, _tracker, moves) = recording_scheduler(policy(0, 0, 1), base);

        for offset in 0..4u64 {
            assert!(matches!(
                scheduler.tick(base + Duration::from_secs(offset)),
                TickOutcome::Jiggled { .. }
            ));
        }
        assert_eq!(moves.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_jiggle_magnitude_matches_policy() {
        let base = Instant::now();
        let (mut scheduler, _tracker, moves) = recording_scheduler(policy(0, 0, 3), base);

        scheduler.tick(base + Duration::from_secs(1));
        scheduler.tick(base + Duration::from_secs(2));

        for dx in moves.lock().unwrap().iter() {
            assert_eq!(dx.abs(), 3);
        }
    }

    #[test]
    fn test_motion_failure_is_swallowed() {
        let base = Instant::now();
        let tracker = Arc::new(ActivityTracker::new(base));
        let mut scheduler = JiggleScheduler::new(
            policy(10, 5, 1),
            tracker.clone(),
            Box::new(FailingSink),
            StdRng::seed_from_u64(7),
        );

        let now = base + Duration::from_secs(11);
        let outcome = scheduler.tick(now);

        // The tick still completes and records the jiggle.
        assert!(matches!(outcome, TickOutcome::Jiggled { .. }));
        assert_eq!(tracker.snapshot().last_jiggle, Some(now));
    }

    #[test]
    fn test_dry_run_matches_real_bookkeeping() {
        let base = Instant::now();
        let ticks: Vec<Instant> = [9u64, 11, 12, 17, 30]
            .iter()
            .map(|s| base + Duration::from_secs(*s))
            .collect();

        let (mut real, real_tracker, _moves) = recording_scheduler(policy(10, 5, 1), base);

        let dry_tracker = Arc::new(ActivityTracker::new(base));
        let mut dry = JiggleScheduler::new(
            policy(10, 5, 1),
            dry_tracker.clone(),
            Box::new(NullPointer),
            StdRng::seed_from_u64(7),
        );

        for now in ticks {
            assert_eq!(real.tick(now), dry.tick(now));
            assert_eq!(real_tracker.snapshot(), dry_tracker.snapshot());
        }
    }

    #[test]
    fn test_idle_ten_interval_five_sequence() {
        // idle=10, interval=5, last activity at t=0.
        let base = Instant::now();
        let (mut scheduler, tracker, _moves) = recording_scheduler(policy(10, 5, 1), base);

        assert_eq!(scheduler.tick(base + Duration::from_secs(9)), TickOutcome::Quiet);

        let at_11 = base + Duration::from_secs(11);
        assert!(matches!(scheduler.tick(at_11), TickOutcome::Jiggled { .. }));
        assert_eq!(tracker.snapshot().last_jiggle, Some(at_11));

        assert_eq!(scheduler.tick(base + Duration::from_secs(12)), TickOutcome::Quiet);

        assert!(matches!(
            scheduler.tick(base + Duration::from_secs(17)),
            TickOutcome::Jiggled { .. }
        ));
    }
}
