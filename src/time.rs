//! Clocks.
//!
//! Everything in tallier that cares about wall or monotonic time asks a
//! `Clock` rather than the operating system directly. Production code uses
//! `SystemClock`; tests drive a `ManualClock` forward by hand.

use chrono::Utc;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A source of time.
pub trait Clock: Send + Sync {
    /// The current monotonic instant.
    fn now(&self) -> Instant;

    /// The current UTC time in seconds since the Unix epoch.
    fn timestamp(&self) -> i64;
}

/// The operating system's clocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn timestamp(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock that only moves when told to.
///
/// The monotonic side starts at the instant the clock was created, the wall
/// side at whatever Unix timestamp the caller supplies. `advance` moves both
/// in lock-step.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    base_timestamp: i64,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Create a new `ManualClock` reading `timestamp` on its wall side.
    pub fn new(timestamp: i64) -> ManualClock {
        ManualClock {
            base: Instant::now(),
            base_timestamp: timestamp,
            offset: Mutex::new(Duration::from_secs(0)),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }

    fn offset(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset()
    }

    fn timestamp(&self) -> i64 {
        self.base_timestamp + self.offset().as_secs() as i64
    }
}

/// Seconds elapsed between `since` and `now`, as a float. Zero if `now` is
/// not after `since`.
pub fn elapsed_secs(since: Instant, now: Instant) -> f64 {
    if now <= since {
        return 0.0;
    }
    let elapsed = now - since;
    elapsed.as_secs() as f64 + f64::from(elapsed.subsec_nanos()) / 1_000_000_000.0
}

/// Express a duration in whole nanoseconds, saturating at `i64::MAX`.
pub fn duration_ns(d: Duration) -> i64 {
    let ns = d.as_secs()
        .saturating_mul(1_000_000_000)
        .saturating_add(u64::from(d.subsec_nanos()));
    if ns > i64::max_value() as u64 {
        i64::max_value()
    } else {
        ns as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_both_sides() {
        let clock = ManualClock::new(1_000);
        let start = clock.now();

        clock.advance(Duration::from_millis(2_500));

        assert_eq!(1_002, clock.timestamp());
        assert_eq!(Duration::from_millis(2_500), clock.now() - start);
    }

    #[test]
    fn test_elapsed_secs_never_negative() {
        let now = Instant::now();
        let later = now + Duration::from_millis(1_500);

        assert_eq!(0.0, elapsed_secs(later, now));
        assert!((elapsed_secs(now, later) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_duration_ns() {
        assert_eq!(1_000_000_001, duration_ns(Duration::new(1, 1)));
        assert_eq!(
            i64::max_value(),
            duration_ns(Duration::from_secs(u64::max_value()))
        );
    }
}
