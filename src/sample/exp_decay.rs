use rand::{self, Open01, Rng};
use sample::heap::{Entry, PriorityHeap};
use sample::{Sample, Snapshot};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use time::{self, Clock, SystemClock};
use util::lock;

/// How long priorities may grow before every key is renormalised against a
/// fresh landmark.
pub const RESCALE_THRESHOLD: Duration = Duration::from_secs(60 * 60);

struct State {
    count: i64,
    landmark: Instant,
    next_rescale: Instant,
    heap: PriorityHeap,
}

/// An exponentially-decaying sample using a forward-decaying priority
/// reservoir. See Cormode et al's "Forward Decay: A Practical Time Decay
/// Model for Streaming Systems".
///
/// Each value gets priority `exp(alpha * age_of_landmark) / u`, `u` uniform
/// on `(0, 1)`. The reservoir is a min-heap on priority; when full the lowest
/// priority entry is evicted to make room. Recent values therefore tend to
/// survive but old values are never excluded outright.
pub struct ExpDecaySample {
    alpha: f64,
    reservoir_size: usize,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl ExpDecaySample {
    /// Create a sample holding at most `reservoir_size` values with decay
    /// factor `alpha`, timed by the system clock.
    pub fn new(reservoir_size: usize, alpha: f64) -> ExpDecaySample {
        ExpDecaySample::with_clock(reservoir_size, alpha, Arc::new(SystemClock))
    }

    /// As `new` but timed by `clock`.
    pub fn with_clock(
        reservoir_size: usize,
        alpha: f64,
        clock: Arc<dyn Clock>,
    ) -> ExpDecaySample {
        let now = clock.now();
        ExpDecaySample {
            alpha: alpha,
            reservoir_size: reservoir_size,
            clock: clock,
            state: Mutex::new(State {
                count: 0,
                landmark: now,
                next_rescale: now + RESCALE_THRESHOLD,
                heap: PriorityHeap::with_capacity(reservoir_size),
            }),
        }
    }

    /// Record `value` as observed at `at`.
    pub fn update_at(&self, at: Instant, value: i64) {
        let Open01(u) = rand::thread_rng().gen::<Open01<f64>>();
        let mut state = lock(&self.state);
        state.count = state.count.saturating_add(1);
        if self.reservoir_size == 0 {
            return;
        }
        // Renormalise before computing the new key: a long idle gap would
        // otherwise overflow exp() for this very insert.
        if at > state.next_rescale {
            self.rescale(&mut state, at);
        }
        if state.heap.len() >= self.reservoir_size {
            let _ = state.heap.pop();
        }
        let age = time::elapsed_secs(state.landmark, at);
        state.heap.push(Entry {
            priority: (age * self.alpha).exp() / u,
            value: value,
        });
    }

    fn rescale(&self, state: &mut State, at: Instant) {
        let factor = (-self.alpha * time::elapsed_secs(state.landmark, at)).exp();
        trace!(
            "rescaling {} decay sample priorities by {}",
            state.heap.len(),
            factor
        );
        // After a long enough idle gap the factor underflows to zero and every
        // retained value loses to anything inserted from here on.
        state.heap.scale(factor);
        state.landmark = at;
        state.next_rescale = at + RESCALE_THRESHOLD;
    }
}

impl Sample for ExpDecaySample {
    fn update(&self, value: i64) {
        self.update_at(self.clock.now(), value)
    }

    fn clear(&self) {
        let now = self.clock.now();
        let mut state = lock(&self.state);
        state.count = 0;
        state.landmark = now;
        state.next_rescale = now + RESCALE_THRESHOLD;
        state.heap.clear();
    }

    fn snapshot(&self) -> Snapshot {
        let state = lock(&self.state);
        Snapshot::new(state.count, state.heap.values())
    }

    fn size(&self) -> usize {
        lock(&self.state).heap.len()
    }

    fn count(&self) -> i64 {
        lock(&self.state).count
    }

    fn values(&self) -> Vec<i64> {
        lock(&self.state).heap.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};
    use time::ManualClock;

    #[test]
    fn test_below_capacity() {
        let sample = ExpDecaySample::new(100, 0.99);
        for i in 0..10 {
            sample.update(i);
        }
        assert_eq!(10, sample.size());
        assert_eq!(10, sample.count());
        assert_eq!(10, sample.values().len());
    }

    #[test]
    fn test_full_reservoir() {
        let sample = ExpDecaySample::new(100, 0.99);
        for i in 0..1000 {
            sample.update(i);
        }
        assert_eq!(100, sample.size());
        assert_eq!(1000, sample.count());
        for v in sample.values() {
            assert!(v >= 0 && v < 1000);
        }
    }

    #[test]
    fn test_zero_capacity_counts_only() {
        let sample = ExpDecaySample::new(0, 0.015);
        sample.update(1);
        sample.update(2);
        assert_eq!(0, sample.size());
        assert_eq!(2, sample.count());
    }

    #[test]
    fn test_clear() {
        let sample = ExpDecaySample::new(10, 0.015);
        for i in 0..20 {
            sample.update(i);
        }
        sample.clear();
        assert_eq!(0, sample.size());
        assert_eq!(0, sample.count());
        assert!(sample.snapshot().values().is_empty());
    }

    #[test]
    fn test_never_exceeds_capacity() {
        fn inner(capacity: u8, updates: u16) -> TestResult {
            let capacity = usize::from(capacity);
            let sample = ExpDecaySample::new(capacity, 0.015);
            for i in 0..updates {
                sample.update(i64::from(i));
            }
            assert!(sample.size() <= capacity);
            assert_eq!(sample.size(), sample.values().len());
            assert_eq!(i64::from(updates), sample.count());
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(200)
            .max_tests(1000)
            .quickcheck(inner as fn(u8, u16) -> TestResult);
    }

    #[test]
    fn test_capacity_held_across_rescale() {
        let clock = Arc::new(ManualClock::new(0));
        let sample = ExpDecaySample::with_clock(10, 0.015, clock.clone());
        for step in 0..500 {
            clock.advance(Duration::from_secs(2 * 60 * 60));
            sample.update(step);
            assert!(sample.size() <= 10);
        }
        assert_eq!(10, sample.size());
        assert_eq!(500, sample.count());
    }

    #[test]
    fn test_recent_values_displace_old_after_rescale() {
        let clock = Arc::new(ManualClock::new(0));
        let sample = ExpDecaySample::with_clock(10, 0.015, clock.clone());
        for i in 1..11 {
            sample.update(i);
        }
        clock.advance(Duration::from_secs(2 * 60 * 60));
        for _ in 0..10 {
            sample.update(999);
        }
        assert_eq!(vec![999; 10], sample.snapshot().values().to_vec());
    }

    #[test]
    fn test_long_idle_gap_does_not_poison_priorities() {
        let clock = Arc::new(ManualClock::new(0));
        let sample = ExpDecaySample::with_clock(10, 0.015, clock.clone());
        for i in 1..11 {
            sample.update(i);
        }
        // exp(0.015 * 1000h) overflows an f64 without a prior rescale
        clock.advance(Duration::from_secs(1000 * 60 * 60));
        for _ in 0..10 {
            sample.update(7);
        }
        assert_eq!(vec![7; 10], sample.snapshot().values().to_vec());
    }
}
