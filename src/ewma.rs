//! Exponentially-weighted moving average of an event rate.
//!
//! Events are counted lock-free as they arrive. Once per `TICK_INTERVAL`
//! something (normally the `TickArbiter`) calls `tick`, which drains that
//! count into an instantaneous rate and blends it into the running average.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use util::lock;

/// The period `Ewma::tick` assumes it is called on.
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

const TICK_SECONDS: f64 = 5.0;

/// The blending factor for a moving window of `minutes` minutes, given the
/// fixed tick interval.
pub fn alpha(minutes: f64) -> f64 {
    1.0 - (-TICK_SECONDS / 60.0 / minutes).exp()
}

#[derive(Debug, Default)]
struct Smoothed {
    rate: f64,
    initialized: bool,
}

/// A moving average of events per second.
#[derive(Debug)]
pub struct Ewma {
    uncounted: AtomicI64,
    alpha: f64,
    smoothed: Mutex<Smoothed>,
}

impl Ewma {
    /// Create an average with blending factor `alpha`.
    pub fn new(alpha: f64) -> Ewma {
        Ewma {
            uncounted: AtomicI64::new(0),
            alpha: alpha,
            smoothed: Mutex::new(Smoothed::default()),
        }
    }

    /// A one-minute moving average.
    pub fn one_minute() -> Ewma {
        Ewma::new(alpha(1.0))
    }

    /// A five-minute moving average.
    pub fn five_minute() -> Ewma {
        Ewma::new(alpha(5.0))
    }

    /// A fifteen-minute moving average.
    pub fn fifteen_minute() -> Ewma {
        Ewma::new(alpha(15.0))
    }

    /// Count `n` new events. Never blocks.
    pub fn update(&self, n: i64) {
        self.uncounted.fetch_add(n, Ordering::Relaxed);
    }

    /// Fold events counted since the last tick into the average. The first
    /// tick adopts the instantaneous rate outright.
    pub fn tick(&self) {
        let count = self.uncounted.swap(0, Ordering::Relaxed);
        let instant_rate = count as f64 / TICK_SECONDS;
        let mut smoothed = lock(&self.smoothed);
        if smoothed.initialized {
            smoothed.rate += self.alpha * (instant_rate - smoothed.rate);
        } else {
            smoothed.initialized = true;
            smoothed.rate = instant_rate;
        }
    }

    /// The moving average, in events per second.
    pub fn rate(&self) -> f64 {
        lock(&self.smoothed).rate
    }
}
