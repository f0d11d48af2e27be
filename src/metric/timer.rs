use arbiter::TickArbiter;
use metric::histogram::distribution;
use metric::{Meter, Metric, Tickable};
use sample::{self, Sample, Snapshot};
use series::Series;
use std::sync::Arc;
use std::time::{Duration, Instant};
use time;

/// The distribution and rate of timed events.
///
/// Each recorded duration lands in a sample, as nanoseconds, and marks one
/// event on an embedded meter. Flushed distribution statistics are divided
/// by the timer's unit, so a unit of one millisecond reports milliseconds.
pub struct Timer {
    meter: Meter,
    unit: f64,
    sample: Box<dyn Sample>,
}

impl Timer {
    /// Create a timer over the default sample, reporting in `unit`, and
    /// register it with `arbiter`.
    pub fn new<S>(name: S, unit: Duration, tags: Vec<String>, arbiter: &TickArbiter) -> Arc<Timer>
    where
        S: Into<String>,
    {
        Timer::with_sample(name, unit, sample::default_sample(), tags, arbiter)
    }

    /// Create a timer over `sample`, reporting in `unit`, and register it
    /// with `arbiter`. A zero unit reports raw nanoseconds.
    pub fn with_sample<S>(
        name: S,
        unit: Duration,
        sample: Box<dyn Sample>,
        tags: Vec<String>,
        arbiter: &TickArbiter,
    ) -> Arc<Timer>
    where
        S: Into<String>,
    {
        let unit = match time::duration_ns(unit) {
            0 => 1.0,
            ns => ns as f64,
        };
        let timer = Arc::new(Timer {
            meter: Meter::unscheduled(name, tags, arbiter.clock()),
            unit: unit,
            sample: sample,
        });
        let tickable: Arc<dyn Tickable> = timer.clone();
        arbiter.add(Arc::downgrade(&tickable));
        timer
    }

    /// Record the duration of one event.
    pub fn update(&self, d: Duration) {
        self.sample.update(time::duration_ns(d));
        self.meter.mark(1);
    }

    /// Record an event that began at `start` and ends now.
    pub fn update_since(&self, start: Instant) {
        let now = self.meter.clock().now();
        let elapsed = if now > start {
            now - start
        } else {
            Duration::from_secs(0)
        };
        self.update(elapsed)
    }

    /// Run `f`, recording how long it took.
    pub fn time<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = self.meter.clock().now();
        let result = f();
        self.update_since(start);
        result
    }

    /// The rate side of the timer.
    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    /// Empty the underlying sample. Rates are unaffected.
    pub fn clear(&self) {
        self.sample.clear()
    }

    /// Freeze the underlying sample, values in nanoseconds.
    pub fn snapshot(&self) -> Snapshot {
        self.sample.snapshot()
    }
}

impl Tickable for Timer {
    fn tick(&self) {
        self.meter.tick()
    }
}

impl Metric for Timer {
    fn name(&self) -> &str {
        self.meter.name()
    }

    fn tags(&self) -> &[String] {
        self.meter.tags()
    }

    fn flush(&self, now: i64) -> Vec<Series> {
        let mut series = self.meter.rate_series(now);
        series.extend(distribution(
            self.name(),
            self.tags(),
            now,
            &self.snapshot(),
            Some(self.unit),
        ));
        series
    }
}
