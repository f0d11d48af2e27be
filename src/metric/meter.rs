use arbiter::TickArbiter;
use ewma::Ewma;
use metric::{suffixed, Metric, Tickable};
use series::Series;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;
use time::{self, Clock};
use util::lock;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Rates {
    rate1: f64,
    rate5: f64,
    rate15: f64,
    mean: f64,
}

/// Counts events and tracks their rate.
///
/// `mark` is lock-free. The one, five and fifteen minute moving averages and
/// the lifetime mean are recomputed only when the meter is ticked, and read
/// back from that last computation.
pub struct Meter {
    name: String,
    tags: Vec<String>,
    count: AtomicI64,
    start: Instant,
    clock: Arc<dyn Clock>,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
    rates: Mutex<Rates>,
}

impl Meter {
    /// Create a meter and register it with `arbiter` for ticking.
    pub fn new<S>(name: S, tags: Vec<String>, arbiter: &TickArbiter) -> Arc<Meter>
    where
        S: Into<String>,
    {
        let meter = Arc::new(Meter::unscheduled(name, tags, arbiter.clock()));
        let tickable: Arc<dyn Tickable> = meter.clone();
        arbiter.add(Arc::downgrade(&tickable));
        meter
    }

    /// Create a meter nobody ticks. The owner must call `tick` every
    /// `TICK_INTERVAL` for the rates to mean anything.
    pub fn unscheduled<S>(name: S, tags: Vec<String>, clock: Arc<dyn Clock>) -> Meter
    where
        S: Into<String>,
    {
        Meter {
            name: name.into(),
            tags: tags,
            count: AtomicI64::new(0),
            start: clock.now(),
            clock: clock,
            m1: Ewma::one_minute(),
            m5: Ewma::five_minute(),
            m15: Ewma::fifteen_minute(),
            rates: Mutex::new(Rates::default()),
        }
    }

    /// Record `n` events.
    pub fn mark(&self, n: i64) {
        self.count.fetch_add(n, Ordering::Relaxed);
        self.m1.update(n);
        self.m5.update(n);
        self.m15.update(n);
    }

    /// Events recorded over the meter's life.
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    /// One-minute moving average, events per second.
    pub fn rate1(&self) -> f64 {
        lock(&self.rates).rate1
    }

    /// Five-minute moving average, events per second.
    pub fn rate5(&self) -> f64 {
        lock(&self.rates).rate5
    }

    /// Fifteen-minute moving average, events per second.
    pub fn rate15(&self) -> f64 {
        lock(&self.rates).rate15
    }

    /// Mean rate over the meter's life, events per second.
    pub fn rate_mean(&self) -> f64 {
        lock(&self.rates).mean
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn rate_series(&self, now: i64) -> Vec<Series> {
        let rates = *lock(&self.rates);
        vec![
            Series::gauge(suffixed(&self.name, "rate"), now, rates.mean, &self.tags),
            Series::gauge(suffixed(&self.name, "rate1"), now, rates.rate1, &self.tags),
            Series::gauge(suffixed(&self.name, "rate5"), now, rates.rate5, &self.tags),
            Series::gauge(suffixed(&self.name, "rate15"), now, rates.rate15, &self.tags),
        ]
    }
}

impl Tickable for Meter {
    fn tick(&self) {
        self.m1.tick();
        self.m5.tick();
        self.m15.tick();

        let elapsed = time::elapsed_secs(self.start, self.clock.now());
        let mean = if elapsed > 0.0 {
            self.count() as f64 / elapsed
        } else {
            0.0
        };
        let mut rates = lock(&self.rates);
        rates.rate1 = self.m1.rate();
        rates.rate5 = self.m5.rate();
        rates.rate15 = self.m15.rate();
        rates.mean = mean;
    }
}

impl Metric for Meter {
    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn flush(&self, now: i64) -> Vec<Series> {
        self.rate_series(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use series::{SeriesKind, Value};
    use std::time::Duration;
    use time::ManualClock;

    fn close(expected: f64, actual: f64) -> bool {
        (expected - actual).abs() < 1e-6
    }

    #[test]
    fn test_mark_counts_without_tick() {
        let arbiter = TickArbiter::manual(Arc::new(ManualClock::new(0)));
        let meter = Meter::new("events", vec![], &arbiter);
        meter.mark(3);
        meter.mark(4);

        assert_eq!(7, meter.count());
        assert_eq!(0.0, meter.rate1());
        assert_eq!(0.0, meter.rate_mean());
    }

    #[test]
    fn test_registers_with_arbiter() {
        let arbiter = TickArbiter::manual(Arc::new(ManualClock::new(0)));
        let meter = Meter::new("events", vec![], &arbiter);
        assert_eq!(1, arbiter.len());
        drop(meter);
        assert_eq!(0, arbiter.len());
    }

    #[test]
    fn test_tick_computes_rates() {
        let clock = Arc::new(ManualClock::new(0));
        let arbiter = TickArbiter::manual(clock.clone());
        let meter = Meter::new("events", vec![], &arbiter);

        meter.mark(3);
        clock.advance(Duration::from_secs(5));
        arbiter.tick_all();

        assert!(close(0.6, meter.rate1()));
        assert!(close(0.6, meter.rate5()));
        assert!(close(0.6, meter.rate15()));
        assert!(close(0.6, meter.rate_mean()));

        clock.advance(Duration::from_secs(5));
        arbiter.tick_all();

        assert!(meter.rate1() < 0.6);
        assert!(meter.rate1() < meter.rate5());
        assert!(meter.rate5() < meter.rate15());
        assert!(close(0.3, meter.rate_mean()));
    }

    #[test]
    fn test_flush_shape() {
        let clock = Arc::new(ManualClock::new(0));
        let arbiter = TickArbiter::manual(clock.clone());
        let meter = Meter::new("requests", vec!["svc:api".to_string()], &arbiter);
        meter.mark(10);
        clock.advance(Duration::from_secs(5));
        arbiter.tick_all();

        let series = meter.flush(77);
        let names: Vec<&str> = series.iter().map(|s| s.metric.as_str()).collect();
        assert_eq!(
            vec!["requests.rate", "requests.rate1", "requests.rate5", "requests.rate15"],
            names
        );
        for s in &series {
            assert_eq!(SeriesKind::Gauge, s.kind);
            assert_eq!(Some(77), s.timestamp());
            assert_eq!(vec!["svc:api".to_string()], s.tags);
            assert_eq!(Some(Value::Float(2.0)), s.value());
        }
        // flushing is read-only for meters
        assert_eq!(10, meter.count());
    }

    #[test]
    fn test_unscheduled_meter_ticks_by_hand() {
        let clock = Arc::new(ManualClock::new(0));
        let meter = Meter::unscheduled("m", vec![], clock.clone());
        meter.mark(5);
        clock.advance(Duration::from_secs(5));
        meter.tick();
        assert!(close(1.0, meter.rate1()));
    }
}
