use metric::{suffixed, Metric};
use series::Series;
use std::sync::atomic::{AtomicI64, Ordering};

/// A signed running total held in a single atomic.
#[derive(Debug)]
pub struct Counter {
    name: String,
    tags: Vec<String>,
    count: AtomicI64,
}

impl Counter {
    /// Create a counter starting at zero.
    pub fn new<S>(name: S, tags: Vec<String>) -> Counter
    where
        S: Into<String>,
    {
        Counter {
            name: name.into(),
            tags: tags,
            count: AtomicI64::new(0),
        }
    }

    /// Increase the count by `i`.
    pub fn inc(&self, i: i64) {
        self.count.fetch_add(i, Ordering::Relaxed);
    }

    /// Decrease the count by `i`.
    pub fn dec(&self, i: i64) {
        self.count.fetch_sub(i, Ordering::Relaxed);
    }

    /// The current count.
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Reset the count to zero.
    pub fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}

impl Metric for Counter {
    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn flush(&self, now: i64) -> Vec<Series> {
        vec![
            Series::counter(suffixed(&self.name, "count"), now, self.count(), &self.tags),
        ]
    }
}

/// A counter that reports only what accumulated since its previous flush.
#[derive(Debug)]
pub struct FlashCounter {
    inner: Counter,
}

impl FlashCounter {
    /// Create a flash counter starting at zero.
    pub fn new<S>(name: S, tags: Vec<String>) -> FlashCounter
    where
        S: Into<String>,
    {
        FlashCounter {
            inner: Counter::new(name, tags),
        }
    }

    /// Increase the count by `i`.
    pub fn inc(&self, i: i64) {
        self.inner.inc(i)
    }

    /// Decrease the count by `i`.
    pub fn dec(&self, i: i64) {
        self.inner.dec(i)
    }

    /// The count accumulated since the last flush.
    pub fn count(&self) -> i64 {
        self.inner.count()
    }

    /// Reset the count to zero.
    pub fn clear(&self) {
        self.inner.clear()
    }
}

impl Metric for FlashCounter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn tags(&self) -> &[String] {
        self.inner.tags()
    }

    fn flush(&self, now: i64) -> Vec<Series> {
        // Subtract what was read rather than zeroing: increments landing
        // between the two operations carry into the next flush.
        let count = self.inner.count();
        self.inner.dec(count);
        vec![
            Series::counter(suffixed(self.name(), "count"), now, count, self.tags()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metric::tags;
    use series::{SeriesKind, Value};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_inc_dec_clear() {
        let c = Counter::new("c", vec![]);
        c.inc(10);
        c.dec(3);
        assert_eq!(7, c.count());
        c.dec(20);
        assert_eq!(-13, c.count());
        c.clear();
        assert_eq!(0, c.count());
    }

    #[test]
    fn test_flush_keeps_lifetime_total() {
        let c = Counter::new("hits", tags(&["env:test"]));
        c.inc(4);

        let series = c.flush(100);
        assert_eq!(1, series.len());
        assert_eq!("hits.count", series[0].metric);
        assert_eq!(SeriesKind::Counter, series[0].kind);
        assert_eq!(vec![(100, Value::Int(4))], series[0].points);
        assert_eq!(tags(&["env:test"]), series[0].tags);

        c.inc(1);
        assert_eq!(Some(Value::Int(5)), c.flush(110)[0].value());
    }

    #[test]
    fn test_concurrent_inc_is_exact() {
        let c = Arc::new(Counter::new("c", vec![]));
        let mut joins = Vec::new();
        for _ in 0..8 {
            let c = Arc::clone(&c);
            joins.push(thread::spawn(move || {
                for _ in 0..10_000 {
                    c.inc(1);
                }
            }));
        }
        for j in joins {
            j.join().expect("incrementer panicked");
        }
        assert_eq!(80_000, c.count());
    }

    #[test]
    fn test_flash_counter_resets_on_flush() {
        let c = FlashCounter::new("jobs", vec![]);
        c.inc(5);

        let series = c.flush(1);
        assert_eq!(Some(Value::Int(5)), series[0].value());
        assert_eq!("jobs.count", series[0].metric);
        assert_eq!(0, c.count());

        c.inc(2);
        assert_eq!(Some(Value::Int(2)), c.flush(2)[0].value());
    }

    #[test]
    fn test_flash_counter_flushes_sum_to_total() {
        let c = Arc::new(FlashCounter::new("c", vec![]));
        let mut joins = Vec::new();
        for _ in 0..4 {
            let c = Arc::clone(&c);
            joins.push(thread::spawn(move || {
                for _ in 0..10_000 {
                    c.inc(1);
                }
            }));
        }
        let mut total = 0;
        for i in 0..20 {
            total += c.flush(i)[0].value().map(|v| v.as_f64()).unwrap_or(0.0) as i64;
        }
        for j in joins {
            j.join().expect("incrementer panicked");
        }
        total += c.flush(99)[0].value().map(|v| v.as_f64()).unwrap_or(0.0) as i64;
        assert_eq!(40_000, total);
    }
}
