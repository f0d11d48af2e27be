use metric::{suffixed, Metric};
use series::Series;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use util::lock;

/// The last integer reading of something.
#[derive(Debug)]
pub struct Gauge {
    name: String,
    tags: Vec<String>,
    value: AtomicI64,
}

impl Gauge {
    /// Create a gauge reading zero.
    pub fn new<S>(name: S, tags: Vec<String>) -> Gauge
    where
        S: Into<String>,
    {
        Gauge {
            name: name.into(),
            tags: tags,
            value: AtomicI64::new(0),
        }
    }

    /// Replace the reading.
    pub fn update(&self, v: i64) {
        self.value.store(v, Ordering::Relaxed);
    }

    /// The current reading.
    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Metric for Gauge {
    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn flush(&self, now: i64) -> Vec<Series> {
        vec![
            Series::gauge(suffixed(&self.name, "value"), now, self.value(), &self.tags),
        ]
    }
}

/// The last floating-point reading of something.
#[derive(Debug)]
pub struct GaugeF {
    name: String,
    tags: Vec<String>,
    value: Mutex<f64>,
}

impl GaugeF {
    /// Create a gauge reading zero.
    pub fn new<S>(name: S, tags: Vec<String>) -> GaugeF
    where
        S: Into<String>,
    {
        GaugeF {
            name: name.into(),
            tags: tags,
            value: Mutex::new(0.0),
        }
    }

    /// Replace the reading.
    pub fn update(&self, v: f64) {
        *lock(&self.value) = v;
    }

    /// The current reading.
    pub fn value(&self) -> f64 {
        *lock(&self.value)
    }
}

impl Metric for GaugeF {
    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn flush(&self, now: i64) -> Vec<Series> {
        vec![
            Series::gauge(suffixed(&self.name, "value"), now, self.value(), &self.tags),
        ]
    }
}
