use metric::{suffixed, Metric, FLUSH_PERCENTILES};
use sample::{self, Sample, Snapshot};
use series::{Series, Value};

/// The distribution of a stream of integer values.
pub struct Histogram {
    name: String,
    tags: Vec<String>,
    sample: Box<dyn Sample>,
}

impl Histogram {
    /// Create a histogram over the default exponentially-decaying sample.
    pub fn new<S>(name: S, tags: Vec<String>) -> Histogram
    where
        S: Into<String>,
    {
        Histogram::with_sample(name, sample::default_sample(), tags)
    }

    /// Create a histogram over `sample`.
    pub fn with_sample<S>(name: S, sample: Box<dyn Sample>, tags: Vec<String>) -> Histogram
    where
        S: Into<String>,
    {
        Histogram {
            name: name.into(),
            tags: tags,
            sample: sample,
        }
    }

    /// Record a value.
    pub fn update(&self, v: i64) {
        self.sample.update(v)
    }

    /// Empty the underlying sample.
    pub fn clear(&self) {
        self.sample.clear()
    }

    /// Freeze the underlying sample for analysis.
    pub fn snapshot(&self) -> Snapshot {
        self.sample.snapshot()
    }
}

impl Metric for Histogram {
    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn flush(&self, now: i64) -> Vec<Series> {
        distribution(&self.name, &self.tags, now, &self.snapshot(), None)
    }
}

/// Series describing `snap`: count, min, max, mean, stddev, median and the
/// upper percentiles. With a `unit` every statistic but the count is divided
/// by it and reported as a float.
pub(crate) fn distribution(
    name: &str,
    tags: &[String],
    now: i64,
    snap: &Snapshot,
    unit: Option<f64>,
) -> Vec<Series> {
    let scale = unit.unwrap_or(1.0);
    let extreme = |v: i64| -> Value {
        match unit {
            Some(u) => Value::Float(v as f64 / u),
            None => Value::Int(v),
        }
    };
    let ps = snap.percentiles(&FLUSH_PERCENTILES);
    vec![
        Series::counter(suffixed(name, "count"), now, snap.count(), tags),
        Series::gauge(suffixed(name, "min"), now, extreme(snap.min()), tags),
        Series::gauge(suffixed(name, "max"), now, extreme(snap.max()), tags),
        Series::gauge(suffixed(name, "mean"), now, snap.mean() / scale, tags),
        Series::gauge(suffixed(name, "stddev"), now, snap.std_dev() / scale, tags),
        Series::gauge(suffixed(name, "median"), now, ps[0] / scale, tags),
        Series::gauge(suffixed(name, "percentile.75"), now, ps[1] / scale, tags),
        Series::gauge(suffixed(name, "percentile.95"), now, ps[2] / scale, tags),
        Series::gauge(suffixed(name, "percentile.99"), now, ps[3] / scale, tags),
    ]
}
