//! Time-series points, the unit of exchange with a `Transport`.
//!
//! The serialised shape is the one monitoring backends in the Datadog family
//! accept:
//!
//! ```json
//! {"metric":"db.query.count","points":[[1500000000,12]],"type":"counter","host":"web-1","tags":["env:prod"]}
//! ```

use std::fmt;

/// How the backend should interpret a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// A count of events over the flush.
    Counter,
    /// An instantaneous reading.
    Gauge,
}

/// A point's value. Integral statistics stay integral on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// An integer reading.
    Int(i64),
    /// A floating-point reading.
    Float(f64),
}

impl Value {
    /// The value as a float, whatever its representation.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Value {
        Value::Float(f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}

/// One observation of one derived metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// The metric name with its derived suffix, `requests.rate1` say.
    pub metric: String,
    /// `(unix seconds, value)` pairs. Metrics always flush exactly one.
    pub points: Vec<(i64, Value)>,
    /// Counter or gauge.
    #[serde(rename = "type")]
    pub kind: SeriesKind,
    /// The reporting host. Filled in by the `Reporter`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host: String,
    /// Metric tags followed by reporter-wide tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Series {
    /// Build a single-point series. The host is left blank.
    pub fn new<S, V>(metric: S, timestamp: i64, value: V, tags: &[String], kind: SeriesKind) -> Series
    where
        S: Into<String>,
        V: Into<Value>,
    {
        Series {
            metric: metric.into(),
            points: vec![(timestamp, value.into())],
            kind: kind,
            host: String::new(),
            tags: tags.to_vec(),
        }
    }

    /// A counter-type single-point series.
    pub fn counter<S, V>(metric: S, timestamp: i64, value: V, tags: &[String]) -> Series
    where
        S: Into<String>,
        V: Into<Value>,
    {
        Series::new(metric, timestamp, value, tags, SeriesKind::Counter)
    }

    /// A gauge-type single-point series.
    pub fn gauge<S, V>(metric: S, timestamp: i64, value: V, tags: &[String]) -> Series
    where
        S: Into<String>,
        V: Into<Value>,
    {
        Series::new(metric, timestamp, value, tags, SeriesKind::Gauge)
    }

    /// Timestamp of the first point.
    pub fn timestamp(&self) -> Option<i64> {
        self.points.first().map(|p| p.0)
    }

    /// Value of the first point.
    pub fn value(&self) -> Option<Value> {
        self.points.first().map(|p| p.1)
    }
}
