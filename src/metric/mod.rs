//! The user-facing metric kinds.
//!
//! Every metric carries a name and a tag set and knows how to `flush` itself
//! into one or more `Series` points. Updates never fail and never block on
//! anything broader than the metric's own state: scalars are plain atomics,
//! derived state sits behind a per-metric lock.

use series::Series;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

mod counter;
mod gauge;
mod histogram;
mod meter;
mod timer;

pub use self::counter::{Counter, FlashCounter};
pub use self::gauge::{Gauge, GaugeF};
pub use self::histogram::Histogram;
pub use self::meter::Meter;
pub use self::timer::Timer;

/// Percentiles reported by histograms and timers, in flush order.
pub const FLUSH_PERCENTILES: [f64; 4] = [0.5, 0.75, 0.95, 0.99];

/// Upcast an `Arc` of a concrete metric to `Any` so the registry can hand
/// back typed handles. Implemented for every eligible type.
pub trait IntoAny {
    /// Erase the concrete type.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> IntoAny for T {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A named, tagged measurement that can report itself.
pub trait Metric: IntoAny + Send + Sync {
    /// The metric's base name. Flushed series append a suffix to it.
    fn name(&self) -> &str;

    /// The metric's tags, in the order given at construction.
    fn tags(&self) -> &[String];

    /// Produce this metric's series as of `now`, in Unix seconds. Flushing
    /// may reset state, see `FlashCounter`.
    fn flush(&self, now: i64) -> Vec<Series>;

    /// The registry key for this metric.
    fn id(&self) -> MetricId {
        MetricId::new(self.name(), self.tags())
    }
}

/// Something that must be advanced on the fixed tick interval.
pub trait Tickable: Send + Sync {
    /// Advance rate state by one interval.
    fn tick(&self);
}

/// Registry identity of a metric: its name plus its tags in sorted order.
/// Tag order at construction does not matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId(String);

impl MetricId {
    /// Derive the id of `name` tagged with `tags`.
    pub fn new<S>(name: &str, tags: &[S]) -> MetricId
    where
        S: AsRef<str>,
    {
        let mut sorted: Vec<&str> = tags.iter().map(|t| t.as_ref()).collect();
        sorted.sort();
        MetricId(format!("{}|{}", name, sorted.join(",")))
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collect anything string-like into an owned tag list.
///
/// ```
/// use tallier::metric::tags;
///
/// assert_eq!(vec!["env:prod".to_string()], tags(&["env:prod"]));
/// ```
pub fn tags<S>(tags: &[S]) -> Vec<String>
where
    S: AsRef<str>,
{
    tags.iter().map(|t| t.as_ref().to_string()).collect()
}

fn suffixed(name: &str, suffix: &str) -> String {
    format!("{}.{}", name, suffix)
}
