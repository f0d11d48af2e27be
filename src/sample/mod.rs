//! Bounded reservoirs of observed values.
//!
//! A `Sample` keeps at most a fixed number of the values it is shown, chosen
//! so that the retained set stays statistically representative of the whole
//! stream. Statistics are never computed against a live sample; callers take
//! a `Snapshot` and ask it instead.

mod exp_decay;
mod heap;
mod snapshot;
mod uniform;

pub use self::exp_decay::ExpDecaySample;
pub use self::snapshot::Snapshot;
pub use self::uniform::{FlashSample, UniformSample};

/// Reservoir size of the default sample.
pub const DEFAULT_RESERVOIR_SIZE: usize = 1028;
/// Decay factor of the default sample. Same shape as the UNIX load average
/// constants.
pub const DEFAULT_ALPHA: f64 = 0.015;

/// A bounded, statistically representative selection of values from a
/// stream.
///
/// All methods take `&self`; implementations synchronise internally so a
/// single sample may be updated from many threads at once.
pub trait Sample: Send + Sync {
    /// Offer a new value to the sample.
    fn update(&self, value: i64);

    /// Drop every retained value and reset the lifetime count to zero.
    fn clear(&self);

    /// Take a frozen copy of the retained values.
    fn snapshot(&self) -> Snapshot;

    /// The number of values currently retained, never more than the
    /// reservoir size.
    fn size(&self) -> usize;

    /// The number of values ever offered since creation or the last clear.
    fn count(&self) -> i64;

    /// A copy of the retained values, in no particular order.
    fn values(&self) -> Vec<i64>;
}

/// The sample histograms and timers get unless told otherwise: an
/// exponentially decaying reservoir biased toward the last five minutes or
/// so.
pub fn default_sample() -> Box<dyn Sample> {
    Box::new(ExpDecaySample::new(DEFAULT_RESERVOIR_SIZE, DEFAULT_ALPHA))
}
