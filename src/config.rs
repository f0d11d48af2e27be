//! Reporter configuration.
//!
//! Configuration is plain data with defaults for every field, deserialisable
//! from TOML. Locating and reading the file is the embedder's business; hand
//! the text to `ReporterConfig::from_toml`.
//!
//! ```toml
//! host = "web-1"
//! tags = ["env:prod"]
//! flush_interval = 10
//!
//! [sample]
//! kind = "exp_decay"
//! reservoir_size = 1028
//! alpha = 0.015
//! ```

use sample::{self, ExpDecaySample, FlashSample, Sample, UniformSample};
use std::error;
use std::fmt;
use std::time::Duration;
use toml;

/// Why a configuration was refused.
#[derive(Debug)]
pub enum Error {
    /// The text was not valid TOML for a `ReporterConfig`.
    Parse(toml::de::Error),
    /// `flush_interval` was zero.
    InvalidInterval,
    /// `sample.reservoir_size` was zero.
    InvalidReservoir,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Parse(ref e) => write!(f, "could not parse configuration: {}", e),
            Error::InvalidInterval => write!(f, "flush_interval must be at least one second"),
            Error::InvalidReservoir => write!(f, "sample.reservoir_size must be at least one"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Parse(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Error {
        Error::Parse(e)
    }
}

/// The sampling strategy histograms and timers are built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    /// `ExpDecaySample`: biased toward recent values.
    ExpDecay,
    /// `UniformSample`: the metric's whole life, evenly.
    Uniform,
    /// `FlashSample`: only what arrived since the previous flush.
    Flash,
}

/// How to build default samples.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    /// Which reservoir to use.
    pub kind: SampleKind,
    /// The most values a reservoir retains.
    pub reservoir_size: usize,
    /// Decay factor, used only by `exp_decay`.
    pub alpha: f64,
}

impl Default for SampleConfig {
    fn default() -> SampleConfig {
        SampleConfig {
            kind: SampleKind::ExpDecay,
            reservoir_size: sample::DEFAULT_RESERVOIR_SIZE,
            alpha: sample::DEFAULT_ALPHA,
        }
    }
}

impl SampleConfig {
    /// Construct a fresh, empty sample as configured.
    pub fn build(&self) -> Box<dyn Sample> {
        match self.kind {
            SampleKind::ExpDecay => Box::new(ExpDecaySample::new(self.reservoir_size, self.alpha)),
            SampleKind::Uniform => Box::new(UniformSample::new(self.reservoir_size)),
            SampleKind::Flash => Box::new(FlashSample::new(self.reservoir_size)),
        }
    }
}

/// Everything a `Reporter` needs besides its transport.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Host label stamped on every series.
    pub host: String,
    /// Tags appended to every series.
    pub tags: Vec<String>,
    /// Seconds between reports.
    pub flush_interval: u64,
    /// Sampling for histograms and timers created through the reporter.
    pub sample: SampleConfig,
}

impl Default for ReporterConfig {
    fn default() -> ReporterConfig {
        ReporterConfig {
            host: "localhost".to_string(),
            tags: Vec::new(),
            flush_interval: 10,
            sample: SampleConfig::default(),
        }
    }
}

impl ReporterConfig {
    /// Parse and validate a TOML document. Absent keys take their defaults.
    pub fn from_toml(text: &str) -> Result<ReporterConfig, Error> {
        let config: ReporterConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Refuse settings no reporter can run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.flush_interval == 0 {
            return Err(Error::InvalidInterval);
        }
        if self.sample.reservoir_size == 0 {
            return Err(Error::InvalidReservoir);
        }
        Ok(())
    }

    /// The report period.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval)
    }
}
