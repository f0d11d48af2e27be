//! Tallier is an in-process instrumentation library. Application code updates
//! counters, gauges, histograms, meters and timers; tallier keeps
//! statistically sound running summaries of those values and periodically
//! hands them, as a batch of time-series points, to a transport of the
//! embedder's choosing.
//!
//! The moving parts:
//!
//!  * [`sample`] holds bounded reservoirs of observed values and the
//!    statistics derived from them.
//!  * [`ewma`] tracks exponentially-weighted event rates.
//!  * [`metric`] layers the two into the user-facing metric kinds.
//!  * [`arbiter`] advances rate state on a fixed five second tick.
//!  * [`reporter`] keeps the registry of live metrics and flushes them
//!    through a [`transport`] on its own period.
//!
//! Neither background loop is global: the embedder owns a `TickArbiter` and a
//! `Reporter` and decides when they start and stop.
#![allow(unknown_lints)]
#![deny(unstable_features, unused_import_braces)]
#![warn(missing_docs)]
extern crate chrono;
extern crate rand;
extern crate serde;
extern crate serde_json;
extern crate toml;

#[macro_use]
extern crate log;

#[macro_use]
extern crate serde_derive;

#[cfg(test)]
extern crate quickcheck;

pub mod arbiter;
pub mod config;
pub mod ewma;
pub mod metric;
pub mod reporter;
pub mod sample;
pub mod series;
pub mod thread;
pub mod time;
pub mod transport;
mod util;
