//! The hand-off point between tallier and a monitoring backend.
//!
//! A `Transport` accepts one batch of series per report and either delivers
//! all of it or fails. There are no partial-batch semantics: the reporter
//! treats any error as the whole report failing.

use serde_json;
use series::Series;
use std::error;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use util::lock;

/// Why a batch was not delivered.
#[derive(Debug)]
pub enum Error {
    /// Writing to the underlying channel failed.
    Io(io::Error),
    /// A series could not be encoded.
    Encode(serde_json::Error),
    /// The backend answered, but not with success.
    Rejected(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref e) => write!(f, "transport i/o error: {}", e),
            Error::Encode(ref e) => write!(f, "could not encode series: {}", e),
            Error::Rejected(ref why) => write!(f, "backend rejected series: {}", why),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref e) => Some(e),
            Error::Encode(ref e) => Some(e),
            Error::Rejected(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Encode(e)
    }
}

/// Delivers batches of series somewhere.
pub trait Transport: Send + Sync {
    /// Deliver `series`, all or nothing.
    fn send(&self, series: &[Series]) -> Result<(), Error>;
}

/// Writes each series as one line of JSON to stdout.
#[derive(Debug, Default)]
pub struct Console;

impl Console {
    /// Create a new Console transport
    pub fn new() -> Console {
        Console
    }
}

impl Transport for Console {
    fn send(&self, series: &[Series]) -> Result<(), Error> {
        let mut buf = Vec::with_capacity(series.len() * 128);
        for s in series {
            serde_json::to_writer(&mut buf, s)?;
            buf.push(b'\n');
        }
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(&buf)?;
        out.flush()?;
        Ok(())
    }
}

/// Null transport
///
/// Intended for testing and demonstration. Every batch it receives is
/// dropped on the floor.
#[derive(Debug, Default)]
pub struct Null;

impl Null {
    /// Create a new Null transport
    pub fn new() -> Null {
        Null
    }
}

impl Transport for Null {
    fn send(&self, _: &[Series]) -> Result<(), Error> {
        Ok(())
    }
}

/// Keeps every batch in memory.
///
/// Clones share storage, so one clone can be handed to a `Reporter` and
/// another kept to inspect what was sent.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    batches: Arc<Mutex<Vec<Vec<Series>>>>,
}

impl Recorder {
    /// Create an empty recorder.
    pub fn new() -> Recorder {
        Recorder::default()
    }

    /// Every batch received so far, oldest first.
    pub fn batches(&self) -> Vec<Vec<Series>> {
        lock(&self.batches).clone()
    }

    /// The most recent batch, if any.
    pub fn last(&self) -> Option<Vec<Series>> {
        lock(&self.batches).last().cloned()
    }

    /// How many batches have been received.
    pub fn len(&self) -> usize {
        lock(&self.batches).len()
    }

    /// Whether no batch has been received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Transport for Recorder {
    fn send(&self, series: &[Series]) -> Result<(), Error> {
        lock(&self.batches).push(series.to_vec());
        Ok(())
    }
}
