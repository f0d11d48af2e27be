//! Periodic worker threads.
//!
//! Both of tallier's background activities, the tick arbiter and the report
//! loop, are a closure run on a fixed schedule by a dedicated thread. This
//! module owns that thread and the channel used to ask it to stop.

use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// A running periodic thread.
///
/// Dropping the handle disconnects the shutdown channel, which the thread
/// reads as a request to stop after its current pass.
#[derive(Debug)]
pub struct ThreadHandle {
    /// JoinHandle for the executing thread.
    handle: thread::JoinHandle<()>,

    /// Signals the thread to exit at its next wake-up.
    shutdown: mpsc::Sender<()>,
}

impl ThreadHandle {
    /// Spawn a thread named `name` that calls `f` once per `interval`.
    ///
    /// Slots lie on a fixed grid, `start + k * interval`. Passes never
    /// overlap: when `f` overruns one or more slots those slots are skipped
    /// and the next pass runs at the next slot still in the future.
    pub fn periodic<F>(name: &str, interval: Duration, mut f: F) -> io::Result<ThreadHandle>
    where
        F: FnMut() + Send + 'static,
    {
        if interval == Duration::from_secs(0) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "periodic interval must be non-zero",
            ));
        }
        let (shutdown, signal) = mpsc::channel();
        let thread_name = name.to_string();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            let start = Instant::now();
            let mut deadline = start + interval;
            loop {
                let now = Instant::now();
                let wait = if deadline > now {
                    deadline - now
                } else {
                    Duration::from_secs(0)
                };
                match signal.recv_timeout(wait) {
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                        debug!("{} shutting down", thread_name);
                        return;
                    }
                }
                f();
                let (next, skipped) = next_deadline(deadline, interval, Instant::now());
                if skipped > 0 {
                    warn!(
                        "{} overran its interval, skipping {} scheduled pass(es)",
                        thread_name, skipped
                    );
                }
                deadline = next;
            }
        })?;
        Ok(ThreadHandle {
            handle: handle,
            shutdown: shutdown,
        })
    }

    /// Join the given Thread, blocking until it exits.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }

    /// Gracefully shutdown the given Thread, blocking until it exits.
    pub fn shutdown(self) -> thread::Result<()> {
        // A send error means the thread is already gone.
        let _ = self.shutdown.send(());
        self.join()
    }
}

/// The first slot after `last` on the `interval` grid that is still ahead of
/// `now`, and the number of slots passed over to reach it.
pub fn next_deadline(last: Instant, interval: Duration, now: Instant) -> (Instant, u64) {
    let mut next = last + interval;
    let mut skipped = 0;
    while next <= now {
        next += interval;
        skipped += 1;
    }
    (next, skipped)
}
