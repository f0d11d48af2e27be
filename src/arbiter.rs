//! The tick arbiter.
//!
//! Rate-tracking metrics (meters and timers) need their moving averages
//! advanced every `TICK_INTERVAL`. Rather than each running its own timer,
//! they register with a `TickArbiter`, which ticks every registered metric in
//! registration order from a single background thread.
//!
//! The arbiter holds only weak references; a metric dropped everywhere else
//! is pruned on the next pass.

use ewma::TICK_INTERVAL;
use metric::Tickable;
use std::io;
use std::mem;
use std::sync::{Arc, Mutex, Weak};
use thread::ThreadHandle;
use time::{Clock, SystemClock};
use util::lock;

type Tickables = Mutex<Vec<Weak<dyn Tickable>>>;

enum Lifecycle {
    Idle,
    Running(ThreadHandle),
    Stopped,
}

/// Periodically ticks every registered `Tickable`.
pub struct TickArbiter {
    clock: Arc<dyn Clock>,
    lazy_start: bool,
    metrics: Arc<Tickables>,
    lifecycle: Mutex<Lifecycle>,
}

impl TickArbiter {
    /// An arbiter on the system clock. Its thread starts the first time a
    /// metric is added.
    pub fn new() -> TickArbiter {
        TickArbiter::with_clock(Arc::new(SystemClock))
    }

    /// As `new`, handing `clock` to the metrics built against it.
    pub fn with_clock(clock: Arc<dyn Clock>) -> TickArbiter {
        TickArbiter::build(clock, true)
    }

    /// An arbiter that never starts a thread of its own accord. The owner
    /// drives it with `tick_all`, or calls `start` explicitly.
    pub fn manual(clock: Arc<dyn Clock>) -> TickArbiter {
        TickArbiter::build(clock, false)
    }

    fn build(clock: Arc<dyn Clock>, lazy_start: bool) -> TickArbiter {
        TickArbiter {
            clock: clock,
            lazy_start: lazy_start,
            metrics: Arc::new(Mutex::new(Vec::new())),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// The clock metrics registered here should measure time with.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Register `metric` to be ticked. The first registration on a lazily
    /// started arbiter spawns its thread.
    pub fn add(&self, metric: Weak<dyn Tickable>) {
        lock(&self.metrics).push(metric);
        if !self.lazy_start {
            return;
        }
        let mut lifecycle = lock(&self.lifecycle);
        if let Lifecycle::Idle = *lifecycle {
            if let Err(e) = self.spawn(&mut lifecycle) {
                error!("could not start tick arbiter: {}", e);
            }
        }
    }

    /// Start the background thread if it is not already running.
    pub fn start(&self) -> io::Result<()> {
        let mut lifecycle = lock(&self.lifecycle);
        if let Lifecycle::Running(_) = *lifecycle {
            return Ok(());
        }
        self.spawn(&mut lifecycle)
    }

    fn spawn(&self, lifecycle: &mut Lifecycle) -> io::Result<()> {
        let metrics = Arc::clone(&self.metrics);
        let handle = ThreadHandle::periodic("tallier-tick-arbiter", TICK_INTERVAL, move || {
            let ticked = tick_pass(&metrics);
            trace!("tick arbiter ticked {} metrics", ticked);
        })?;
        debug!("tick arbiter started");
        *lifecycle = Lifecycle::Running(handle);
        Ok(())
    }

    /// Whether the background thread is running.
    pub fn is_running(&self) -> bool {
        match *lock(&self.lifecycle) {
            Lifecycle::Running(_) => true,
            _ => false,
        }
    }

    /// Stop the background thread, waiting for any pass in progress. Later
    /// registrations will not restart it; `start` will.
    pub fn stop(&self) {
        let previous = {
            let mut lifecycle = lock(&self.lifecycle);
            mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        };
        if let Lifecycle::Running(handle) = previous {
            if handle.shutdown().is_err() {
                error!("tick arbiter thread panicked");
            }
            debug!("tick arbiter stopped");
        }
    }

    /// Tick every live registered metric once, right now, returning how
    /// many were ticked.
    pub fn tick_all(&self) -> usize {
        tick_pass(&self.metrics)
    }

    /// The number of registered metrics still alive.
    pub fn len(&self) -> usize {
        lock(&self.metrics)
            .iter()
            .filter(|m| m.upgrade().is_some())
            .count()
    }

    /// Whether no live metric is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TickArbiter {
    fn default() -> TickArbiter {
        TickArbiter::new()
    }
}

impl Drop for TickArbiter {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One pass over `metrics` in registration order, pruning the dead. The lock
/// is held for the whole pass, so one slow `tick` delays the rest.
fn tick_pass(metrics: &Tickables) -> usize {
    let mut metrics = lock(metrics);
    let mut ticked = 0;
    metrics.retain(|weak| match weak.upgrade() {
        Some(metric) => {
            metric.tick();
            ticked += 1;
            true
        }
        None => false,
    });
    ticked
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::ManualClock;

    struct Ticker {
        id: usize,
        ticks: AtomicUsize,
        order: Arc<Mutex<Vec<usize>>>,
    }

    impl Tickable for Ticker {
        fn tick(&self) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            self.order.lock().unwrap().push(self.id);
        }
    }

    fn ticker(id: usize, order: &Arc<Mutex<Vec<usize>>>) -> Arc<Ticker> {
        Arc::new(Ticker {
            id: id,
            ticks: AtomicUsize::new(0),
            order: Arc::clone(order),
        })
    }

    fn weak(p: &Arc<Ticker>) -> Weak<dyn Tickable> {
        let t: Arc<dyn Tickable> = p.clone();
        Arc::downgrade(&t)
    }

    #[test]
    fn test_manual_arbiter_never_starts() {
        let arbiter = TickArbiter::manual(Arc::new(ManualClock::new(0)));
        let order = Arc::new(Mutex::new(Vec::new()));
        let p = ticker(0, &order);
        arbiter.add(weak(&p));
        assert!(!arbiter.is_running());
        assert_eq!(1, arbiter.len());
    }

    #[test]
    fn test_tick_all_in_registration_order() {
        let arbiter = TickArbiter::manual(Arc::new(ManualClock::new(0)));
        let order = Arc::new(Mutex::new(Vec::new()));
        let tickers: Vec<Arc<Ticker>> = (0..5).map(|i| ticker(i, &order)).collect();
        for p in &tickers {
            arbiter.add(weak(p));
        }

        assert_eq!(5, arbiter.tick_all());
        assert_eq!(5, arbiter.tick_all());

        assert_eq!(vec![0, 1, 2, 3, 4, 0, 1, 2, 3, 4], *order.lock().unwrap());
        for p in &tickers {
            assert_eq!(2, p.ticks.load(Ordering::SeqCst));
        }
    }

    #[test]
    fn test_dropped_metrics_are_pruned() {
        let arbiter = TickArbiter::manual(Arc::new(ManualClock::new(0)));
        let order = Arc::new(Mutex::new(Vec::new()));
        let keep = ticker(0, &order);
        let gone = ticker(1, &order);
        arbiter.add(weak(&keep));
        arbiter.add(weak(&gone));
        drop(gone);

        assert_eq!(1, arbiter.len());
        assert_eq!(1, arbiter.tick_all());
        assert_eq!(vec![0], *order.lock().unwrap());
    }

    #[test]
    fn test_lazy_start_once_and_stop() {
        let arbiter = TickArbiter::new();
        assert!(!arbiter.is_running());

        let order = Arc::new(Mutex::new(Vec::new()));
        let a = ticker(0, &order);
        let b = ticker(1, &order);
        arbiter.add(weak(&a));
        assert!(arbiter.is_running());
        arbiter.add(weak(&b));
        assert!(arbiter.is_running());

        arbiter.stop();
        assert!(!arbiter.is_running());

        let c = ticker(2, &order);
        arbiter.add(weak(&c));
        assert!(!arbiter.is_running());

        assert!(arbiter.start().is_ok());
        assert!(arbiter.is_running());
    }

    #[test]
    fn test_concurrent_adds_start_one_thread() {
        let arbiter = Arc::new(TickArbiter::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        let tickers: Vec<Arc<Ticker>> = (0..8).map(|i| ticker(i, &order)).collect();
        let mut joins = Vec::new();
        for p in &tickers {
            let arbiter = Arc::clone(&arbiter);
            let w = weak(p);
            joins.push(::std::thread::spawn(move || arbiter.add(w)));
        }
        for j in joins {
            j.join().expect("adder panicked");
        }
        assert!(arbiter.is_running());
        assert_eq!(8, arbiter.len());
    }
}
