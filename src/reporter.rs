//! The registry of live metrics and the loop that reports them.
//!
//! A `Reporter` maps `MetricId`s to metrics. Every report it snapshots the
//! membership, flushes each metric into series outside the registry lock,
//! stamps host and reporter tags on the result and hands the batch to its
//! `Transport`.

use arbiter::TickArbiter;
use config::{ReporterConfig, SampleConfig};
use metric::{Counter, FlashCounter, Gauge, GaugeF, Histogram, IntoAny, Meter, Metric, MetricId,
             Timer};
use series::Series;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thread::ThreadHandle;
use time::{Clock, SystemClock};
use transport::{self, Transport};
use util::lock;

/// The outcome of a typed registry lookup.
pub enum Lookup<M> {
    /// A metric of the requested kind.
    Found(Arc<M>),
    /// Something is registered under the id, but not of the requested kind.
    WrongKind(Arc<dyn Metric>),
    /// Nothing is registered under the id.
    NotFound,
}

impl<M> Lookup<M> {
    /// The metric, if one of the requested kind was found.
    pub fn found(self) -> Option<Arc<M>> {
        match self {
            Lookup::Found(m) => Some(m),
            _ => None,
        }
    }

    /// Whether a metric of the requested kind was found.
    pub fn is_found(&self) -> bool {
        match *self {
            Lookup::Found(_) => true,
            _ => false,
        }
    }
}

impl<M> fmt::Debug for Lookup<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Lookup::Found(_) => write!(f, "Found"),
            Lookup::WrongKind(ref m) => write!(f, "WrongKind({})", m.id()),
            Lookup::NotFound => write!(f, "NotFound"),
        }
    }
}

fn classify<M>(metric: Arc<dyn Metric>) -> Lookup<M>
where
    M: Metric + 'static,
{
    match IntoAny::into_any(Arc::clone(&metric)).downcast::<M>() {
        Ok(m) => Lookup::Found(m),
        Err(_) => Lookup::WrongKind(metric),
    }
}

/// Registry and periodic reporter of metrics.
pub struct Reporter {
    registry: Mutex<BTreeMap<MetricId, Arc<dyn Metric>>>,
    host: String,
    tags: Vec<String>,
    sample: SampleConfig,
    transport: Box<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl Reporter {
    /// Create an empty, un-started reporter. `host` and `tags` are stamped
    /// on every series it produces.
    pub fn new<S>(host: S, tags: Vec<String>, transport: Box<dyn Transport>) -> Reporter
    where
        S: Into<String>,
    {
        Reporter {
            registry: Mutex::new(BTreeMap::new()),
            host: host.into(),
            tags: tags,
            sample: SampleConfig::default(),
            transport: transport,
            clock: Arc::new(SystemClock),
        }
    }

    /// Create an empty, un-started reporter from `config`.
    pub fn from_config(config: &ReporterConfig, transport: Box<dyn Transport>) -> Reporter {
        let mut reporter = Reporter::new(config.host.clone(), config.tags.clone(), transport);
        reporter.sample = config.sample.clone();
        reporter
    }

    /// Timestamp series with `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Reporter {
        self.clock = clock;
        self
    }

    /// Register `metric`, replacing and returning anything already
    /// registered under its id.
    pub fn register(&self, metric: Arc<dyn Metric>) -> Option<Arc<dyn Metric>> {
        let id = metric.id();
        lock(&self.registry).insert(id, metric)
    }

    /// Look up the metric registered under `name` and `tags`, creating it
    /// with `fallback` if absent. Creation happens under the registry lock,
    /// so concurrent fetches of one id create exactly once.
    pub fn fetch<M, F>(&self, fallback: F, name: &str, tags: &[String]) -> Lookup<M>
    where
        M: Metric + 'static,
        F: FnOnce() -> Arc<M>,
    {
        let id = MetricId::new(name, tags);
        let mut registry = lock(&self.registry);
        if let Some(existing) = registry.get(&id) {
            return classify(Arc::clone(existing));
        }
        let created = fallback();
        trace!("registering {}", id);
        registry.insert(id, created.clone() as Arc<dyn Metric>);
        Lookup::Found(created)
    }

    /// Look up a metric of kind `M`.
    pub fn get<M>(&self, name: &str, tags: &[String]) -> Lookup<M>
    where
        M: Metric + 'static,
    {
        match self.get_by_id(&MetricId::new(name, tags)) {
            Some(metric) => classify(metric),
            None => Lookup::NotFound,
        }
    }

    /// Look up whatever is registered under `id`.
    pub fn get_by_id(&self, id: &MetricId) -> Option<Arc<dyn Metric>> {
        lock(&self.registry).get(id).cloned()
    }

    /// Remove and return whatever is registered under `name` and `tags`.
    pub fn unregister(&self, name: &str, tags: &[String]) -> Option<Arc<dyn Metric>> {
        lock(&self.registry).remove(&MetricId::new(name, tags))
    }

    /// The number of registered metrics.
    pub fn len(&self) -> usize {
        lock(&self.registry).len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn registered(&self) -> Vec<Arc<dyn Metric>> {
        lock(&self.registry).values().cloned().collect()
    }

    /// Flush every registered metric and return the combined series, each
    /// stamped with this reporter's host and tags.
    ///
    /// Only the membership snapshot is taken under the registry lock. Each
    /// metric flushes at its own instant, so the batch is not one atomic
    /// cut across metrics.
    pub fn series(&self) -> Vec<Series> {
        let now = self.clock.timestamp();
        let metrics = self.registered();

        let mut series = Vec::with_capacity(metrics.len());
        for metric in metrics {
            series.extend(metric.flush(now));
        }
        for s in &mut series {
            s.tags.extend(self.tags.iter().cloned());
            s.host = self.host.clone();
        }
        series
    }

    /// Flush and deliver one batch. Transport failure is returned as-is;
    /// registry state is unaffected either way.
    pub fn report(&self) -> Result<(), transport::Error> {
        let series = self.series();
        debug!("reporting {} series", series.len());
        self.transport.send(&series)
    }

    /// Report every `interval` on a background thread until the returned
    /// handle is shut down or dropped. Failed reports are logged and the
    /// next scheduled report is the retry.
    pub fn start(self: Arc<Self>, interval: Duration) -> io::Result<ThreadHandle> {
        info!(
            "reporting every {}s as host {}",
            interval.as_secs(),
            self.host
        );
        ThreadHandle::periodic("tallier-reporter", interval, move || {
            if let Err(e) = self.report() {
                error!("series report failed: {}", e);
            }
        })
    }

    /// Register a new `Counter`.
    pub fn register_counter(&self, name: &str, tags: &[String]) -> Arc<Counter> {
        let m = Arc::new(Counter::new(name, tags.to_vec()));
        self.register(m.clone());
        m
    }

    /// Fetch or create a `Counter`.
    pub fn fetch_counter(&self, name: &str, tags: &[String]) -> Lookup<Counter> {
        self.fetch(|| Arc::new(Counter::new(name, tags.to_vec())), name, tags)
    }

    /// Register a new `FlashCounter`.
    pub fn register_flash_counter(&self, name: &str, tags: &[String]) -> Arc<FlashCounter> {
        let m = Arc::new(FlashCounter::new(name, tags.to_vec()));
        self.register(m.clone());
        m
    }

    /// Fetch or create a `FlashCounter`.
    pub fn fetch_flash_counter(&self, name: &str, tags: &[String]) -> Lookup<FlashCounter> {
        self.fetch(|| Arc::new(FlashCounter::new(name, tags.to_vec())), name, tags)
    }

    /// Register a new `Gauge`.
    pub fn register_gauge(&self, name: &str, tags: &[String]) -> Arc<Gauge> {
        let m = Arc::new(Gauge::new(name, tags.to_vec()));
        self.register(m.clone());
        m
    }

    /// Fetch or create a `Gauge`.
    pub fn fetch_gauge(&self, name: &str, tags: &[String]) -> Lookup<Gauge> {
        self.fetch(|| Arc::new(Gauge::new(name, tags.to_vec())), name, tags)
    }

    /// Register a new `GaugeF`.
    pub fn register_gauge_f(&self, name: &str, tags: &[String]) -> Arc<GaugeF> {
        let m = Arc::new(GaugeF::new(name, tags.to_vec()));
        self.register(m.clone());
        m
    }

    /// Fetch or create a `GaugeF`.
    pub fn fetch_gauge_f(&self, name: &str, tags: &[String]) -> Lookup<GaugeF> {
        self.fetch(|| Arc::new(GaugeF::new(name, tags.to_vec())), name, tags)
    }

    /// Register a new `Histogram` over the configured sample.
    pub fn register_histogram(&self, name: &str, tags: &[String]) -> Arc<Histogram> {
        let m = Arc::new(Histogram::with_sample(name, self.sample.build(), tags.to_vec()));
        self.register(m.clone());
        m
    }

    /// Fetch or create a `Histogram` over the configured sample.
    pub fn fetch_histogram(&self, name: &str, tags: &[String]) -> Lookup<Histogram> {
        self.fetch(
            || Arc::new(Histogram::with_sample(name, self.sample.build(), tags.to_vec())),
            name,
            tags,
        )
    }

    /// Register a new `Meter`, ticked by `arbiter`.
    pub fn register_meter(&self, arbiter: &TickArbiter, name: &str, tags: &[String]) -> Arc<Meter> {
        let m = Meter::new(name, tags.to_vec(), arbiter);
        self.register(m.clone());
        m
    }

    /// Fetch or create a `Meter`, ticked by `arbiter`.
    pub fn fetch_meter(&self, arbiter: &TickArbiter, name: &str, tags: &[String]) -> Lookup<Meter> {
        self.fetch(|| Meter::new(name, tags.to_vec(), arbiter), name, tags)
    }

    /// Register a new `Timer` over the configured sample, reporting in
    /// `unit` and ticked by `arbiter`.
    pub fn register_timer(
        &self,
        arbiter: &TickArbiter,
        name: &str,
        unit: Duration,
        tags: &[String],
    ) -> Arc<Timer> {
        let m = Timer::with_sample(name, unit, self.sample.build(), tags.to_vec(), arbiter);
        self.register(m.clone());
        m
    }

    /// Fetch or create a `Timer` over the configured sample, reporting in
    /// `unit` and ticked by `arbiter`.
    pub fn fetch_timer(
        &self,
        arbiter: &TickArbiter,
        name: &str,
        unit: Duration,
        tags: &[String],
    ) -> Lookup<Timer> {
        self.fetch(
            || Timer::with_sample(name, unit, self.sample.build(), tags.to_vec(), arbiter),
            name,
            tags,
        )
    }
}
