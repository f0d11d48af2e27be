use rand::{self, Rng};
use sample::{Sample, Snapshot};
use std::mem;
use std::sync::Mutex;
use util::lock;

#[derive(Debug)]
struct State {
    count: i64,
    values: Vec<i64>,
}

/// A uniform sample using Vitter's Algorithm R.
///
/// Until the reservoir fills every value is kept. After that the `n`th value
/// replaces a random slot with probability `reservoir_size / n`, so each
/// value seen has the same chance of being retained.
#[derive(Debug)]
pub struct UniformSample {
    reservoir_size: usize,
    state: Mutex<State>,
}

impl UniformSample {
    /// Create a sample holding at most `reservoir_size` values.
    pub fn new(reservoir_size: usize) -> UniformSample {
        UniformSample {
            reservoir_size: reservoir_size,
            state: Mutex::new(State {
                count: 0,
                values: Vec::with_capacity(reservoir_size),
            }),
        }
    }

    /// Freeze the current contents and, under the same lock, empty the
    /// reservoir.
    fn drain(&self) -> Snapshot {
        let mut state = lock(&self.state);
        let values = mem::replace(&mut state.values, Vec::with_capacity(self.reservoir_size));
        let count = mem::replace(&mut state.count, 0);
        Snapshot::new(count, values)
    }
}

impl Sample for UniformSample {
    fn update(&self, value: i64) {
        let mut state = lock(&self.state);
        state.count = state.count.saturating_add(1);
        if state.values.len() < self.reservoir_size {
            state.values.push(value);
        } else {
            let slot = rand::thread_rng().gen_range(0, state.count);
            if slot < self.reservoir_size as i64 {
                state.values[slot as usize] = value;
            }
        }
    }

    fn clear(&self) {
        let mut state = lock(&self.state);
        state.count = 0;
        state.values.clear();
    }

    fn snapshot(&self) -> Snapshot {
        let state = lock(&self.state);
        Snapshot::new(state.count, state.values.clone())
    }

    fn size(&self) -> usize {
        lock(&self.state).values.len()
    }

    fn count(&self) -> i64 {
        lock(&self.state).count
    }

    fn values(&self) -> Vec<i64> {
        lock(&self.state).values.clone()
    }
}

/// A uniform sample that empties itself every time it is snapshotted.
///
/// Where a `UniformSample` summarises a metric's whole life, a `FlashSample`
/// summarises only what happened since the previous flush.
#[derive(Debug)]
pub struct FlashSample {
    inner: UniformSample,
}

impl FlashSample {
    /// Create a sample holding at most `reservoir_size` values between
    /// snapshots.
    pub fn new(reservoir_size: usize) -> FlashSample {
        FlashSample {
            inner: UniformSample::new(reservoir_size),
        }
    }
}

impl Sample for FlashSample {
    fn update(&self, value: i64) {
        self.inner.update(value)
    }

    fn clear(&self) {
        self.inner.clear()
    }

    fn snapshot(&self) -> Snapshot {
        self.inner.drain()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn count(&self) -> i64 {
        self.inner.count()
    }

    fn values(&self) -> Vec<i64> {
        self.inner.values()
    }
}
