
/// A read-only copy of a `Sample` taken at one instant.
///
/// Every statistic is derived from exactly the values captured, no matter
/// what happens to the originating sample afterwards. The values are sorted
/// once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    count: i64,
    values: Vec<i64>,
}

impl Snapshot {
    /// Freeze `values` along with the lifetime `count` of the sample they
    /// came from.
    pub fn new(count: i64, mut values: Vec<i64>) -> Snapshot {
        values.sort_unstable();
        Snapshot {
            count: count,
            values: values,
        }
    }

    /// The number of values offered to the sample at snapshot time.
    pub fn count(&self) -> i64 {
        self.count
    }

    /// The number of values retained at snapshot time.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// The captured values, sorted ascending.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// The smallest captured value, zero if there are none.
    pub fn min(&self) -> i64 {
        self.values.first().cloned().unwrap_or(0)
    }

    /// The largest captured value, zero if there are none.
    pub fn max(&self) -> i64 {
        self.values.last().cloned().unwrap_or(0)
    }

    /// The sum of captured values. Wraps on overflow.
    pub fn sum(&self) -> i64 {
        self.values.iter().fold(0i64, |acc, v| acc.wrapping_add(*v))
    }

    /// The arithmetic mean of captured values, zero if there are none.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.sum() as f64 / self.values.len() as f64
    }

    /// The population variance of captured values.
    pub fn variance(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let sum = self.values.iter().fold(0.0, |acc, v| {
            let d = *v as f64 - mean;
            acc + d * d
        });
        sum / self.values.len() as f64
    }

    /// The population standard deviation of captured values.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// A single percentile, `p` given in `[0.0, 1.0]`.
    pub fn percentile(&self, p: f64) -> f64 {
        self.percentiles(&[p])[0]
    }

    /// Several percentiles at once, in the order asked for.
    ///
    /// Position is `p * (n + 1)`. Below the first rank we answer with the
    /// minimum, at or past the last with the maximum, and in between we
    /// interpolate linearly across the two neighbouring ranks.
    pub fn percentiles(&self, ps: &[f64]) -> Vec<f64> {
        let size = self.values.len();
        if size == 0 {
            return vec![0.0; ps.len()];
        }
        ps.iter()
            .map(|p| {
                let pos = p * (size + 1) as f64;
                // NaN falls through to the minimum
                if !(pos >= 1.0) {
                    self.values[0] as f64
                } else if pos >= size as f64 {
                    self.values[size - 1] as f64
                } else {
                    let lower = self.values[pos as usize - 1] as f64;
                    let upper = self.values[pos as usize] as f64;
                    lower + (pos - pos.floor()) * (upper - lower)
                }
            })
            .collect()
    }
}

impl Default for Snapshot {
    fn default() -> Snapshot {
        Snapshot::new(0, Vec::new())
    }
}
