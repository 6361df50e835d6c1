//! Dense prefix-sum histogram over a sparse value distribution.
//!
//! Built once from a [`RawHistogram`] and read-only afterwards. Counts are
//! stored cumulatively so range and percentile queries need no re-summing.

use crate::error::{CoverageError, Result};
use crate::store::RawHistogram;

/// Histogram of integer values with `below`/`above` overflow tails.
///
/// `prefix_sum[0]` is the `below` count and `prefix_sum[i]` is the number of
/// positions whose value is `<= first_value + i - 1`, `below` included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    first_value: i64,
    prefix_sum: Vec<u64>,
    above: u64,
}

impl Histogram {
    /// Build from raw storage output.
    ///
    /// Pairs may arrive unsorted, with gaps or repeated values. An input with
    /// no pairs and no overflow counts is rejected.
    pub fn from_raw(raw: &RawHistogram) -> Result<Self> {
        let (first_value, last_value) = match (
            raw.counts.iter().map(|&(v, _)| v).min(),
            raw.counts.iter().map(|&(v, _)| v).max(),
        ) {
            (Some(lo), Some(hi)) => (lo as i64, hi as i64),
            _ if raw.below + raw.above > 0 => {
                return Ok(Self {
                    first_value: 0,
                    prefix_sum: vec![raw.below],
                    above: raw.above,
                })
            }
            _ => {
                return Err(CoverageError::MalformedHistogramInput(
                    "no value counts and no overflow counts".to_string(),
                ))
            }
        };

        let span = (last_value - first_value + 1) as usize;
        let mut prefix_sum = vec![0u64; span + 1];
        for &(value, count) in &raw.counts {
            prefix_sum[(value as i64 - first_value) as usize + 1] += count;
        }
        prefix_sum[0] = raw.below;
        for i in 1..prefix_sum.len() {
            prefix_sum[i] += prefix_sum[i - 1];
        }

        Ok(Self {
            first_value,
            prefix_sum,
            above: raw.above,
        })
    }

    /// Smallest value with its own bucket.
    pub fn first_value(&self) -> i64 {
        self.first_value
    }

    /// Largest value with its own bucket; below `first_value` when there are none.
    pub fn last_value(&self) -> i64 {
        self.first_value + self.prefix_sum.len() as i64 - 2
    }

    /// Count of positions below the bucketed range.
    pub fn below(&self) -> u64 {
        self.prefix_sum[0]
    }

    /// Count of positions above the bucketed range.
    pub fn above(&self) -> u64 {
        self.above
    }

    /// The cumulative counts, `below` first.
    pub fn prefix_sum(&self) -> &[u64] {
        &self.prefix_sum
    }

    #[inline]
    fn last_cumulative(&self) -> u64 {
        self.prefix_sum[self.prefix_sum.len() - 1]
    }

    /// Number of positions holding exactly `value`; 0 outside the bucketed range.
    pub fn value_count(&self, value: i64) -> u64 {
        if value < self.first_value || value > self.last_value() {
            return 0;
        }
        let idx = (value - self.first_value + 1) as usize;
        self.prefix_sum[idx] - self.prefix_sum[idx - 1]
    }

    /// Every position, overflow tails included.
    pub fn total_count(&self) -> u64 {
        self.last_cumulative() + self.above
    }

    fn nonzero_total(&self) -> Result<f64> {
        match self.total_count() {
            0 => Err(CoverageError::EmptyHistogram),
            total => Ok(total as f64),
        }
    }

    /// Share of positions holding exactly `value`.
    pub fn value_percentage(&self, value: i64) -> Result<f64> {
        let total = self.nonzero_total()?;
        Ok(self.value_count(value) as f64 / total)
    }

    /// Share of positions whose value is `<= value`; 0 below the bucketed range.
    pub fn percentile_below(&self, value: i64) -> Result<f64> {
        let total = self.nonzero_total()?;
        if value < self.first_value {
            return Ok(0.0);
        }
        let idx = ((value - self.first_value + 1) as usize).min(self.prefix_sum.len() - 1);
        Ok(self.prefix_sum[idx] as f64 / total)
    }

    /// Share of positions whose value is `>= threshold`.
    ///
    /// Exact while `threshold` is at most one past the bucketed range; above
    /// that every `above` position is counted.
    pub fn fraction_at_least(&self, threshold: i64) -> Result<f64> {
        let total = self.nonzero_total()?;
        let under = if threshold <= self.first_value {
            self.below()
        } else {
            let idx = ((threshold - self.first_value) as usize).min(self.prefix_sum.len() - 1);
            self.prefix_sum[idx]
        };
        Ok((self.total_count() - under) as f64 / total)
    }

    /// Sum, sum of squares and count over the bucketed values.
    fn moments(&self) -> (f64, f64, u64) {
        let mut sum = 0f64;
        let mut sum_sq = 0f64;
        for (step, pair) in self.prefix_sum.windows(2).enumerate() {
            let count = (pair[1] - pair[0]) as f64;
            let value = (self.first_value + step as i64) as f64;
            sum += value * count;
            sum_sq += value * value * count;
        }
        (sum, sum_sq, self.last_cumulative() - self.below())
    }

    /// Mean over the bucketed values; overflow positions carry no value.
    pub fn mean(&self) -> Result<f64> {
        let (sum, _, count) = self.moments();
        if count == 0 {
            return Err(CoverageError::EmptyHistogram);
        }
        Ok(sum / count as f64)
    }

    /// Population standard deviation over the bucketed values.
    pub fn std(&self) -> Result<f64> {
        let (sum, sum_sq, count) = self.moments();
        if count == 0 {
            return Err(CoverageError::EmptyHistogram);
        }
        let n = count as f64;
        let mean = sum / n;
        // guard against tiny negative variances from rounding
        Ok((sum_sq / n - mean * mean).max(0.0).sqrt())
    }

    /// First value whose cumulative share strictly exceeds `nth` percent.
    ///
    /// Returns 0 when no value does (including an empty histogram). This is
    /// a coarse answer; [`crate::percentile::PercentileEstimator`] resolves
    /// the tails exactly.
    pub fn percentile(&self, nth: f64) -> i64 {
        let total = self.total_count();
        if total == 0 {
            return 0;
        }
        let idx = self.prefix_sum[1..]
            .partition_point(|&cum| cum as f64 * 100.0 / total as f64 <= nth);
        if idx < self.prefix_sum.len() - 1 {
            self.first_value + idx as i64
        } else {
            0
        }
    }

    /// `percentile(50)`.
    pub fn median(&self) -> i64 {
        self.percentile(50.0)
    }

    /// Iterate `(value, count)` over the bucketed range in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        self.prefix_sum
            .windows(2)
            .enumerate()
            .map(move |(step, pair)| (self.first_value + step as i64, pair[1] - pair[0]))
    }
}

impl TryFrom<&RawHistogram> for Histogram {
    type Error = CoverageError;

    fn try_from(raw: &RawHistogram) -> Result<Self> {
        Self::from_raw(raw)
    }
}
