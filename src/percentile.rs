//! Exact percentiles from a coarse histogram plus a raw-value fallback.
//!
//! A histogram over `[0, COARSE_HISTOGRAM_MAX)` is cheap for the storage
//! engine to produce, but cannot place a percentile that falls into its
//! `below` or `above` overflow buckets. Only those regions pay for loading
//! their raw values and binary searching the answer.
//!
//! Both paths answer with the smallest value `v` such that the share of
//! positions with value `<= v` strictly exceeds `nth` percent, so `nth = 0`
//! is the minimum and `nth = 100` the maximum.

use log::debug;

use crate::config::COARSE_HISTOGRAM_MAX;
use crate::error::{expect_len, CoverageError, Result};
use crate::region::Region;
use crate::store::{RawHistogram, TrackStore};

/// Percentile queries against one storage engine.
pub struct PercentileEstimator<'a, S: TrackStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TrackStore + ?Sized> PercentileEstimator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The `nth` percentile of every region, in input order.
    ///
    /// Issues one batched coarse histogram request for all regions. Fails
    /// before any storage call if `nth` is outside `[0, 100]` or any region
    /// is empty.
    pub fn percentile(&self, regions: &[Region], nth: f64) -> Result<Vec<i32>> {
        if !(0.0..=100.0).contains(&nth) {
            return Err(CoverageError::InvalidPercentile(nth));
        }
        if let Some(empty) = regions.iter().find(|r| r.is_empty()) {
            return Err(CoverageError::EmptyRegion(empty.to_string()));
        }
        if regions.is_empty() {
            return Ok(Vec::new());
        }

        let coarse = self
            .store
            .raw_histogram(regions, 0, COARSE_HISTOGRAM_MAX)?;
        let coarse = expect_len(coarse, regions.len())?;

        regions
            .iter()
            .zip(coarse)
            .map(|(region, hist)| self.resolve(region, hist, nth))
            .collect()
    }

    /// `percentile(regions, 50)`.
    pub fn median(&self, regions: &[Region]) -> Result<Vec<i32>> {
        self.percentile(regions, 50.0)
    }

    fn resolve(&self, region: &Region, mut hist: RawHistogram, nth: f64) -> Result<i32> {
        let total = region.len() as f64;
        let below_pct = hist.below as f64 * 100.0 / total;
        let in_range_pct = (region.len().saturating_sub(hist.above)) as f64 * 100.0 / total;

        if nth < below_pct || (hist.above > 0 && in_range_pct <= nth) {
            debug!(
                "percentile {} of {} falls outside the coarse histogram, scanning raw values",
                nth, region
            );
            return self.exact(region, nth);
        }

        hist.counts.sort_unstable_by_key(|&(value, _)| value);
        let mut accumulated = hist.below;
        for (value, count) in hist.counts {
            if (accumulated + count) as f64 * 100.0 / total > nth {
                return Ok(value);
            }
            accumulated += count;
        }

        debug!(
            "coarse histogram of {} does not resolve percentile {}, scanning raw values",
            region, nth
        );
        self.exact(region, nth)
    }

    /// Binary search over the raw values of one region.
    fn exact(&self, region: &Region, nth: f64) -> Result<i32> {
        let mut data = vec![0i32; region.len() as usize];
        self.store
            .load_values(&region.name, region.begin, region.end, &mut data)?;
        exact_percentile(&data, nth).ok_or_else(|| CoverageError::EmptyRegion(region.to_string()))
    }
}

/// Smallest `v` in `data` such that `count(values <= v) * 100 / len > nth`;
/// the maximum when `nth` is never exceeded. `None` for empty input.
pub fn exact_percentile(data: &[i32], nth: f64) -> Option<i32> {
    let min = *data.iter().min()? as i64;
    let max = *data.iter().max()? as i64;
    let total = data.len() as f64;
    let exceeds = |threshold: i64| {
        let below = data.iter().filter(|&&v| (v as i64) < threshold).count();
        below as f64 * 100.0 / total > nth
    };

    // search the smallest threshold t in (min, max + 1] with count(< t) past nth;
    // count(< t) never decreases as t grows
    let (mut low, mut high) = (min + 1, max + 1);
    if !exceeds(high) {
        return Some(max as i32);
    }
    while low < high {
        let mid = low + (high - low) / 2;
        if exceeds(mid) {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    Some((low - 1) as i32)
}
