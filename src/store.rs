//! Storage engine contract.
//!
//! The statistics layer never touches a file format directly. Anything that
//! can list its chromosomes, iterate or bulk-load per-position values, and
//! answer batched mean/histogram requests can back a [`crate::CoverageTrack`].
//! Batched calls must return exactly one result per input region, in order.

use crate::error::Result;
use crate::region::Region;

/// Raw per-region histogram as produced by a storage engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHistogram {
    /// Sparse `(value, count)` pairs; neither sorted nor contiguous.
    pub counts: Vec<(i32, u64)>,
    /// Number of positions with a value below the requested minimum.
    pub below: u64,
    /// Number of positions with a value at or above the requested maximum.
    pub above: u64,
}

impl RawHistogram {
    /// Total number of positions described by this histogram.
    pub fn total(&self) -> u64 {
        self.below + self.above + self.counts.iter().map(|&(_, c)| c).sum::<u64>()
    }
}

/// The operations the statistics core needs from a coverage source.
pub trait TrackStore: Send + Sync {
    /// Chromosome names and lengths, in storage order.
    fn chroms(&self) -> Vec<(String, u64)>;

    /// True when every request crosses a network boundary.
    fn is_remote(&self) -> bool {
        false
    }

    /// Mean value over each region.
    fn raw_mean(&self, regions: &[Region]) -> Result<Vec<f64>>;

    /// Histogram of values in `[min, max)` over each region, with overflow counts.
    fn raw_histogram(&self, regions: &[Region], min: i32, max: i32) -> Result<Vec<RawHistogram>>;

    /// Fill `out` with the values of `[begin, end)`; `out.len()` must equal `end - begin`.
    fn load_values(&self, name: &str, begin: u64, end: u64, out: &mut [i32]) -> Result<()>;

    /// Lazily yield exactly `end - begin` values.
    fn value_iter<'a>(
        &'a self,
        name: &str,
        begin: u64,
        end: u64,
    ) -> Result<Box<dyn Iterator<Item = i32> + Send + 'a>>;
}

impl<T: TrackStore + ?Sized> TrackStore for &T {
    fn chroms(&self) -> Vec<(String, u64)> {
        (**self).chroms()
    }

    fn is_remote(&self) -> bool {
        (**self).is_remote()
    }

    fn raw_mean(&self, regions: &[Region]) -> Result<Vec<f64>> {
        (**self).raw_mean(regions)
    }

    fn raw_histogram(&self, regions: &[Region], min: i32, max: i32) -> Result<Vec<RawHistogram>> {
        (**self).raw_histogram(regions, min, max)
    }

    fn load_values(&self, name: &str, begin: u64, end: u64, out: &mut [i32]) -> Result<()> {
        (**self).load_values(name, begin, end, out)
    }

    fn value_iter<'a>(
        &'a self,
        name: &str,
        begin: u64,
        end: u64,
    ) -> Result<Box<dyn Iterator<Item = i32> + Send + 'a>> {
        (**self).value_iter(name, begin, end)
    }
}
