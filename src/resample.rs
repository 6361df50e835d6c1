//! Fixed-width binning of regions.
//!
//! Every region is cut into consecutive bins, all bins of all regions go to
//! the storage engine in one batched call, and the flat results are cut
//! back into one array per region.

use log::debug;

use crate::aggregate::{AggregateDispatcher, Method};
use crate::config::REMOTE_BIN_QUANTUM;
use crate::error::{CoverageError, Result};
use crate::region::{OneOrMany, Region};
use crate::store::TrackStore;

/// Consecutive, non-overlapping bins covering one region.
/// The last bin is shorter when the region length is not a multiple of the bin size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinPlan {
    bins: Vec<Region>,
}

impl BinPlan {
    /// Split `region` into bins of `bin_size`.
    pub fn new(region: &Region, bin_size: u64) -> Result<Self> {
        if bin_size == 0 {
            return Err(CoverageError::InvalidBinSize);
        }
        let mut bins = Vec::with_capacity(region.len().div_ceil(bin_size) as usize);
        let mut cursor = region.begin;
        while cursor < region.end {
            let end = cursor.saturating_add(bin_size).min(region.end);
            bins.push(Region::new(region.name.as_str(), cursor, end));
            cursor = end;
        }
        Ok(Self { bins })
    }

    pub fn bins(&self) -> &[Region] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn into_bins(self) -> Vec<Region> {
        self.bins
    }
}

/// The bin size a store will actually be queried with.
///
/// Remote stores pay a round trip per request, so when adjustment is
/// allowed their bins are at least [`REMOTE_BIN_QUANTUM`] wide and a
/// multiple of it.
pub fn effective_bin_size(bin_size: u64, is_remote: bool, allow_adjustment: bool) -> u64 {
    if !(is_remote && allow_adjustment) {
        return bin_size;
    }
    if bin_size < REMOTE_BIN_QUANTUM {
        REMOTE_BIN_QUANTUM
    } else {
        bin_size / REMOTE_BIN_QUANTUM * REMOTE_BIN_QUANTUM
    }
}

/// Output of [`Resampler::resample`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    /// One array of bin values per input region, shaped like the input.
    pub values: OneOrMany<Vec<f64>>,
    /// The bin size after any remote adjustment.
    pub bin_size: u64,
}

/// Bins regions and aggregates every bin.
pub struct Resampler<'a, S: TrackStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TrackStore + ?Sized> Resampler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Aggregate every `bin_size` window of each region with `method`.
    pub fn resample(
        &self,
        regions: &OneOrMany<Region>,
        method: Method,
        bin_size: u64,
        allow_adjustment: bool,
    ) -> Result<Resampled> {
        if bin_size == 0 {
            return Err(CoverageError::InvalidBinSize);
        }
        let bin_size = {
            let adjusted = effective_bin_size(bin_size, self.store.is_remote(), allow_adjustment);
            if adjusted != bin_size {
                debug!("Adjusted bin size from {} to {} for a remote store", bin_size, adjusted);
            }
            adjusted
        };

        let plans = regions
            .as_slice()
            .iter()
            .map(|region| BinPlan::new(region, bin_size))
            .collect::<Result<Vec<_>>>()?;
        let sizes: Vec<usize> = plans.iter().map(BinPlan::len).collect();
        let tasks: Vec<Region> = plans.into_iter().flat_map(BinPlan::into_bins).collect();

        let flat = AggregateDispatcher::new(self.store).aggregate(method, &tasks)?;

        let mut flat = flat.into_iter();
        let per_region: Vec<Vec<f64>> = sizes
            .iter()
            .map(|&n| flat.by_ref().take(n).collect())
            .collect();

        Ok(Resampled {
            values: regions.reshape(per_region)?,
            bin_size,
        })
    }
}
