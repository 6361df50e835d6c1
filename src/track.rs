//! Caller-facing handle over one storage engine.
//!
//! A [`CoverageTrack`] reads the chromosome table once when it is created
//! and resolves every region spec against it. Each statistic accepts a
//! single spec or a list and answers in the same shape.

use crate::aggregate::{AggregateDispatcher, Method};
use crate::error::Result;
use crate::genome::ChromTable;
use crate::histogram::Histogram;
use crate::region::{resolve_many, whole_genome, OneOrMany, Region, RegionSpec};
use crate::resample::{Resampled, Resampler};
use crate::store::TrackStore;

/// One opened coverage track.
#[derive(Debug, Clone)]
pub struct CoverageTrack<S> {
    store: S,
    chroms: ChromTable,
}

impl<S: TrackStore> CoverageTrack<S> {
    /// Wrap a store, caching its chromosome table.
    pub fn new(store: S) -> Self {
        let chroms = ChromTable::from_chroms(store.chroms());
        Self { store, chroms }
    }

    /// The chromosome table captured at open time.
    pub fn chroms(&self) -> &ChromTable {
        &self.chroms
    }

    /// The underlying storage engine.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// True when the store sits behind a network boundary.
    pub fn is_remote(&self) -> bool {
        self.store.is_remote()
    }

    /// Resolve specs against this track's chromosomes.
    pub fn resolve(&self, specs: &OneOrMany<RegionSpec>) -> Result<OneOrMany<Region>> {
        resolve_many(specs, &self.chroms)
    }

    /// Every chromosome, whole, in storage order.
    pub fn whole_genome(&self) -> Vec<Region> {
        whole_genome(&self.chroms)
    }

    fn dispatcher(&self) -> AggregateDispatcher<'_, S> {
        AggregateDispatcher::new(&self.store)
    }

    pub fn mean(&self, specs: &OneOrMany<RegionSpec>) -> Result<OneOrMany<f64>> {
        self.dispatcher().mean(&self.resolve(specs)?)
    }

    pub fn sum(&self, specs: &OneOrMany<RegionSpec>) -> Result<OneOrMany<f64>> {
        self.dispatcher().sum(&self.resolve(specs)?)
    }

    pub fn median(&self, specs: &OneOrMany<RegionSpec>) -> Result<OneOrMany<i32>> {
        self.dispatcher().median(&self.resolve(specs)?)
    }

    pub fn percentile(&self, specs: &OneOrMany<RegionSpec>, nth: f64) -> Result<OneOrMany<i32>> {
        self.dispatcher().percentile(&self.resolve(specs)?, nth)
    }

    /// Histogram of values in `[min, max)`.
    pub fn histogram(
        &self,
        specs: &OneOrMany<RegionSpec>,
        min: i32,
        max: i32,
    ) -> Result<OneOrMany<Histogram>> {
        self.dispatcher().histogram(&self.resolve(specs)?, min, max)
    }

    /// Share of positions at or above each threshold.
    pub fn perc_cov(
        &self,
        specs: &OneOrMany<RegionSpec>,
        thresholds: &[u32],
    ) -> Result<OneOrMany<Vec<f64>>> {
        self.dispatcher().perc_cov(&self.resolve(specs)?, thresholds)
    }

    /// Bin each region and aggregate every bin.
    pub fn resample(
        &self,
        specs: &OneOrMany<RegionSpec>,
        method: Method,
        bin_size: u64,
        allow_adjustment: bool,
    ) -> Result<Resampled> {
        Resampler::new(&self.store).resample(&self.resolve(specs)?, method, bin_size, allow_adjustment)
    }

    /// Raw values of one region.
    pub fn values(&self, spec: &RegionSpec) -> Result<Vec<i32>> {
        let region = spec.resolve(&self.chroms)?;
        self.load_region(&region)
    }

    /// Bulk load: the values of every region, concatenated in input order.
    pub fn load_values(&self, specs: &OneOrMany<RegionSpec>) -> Result<Vec<i32>> {
        let regions = self.resolve(specs)?;
        let total: u64 = regions.as_slice().iter().map(Region::len).sum();
        let mut out = vec![0i32; total as usize];
        let mut offset = 0usize;
        for region in regions.as_slice() {
            let n = region.len() as usize;
            self.store.load_values(
                &region.name,
                region.begin,
                region.end,
                &mut out[offset..offset + n],
            )?;
            offset += n;
        }
        Ok(out)
    }

    /// Lazily iterate the values of one region.
    pub fn value_iter(&self, spec: &RegionSpec) -> Result<Box<dyn Iterator<Item = i32> + Send + '_>> {
        let region = spec.resolve(&self.chroms)?;
        self.store.value_iter(&region.name, region.begin, region.end)
    }

    pub(crate) fn load_region(&self, region: &Region) -> Result<Vec<i32>> {
        let mut out = vec![0i32; region.len() as usize];
        self.store
            .load_values(&region.name, region.begin, region.end, &mut out)?;
        Ok(out)
    }
}
