//! Batched aggregate queries.
//!
//! Every operation here turns its region input into one slice and makes a
//! single batched call into the storage engine; results come back in input
//! order and are reshaped to match the input (single region in, single
//! value out).

use std::fmt;
use std::str::FromStr;

use crate::error::{expect_len, CoverageError, Result};
use crate::histogram::Histogram;
use crate::percentile::PercentileEstimator;
use crate::region::{OneOrMany, Region};
use crate::store::TrackStore;

/// Per-bin aggregation used by resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Mean,
    Median,
}

impl FromStr for Method {
    type Err = CoverageError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" | "avg" => Ok(Method::Mean),
            "median" => Ok(Method::Median),
            other => Err(CoverageError::UnsupportedAggregationMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Mean => write!(f, "mean"),
            Method::Median => write!(f, "median"),
        }
    }
}

/// Batched statistics over one storage engine.
pub struct AggregateDispatcher<'a, S: TrackStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TrackStore + ?Sized> AggregateDispatcher<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Mean value of each region.
    pub fn mean(&self, regions: &OneOrMany<Region>) -> Result<OneOrMany<f64>> {
        regions.reshape(self.mean_batch(regions.as_slice())?)
    }

    /// Mean value of each region, flat.
    pub fn mean_batch(&self, regions: &[Region]) -> Result<Vec<f64>> {
        if regions.is_empty() {
            return Ok(Vec::new());
        }
        expect_len(self.store.raw_mean(regions)?, regions.len())
    }

    /// Sum of values over each region.
    pub fn sum(&self, regions: &OneOrMany<Region>) -> Result<OneOrMany<f64>> {
        let means = self.mean_batch(regions.as_slice())?;
        let sums = regions
            .as_slice()
            .iter()
            .zip(means)
            .map(|(region, mean)| if region.is_empty() { 0.0 } else { mean * region.len() as f64 })
            .collect();
        regions.reshape(sums)
    }

    /// The `nth` percentile of each region.
    pub fn percentile(&self, regions: &OneOrMany<Region>, nth: f64) -> Result<OneOrMany<i32>> {
        let values = PercentileEstimator::new(self.store).percentile(regions.as_slice(), nth)?;
        regions.reshape(values)
    }

    /// Median of each region.
    pub fn median(&self, regions: &OneOrMany<Region>) -> Result<OneOrMany<i32>> {
        self.percentile(regions, 50.0)
    }

    /// Histogram of values in `[min, max)` for each region.
    pub fn histogram(
        &self,
        regions: &OneOrMany<Region>,
        min: i32,
        max: i32,
    ) -> Result<OneOrMany<Histogram>> {
        regions.reshape(self.histogram_batch(regions.as_slice(), min, max)?)
    }

    /// Histogram of values in `[min, max)` for each region, flat.
    pub fn histogram_batch(&self, regions: &[Region], min: i32, max: i32) -> Result<Vec<Histogram>> {
        if min >= max {
            return Err(CoverageError::MalformedHistogramInput(format!(
                "empty bucket range [{}, {})",
                min, max
            )));
        }
        if regions.is_empty() {
            return Ok(Vec::new());
        }
        let raw = expect_len(self.store.raw_histogram(regions, min, max)?, regions.len())?;
        raw.iter().map(Histogram::from_raw).collect()
    }

    /// Share of positions with value `>= t` for every threshold, per region.
    pub fn perc_cov(
        &self,
        regions: &OneOrMany<Region>,
        thresholds: &[u32],
    ) -> Result<OneOrMany<Vec<f64>>> {
        let Some(&max_threshold) = thresholds.iter().max() else {
            return regions.reshape(vec![Vec::new(); regions.len()]);
        };
        if let Some(empty) = regions.as_slice().iter().find(|r| r.is_empty()) {
            return Err(CoverageError::EmptyRegion(empty.to_string()));
        }
        let max = i32::try_from(max_threshold)
            .ok()
            .and_then(|t| t.checked_add(1))
            .ok_or_else(|| {
                CoverageError::InvalidFormat(format!("threshold {} is too large", max_threshold))
            })?;

        let histograms = self.histogram_batch(regions.as_slice(), 0, max)?;
        let fractions = histograms
            .iter()
            .map(|h| {
                thresholds
                    .iter()
                    .map(|&t| h.fraction_at_least(t as i64))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        regions.reshape(fractions)
    }

    /// Aggregate each region with `method`, flat.
    pub fn aggregate(&self, method: Method, regions: &[Region]) -> Result<Vec<f64>> {
        match method {
            Method::Mean => self.mean_batch(regions),
            Method::Median => Ok(PercentileEstimator::new(self.store)
                .median(regions)?
                .into_iter()
                .map(f64::from)
                .collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bedgraph::BedGraphStore;

    fn store() -> BedGraphStore {
        BedGraphStore::from_dense([("chr1", vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10])])
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("mean".parse::<Method>().unwrap(), Method::Mean);
        assert_eq!("median".parse::<Method>().unwrap(), Method::Median);
        assert!(matches!(
            "max".parse::<Method>(),
            Err(CoverageError::UnsupportedAggregationMethod(m)) if m == "max"
        ));
    }

    #[test]
    fn test_mean_shape() {
        let s = store();
        let d = AggregateDispatcher::new(&s);
        let one = d.mean(&Region::new("chr1", 0, 10).into()).unwrap();
        assert_eq!(one, OneOrMany::One(5.5));

        let many = d
            .mean(&OneOrMany::Many(vec![
                Region::new("chr1", 0, 2),
                Region::new("chr1", 8, 10),
            ]))
            .unwrap();
        assert_eq!(many, OneOrMany::Many(vec![1.5, 9.5]));
    }

    #[test]
    fn test_sum() {
        let s = store();
        let d = AggregateDispatcher::new(&s);
        let sums = d
            .sum(&OneOrMany::Many(vec![
                Region::new("chr1", 0, 10),
                Region::new("chr1", 3, 3),
            ]))
            .unwrap();
        assert_eq!(sums, OneOrMany::Many(vec![55.0, 0.0]));
    }

    #[test]
    fn test_perc_cov() {
        let s = store();
        let d = AggregateDispatcher::new(&s);
        let cov = d
            .perc_cov(&Region::new("chr1", 0, 10).into(), &[1, 5, 11])
            .unwrap();
        assert_eq!(cov, OneOrMany::One(vec![1.0, 0.6, 0.0]));
    }

    #[test]
    fn test_histogram_range_checked() {
        let s = store();
        let d = AggregateDispatcher::new(&s);
        assert!(d.histogram(&Region::new("chr1", 0, 10).into(), 5, 5).is_err());
        let h = d
            .histogram(&Region::new("chr1", 0, 10).into(), 0, 5)
            .unwrap()
            .into_one()
            .unwrap();
        assert_eq!(h.below(), 0);
        assert_eq!(h.above(), 6);
        assert_eq!(h.value_count(4), 1);
    }

    #[test]
    fn test_aggregate_median() {
        let s = store();
        let d = AggregateDispatcher::new(&s);
        let values = d
            .aggregate(Method::Median, &[Region::new("chr1", 0, 10), Region::new("chr1", 0, 3)])
            .unwrap();
        assert_eq!(values, vec![6.0, 2.0]);
    }
}
