//! Stat command implementation.
//!
//! Computes one statistic for every requested region of a track, or for
//! every chromosome when no region is given.

use std::collections::BTreeMap;
use std::io::Write;
use std::str::FromStr;

use crate::aggregate::AggregateDispatcher;
use crate::config::DEFAULT_HISTOGRAM_MAX;
use crate::error::{CoverageError, Result};
use crate::output::StatWriter;
use crate::region::{OneOrMany, Region, RegionSpec};
use crate::store::TrackStore;
use crate::track::CoverageTrack;

/// Statistic reported by `covstat stat`.
#[derive(Debug, Clone, PartialEq)]
pub enum Statistic {
    Mean,
    Sum,
    Median,
    Percentile(f64),
    Hist,
    PercCov(Vec<u32>),
}

impl FromStr for Statistic {
    type Err = CoverageError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CoverageError::InvalidFormat(format!("unknown statistic '{}'", s));
        match s {
            "mean" | "avg" => return Ok(Statistic::Mean),
            "sum" => return Ok(Statistic::Sum),
            "median" => return Ok(Statistic::Median),
            "hist" => return Ok(Statistic::Hist),
            _ => {}
        }
        let (name, arg) = s.split_once('=').ok_or_else(invalid)?;
        match name {
            "percentile" => arg.parse().map(Statistic::Percentile).map_err(|_| invalid()),
            "perc_cov" => arg
                .split(',')
                .map(|t| t.trim().parse::<u32>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Statistic::PercCov)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// Stat command configuration.
#[derive(Debug, Clone)]
pub struct StatCommand {
    pub stat: Statistic,
    /// Upper bound (exclusive) of the `hist` output.
    pub max_bin: i32,
}

impl Default for StatCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl StatCommand {
    pub fn new() -> Self {
        Self {
            stat: Statistic::Mean,
            max_bin: DEFAULT_HISTOGRAM_MAX,
        }
    }

    pub fn with_stat(mut self, stat: Statistic) -> Self {
        self.stat = stat;
        self
    }

    pub fn with_max_bin(mut self, max_bin: i32) -> Self {
        self.max_bin = max_bin;
        self
    }

    /// Run the statistic over `specs` (whole genome when empty).
    pub fn run<S: TrackStore, W: Write>(
        &self,
        track: &CoverageTrack<S>,
        specs: Vec<RegionSpec>,
        output: &mut W,
    ) -> Result<()> {
        let regions = if specs.is_empty() {
            track.whole_genome()
        } else {
            track.resolve(&OneOrMany::Many(specs))?.into_vec()
        };
        let dispatcher = AggregateDispatcher::new(track.store());
        let mut writer = StatWriter::new(output);

        match &self.stat {
            Statistic::Mean => {
                let means = dispatcher.mean_batch(&regions)?;
                write_float_rows(&mut writer, &regions, means.into_iter().map(|m| vec![m]))?;
            }
            Statistic::Sum => {
                let sums = dispatcher.sum(&OneOrMany::Many(regions.clone()))?.into_vec();
                write_float_rows(&mut writer, &regions, sums.into_iter().map(|s| vec![s]))?;
            }
            Statistic::Median => {
                let medians = dispatcher.median(&OneOrMany::Many(regions.clone()))?.into_vec();
                write_int_rows(&mut writer, &regions, medians)?;
            }
            Statistic::Percentile(nth) => {
                let values = dispatcher
                    .percentile(&OneOrMany::Many(regions.clone()), *nth)?
                    .into_vec();
                write_int_rows(&mut writer, &regions, values)?;
            }
            Statistic::PercCov(thresholds) => {
                let fractions = dispatcher
                    .perc_cov(&OneOrMany::Many(regions.clone()), thresholds)?
                    .into_vec();
                write_float_rows(&mut writer, &regions, fractions)?;
            }
            Statistic::Hist => self.write_histogram(&dispatcher, &regions, &mut writer)?,
        }
        writer.flush()
    }

    /// Pool every region into one histogram over `[0, max_bin)`.
    fn write_histogram<S: TrackStore, W: Write>(
        &self,
        dispatcher: &AggregateDispatcher<'_, S>,
        regions: &[Region],
        writer: &mut StatWriter<W>,
    ) -> Result<()> {
        if self.max_bin <= 0 {
            return Err(CoverageError::MalformedHistogramInput(format!(
                "max bin must be positive, got {}",
                self.max_bin
            )));
        }
        let regions: Vec<Region> = regions.iter().filter(|r| !r.is_empty()).cloned().collect();
        let histograms = dispatcher.histogram_batch(&regions, 0, self.max_bin)?;

        let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
        let (mut below, mut above) = (0u64, 0u64);
        for h in &histograms {
            below += h.below();
            above += h.above();
            for (value, count) in h.iter() {
                if count > 0 {
                    *counts.entry(value).or_default() += count;
                }
            }
        }
        let total = below + above + counts.values().sum::<u64>();
        if total == 0 {
            return Err(CoverageError::EmptyHistogram);
        }
        let fraction = |n: u64| n as f64 / total as f64;

        writer.write_str("<0")?;
        write_count(writer, below, fraction(below))?;
        for value in 0..self.max_bin {
            let count = counts.get(&(value as i64)).copied().unwrap_or(0);
            writer.write_int(value)?;
            write_count(writer, count, fraction(count))?;
        }
        writer.write_str(">=")?;
        writer.write_int(self.max_bin)?;
        write_count(writer, above, fraction(above))
    }
}

fn write_count<W: Write>(writer: &mut StatWriter<W>, count: u64, fraction: f64) -> Result<()> {
    writer.write_tab()?;
    writer.write_int(count)?;
    writer.write_tab()?;
    writer.write_float(fraction)?;
    writer.write_newline()
}

fn write_float_rows<W: Write, I>(writer: &mut StatWriter<W>, regions: &[Region], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<f64>>,
{
    for (region, values) in regions.iter().zip(rows) {
        writer.write_float_row(&region.name, region.begin, region.end, &values)?;
    }
    Ok(())
}

fn write_int_rows<W: Write>(writer: &mut StatWriter<W>, regions: &[Region], values: Vec<i32>) -> Result<()> {
    for (region, value) in regions.iter().zip(values) {
        writer.write_int_row(&region.name, region.begin, region.end, value)?;
    }
    Ok(())
}
