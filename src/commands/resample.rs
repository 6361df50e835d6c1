//! Resample command implementation.
//!
//! Cuts regions into fixed-width bins and prints one aggregated value per
//! bin in bedGraph layout.

use std::io::Write;

use log::info;

use crate::aggregate::Method;
use crate::error::Result;
use crate::output::StatWriter;
use crate::region::{OneOrMany, RegionSpec};
use crate::resample::{BinPlan, Resampler};
use crate::store::TrackStore;
use crate::track::CoverageTrack;

/// Resample command configuration.
#[derive(Debug, Clone)]
pub struct ResampleCommand {
    pub bin_size: u64,
    pub method: Method,
    /// Let remote stores widen the bin size.
    pub allow_adjustment: bool,
}

impl ResampleCommand {
    pub fn new(bin_size: u64) -> Self {
        Self {
            bin_size,
            method: Method::Mean,
            allow_adjustment: true,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_adjustment(mut self, allow: bool) -> Self {
        self.allow_adjustment = allow;
        self
    }

    /// Resample `specs` (whole genome when empty) and write one row per bin.
    pub fn run<S: TrackStore, W: Write>(
        &self,
        track: &CoverageTrack<S>,
        specs: Vec<RegionSpec>,
        output: &mut W,
    ) -> Result<()> {
        let regions = if specs.is_empty() {
            OneOrMany::Many(track.whole_genome())
        } else {
            track.resolve(&OneOrMany::Many(specs))?
        };

        let resampled = Resampler::new(track.store()).resample(
            &regions,
            self.method,
            self.bin_size,
            self.allow_adjustment,
        )?;
        if resampled.bin_size != self.bin_size {
            info!(
                "Using bin size {} instead of {}",
                resampled.bin_size, self.bin_size
            );
        }

        let mut writer = StatWriter::new(output);
        for (region, values) in regions
            .as_slice()
            .iter()
            .zip(resampled.values.as_slice())
        {
            let plan = BinPlan::new(region, resampled.bin_size)?;
            for (bin, &value) in plan.bins().iter().zip(values) {
                writer.write_float_row(&bin.name, bin.begin, bin.end, &[value])?;
            }
        }
        writer.flush()
    }
}
