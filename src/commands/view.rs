//! View command implementation.
//!
//! Prints per-position values of one region for several tracks side by side.

use std::io::Write;

use crate::error::{CoverageError, Result};
use crate::matrix::TrackMatrix;
use crate::output::StatWriter;
use crate::region::RegionSpec;
use crate::store::TrackStore;

/// View command configuration.
#[derive(Debug, Clone, Default)]
pub struct ViewCommand {
    /// Print a `#chrom pos name...` header line.
    pub header: bool,
}

impl ViewCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Write `chrom  pos  v1  v2 ...` for every position of `spec`.
    ///
    /// The region is resolved against the first track; tracks that end
    /// earlier abort the output with `TrackLengthMismatch`.
    pub fn run<S: TrackStore, W: Write>(
        &self,
        matrix: &TrackMatrix<S>,
        spec: &RegionSpec,
        output: &mut W,
    ) -> Result<()> {
        let first = matrix
            .tracks()
            .first()
            .ok_or_else(|| CoverageError::InvalidFormat("no tracks to view".to_string()))?;
        let region = spec.resolve(first.chroms())?;

        let mut writer = StatWriter::new(output);
        if self.header {
            writer.write_str("#chrom\tpos")?;
            match matrix.names() {
                Some(names) => {
                    for name in names {
                        writer.write_tab()?;
                        writer.write_str(name)?;
                    }
                }
                None => {
                    for i in 0..matrix.len() {
                        writer.write_tab()?;
                        writer.write_str("track")?;
                        writer.write_int(i)?;
                    }
                }
            }
            writer.write_newline()?;
        }

        for row in matrix.enumerate_values(&region.name, region.begin, region.end)? {
            let (chrom, pos, values) = row?;
            writer.write_str(&chrom)?;
            writer.write_tab()?;
            writer.write_int(pos)?;
            for value in values {
                writer.write_tab()?;
                writer.write_int(value)?;
            }
            writer.write_newline()?;
        }
        writer.flush()
    }
}
