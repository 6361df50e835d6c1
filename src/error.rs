//! Error type shared by every covstat operation.

use std::io;
use thiserror::Error;

/// Errors that can occur while resolving regions or computing statistics.
#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Chromosome '{0}' does not exist")]
    UnknownChromosome(String),

    #[error("Invalid region spec: {0}")]
    InvalidRegionSpec(String),

    #[error("Region {0} is empty")]
    EmptyRegion(String),

    #[error("Histogram has no counts")]
    EmptyHistogram,

    #[error("Malformed histogram input: {0}")]
    MalformedHistogramInput(String),

    #[error("Unsupported aggregation method: '{0}' (expected mean or median)")]
    UnsupportedAggregationMethod(String),

    #[error("Track {track} ended at {chrom}:{position}, before the requested end {end}")]
    TrackLengthMismatch {
        track: usize,
        chrom: String,
        position: u64,
        end: u64,
    },

    #[error("Percentile must be within [0, 100], got {0}")]
    InvalidPercentile(f64),

    #[error("Bin size must be greater than zero")]
    InvalidBinSize,

    #[error("Storage returned {actual} results for {expected} regions")]
    StoreMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, CoverageError>;

/// Fail unless a storage call produced exactly one result per region.
#[inline]
pub(crate) fn expect_len<T>(results: Vec<T>, expected: usize) -> Result<Vec<T>> {
    if results.len() != expected {
        return Err(CoverageError::StoreMismatch {
            expected,
            actual: results.len(),
        });
    }
    Ok(results)
}
