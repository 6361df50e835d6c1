// Clippy allows for the whole crate
#![allow(clippy::type_complexity)]

//! covstat: statistics over integer coverage tracks
//!
//! This library answers mean, sum, median, percentile, histogram and
//! coverage-fraction queries over genomic regions, and resamples tracks into
//! fixed-width bins.
//!
//! # Features
//!
//! - **Batched queries**: every list of regions goes to the storage engine in one call
//! - **Two-stage percentiles**: a coarse histogram with an exact fallback
//! - **Parallel processing**: Uses Rayon for multi-core parallelism
//! - **Pluggable storage**: anything implementing [`TrackStore`]
//!
//! # Example
//!
//! ```rust,no_run
//! use covstat::{BedGraphStore, ChromTable, CoverageTrack, OneOrMany};
//!
//! let genome = ChromTable::from_file("genome.txt").unwrap();
//! let store = BedGraphStore::from_path("coverage.bedGraph", genome).unwrap();
//! let track = CoverageTrack::new(store);
//!
//! let mean = track.mean(&"chr1:1000-2000".into()).unwrap();
//! let medians = track
//!     .median(&OneOrMany::Many(vec!["chr1".into(), "chr2".into()]))
//!     .unwrap();
//! ```

pub mod aggregate;
pub mod bedgraph;
pub mod commands;
pub mod config;
pub mod error;
pub mod genome;
pub mod histogram;
pub mod matrix;
pub mod output;
pub mod parallel;
pub mod percentile;
pub mod region;
pub mod resample;
pub mod store;
pub mod track;

// Re-export commonly used types
pub use aggregate::{AggregateDispatcher, Method};
pub use bedgraph::BedGraphStore;
pub use error::{CoverageError, Result};
pub use genome::ChromTable;
pub use histogram::Histogram;
pub use matrix::TrackMatrix;
pub use percentile::PercentileEstimator;
pub use region::{OneOrMany, Region, RegionSpec};
pub use resample::{BinPlan, Resampled, Resampler};
pub use store::{RawHistogram, TrackStore};
pub use track::CoverageTrack;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::aggregate::Method;
    pub use crate::bedgraph::BedGraphStore;
    pub use crate::commands::{ResampleCommand, StatCommand, Statistic, ViewCommand};
    pub use crate::error::{CoverageError, Result};
    pub use crate::genome::ChromTable;
    pub use crate::histogram::Histogram;
    pub use crate::matrix::TrackMatrix;
    pub use crate::region::{OneOrMany, Region, RegionSpec};
    pub use crate::store::TrackStore;
    pub use crate::track::CoverageTrack;
}
