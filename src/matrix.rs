//! Several tracks read side by side.
//!
//! Every query runs against each track independently and the per-track
//! results are stacked into rows (one row per track). Tracks must agree on
//! the length of every queried region.

use ndarray::Array2;

use crate::aggregate::Method;
use crate::error::{CoverageError, Result};
use crate::region::{OneOrMany, Region, RegionSpec};
use crate::resample::effective_bin_size;
use crate::store::TrackStore;
use crate::track::CoverageTrack;

/// An ordered group of tracks with optional names.
#[derive(Debug, Clone)]
pub struct TrackMatrix<S> {
    tracks: Vec<CoverageTrack<S>>,
    names: Option<Vec<String>>,
}

impl<S: TrackStore> TrackMatrix<S> {
    pub fn new(tracks: Vec<CoverageTrack<S>>) -> Self {
        Self {
            tracks,
            names: None,
        }
    }

    /// Attach one name per track.
    pub fn with_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.tracks.len() {
            return Err(CoverageError::InvalidFormat(format!(
                "{} names given for {} tracks",
                names.len(),
                self.tracks.len()
            )));
        }
        self.names = Some(names);
        Ok(self)
    }

    pub fn tracks(&self) -> &[CoverageTrack<S>] {
        &self.tracks
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Resolve one spec on every track; each track clips against its own lengths.
    fn resolve_each(&self, spec: &RegionSpec) -> Result<Vec<Region>> {
        self.tracks.iter().map(|t| spec.resolve(t.chroms())).collect()
    }

    /// Step through `[begin, end)` of `chrom`, one row of track values per position.
    ///
    /// The sequence is lazy and ends early with `TrackLengthMismatch` if any
    /// track runs out of positions before the others.
    pub fn enumerate_values(&self, chrom: &str, begin: u64, end: u64) -> Result<MatrixValues<'_>> {
        let spec = RegionSpec::Triple(
            chrom.to_string(),
            i64::try_from(begin).unwrap_or(i64::MAX),
            i64::try_from(end).unwrap_or(i64::MAX),
        );
        let regions = self.resolve_each(&spec)?;
        let end = regions.iter().map(|r| r.end).max().unwrap_or(begin);
        let begin = regions.iter().map(|r| r.begin).min().unwrap_or(begin);

        let iters = self
            .tracks
            .iter()
            .zip(&regions)
            .map(|(track, region)| {
                track
                    .store()
                    .value_iter(&region.name, region.begin, region.end)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MatrixValues {
            chrom: chrom.to_string(),
            iters,
            pos: begin,
            end,
            done: false,
        })
    }

    /// Raw values of one region, tracks × positions.
    pub fn load_values(&self, spec: &RegionSpec) -> Result<Array2<i32>> {
        let regions = self.resolve_each(spec)?;
        check_equal_lengths(&regions)?;
        let width = regions.first().map_or(0, |r| r.len() as usize);

        let mut rows = Vec::with_capacity(self.tracks.len() * width);
        for (track, region) in self.tracks.iter().zip(&regions) {
            rows.extend(track.load_region(region)?);
        }
        stack(rows, self.tracks.len(), width)
    }

    /// Resample every track, tracks × bins per region.
    ///
    /// The bin size is adjusted once for the whole group (if any track is
    /// remote) so every track is binned identically.
    pub fn resample(
        &self,
        specs: &OneOrMany<RegionSpec>,
        method: Method,
        bin_size: u64,
        allow_adjustment: bool,
    ) -> Result<(OneOrMany<Array2<f64>>, u64)> {
        if bin_size == 0 {
            return Err(CoverageError::InvalidBinSize);
        }
        let any_remote = self.tracks.iter().any(CoverageTrack::is_remote);
        let bin_size = effective_bin_size(bin_size, any_remote, allow_adjustment);

        let per_track = self
            .tracks
            .iter()
            .map(|t| {
                t.resample(specs, method, bin_size, false)
                    .map(|r| r.values.into_vec())
            })
            .collect::<Result<Vec<_>>>()?;

        let mut stacked = Vec::with_capacity(specs.len());
        for region_idx in 0..specs.len() {
            let width = per_track.first().map_or(0, |t| t[region_idx].len());
            let mut flat = Vec::with_capacity(per_track.len() * width);
            for (track_idx, bins) in per_track.iter().enumerate() {
                let row = &bins[region_idx];
                if row.len() != width {
                    return Err(CoverageError::TrackLengthMismatch {
                        track: track_idx,
                        chrom: specs.as_slice()[region_idx].to_string(),
                        position: row.len() as u64,
                        end: width as u64,
                    });
                }
                flat.extend_from_slice(row);
            }
            stacked.push(stack(flat, per_track.len(), width)?);
        }

        Ok((specs.reshape(stacked)?, bin_size))
    }
}

fn check_equal_lengths(regions: &[Region]) -> Result<()> {
    if let Some(first) = regions.first() {
        if let Some((track, short)) = regions
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != first.len())
        {
            return Err(CoverageError::TrackLengthMismatch {
                track,
                chrom: short.name.clone(),
                position: short.end,
                end: first.end,
            });
        }
    }
    Ok(())
}

fn stack<T>(flat: Vec<T>, rows: usize, cols: usize) -> Result<Array2<T>> {
    Array2::from_shape_vec((rows, cols), flat)
        .map_err(|e| CoverageError::InvalidFormat(format!("cannot stack track rows: {}", e)))
}

/// Lockstep per-position rows across tracks; see [`TrackMatrix::enumerate_values`].
pub struct MatrixValues<'a> {
    chrom: String,
    iters: Vec<Box<dyn Iterator<Item = i32> + Send + 'a>>,
    pos: u64,
    end: u64,
    done: bool,
}

impl Iterator for MatrixValues<'_> {
    type Item = Result<(String, u64, Vec<i32>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.end {
            return None;
        }
        let mut row = Vec::with_capacity(self.iters.len());
        for (track, iter) in self.iters.iter_mut().enumerate() {
            match iter.next() {
                Some(value) => row.push(value),
                None => {
                    self.done = true;
                    return Some(Err(CoverageError::TrackLengthMismatch {
                        track,
                        chrom: self.chrom.clone(),
                        position: self.pos,
                        end: self.end,
                    }));
                }
            }
        }
        let pos = self.pos;
        self.pos += 1;
        Some(Ok((self.chrom.clone(), pos, row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bedgraph::BedGraphStore;

    fn matrix() -> TrackMatrix<BedGraphStore> {
        TrackMatrix::new(vec![
            CoverageTrack::new(BedGraphStore::from_dense([("chr1", vec![1, 2, 3, 4, 5, 6])])),
            CoverageTrack::new(BedGraphStore::from_dense([("chr1", vec![10, 20, 30, 40, 50, 60])])),
        ])
    }

    #[test]
    fn test_enumerate_values_lockstep() {
        let m = matrix();
        let rows: Vec<_> = m
            .enumerate_values("chr1", 1, 4)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            rows,
            vec![
                ("chr1".to_string(), 1, vec![2, 20]),
                ("chr1".to_string(), 2, vec![3, 30]),
                ("chr1".to_string(), 3, vec![4, 40]),
            ]
        );
    }

    #[test]
    fn test_enumerate_values_mismatch() {
        let m = TrackMatrix::new(vec![
            CoverageTrack::new(BedGraphStore::from_dense([("chr1", vec![1; 6])])),
            CoverageTrack::new(BedGraphStore::from_dense([("chr1", vec![2; 4])])),
        ]);
        let rows: Vec<_> = m.enumerate_values("chr1", 0, 6).unwrap().collect();
        assert_eq!(rows.len(), 5);
        assert!(rows[..4].iter().all(|r| r.is_ok()));
        assert!(matches!(
            rows[4],
            Err(CoverageError::TrackLengthMismatch { track: 1, position: 4, end: 6, .. })
        ));
    }

    #[test]
    fn test_load_values_stacks_rows() {
        let m = matrix();
        let arr = m.load_values(&"chr1:2-5".into()).unwrap();
        assert_eq!(arr.shape(), &[2, 3]);
        assert_eq!(arr.row(0).to_vec(), vec![3, 4, 5]);
        assert_eq!(arr.row(1).to_vec(), vec![30, 40, 50]);
    }

    #[test]
    fn test_resample_stacks_bins() {
        let m = matrix();
        let (arr, bin_size) = m
            .resample(&"chr1".into(), Method::Mean, 4, true)
            .unwrap();
        assert_eq!(bin_size, 4);
        let arr = arr.into_one().unwrap();
        assert_eq!(arr.shape(), &[2, 2]);
        assert_eq!(arr.row(0).to_vec(), vec![2.5, 5.5]);
        assert_eq!(arr.row(1).to_vec(), vec![25.0, 55.0]);
    }

    #[test]
    fn test_names_must_match() {
        assert!(matrix().with_names(vec!["a".to_string()]).is_err());
        let m = matrix()
            .with_names(vec!["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(m.names().unwrap(), &["a".to_string(), "b".to_string()]);
    }
}
