//! In-memory run-length coverage track loaded from bedGraph.
//!
//! Each record `chrom\tstart\tend\tvalue` sets `[start, end)` to an integer
//! value; positions not covered by any record read as 0. This is the
//! reference [`TrackStore`] used by the command-line tool and the tests.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::info;
use memchr::memchr;

use crate::config;
use crate::error::{CoverageError, Result};
use crate::genome::ChromTable;
use crate::parallel::{fill_chunks, map_ordered};
use crate::region::Region;
use crate::store::{RawHistogram, TrackStore};

/// One constant-value stretch `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    start: u64,
    end: u64,
    value: i32,
}

/// Coverage track held as sorted, non-overlapping runs per chromosome.
#[derive(Debug, Clone, Default)]
pub struct BedGraphStore {
    chroms: ChromTable,
    runs: HashMap<String, Vec<Run>>,
}

impl BedGraphStore {
    /// An all-zero track over the given chromosomes.
    pub fn new(chroms: ChromTable) -> Self {
        Self {
            chroms,
            runs: HashMap::new(),
        }
    }

    /// Load a bedGraph file.
    pub fn from_path<P: AsRef<Path>>(path: P, chroms: ChromTable) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let store = Self::from_reader(file, chroms)?;
        info!(
            "Loaded {} runs over {} chromosomes from {}",
            store.run_count(),
            store.chroms.len(),
            path.display()
        );
        Ok(store)
    }

    /// Parse bedGraph records from any reader.
    ///
    /// Blank lines, `#` comments, and `track`/`browser` headers are skipped.
    /// Records may come in any order but must not overlap.
    pub fn from_reader<R: Read>(reader: R, chroms: ChromTable) -> Result<Self> {
        let mut store = Self::new(chroms);
        let mut reader = BufReader::new(reader);
        let mut buffer = String::with_capacity(1024);
        let mut line_number = 0;

        loop {
            buffer.clear();
            if reader.read_line(&mut buffer)? == 0 {
                break;
            }
            line_number += 1;

            let line = buffer.trim_end_matches(['\n', '\r']);
            if should_skip_line(line.as_bytes()) {
                continue;
            }
            let (chrom, start, end, value) =
                parse_bedgraph_line(line.as_bytes()).ok_or_else(|| CoverageError::Parse {
                    line: line_number,
                    message: format!("Expected chrom, start, end, integer value: '{}'", line),
                })?;
            if start > end {
                return Err(CoverageError::Parse {
                    line: line_number,
                    message: format!("Start ({}) > end ({})", start, end),
                });
            }
            store.push_run(chrom, start, end, value)?;
        }

        store.finish()?;
        Ok(store)
    }

    /// Build a track from dense per-chromosome values.
    /// Each chromosome's length is the length of its vector.
    pub fn from_dense<I, S>(tracks: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<i32>)>,
        S: Into<String>,
    {
        let mut chroms = Vec::new();
        let mut runs = HashMap::new();
        for (name, values) in tracks {
            let name = name.into();
            chroms.push((name.clone(), values.len() as u64));
            runs.insert(name, compress(&values));
        }
        Self {
            chroms: ChromTable::from_chroms(chroms),
            runs,
        }
    }

    /// Set `[start, end)` of `chrom` to `value`, clipped to the chromosome.
    /// An overlap with an existing run is rejected and leaves the store unchanged.
    pub fn insert(&mut self, chrom: &str, start: u64, end: u64, value: i32) -> Result<()> {
        let end = end.min(self.chroms.require(chrom)?);
        if start >= end || value == 0 {
            return Ok(());
        }
        let runs = self.runs.entry(chrom.to_string()).or_default();
        let idx = runs.partition_point(|r| r.end <= start);
        if let Some(next) = runs.get(idx).filter(|r| r.start < end) {
            return Err(CoverageError::InvalidFormat(format!(
                "Overlapping records on {}: [{}, {}) and [{}, {})",
                chrom, next.start, next.end, start, end
            )));
        }
        runs.insert(idx, Run { start, end, value });
        Ok(())
    }

    /// Chromosome table of this track.
    pub fn chrom_table(&self) -> &ChromTable {
        &self.chroms
    }

    /// Number of stored runs.
    pub fn run_count(&self) -> usize {
        self.runs.values().map(Vec::len).sum()
    }

    fn push_run(&mut self, chrom: &str, start: u64, end: u64, value: i32) -> Result<()> {
        let length = self.chroms.require(chrom)?;
        let end = end.min(length);
        if start >= end || value == 0 {
            return Ok(());
        }
        self.runs.entry(chrom.to_string()).or_default().push(Run {
            start,
            end,
            value,
        });
        Ok(())
    }

    /// Sort runs and reject overlaps.
    fn finish(&mut self) -> Result<()> {
        for (chrom, runs) in self.runs.iter_mut() {
            runs.sort_unstable_by_key(|r| r.start);
            for pair in runs.windows(2) {
                if pair[1].start < pair[0].end {
                    return Err(CoverageError::InvalidFormat(format!(
                        "Overlapping records on {}: [{}, {}) and [{}, {})",
                        chrom, pair[0].start, pair[0].end, pair[1].start, pair[1].end
                    )));
                }
            }
        }
        Ok(())
    }

    /// Runs of a chromosome after checking `[begin, end)` lies on it.
    fn runs_in(&self, name: &str, begin: u64, end: u64) -> Result<&[Run]> {
        let length = self.chroms.require(name)?;
        if begin > end || end > length {
            return Err(CoverageError::InvalidRegionSpec(format!(
                "{}:{}-{} is outside [0, {}]",
                name, begin, end, length
            )));
        }
        Ok(self.runs.get(name).map_or(&[][..], Vec::as_slice))
    }

    /// Covered `(start, end, value)` pieces of a region, clipped, in order.
    fn segments<'a>(
        &'a self,
        region: &Region,
    ) -> Result<impl Iterator<Item = (u64, u64, i32)> + 'a> {
        let runs = self.runs_in(&region.name, region.begin, region.end)?;
        let (begin, end) = (region.begin, region.end);
        let first = runs.partition_point(|r| r.end <= begin);
        Ok(runs[first..]
            .iter()
            .take_while(move |r| r.start < end)
            .map(move |r| (r.start.max(begin), r.end.min(end), r.value)))
    }

    fn region_mean(&self, region: &Region) -> Result<f64> {
        let sum: f64 = self
            .segments(region)?
            .map(|(s, e, v)| v as f64 * (e - s) as f64)
            .sum();
        if region.is_empty() {
            return Ok(f64::NAN);
        }
        Ok(sum / region.len() as f64)
    }

    fn region_histogram(&self, region: &Region, min: i32, max: i32) -> Result<RawHistogram> {
        let mut counts: BTreeMap<i32, u64> = BTreeMap::new();
        let mut hist = RawHistogram::default();
        let mut covered = 0;
        let mut bucket = |value: i32, n: u64, hist: &mut RawHistogram| {
            if value < min {
                hist.below += n;
            } else if value >= max {
                hist.above += n;
            } else {
                *counts.entry(value).or_default() += n;
            }
        };

        for (s, e, v) in self.segments(region)? {
            covered += e - s;
            bucket(v, e - s, &mut hist);
        }
        let zeros = region.len() - covered;
        if zeros > 0 {
            bucket(0, zeros, &mut hist);
        }

        hist.counts = counts.into_iter().collect();
        Ok(hist)
    }
}

impl TrackStore for BedGraphStore {
    fn chroms(&self) -> Vec<(String, u64)> {
        self.chroms
            .iter()
            .map(|(name, len)| (name.to_string(), len))
            .collect()
    }

    fn raw_mean(&self, regions: &[Region]) -> Result<Vec<f64>> {
        map_ordered(regions, |r| self.region_mean(r))
    }

    fn raw_histogram(&self, regions: &[Region], min: i32, max: i32) -> Result<Vec<RawHistogram>> {
        map_ordered(regions, |r| self.region_histogram(r, min, max))
    }

    fn load_values(&self, name: &str, begin: u64, end: u64, out: &mut [i32]) -> Result<()> {
        let runs = self.runs_in(name, begin, end)?;
        if out.len() as u64 != end - begin {
            return Err(CoverageError::InvalidFormat(format!(
                "buffer holds {} values but {}:{}-{} has {}",
                out.len(),
                name,
                begin,
                end,
                end - begin
            )));
        }
        fill_chunks(out, config::load_chunk_size(), |offset, chunk| {
            fill_range(runs, begin + offset as u64, chunk);
            Ok(())
        })
    }

    fn value_iter<'a>(
        &'a self,
        name: &str,
        begin: u64,
        end: u64,
    ) -> Result<Box<dyn Iterator<Item = i32> + Send + 'a>> {
        let runs = self.runs_in(name, begin, end)?;
        let idx = runs.partition_point(|r| r.end <= begin);
        Ok(Box::new(RunValues {
            runs,
            idx,
            pos: begin,
            end,
        }))
    }
}

/// Write the values of `[start, start + out.len())` into `out`.
fn fill_range(runs: &[Run], start: u64, out: &mut [i32]) {
    out.fill(0);
    let end = start + out.len() as u64;
    let first = runs.partition_point(|r| r.end <= start);
    for run in runs[first..].iter().take_while(|r| r.start < end) {
        let s = (run.start.max(start) - start) as usize;
        let e = (run.end.min(end) - start) as usize;
        out[s..e].fill(run.value);
    }
}

/// Run-length encode dense values, dropping zero runs.
fn compress(values: &[i32]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for (pos, &value) in values.iter().enumerate() {
        let pos = pos as u64;
        match runs.last_mut() {
            Some(last) if last.end == pos && last.value == value => last.end += 1,
            _ if value != 0 => runs.push(Run {
                start: pos,
                end: pos + 1,
                value,
            }),
            _ => {}
        }
    }
    runs
}

/// Per-position iterator over runs.
struct RunValues<'a> {
    runs: &'a [Run],
    idx: usize,
    pos: u64,
    end: u64,
}

impl Iterator for RunValues<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        if self.pos >= self.end {
            return None;
        }
        while self.idx < self.runs.len() && self.runs[self.idx].end <= self.pos {
            self.idx += 1;
        }
        let value = match self.runs.get(self.idx) {
            Some(run) if run.start <= self.pos => run.value,
            _ => 0,
        };
        self.pos += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = (self.end - self.pos) as usize;
        (n, Some(n))
    }
}

/// Fast i64 parsing for an optionally signed decimal.
#[inline(always)]
fn parse_i64_fast(bytes: &[u8]) -> Option<i64> {
    let (negative, digits) = match bytes.first()? {
        b'-' => (true, &bytes[1..]),
        b'+' => (false, &bytes[1..]),
        _ => (false, bytes),
    };
    let n = parse_u64_fast(digits)?;
    let n = i64::try_from(n).ok()?;
    Some(if negative { -n } else { n })
}

/// Fast u64 parsing - no allocation, no error formatting.
#[inline(always)]
fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Split a bedGraph line into `(chrom, start, end, value)` using memchr.
#[inline(always)]
fn parse_bedgraph_line(line: &[u8]) -> Option<(&str, u64, u64, i32)> {
    let tab1 = memchr(b'\t', line)?;
    let chrom = std::str::from_utf8(&line[..tab1]).ok()?;

    let rest1 = &line[tab1 + 1..];
    let tab2 = memchr(b'\t', rest1)?;
    let start = parse_u64_fast(&rest1[..tab2])?;

    let rest2 = &rest1[tab2 + 1..];
    let tab3 = memchr(b'\t', rest2)?;
    let end = parse_u64_fast(&rest2[..tab3])?;

    let rest3 = &rest2[tab3 + 1..];
    let value_len = memchr(b'\t', rest3).unwrap_or(rest3.len());
    let value = i32::try_from(parse_i64_fast(&rest3[..value_len])?).ok()?;

    Some((chrom, start, end, value))
}

/// Check if a line should be skipped (empty, comment, or header).
#[inline(always)]
fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#' || line.starts_with(b"track") || line.starts_with(b"browser")
}
