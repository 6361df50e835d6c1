//! Region specifications and their resolution into clipped regions.
//!
//! Callers describe regions loosely (a chromosome name, a `"chr:begin-end"`
//! string, or a 2/3-tuple). Resolution validates the chromosome against a
//! [`ChromTable`] and clips the bounds into `[0, length]`.

use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use crate::error::{CoverageError, Result};
use crate::genome::ChromTable;

/// A resolved half-open region `[begin, end)` on a named chromosome.
/// Always satisfies `begin <= end <= chrom_length(name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    pub name: String,
    pub begin: u64,
    pub end: u64,
}

impl Region {
    /// Create a region without validation; use [`RegionSpec::resolve`] for user input.
    #[inline]
    pub fn new(name: impl Into<String>, begin: u64, end: u64) -> Self {
        Self {
            name: name.into(),
            begin,
            end,
        }
    }

    /// Returns the length of the region.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.begin)
    }

    /// Returns true if the region has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.name, self.begin, self.end)
    }
}

impl Ord for Region {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then(self.begin.cmp(&other.begin))
            .then(self.end.cmp(&other.end))
    }
}

impl PartialOrd for Region {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An unresolved region as supplied by a caller.
///
/// Bounds are signed so that negative begins can be clipped to 0 instead of
/// being rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSpec {
    /// A bare chromosome name or a `"name:begin-end"` string.
    Text(String),
    /// `(name, end)`, begin is 0.
    Pair(String, i64),
    /// `(name, begin, end)`.
    Triple(String, i64, i64),
}

impl RegionSpec {
    /// Build a spec from tuple-like fields (e.g. the columns of a BED line).
    ///
    /// One field is a text spec, two are `(name, end)`, three are
    /// `(name, begin, end)`. Any other arity is rejected.
    pub fn from_fields(fields: &[&str]) -> Result<Self> {
        match fields {
            [text] => Ok(Self::Text(text.to_string())),
            [name, end] => Ok(Self::Pair(name.to_string(), parse_bound(end, fields)?)),
            [name, begin, end] => Ok(Self::Triple(
                name.to_string(),
                parse_bound(begin, fields)?,
                parse_bound(end, fields)?,
            )),
            _ => Err(CoverageError::InvalidRegionSpec(format!(
                "expected 1 to 3 fields, got {}",
                fields.len()
            ))),
        }
    }

    /// Resolve against a chromosome table, clipping bounds into `[0, length]`.
    ///
    /// Unknown chromosomes are an error; out-of-range bounds never are.
    pub fn resolve(&self, chroms: &ChromTable) -> Result<Region> {
        let (name, begin, end) = match self {
            Self::Text(text) => match text.split_once(':') {
                None => (text.as_str(), None, None),
                Some((name, range)) => {
                    let (left, right) = range.split_once('-').ok_or_else(|| {
                        CoverageError::InvalidRegionSpec(format!(
                            "'{}' has no '-' between begin and end",
                            text
                        ))
                    })?;
                    let begin = if left.is_empty() {
                        None
                    } else {
                        Some(parse_text_bound(left, text)?)
                    };
                    let end = if right.is_empty() {
                        None
                    } else {
                        Some(parse_text_bound(right, text)?)
                    };
                    (name, begin, end)
                }
            },
            Self::Pair(name, end) => (name.as_str(), None, Some(*end)),
            Self::Triple(name, begin, end) => (name.as_str(), Some(*begin), Some(*end)),
        };

        let length = chroms.require(name)?;
        let end = end.map_or(length, |e| (e.max(0) as u64).min(length));
        let begin = begin.map_or(0, |b| b.max(0) as u64).min(end);
        Ok(Region::new(name, begin, end))
    }
}

fn parse_bound(field: &str, fields: &[&str]) -> Result<i64> {
    field.trim().parse().map_err(|_| {
        CoverageError::InvalidRegionSpec(format!(
            "'{}' is not an integer in ({})",
            field,
            fields.join(", ")
        ))
    })
}

fn parse_text_bound(field: &str, text: &str) -> Result<i64> {
    field.parse().map_err(|_| {
        CoverageError::InvalidRegionSpec(format!("'{}' is not an integer in '{}'", field, text))
    })
}

impl FromStr for RegionSpec {
    type Err = CoverageError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(CoverageError::InvalidRegionSpec("empty spec".to_string()));
        }
        Ok(Self::Text(s.to_string()))
    }
}

impl fmt::Display for RegionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionSpec::Text(text) => write!(f, "{}", text),
            RegionSpec::Pair(name, end) => write!(f, "{}:0-{}", name, end),
            RegionSpec::Triple(name, begin, end) => write!(f, "{}:{}-{}", name, begin, end),
        }
    }
}

impl From<&str> for RegionSpec {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RegionSpec {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&Region> for RegionSpec {
    fn from(r: &Region) -> Self {
        Self::Triple(r.name.clone(), r.begin as i64, r.end as i64)
    }
}

impl<S: Into<String>> From<(S, i64)> for RegionSpec {
    fn from((name, end): (S, i64)) -> Self {
        Self::Pair(name.into(), end)
    }
}

impl<S: Into<String>> From<(S, i64, i64)> for RegionSpec {
    fn from((name, begin, end): (S, i64, i64)) -> Self {
        Self::Triple(name.into(), begin, end)
    }
}

/// Either a single item or a list of items.
///
/// Every caller-facing operation accepts its region input in this shape and
/// returns its output in the same shape: a single spec yields a single
/// result, a list yields a list of equal length and order.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Number of items.
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    /// True for an empty list.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if this was built from a single item.
    pub fn is_one(&self) -> bool {
        matches!(self, Self::One(_))
    }

    /// All items as a slice.
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(item) => std::slice::from_ref(item),
            Self::Many(items) => items,
        }
    }

    /// All items as a vector.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }

    /// The single item, if this was built from one.
    pub fn into_one(self) -> Option<T> {
        match self {
            Self::One(item) => Some(item),
            Self::Many(_) => None,
        }
    }

    /// The list, if this was built from one.
    pub fn into_many(self) -> Option<Vec<T>> {
        match self {
            Self::One(_) => None,
            Self::Many(items) => Some(items),
        }
    }

    /// Map every item, keeping the shape. Stops at the first error.
    pub fn try_map<U, E, F>(self, mut f: F) -> std::result::Result<OneOrMany<U>, E>
    where
        F: FnMut(T) -> std::result::Result<U, E>,
    {
        Ok(match self {
            Self::One(item) => OneOrMany::One(f(item)?),
            Self::Many(items) => OneOrMany::Many(
                items
                    .into_iter()
                    .map(f)
                    .collect::<std::result::Result<_, E>>()?,
            ),
        })
    }

    /// Give flat per-item results the same shape as `self`.
    pub fn reshape<U>(&self, results: Vec<U>) -> Result<OneOrMany<U>> {
        let mut results = crate::error::expect_len(results, self.len())?;
        Ok(match self {
            Self::One(_) => match results.pop() {
                Some(item) => OneOrMany::One(item),
                None => {
                    return Err(CoverageError::StoreMismatch {
                        expected: 1,
                        actual: 0,
                    })
                }
            },
            Self::Many(_) => OneOrMany::Many(results),
        })
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        Self::Many(items)
    }
}

impl From<RegionSpec> for OneOrMany<RegionSpec> {
    fn from(spec: RegionSpec) -> Self {
        Self::One(spec)
    }
}

impl From<&str> for OneOrMany<RegionSpec> {
    fn from(spec: &str) -> Self {
        Self::One(spec.into())
    }
}

impl From<Region> for OneOrMany<Region> {
    fn from(region: Region) -> Self {
        Self::One(region)
    }
}

/// Resolve a single spec.
#[inline]
pub fn resolve(spec: &RegionSpec, chroms: &ChromTable) -> Result<Region> {
    spec.resolve(chroms)
}

/// Resolve a spec or a list of specs, keeping the shape.
///
/// The first invalid spec aborts the whole batch.
pub fn resolve_many(specs: &OneOrMany<RegionSpec>, chroms: &ChromTable) -> Result<OneOrMany<Region>> {
    Ok(match specs {
        OneOrMany::One(spec) => OneOrMany::One(spec.resolve(chroms)?),
        OneOrMany::Many(specs) => OneOrMany::Many(
            specs
                .iter()
                .map(|spec| spec.resolve(chroms))
                .collect::<Result<_>>()?,
        ),
    })
}

/// Every chromosome of the table as a whole-chromosome region, in order.
pub fn whole_genome(chroms: &ChromTable) -> Vec<Region> {
    chroms
        .iter()
        .map(|(name, len)| Region::new(name, 0, len))
        .collect()
}

/// Read region specs from a BED-like file (first three columns).
///
/// Blank lines, `#` comments, and `track`/`browser` headers are skipped.
pub fn read_region_specs<P: AsRef<Path>>(path: P) -> Result<Vec<RegionSpec>> {
    let file = File::open(path)?;
    parse_region_specs(file)
}

/// Parse region specs from any reader; see [`read_region_specs`].
pub fn parse_region_specs<R: Read>(reader: R) -> Result<Vec<RegionSpec>> {
    let reader = BufReader::new(reader);
    let mut specs = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').take(3).collect();
        let spec = RegionSpec::from_fields(&fields).map_err(|e| CoverageError::Parse {
            line: line_num + 1,
            message: e.to_string(),
        })?;
        specs.push(spec);
    }
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ChromTable {
        ChromTable::from_chroms([("chr1", 1000), ("chr2", 500)])
    }

    #[test]
    fn test_bare_name_is_whole_chromosome() {
        let r = RegionSpec::from("chr2").resolve(&table()).unwrap();
        assert_eq!(r, Region::new("chr2", 0, 500));
    }

    #[test]
    fn test_text_ranges() {
        let t = table();
        let r = RegionSpec::from("chr1:100-200").resolve(&t).unwrap();
        assert_eq!(r, Region::new("chr1", 100, 200));

        let r = RegionSpec::from("chr1:100-").resolve(&t).unwrap();
        assert_eq!(r, Region::new("chr1", 100, 1000));

        let r = RegionSpec::from("chr1:-300").resolve(&t).unwrap();
        assert_eq!(r, Region::new("chr1", 0, 300));

        let r = RegionSpec::from("chr1:-").resolve(&t).unwrap();
        assert_eq!(r, Region::new("chr1", 0, 1000));
    }

    #[test]
    fn test_tuples() {
        let t = table();
        let r = RegionSpec::from(("chr1", 250)).resolve(&t).unwrap();
        assert_eq!(r, Region::new("chr1", 0, 250));

        let r = RegionSpec::from(("chr1", 10, 20)).resolve(&t).unwrap();
        assert_eq!(r, Region::new("chr1", 10, 20));
    }

    #[test]
    fn test_clipping_never_errors() {
        let t = table();
        let r = RegionSpec::from(("chr2", -50, 9000)).resolve(&t).unwrap();
        assert_eq!(r, Region::new("chr2", 0, 500));

        let r = RegionSpec::from("chr2:400-100000").resolve(&t).unwrap();
        assert_eq!(r, Region::new("chr2", 400, 500));

        // begin past the end collapses to an empty region at the end
        let r = RegionSpec::from(("chr2", 800, 900)).resolve(&t).unwrap();
        assert_eq!(r, Region::new("chr2", 500, 500));
        assert!(r.is_empty());
    }

    #[test]
    fn test_unknown_chromosome_not_masked_by_clipping() {
        let err = RegionSpec::from(("chrZ", -1, 10)).resolve(&table()).unwrap_err();
        assert!(matches!(err, CoverageError::UnknownChromosome(name) if name == "chrZ"));

        let err = RegionSpec::from("chrZ:1-2").resolve(&table()).unwrap_err();
        assert!(matches!(err, CoverageError::UnknownChromosome(_)));
    }

    #[test]
    fn test_invalid_specs() {
        let t = table();
        for text in ["chr1:100", "chr1:a-b", "chr1:10-x"] {
            let err = RegionSpec::from(text).resolve(&t).unwrap_err();
            assert!(
                matches!(err, CoverageError::InvalidRegionSpec(_)),
                "{} should be rejected",
                text
            );
        }
        assert!(matches!(
            RegionSpec::from_fields(&[]),
            Err(CoverageError::InvalidRegionSpec(_))
        ));
        assert!(matches!(
            RegionSpec::from_fields(&["chr1", "1", "2", "3"]),
            Err(CoverageError::InvalidRegionSpec(_))
        ));
        assert!(matches!(
            RegionSpec::from_fields(&["chr1", "ten"]),
            Err(CoverageError::InvalidRegionSpec(_))
        ));
        assert!("".parse::<RegionSpec>().is_err());
    }

    #[test]
    fn test_from_fields() {
        assert_eq!(
            RegionSpec::from_fields(&["chr1"]).unwrap(),
            RegionSpec::Text("chr1".to_string())
        );
        assert_eq!(
            RegionSpec::from_fields(&["chr1", "50"]).unwrap(),
            RegionSpec::Pair("chr1".to_string(), 50)
        );
        assert_eq!(
            RegionSpec::from_fields(&["chr1", "5", "50"]).unwrap(),
            RegionSpec::Triple("chr1".to_string(), 5, 50)
        );
    }

    #[test]
    fn test_resolve_idempotent_on_display() {
        let t = table();
        for text in ["chr1:0-1000", "chr1:5-6000", "chr2:-", "chr2:499-500", "chr1"] {
            let once = RegionSpec::from(text).resolve(&t).unwrap();
            let twice = RegionSpec::from(once.to_string()).resolve(&t).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_resolve_many_keeps_shape() {
        let t = table();
        let one = resolve_many(&OneOrMany::from("chr1:1-2"), &t).unwrap();
        assert!(one.is_one());

        let specs = OneOrMany::Many(vec![RegionSpec::from("chr1"), "chr2:10-20".into()]);
        let many = resolve_many(&specs, &t).unwrap();
        assert_eq!(
            many,
            OneOrMany::Many(vec![Region::new("chr1", 0, 1000), Region::new("chr2", 10, 20)])
        );
    }

    #[test]
    fn test_resolve_many_aborts_on_first_error() {
        let specs = OneOrMany::Many(vec![RegionSpec::from("chr1"), "chrQ".into(), "chr2".into()]);
        assert!(resolve_many(&specs, &table()).is_err());
    }

    #[test]
    fn test_reshape() {
        let one: OneOrMany<u8> = OneOrMany::One(1);
        assert_eq!(one.reshape(vec![7.5]).unwrap(), OneOrMany::One(7.5));
        assert!(one.reshape(vec![1.0, 2.0]).is_err());

        let many: OneOrMany<u8> = OneOrMany::Many(vec![1, 2]);
        assert_eq!(many.reshape(vec!['a', 'b']).unwrap(), OneOrMany::Many(vec!['a', 'b']));
    }

    #[test]
    fn test_parse_region_specs() {
        let content = "# header\nchr1\t10\t20\tname\nchr2\nchr1\t30\n";
        let specs = parse_region_specs(content.as_bytes()).unwrap();
        assert_eq!(
            specs,
            vec![
                RegionSpec::Triple("chr1".to_string(), 10, 20),
                RegionSpec::Text("chr2".to_string()),
                RegionSpec::Pair("chr1".to_string(), 30),
            ]
        );
    }

    #[test]
    fn test_whole_genome() {
        let regions = whole_genome(&table());
        assert_eq!(
            regions,
            vec![Region::new("chr1", 0, 1000), Region::new("chr2", 0, 500)]
        );
    }
}
