//! Chromosome length table.
//!
//! Built once per opened track (from the storage engine's chromosome list or
//! from a `.genome` file: tab-delimited `chrom\tsize`) and never mutated
//! afterwards.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{CoverageError, Result};

/// Chromosome names and lengths, in storage order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromTable {
    /// Map of chromosome name to length
    sizes: HashMap<String, u64>,
    /// Chromosome order as reported by the source
    order: Vec<String>,
}

impl ChromTable {
    /// Build a table from ordered `(name, length)` pairs.
    /// A repeated name keeps its first position and its last length.
    pub fn from_chroms<I, S>(chroms: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut sizes = HashMap::new();
        let mut order = Vec::new();
        for (name, size) in chroms {
            let name = name.into();
            if !sizes.contains_key(&name) {
                order.push(name.clone());
            }
            sizes.insert(name, size);
        }
        Self { sizes, order }
    }

    /// Load a table from a genome file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse a genome file from any reader. Blank lines and `#` comments are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut chroms = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 2 {
                return Err(CoverageError::Parse {
                    line: line_num + 1,
                    message: "Genome file requires two columns: chrom and size".to_string(),
                });
            }

            let size: u64 = fields[1].parse().map_err(|_| CoverageError::Parse {
                line: line_num + 1,
                message: format!("Invalid chromosome size: {}", fields[1]),
            })?;
            chroms.push((fields[0].to_string(), size));
        }

        Ok(Self::from_chroms(chroms))
    }

    /// Length of a chromosome, if present.
    #[inline]
    pub fn chrom_size(&self, chrom: &str) -> Option<u64> {
        self.sizes.get(chrom).copied()
    }

    /// Length of a chromosome, or `UnknownChromosome`.
    #[inline]
    pub fn require(&self, chrom: &str) -> Result<u64> {
        self.chrom_size(chrom)
            .ok_or_else(|| CoverageError::UnknownChromosome(chrom.to_string()))
    }

    /// `(name, length)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.order
            .iter()
            .map(move |name| (name.as_str(), self.sizes[name]))
    }

    /// Get number of chromosomes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
