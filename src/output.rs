//! Tab-separated output for command results.
//!
//! Uses itoa for integer formatting and ryu for float formatting
//! to avoid allocation in the hot path.

use std::io::{BufWriter, Write};

use crate::error::Result;

/// Buffer size for StatWriter (1MB default).
const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Buffered writer for region-keyed statistic rows.
pub struct StatWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: Write> StatWriter<W> {
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    /// Write `chrom\tbegin\tend` without a newline.
    #[inline]
    pub fn write_region(&mut self, chrom: &str, begin: u64, end: u64) -> Result<()> {
        self.writer.write_all(chrom.as_bytes())?;
        self.write_tab()?;
        self.write_int(begin)?;
        self.write_tab()?;
        self.write_int(end)
    }

    /// Write an integer using itoa.
    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<()> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    /// Write a float using ryu. Non-finite values print as `nan`/`inf`.
    #[inline]
    pub fn write_float(&mut self, f: f64) -> Result<()> {
        if f.is_nan() {
            self.writer.write_all(b"nan")?;
        } else if f.is_infinite() {
            self.writer
                .write_all(if f > 0.0 { b"inf" } else { b"-inf" })?;
        } else {
            self.writer.write_all(self.ryu_buf.format(f).as_bytes())?;
        }
        Ok(())
    }

    #[inline]
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.writer.write_all(s.as_bytes())?;
        Ok(())
    }

    #[inline]
    pub fn write_tab(&mut self) -> Result<()> {
        self.writer.write_all(b"\t")?;
        Ok(())
    }

    #[inline]
    pub fn write_newline(&mut self) -> Result<()> {
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write a region followed by tab-separated floats and a newline.
    pub fn write_float_row(&mut self, chrom: &str, begin: u64, end: u64, values: &[f64]) -> Result<()> {
        self.write_region(chrom, begin, end)?;
        for &v in values {
            self.write_tab()?;
            self.write_float(v)?;
        }
        self.write_newline()
    }

    /// Write a region followed by one integer and a newline.
    pub fn write_int_row<I: itoa::Integer>(&mut self, chrom: &str, begin: u64, end: u64, value: I) -> Result<()> {
        self.write_region(chrom, begin, end)?;
        self.write_tab()?;
        self.write_int(value)?;
        self.write_newline()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> Drop for StatWriter<W> {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_row() {
        let mut out = Vec::new();
        {
            let mut writer = StatWriter::new(&mut out);
            writer.write_float_row("chr1", 0, 10, &[4.5, 2.0]).unwrap();
            writer.write_int_row("chr2", 5, 6, -3i32).unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "chr1\t0\t10\t4.5\t2.0\nchr2\t5\t6\t-3\n"
        );
    }

    #[test]
    fn test_non_finite() {
        let mut out = Vec::new();
        {
            let mut writer = StatWriter::new(&mut out);
            writer.write_float(f64::NAN).unwrap();
            writer.write_tab().unwrap();
            writer.write_float(f64::INFINITY).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "nan\tinf");
    }
}
