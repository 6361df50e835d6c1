//! Global configuration for covstat runtime behavior.
//!
//! Constants describe the fixed shape of coarse statistics; the atomics are
//! set once at startup (usually from CLI flags) and read by the storage layer.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Exclusive upper bound of the coarse histogram used for percentiles.
/// Values at or above it land in the `above` overflow bucket.
pub const COARSE_HISTOGRAM_MAX: i32 = 65536;

/// Remote stores only accept bin sizes that are multiples of this.
pub const REMOTE_BIN_QUANTUM: u64 = 65536;

/// Default exclusive upper bound for `stat -s hist`.
pub const DEFAULT_HISTOGRAM_MAX: i32 = 1000;

/// Default number of positions handed to one worker by a bulk load.
pub const DEFAULT_LOAD_CHUNK_SIZE: usize = 1_000_000;

static LOAD_CHUNK_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_LOAD_CHUNK_SIZE);

/// Set the number of positions each parallel worker fills during a bulk load.
///
/// A value of zero is ignored and keeps the current setting.
///
/// # Example
///
/// ```
/// use covstat::config;
///
/// config::set_load_chunk_size(250_000);
/// assert_eq!(config::load_chunk_size(), 250_000);
/// config::set_load_chunk_size(config::DEFAULT_LOAD_CHUNK_SIZE);
/// ```
#[inline]
pub fn set_load_chunk_size(positions: usize) {
    if positions > 0 {
        LOAD_CHUNK_SIZE.store(positions, Ordering::Release);
    }
}

/// Current bulk-load chunk size in positions.
#[inline]
pub fn load_chunk_size() -> usize {
    LOAD_CHUNK_SIZE.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_chunk_size() {
        set_load_chunk_size(DEFAULT_LOAD_CHUNK_SIZE);
        assert_eq!(load_chunk_size(), 1_000_000);
    }

    #[test]
    #[serial]
    fn test_zero_chunk_size_ignored() {
        set_load_chunk_size(4096);
        set_load_chunk_size(0);
        assert_eq!(load_chunk_size(), 4096);
        set_load_chunk_size(DEFAULT_LOAD_CHUNK_SIZE);
    }
}
