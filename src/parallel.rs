//! Parallel processing utilities using Rayon.
//!
//! Regions handed to the storage engine are independent and read-only, so
//! batched work can be spread over the global pool as long as every result
//! keeps the index of its input.

use rayon::prelude::*;

use crate::error::Result;

/// Minimum number of regions before enabling parallelization.
/// Below this threshold, sequential processing is faster due to
/// thread spawn overhead.
pub const PARALLEL_THRESHOLD: usize = 64;

/// Map `f` over `items`, in parallel for large inputs, keeping input order.
///
/// The error of the lowest-index failing item is returned. On the parallel
/// path every item is still evaluated.
pub fn map_ordered<T, U, F>(items: &[T], f: F) -> Result<Vec<U>>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> Result<U> + Sync + Send,
{
    if items.len() < PARALLEL_THRESHOLD {
        items.iter().map(f).collect()
    } else {
        let results: Vec<Result<U>> = items.par_iter().map(f).collect();
        results.into_iter().collect()
    }
}

/// Fill consecutive chunks of `out` in parallel.
///
/// `f` receives the offset of the chunk within `out` and the chunk itself.
pub fn fill_chunks<V, F>(out: &mut [V], chunk_size: usize, f: F) -> Result<()>
where
    V: Send,
    F: Fn(usize, &mut [V]) -> Result<()> + Sync + Send,
{
    let chunk_size = chunk_size.max(1);
    out.par_chunks_mut(chunk_size)
        .enumerate()
        .try_for_each(|(i, chunk)| f(i * chunk_size, chunk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoverageError;

    #[test]
    fn test_map_ordered_keeps_order() {
        let items: Vec<u64> = (0..1000).collect();
        let doubled = map_ordered(&items, |&x| Ok(x * 2)).unwrap();
        assert_eq!(doubled.len(), 1000);
        assert!(doubled.iter().enumerate().all(|(i, &v)| v == i as u64 * 2));
    }

    #[test]
    fn test_map_ordered_error() {
        let items: Vec<u64> = (0..10).collect();
        let result = map_ordered(&items, |&x| {
            if x == 3 {
                Err(CoverageError::InvalidBinSize)
            } else {
                Ok(x)
            }
        });
        assert!(matches!(result, Err(CoverageError::InvalidBinSize)));
    }

    #[test]
    fn test_map_ordered_parallel_lowest_error_wins() {
        let items: Vec<u64> = (0..(PARALLEL_THRESHOLD as u64 * 8)).collect();
        for _ in 0..20 {
            let result = map_ordered(&items, |&x| match x {
                70 => Err(CoverageError::StoreMismatch {
                    expected: 70,
                    actual: 0,
                }),
                x if x > 70 && x % 3 == 0 => Err(CoverageError::InvalidBinSize),
                x => Ok(x),
            });
            assert!(matches!(
                result,
                Err(CoverageError::StoreMismatch { expected: 70, .. })
            ));
        }
    }

    #[test]
    fn test_fill_chunks_offsets() {
        let mut out = vec![0usize; 10];
        fill_chunks(&mut out, 3, |offset, chunk| {
            for (i, slot) in chunk.iter_mut().enumerate() {
                *slot = offset + i;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(out, (0..10).collect::<Vec<_>>());
    }
}
