//! Block partitioning of output rows across workers.

use std::ops::Range;

use crate::error::{MatmulError, Result};

/// A half-open range `[start, end)` of output rows assigned to one worker.
///
/// `start == end` is a valid, empty chunk for an idle worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowChunk {
    pub start: usize,
    pub end: usize,
}

impl RowChunk {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "chunk start {start} past end {end}");
        RowChunk { start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Splits the rows `[0, m)` into exactly `workers` contiguous chunks.
///
/// Every chunk has `ceil(m / workers)` rows except the trailing ones, which
/// may be shorter or empty. Chunk `i` covers
/// `[min(i * chunk_size, m), min((i + 1) * chunk_size, m))`.
///
/// Each worker therefore touches one contiguous band of A and of the output
/// buffer. Every row costs the same `n * p` multiply-adds, so equal-sized
/// bands are balanced enough without work stealing.
///
/// # Errors
///
/// Returns [`MatmulError::InvalidWorkerCount`] when `workers == 0`.
///
/// # Example
///
/// ```rust
/// use rowpar::partition::{partition_rows, RowChunk};
///
/// let chunks = partition_rows(10, 4).unwrap();
/// assert_eq!(
///     chunks,
///     vec![
///         RowChunk::new(0, 3),
///         RowChunk::new(3, 6),
///         RowChunk::new(6, 9),
///         RowChunk::new(9, 10),
///     ]
/// );
/// ```
pub fn partition_rows(m: usize, workers: usize) -> Result<Vec<RowChunk>> {
    if workers == 0 {
        return Err(MatmulError::InvalidWorkerCount { workers });
    }

    let chunk_size = m.div_ceil(workers);

    Ok((0..workers)
        .map(|w| {
            let start = w.saturating_mul(chunk_size).min(m);
            let end = (w + 1).saturating_mul(chunk_size).min(m);
            RowChunk::new(start, end)
        })
        .collect())
}
