//! Row-partitioned parallel multiplication.
//!
//! The output `C` is allocated as one zeroed flat buffer and cut into
//! contiguous bands of whole rows, one band per [`RowChunk`]. Each band is
//! handed to its own worker task as an exclusive `&mut [T]`, so no two tasks
//! can ever write the same cell and the buffer needs no locking. Operands are
//! shared read-only by reference for the whole call.
//!
//! A fresh rayon pool with exactly `workers` threads is built for every call
//! and dropped once the scope (the barrier) has joined every task. A task that
//! panics does not take the call down with it: its chunk and panic message are
//! recorded, and after the barrier the call fails with
//! [`MatmulError::WorkerFailure`] listing every failed chunk. Partial results
//! are never returned.
//!
//! # Threshold
//!
//! Outputs with fewer than [`PARALLEL_THRESHOLD`] cells are delegated to
//! [`seq_matmul`] without building a pool. The value is a tunable default, not
//! a measured crossover point; override it with [`ParallelConfig::threshold`].

use std::any::Any;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

use log::{debug, trace, warn};

use crate::{
    error::{ChunkFailure, MatmulError, Result},
    matrix::{Element, Matrix},
    partition::{partition_rows, RowChunk},
    sequential::{check_compatible, multiply_rows, seq_matmul},
    PARALLEL_THRESHOLD,
};

/// Number of execution units reported by the host, or 1 if unknown.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Tuning knobs for [`ParallelMultiplier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Worker threads (and row chunks) per parallel call. Must be at least 1.
    pub workers: usize,
    /// Outputs with fewer than this many cells run sequentially.
    pub threshold: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        ParallelConfig {
            workers: default_workers(),
            threshold: PARALLEL_THRESHOLD,
        }
    }
}

impl ParallelConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }
}

/// Which path a multiplication took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Below the threshold; computed on the calling thread.
    Sequential,
    /// Dispatched to a worker pool.
    Parallel,
}

/// What a call to [`ParallelMultiplier::multiply_with_report`] actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub strategy: Strategy,
    /// Threads in the pool built for the call; 0 on the sequential path.
    pub pool_threads: usize,
    /// Row chunks computed by the partitioner, including empty ones.
    pub chunks: Vec<RowChunk>,
    /// Worker tasks actually spawned. Empty chunks get no task.
    pub tasks_spawned: usize,
}

impl DispatchReport {
    fn sequential() -> Self {
        DispatchReport {
            strategy: Strategy::Sequential,
            pool_threads: 0,
            chunks: Vec::new(),
            tasks_spawned: 0,
        }
    }
}

/// Multiplies matrices by splitting the output rows across a worker pool.
///
/// # Example
///
/// ```rust
/// use rowpar::{Matrix, ParallelConfig, ParallelMultiplier};
///
/// let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
/// let b = Matrix::from_rows(vec![vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
///
/// // Force the parallel path even for this tiny input.
/// let multiplier = ParallelMultiplier::new(
///     ParallelConfig::default().with_workers(2).with_threshold(0),
/// );
/// let c = multiplier.multiply(&a, &b).unwrap();
/// assert_eq!(c.to_rows(), vec![vec![19.0, 22.0], vec![43.0, 50.0]]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParallelMultiplier {
    config: ParallelConfig,
}

impl ParallelMultiplier {
    pub fn new(config: ParallelConfig) -> Self {
        ParallelMultiplier { config }
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// Computes `C = A * B`, bit-identical to [`seq_matmul`].
    ///
    /// # Errors
    ///
    /// - [`MatmulError::DimensionMismatch`] if `a.cols() != b.rows()`, before any work starts.
    /// - [`MatmulError::InvalidWorkerCount`] if the parallel path runs with 0 workers.
    /// - [`MatmulError::ThreadPool`] if the worker pool cannot be started.
    /// - [`MatmulError::WorkerFailure`] if any worker task panicked.
    pub fn multiply<T: Element>(&self, a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
        self.multiply_with_report(a, b).map(|(c, _)| c)
    }

    /// Same as [`multiply`](Self::multiply), also describing how the work was dispatched.
    pub fn multiply_with_report<T: Element>(
        &self,
        a: &Matrix<T>,
        b: &Matrix<T>,
    ) -> Result<(Matrix<T>, DispatchReport)> {
        check_compatible(a, b)?;

        let (m, p) = (a.rows(), b.cols());
        let cells = m * p;

        if cells < self.config.threshold {
            debug!(
                "{m}x{p} output ({cells} cells) below threshold {}, running sequentially",
                self.config.threshold
            );
            return Ok((seq_matmul(a, b)?, DispatchReport::sequential()));
        }

        let workers = self.config.workers;
        let chunks = partition_rows(m, workers)?;
        debug!(
            "{m}x{p} output ({cells} cells): {workers} workers, {} rows per chunk",
            chunks.first().map_or(0, RowChunk::len)
        );

        let (buffer, tasks_spawned) = run_chunks(a, b, &chunks, workers, multiply_rows::<T>)?;

        let report = DispatchReport {
            strategy: Strategy::Parallel,
            pool_threads: workers,
            chunks,
            tasks_spawned,
        };
        Ok((Matrix::from_buffer(m, p, buffer), report))
    }
}

/// Computes `C = A * B` with the default [`ParallelConfig`].
///
/// Worker count is the host's available parallelism and the threshold is
/// [`PARALLEL_THRESHOLD`].
pub fn par_matmul<T: Element>(a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
    ParallelMultiplier::default().multiply(a, b)
}

/// Runs `kernel` once per non-empty chunk on a fresh pool of `workers` threads.
///
/// Returns the filled `m * p` buffer and the number of tasks spawned.
fn run_chunks<T, K>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    chunks: &[RowChunk],
    workers: usize,
    kernel: K,
) -> Result<(Vec<T>, usize)>
where
    T: Element,
    K: Fn(&Matrix<T>, &Matrix<T>, Range<usize>, &mut [T]) + Sync,
{
    let p = b.cols();
    let mut buffer = vec![T::zero(); a.rows() * p];

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("rowpar-worker-{i}"))
        .build()?;

    // Cut the buffer into one exclusive band of whole rows per chunk.
    let mut bands = Vec::with_capacity(chunks.len());
    let mut rest: &mut [T] = &mut buffer;
    for &chunk in chunks {
        let (band, tail) = std::mem::take(&mut rest).split_at_mut(chunk.len() * p);
        rest = tail;
        if !chunk.is_empty() {
            bands.push((chunk, band));
        }
    }
    debug_assert!(rest.is_empty(), "chunks must cover every output row");

    let tasks_spawned = bands.len();
    let failures = Mutex::new(Vec::new());

    pool.scope(|scope| {
        for (chunk, band) in bands {
            let failures = &failures;
            let kernel = &kernel;

            scope.spawn(move |_| {
                trace!("worker task for rows [{}, {})", chunk.start, chunk.end);
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| kernel(a, b, chunk.rows(), band)));

                if let Err(payload) = outcome {
                    let cause = panic_message(payload.as_ref());
                    warn!(
                        "worker for rows [{}, {}) failed: {cause}",
                        chunk.start, chunk.end
                    );
                    failures
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(ChunkFailure { chunk, cause });
                }
            });
        }
    });

    let mut failures = failures.into_inner().unwrap_or_else(PoisonError::into_inner);
    if !failures.is_empty() {
        failures.sort_by_key(|failure| failure.chunk.start);
        return Err(MatmulError::WorkerFailure { failures });
    }

    Ok((buffer, tasks_spawned))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked with a non-string payload".to_string()
    }
}
