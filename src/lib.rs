//! Row-partitioned parallel dense matrix multiplication.
//!
//! `rowpar` multiplies dense row-major matrices two ways and checks that they
//! agree bit for bit:
//!
//! - [`seq_matmul`]: the single-threaded reference, `i`, `j`, `k` ascending.
//! - [`ParallelMultiplier`] / [`par_matmul`]: splits the output rows into
//!   contiguous chunks ([`partition::partition_rows`]) and computes each chunk
//!   on its own worker, writing straight into a disjoint band of one flat
//!   output buffer.
//!
//! The [`bench`] module drives both on random operands and reports speedup
//! and efficiency; the `rowpar` binary exposes it on the command line.
//!
//! ```rust
//! use rowpar::{par_matmul, seq_matmul, Matrix};
//!
//! let a = Matrix::from_fn(300, 120, |i, j| (i + j) as f64 / 100.0).unwrap();
//! let b = Matrix::from_fn(120, 300, |i, j| (i * j % 7) as f64).unwrap();
//!
//! assert_eq!(seq_matmul(&a, &b).unwrap(), par_matmul(&a, &b).unwrap());
//! ```

pub mod bench;
pub mod error;
pub mod matrix;
pub mod parallel;
pub mod partition;
pub mod sequential;
pub mod verify;

/// Outputs with fewer cells than this are multiplied sequentially.
///
/// Override per multiplier with [`ParallelConfig::threshold`].
pub const PARALLEL_THRESHOLD: usize = 25_000;

pub use error::{ChunkFailure, MatmulError, Result};
pub use matrix::{Element, Matrix};
pub use parallel::{
    default_workers, par_matmul, DispatchReport, ParallelConfig, ParallelMultiplier, Strategy,
};
pub use partition::RowChunk;
pub use sequential::seq_matmul;
pub use verify::ensure_equal;
