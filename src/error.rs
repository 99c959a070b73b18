//! Error types for rowpar operations.
//!
//! Every failure in the multiplication core is reported through [`MatmulError`]
//! and returned to the direct caller. Nothing in the core recovers locally.

use std::fmt;

use thiserror::Error;

use crate::partition::RowChunk;

/// A single worker task that did not complete its row chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// The rows the failing task was responsible for.
    pub chunk: RowChunk,
    /// The panic payload or error message raised by the task.
    pub cause: String,
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows [{}, {}): {}",
            self.chunk.start, self.chunk.end, self.cause
        )
    }
}

/// Errors that can occur while building, multiplying or verifying matrices.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatmulError {
    /// The inner dimensions of the operands disagree (`A.cols != B.rows`).
    #[error("invalid dimensions; cannot multiply {a_rows}x{a_cols} * {b_rows}x{b_cols}")]
    DimensionMismatch {
        a_rows: usize,
        a_cols: usize,
        b_rows: usize,
        b_cols: usize,
    },

    /// A matrix could not be built from the given dimensions or data.
    #[error("invalid matrix shape {rows}x{cols} with {len} elements: {message}")]
    InvalidShape {
        rows: usize,
        cols: usize,
        len: usize,
        message: String,
    },

    /// Work cannot be partitioned across zero workers.
    #[error("worker count must be at least 1 (got {workers})")]
    InvalidWorkerCount { workers: usize },

    /// The per-call worker pool could not be started.
    #[error("failed to build worker pool: {message}")]
    ThreadPool { message: String },

    /// One or more worker tasks failed; no partial result is returned.
    #[error("{} of the worker tasks failed: {}", .failures.len(), join_failures(.failures))]
    WorkerFailure { failures: Vec<ChunkFailure> },

    /// The sequential and parallel results differ.
    #[error(
        "results do not match for {rows}x{cols} output: {mismatches} differing cell(s), \
         first at ({row}, {col}): expected {expected}, got {actual}"
    )]
    ResultMismatch {
        rows: usize,
        cols: usize,
        mismatches: usize,
        row: usize,
        col: usize,
        expected: f64,
        actual: f64,
    },

    /// The benchmark driver was given an unusable configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

fn join_failures(failures: &[ChunkFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<rayon::ThreadPoolBuildError> for MatmulError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        MatmulError::ThreadPool {
            message: err.to_string(),
        }
    }
}

/// Result type alias for rowpar operations.
pub type Result<T> = std::result::Result<T, MatmulError>;

/// Creates a dimension-mismatch error for `A (a_rows x a_cols) * B (b_rows x b_cols)`.
pub fn dimension_mismatch(a_rows: usize, a_cols: usize, b_rows: usize, b_cols: usize) -> MatmulError {
    MatmulError::DimensionMismatch {
        a_rows,
        a_cols,
        b_rows,
        b_cols,
    }
}

/// Creates a shape error.
pub fn invalid_shape(rows: usize, cols: usize, len: usize, message: impl Into<String>) -> MatmulError {
    MatmulError::InvalidShape {
        rows,
        cols,
        len,
        message: message.into(),
    }
}

/// Creates a configuration error.
pub fn invalid_config(message: impl Into<String>) -> MatmulError {
    MatmulError::InvalidConfig {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let error = dimension_mismatch(2, 3, 4, 2);
        let display = format!("{}", error);
        assert!(display.contains("cannot multiply 2x3 * 4x2"));
    }

    #[test]
    fn test_invalid_shape_display() {
        let error = invalid_shape(2, 2, 3, "data length must be rows * cols");
        let display = format!("{}", error);
        assert!(display.contains("2x2"));
        assert!(display.contains("3 elements"));
        assert!(display.contains("data length must be rows * cols"));
    }

    #[test]
    fn test_worker_failure_lists_every_chunk() {
        let error = MatmulError::WorkerFailure {
            failures: vec![
                ChunkFailure {
                    chunk: RowChunk::new(0, 4),
                    cause: "boom".to_string(),
                },
                ChunkFailure {
                    chunk: RowChunk::new(8, 12),
                    cause: "bang".to_string(),
                },
            ],
        };
        let display = format!("{}", error);
        assert!(display.starts_with("2 of the worker tasks failed"));
        assert!(display.contains("rows [0, 4): boom"));
        assert!(display.contains("rows [8, 12): bang"));
    }

    #[test]
    fn test_result_mismatch_display() {
        let error = MatmulError::ResultMismatch {
            rows: 3,
            cols: 4,
            mismatches: 1,
            row: 2,
            col: 1,
            expected: 1.5,
            actual: 2.5,
        };
        let display = format!("{}", error);
        assert!(display.contains("3x4 output"));
        assert!(display.contains("first at (2, 1)"));
        assert!(display.contains("expected 1.5, got 2.5"));
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(dimension_mismatch(1, 2, 3, 4), dimension_mismatch(1, 2, 3, 4));
        assert_ne!(dimension_mismatch(1, 2, 3, 4), dimension_mismatch(1, 2, 3, 5));
    }

    #[test]
    fn test_error_trait_implementation() {
        let error = invalid_config("eval_runs must be at least 1");

        let _: &dyn std::error::Error = &error;
        assert!(std::error::Error::source(&error).is_none());
    }
}
