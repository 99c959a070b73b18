//! Cell-by-cell comparison of two multiplication results.

use num::ToPrimitive;

use crate::error::{MatmulError, Result};
use crate::matrix::{Element, Matrix};

/// Checks that `actual` equals `expected` exactly, cell for cell.
///
/// Both multipliers accumulate every cell in the same order, so any
/// difference, however small, is a correctness bug.
///
/// # Errors
///
/// Returns [`MatmulError::ResultMismatch`] carrying the expected dimensions,
/// the number of differing cells and the first one in row-major order. A
/// shape difference is reported as a mismatch at the first cell outside the
/// shared region, with `NaN` standing in for the missing value.
pub fn ensure_equal<T: Element>(expected: &Matrix<T>, actual: &Matrix<T>) -> Result<()> {
    let (rows, cols) = expected.shape();

    if actual.shape() != expected.shape() {
        let (row, col) = if actual.rows() != rows {
            (rows.min(actual.rows()), 0)
        } else {
            (0, cols.min(actual.cols()))
        };
        return Err(MatmulError::ResultMismatch {
            rows,
            cols,
            mismatches: rows.abs_diff(actual.rows()) * cols
                + rows.min(actual.rows()) * cols.abs_diff(actual.cols()),
            row,
            col,
            expected: cell(expected, row, col),
            actual: cell(actual, row, col),
        });
    }

    let mut first = None;
    let mut mismatches = 0;
    for (idx, (e, a)) in expected.as_slice().iter().zip(actual.as_slice()).enumerate() {
        // NaN in the same cell of both results counts as equal.
        if e != a && !(e.is_nan() && a.is_nan()) {
            mismatches += 1;
            first.get_or_insert(idx);
        }
    }

    match first {
        None => Ok(()),
        Some(idx) => {
            let (row, col) = (idx / cols, idx % cols);
            Err(MatmulError::ResultMismatch {
                rows,
                cols,
                mismatches,
                row,
                col,
                expected: cell(expected, row, col),
                actual: cell(actual, row, col),
            })
        }
    }
}

fn cell<T: Element>(m: &Matrix<T>, row: usize, col: usize) -> f64 {
    m.get(row, col)
        .and_then(|value| ToPrimitive::to_f64(&value))
        .unwrap_or(f64::NAN)
}
