//! Single-threaded reference multiplication.

use std::ops::Range;

use crate::error::{dimension_mismatch, Result};
use crate::matrix::{Element, Matrix};

/// Computes `C = A * B` on the calling thread.
///
/// Cells are produced with `i`, then `j`, then `k` ascending, each one
/// accumulated from zero. This fixes the floating-point summation order, so
/// any other multiplier that reuses [`multiply_rows`] returns bit-identical
/// results.
///
/// # Errors
///
/// Returns [`MatmulError::DimensionMismatch`](crate::MatmulError::DimensionMismatch)
/// when `a.cols() != b.rows()`.
///
/// # Example
///
/// ```rust
/// use rowpar::{seq_matmul, Matrix};
///
/// let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
/// let b = Matrix::from_rows(vec![vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
///
/// let c = seq_matmul(&a, &b).unwrap();
/// assert_eq!(c.to_rows(), vec![vec![19.0, 22.0], vec![43.0, 50.0]]);
/// ```
pub fn seq_matmul<T: Element>(a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
    check_compatible(a, b)?;

    let (m, p) = (a.rows(), b.cols());
    let mut c = vec![T::zero(); m * p];
    multiply_rows(a, b, 0..m, &mut c);

    Ok(Matrix::from_buffer(m, p, c))
}

/// Fails with `DimensionMismatch` unless `A.cols == B.rows`.
pub(crate) fn check_compatible<T: Element>(a: &Matrix<T>, b: &Matrix<T>) -> Result<()> {
    if a.cols() != b.rows() {
        return Err(dimension_mismatch(a.rows(), a.cols(), b.rows(), b.cols()));
    }
    Ok(())
}

/// Writes rows `rows` of `A * B` into `out`.
///
/// `out` holds exactly those rows, row-major: cell `(i, j)` of the product
/// lands at `out[(i - rows.start) * p + j]`. Operands must already be
/// compatible.
#[inline]
pub(crate) fn multiply_rows<T: Element>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    rows: Range<usize>,
    out: &mut [T],
) {
    let p = b.cols();
    let b_data = b.as_slice();
    debug_assert_eq!(out.len(), rows.len() * p);

    for (out_row, i) in out.chunks_exact_mut(p).zip(rows) {
        let a_row = a.row(i);
        for (j, cell) in out_row.iter_mut().enumerate() {
            let mut sum = T::zero();
            for (k, &a_ik) in a_row.iter().enumerate() {
                sum = sum + a_ik * b_data[k * p + j];
            }
            *cell = sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatmulError;

    #[test]
    fn test_two_by_two() {
        let a = Matrix::from_rows(vec![vec![1.0f64, 2.0], vec![3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(vec![vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
        let c = seq_matmul(&a, &b).unwrap();
        assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_rectangular() {
        // (2x3) * (3x2)
        let a = Matrix::new(2, 3, vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = Matrix::new(3, 2, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
        let c = seq_matmul(&a, &b).unwrap();
        assert_eq!(c.shape(), (2, 2));
        assert_eq!(c.as_slice(), &[58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_outer_product_shape() {
        // (3x1) * (1x4)
        let a = Matrix::new(3, 1, vec![1.0f64, 2.0, 3.0]).unwrap();
        let b = Matrix::new(1, 4, vec![1.0, 10.0, 100.0, 1000.0]).unwrap();
        let c = seq_matmul(&a, &b).unwrap();
        assert_eq!(c.shape(), (3, 4));
        assert_eq!(c.row(2), &[3.0, 30.0, 300.0, 3000.0]);
    }

    #[test]
    fn test_dimension_mismatch_reports_all_dims() {
        let a = Matrix::<f64>::zeros(2, 3).unwrap();
        let b = Matrix::<f64>::zeros(4, 2).unwrap();
        assert_eq!(
            seq_matmul(&a, &b),
            Err(MatmulError::DimensionMismatch {
                a_rows: 2,
                a_cols: 3,
                b_rows: 4,
                b_cols: 2,
            })
        );
    }

    #[test]
    fn test_multiply_rows_writes_only_its_band() {
        let a = Matrix::from_fn(4, 3, |i, j| (i + j) as f64).unwrap();
        let b = Matrix::from_fn(3, 2, |i, j| (i * 2 + j) as f64).unwrap();
        let full = seq_matmul(&a, &b).unwrap();

        let mut band = vec![0.0; 2 * 2];
        multiply_rows(&a, &b, 1..3, &mut band);
        assert_eq!(&band[..], &full.as_slice()[2..6]);
    }
}
