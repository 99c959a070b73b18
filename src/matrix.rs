//! Dense row-major matrices.
//!
//! A [`Matrix`] stores its elements in one flat buffer of length `rows * cols`,
//! with element `(i, j)` at index `i * cols + j`. The flat form is what the
//! parallel multiplier splits into disjoint per-worker slices; the nested
//! `Vec<Vec<T>>` form and `ndarray::Array2` are supported for interchange.

use std::fmt;
use std::ops::Index;

use ndarray::Array2;
use num::Float;

use crate::error::{invalid_shape, Result};

/// Scalar types a [`Matrix`] can hold.
///
/// Implemented for every `num::Float` that can be shared across worker
/// threads, which in practice means `f32` and `f64`.
pub trait Element: Float + Send + Sync + fmt::Debug + fmt::Display + 'static {}

impl<T> Element for T where T: Float + Send + Sync + fmt::Debug + fmt::Display + 'static {}

/// A rectangular, row-major grid of floating-point values.
///
/// Both dimensions are at least 1. Matrices are never mutated by the
/// multipliers; results are returned as new matrices owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Element> Matrix<T> {
    /// Builds a matrix from a flat row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`MatmulError::InvalidShape`](crate::MatmulError::InvalidShape)
    /// if either dimension is zero or `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        check_dims(rows, cols, data.len())?;
        match rows.checked_mul(cols) {
            Some(len) if len == data.len() => Ok(Matrix { rows, cols, data }),
            _ => Err(invalid_shape(
                rows,
                cols,
                data.len(),
                "data length must equal rows * cols",
            )),
        }
    }

    /// A `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        Self::from_fn(rows, cols, |_, _| T::zero())
    }

    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Result<Self> {
        Self::from_fn(n, n, |i, j| if i == j { T::one() } else { T::zero() })
    }

    /// Builds a matrix by evaluating `f(row, col)` for every cell in row-major order.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> T,
    {
        check_dims(rows, cols, 0)?;
        let len = rows
            .checked_mul(cols)
            .ok_or_else(|| invalid_shape(rows, cols, 0, "rows * cols overflows usize"))?;

        let mut data = Vec::with_capacity(len);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Builds a matrix from nested rows.
    ///
    /// # Errors
    ///
    /// Fails if there are no rows, the first row is empty, or any row has a
    /// different length than the first.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        check_dims(n_rows, n_cols, 0)?;

        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(invalid_shape(
                    n_rows,
                    n_cols,
                    data.len() + row.len(),
                    format!("row {i} has {} columns, expected {n_cols}", row.len()),
                ));
            }
            data.extend(row);
        }
        Ok(Matrix {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    /// Wraps a buffer whose length is already known to be `rows * cols`.
    pub(crate) fn from_buffer(rows: usize, cols: usize, data: Vec<T>) -> Self {
        debug_assert!(rows > 0 && cols > 0);
        debug_assert_eq!(data.len(), rows * cols);
        Matrix { rows, cols, data }
    }

    /// Copies the matrix out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.data.chunks(self.cols).map(<[T]>::to_vec).collect()
    }

    /// Copies the matrix into an `ndarray` array of the same shape.
    pub fn to_array2(&self) -> Array2<T> {
        Array2::from_shape_fn((self.rows, self.cols), |(i, j)| self[(i, j)])
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// The flat row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Row `i` as a slice of `cols` elements.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows`.
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    /// The element at `(i, j)`, or `None` when out of bounds.
    pub fn get(&self, i: usize, j: usize) -> Option<T> {
        if i < self.rows && j < self.cols {
            Some(self.data[i * self.cols + j])
        } else {
            None
        }
    }
}

fn check_dims(rows: usize, cols: usize, len: usize) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(invalid_shape(
            rows,
            cols,
            len,
            "matrices must have at least one row and one column",
        ));
    }
    Ok(())
}

impl<T: Element> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.data[i * self.cols + j]
    }
}

impl<T: Element> TryFrom<Vec<Vec<T>>> for Matrix<T> {
    type Error = crate::MatmulError;

    fn try_from(rows: Vec<Vec<T>>) -> Result<Self> {
        Matrix::from_rows(rows)
    }
}

impl<T: Element> TryFrom<&Array2<T>> for Matrix<T> {
    type Error = crate::MatmulError;

    fn try_from(array: &Array2<T>) -> Result<Self> {
        let (rows, cols) = array.dim();
        // `iter` walks in logical row-major order whatever the memory layout.
        Matrix::new(rows, cols, array.iter().copied().collect())
    }
}

impl<T: Element> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks(self.cols) {
            write!(f, "[")?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{value}")?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
