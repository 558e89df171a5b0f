//! Compressed sparse column storage for local distance matrices.
//!
//! Column-compressed is the layout downstream analysis code expects for
//! distance kernels, and for a symmetric matrix a column of the CSC form is
//! also the corresponding row.

use nalgebra::{DMatrix, DVector};

use crate::error::{GeodesicError, Result};

/// Compressed Sparse Column (CSC) matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix {
    /// Number of rows.
    rows: usize,
    /// Number of columns.
    cols: usize,
    /// Column pointers: `col_ptr[j]` is where column `j` starts in
    /// `row_idx`/`values`. Length is `cols + 1`, with `col_ptr[cols] = nnz`.
    col_ptr: Vec<usize>,
    /// Row index of each stored value, ascending within a column.
    row_idx: Vec<usize>,
    /// Stored values.
    values: Vec<f64>,
}

impl CscMatrix {
    /// Create a CSC matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate entries at the same position are summed.
    ///
    /// # Errors
    ///
    /// [`GeodesicError::IndexOutOfRange`] if a triplet lies outside the shape.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self> {
        let mut triplets: Vec<(usize, usize, f64)> = triplets.into_iter().collect();
        for &(r, c, _) in &triplets {
            if r >= rows || c >= cols {
                return Err(GeodesicError::IndexOutOfRange {
                    index: if r >= rows { r } else { c },
                    vertex_count: if r >= rows { rows } else { cols },
                });
            }
        }

        // Sort by (col, row) for CSC construction
        triplets.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

        let mut col_ptr = vec![0usize; cols + 1];
        let mut row_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut prev = None;

        for (row, col, val) in triplets {
            match values.last_mut() {
                Some(last) if prev == Some((row, col)) => *last += val,
                _ => {
                    row_idx.push(row);
                    values.push(val);
                    col_ptr[col + 1] += 1;
                    prev = Some((row, col));
                }
            }
        }

        // Prefix sum of per-column counts
        for j in 0..cols {
            col_ptr[j + 1] += col_ptr[j];
        }

        Ok(Self {
            rows,
            cols,
            col_ptr,
            row_idx,
            values,
        })
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get the number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column pointer array (length `ncols + 1`).
    #[inline]
    pub fn col_ptr(&self) -> &[usize] {
        &self.col_ptr
    }

    /// Row indices of the stored entries.
    #[inline]
    pub fn row_indices(&self) -> &[usize] {
        &self.row_idx
    }

    /// Stored values.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Stored entries of column `j` as `(row, value)`.
    pub fn column(&self, j: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.col_ptr[j]..self.col_ptr[j + 1];
        self.row_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Get the stored value at `(row, col)`, or `None` if not stored.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let (start, end) = (self.col_ptr[col], self.col_ptr[col + 1]);
        self.row_idx[start..end]
            .binary_search(&row)
            .ok()
            .map(|k| self.values[start + k])
    }

    /// Iterate over all stored entries as `(row, col, value)`, column by column.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.cols).flat_map(move |j| self.column(j).map(move |(i, v)| (i, j, v)))
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        if x.len() != self.cols {
            return Err(GeodesicError::invalid_param(
                "x",
                x.len(),
                "vector length must match the column count",
            ));
        }

        let mut y = DVector::zeros(self.rows);
        for j in 0..self.cols {
            let xj = x[j];
            for (i, v) in self.column(j) {
                y[i] += v * xj;
            }
        }
        Ok(y)
    }

    /// Dense copy, with zeros where nothing is stored.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.rows, self.cols);
        for (i, j, v) in self.triplets() {
            dense[(i, j)] = v;
        }
        dense
    }

    /// Largest `|A[i,j] - A[j,i]|` over all stored entries.
    ///
    /// An entry stored on one side only counts against zero on the other.
    pub fn max_asymmetry(&self) -> f64 {
        self.triplets()
            .map(|(i, j, v)| (v - self.get(j, i).unwrap_or(0.0)).abs())
            .fold(0.0, f64::max)
    }
}
