//! Compressed Sparse Row (CSR) matrix format
//!
//! CSR format stores:
//! - `values`: Non-zero entries in row-major order
//! - `col_indices`: Column index for each value
//! - `row_ptrs`: Index into values/col_indices where each row starts

use super::view::{CsrView, validate_csr};
use crate::error::Result;
use crate::traits::Scalar;
use ndarray::Array2;
use std::ops::Range;

/// Compressed Sparse Row (CSR) matrix format
///
/// Owned storage for the left operand of the sparse-dense product.
/// Fields are private so that every instance satisfies the CSR invariants
/// checked by [`CsrMatrix::from_raw_parts`].
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T: Scalar> {
    num_rows: usize,
    num_cols: usize,
    values: Vec<T>,
    col_indices: Vec<usize>,
    row_ptrs: Vec<usize>,
}

impl<T: Scalar> CsrMatrix<T> {
    /// Create a new empty CSR matrix
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs: vec![0; num_rows + 1],
        }
    }

    /// Create a CSR matrix from raw components
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the arrays are inconsistent (see
    /// [`CsrView`] for the full list of invariants).
    pub fn from_raw_parts(
        num_rows: usize,
        num_cols: usize,
        row_ptrs: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self> {
        validate_csr(num_rows, num_cols, values.len(), &col_indices, &row_ptrs)?;

        Ok(Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        })
    }

    /// Create a CSR matrix from a dense matrix
    ///
    /// Only stores entries with magnitude > threshold
    pub fn from_dense(dense: &Array2<T>, threshold: T::Real) -> Self {
        let num_rows = dense.nrows();
        let num_cols = dense.ncols();

        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptrs = vec![0usize; num_rows + 1];

        for i in 0..num_rows {
            for j in 0..num_cols {
                let val = dense[[i, j]];
                if val.norm() > threshold {
                    values.push(val);
                    col_indices.push(j);
                }
            }
            row_ptrs[i + 1] = values.len();
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create a CSR matrix from COO (Coordinate) format triplets
    ///
    /// Triplets are (row, col, value). Duplicate entries are summed.
    /// Triplets outside the matrix bounds are rejected.
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Result<Self> {
        triplets.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut values: Vec<T> = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut row_counts = vec![0usize; num_rows];
        let mut prev: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            if row >= num_rows {
                return Err(crate::SpmmError::dimension(
                    "triplet rows",
                    format!("{row} outside [0, {num_rows})"),
                ));
            }
            if prev == Some((row, col)) {
                // Same entry, accumulate
                if let Some(last) = values.last_mut() {
                    *last += val;
                }
                continue;
            }
            values.push(val);
            col_indices.push(col);
            row_counts[row] += 1;
            prev = Some((row, col));
        }

        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        row_ptrs.push(0);
        let mut acc = 0;
        for count in row_counts {
            acc += count;
            row_ptrs.push(acc);
        }

        Self::from_raw_parts(num_rows, num_cols, row_ptrs, col_indices, values)
    }

    /// Create identity matrix in CSR format
    pub fn identity(n: usize) -> Self {
        Self {
            num_rows: n,
            num_cols: n,
            values: vec![T::one(); n],
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Non-zero values in row-major order
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Column index of each stored value
    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    /// Row pointers: `row_ptrs[i]` is where row i starts, `row_ptrs[num_rows] == nnz`
    pub fn row_ptrs(&self) -> &[usize] {
        &self.row_ptrs
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Sparsity ratio (fraction of non-zero entries)
    pub fn sparsity(&self) -> f64 {
        let total = self.num_rows * self.num_cols;
        if total == 0 {
            0.0
        } else {
            self.nnz() as f64 / total as f64
        }
    }

    /// Get the range of indices in values/col_indices for a given row
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// Get the (col, value) pairs for a row
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Get element at (i, j), returns 0 if not stored (duplicates are summed)
    pub fn get(&self, i: usize, j: usize) -> T {
        self.row_entries(i)
            .filter(|&(col, _)| col == j)
            .fold(T::zero(), |acc, (_, v)| acc + v)
    }

    /// Borrow the matrix as a [`CsrView`]
    pub fn view(&self) -> CsrView<'_, T, usize> {
        CsrView::from_validated(
            self.num_rows,
            self.num_cols,
            &self.values,
            &self.col_indices,
            &self.row_ptrs,
        )
    }

    /// Convert to dense matrix (for debugging/small matrices)
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.num_rows, self.num_cols), T::zero());

        for i in 0..self.num_rows {
            for (j, v) in self.row_entries(i) {
                dense[[i, j]] += v;
            }
        }

        dense
    }
}

/// Builder for constructing CSR matrices row by row
pub struct CsrBuilder<T: Scalar> {
    num_rows: usize,
    num_cols: usize,
    values: Vec<T>,
    col_indices: Vec<usize>,
    row_ptrs: Vec<usize>,
}

impl<T: Scalar> CsrBuilder<T> {
    /// Create a new CSR builder
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self::with_capacity(num_rows, num_cols, 0)
    }

    /// Create a new CSR builder with estimated non-zeros
    pub fn with_capacity(num_rows: usize, num_cols: usize, nnz_estimate: usize) -> Self {
        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        row_ptrs.push(0);
        Self {
            num_rows,
            num_cols,
            values: Vec::with_capacity(nnz_estimate),
            col_indices: Vec::with_capacity(nnz_estimate),
            row_ptrs,
        }
    }

    /// Add entries for the next row; exact zeros are skipped
    pub fn add_row_entries(&mut self, entries: impl IntoIterator<Item = (usize, T)>) {
        for (col, val) in entries {
            if !val.is_zero() {
                self.values.push(val);
                self.col_indices.push(col);
            }
        }
        self.row_ptrs.push(self.values.len());
    }

    /// Finish building and return the CSR matrix
    ///
    /// Rows that were never added are left empty. Fails if more rows than
    /// `num_rows` were added or a column index is out of range.
    pub fn finish(mut self) -> Result<CsrMatrix<T>> {
        while self.row_ptrs.len() < self.num_rows + 1 {
            self.row_ptrs.push(self.values.len());
        }

        CsrMatrix::from_raw_parts(
            self.num_rows,
            self.num_cols,
            self.row_ptrs,
            self.col_indices,
            self.values,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpmmError;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    #[test]
    fn test_csr_from_dense() {
        let dense = array![[1.0_f64, 0.0, 2.0], [0.0, 3.0, 0.0], [4.0, 0.0, 5.0]];

        let csr = CsrMatrix::from_dense(&dense, 1e-15);

        assert_eq!(csr.num_rows(), 3);
        assert_eq!(csr.num_cols(), 3);
        assert_eq!(csr.nnz(), 5);

        assert_relative_eq!(csr.get(0, 0), 1.0);
        assert_relative_eq!(csr.get(0, 2), 2.0);
        assert_relative_eq!(csr.get(1, 1), 3.0);
        assert_relative_eq!(csr.get(2, 0), 4.0);
        assert_relative_eq!(csr.get(2, 2), 5.0);
        assert_relative_eq!(csr.get(1, 0), 0.0);
    }

    #[test]
    fn test_csr_from_triplets() {
        let triplets = vec![
            (2, 2, 5.0_f64),
            (0, 0, 1.0),
            (1, 1, 3.0),
            (0, 2, 2.0),
            (2, 0, 4.0),
        ];

        let csr = CsrMatrix::from_triplets(3, 3, triplets).unwrap();

        assert_eq!(csr.nnz(), 5);
        assert_eq!(csr.row_ptrs(), &[0, 2, 3, 5]);
        assert_relative_eq!(csr.get(0, 0), 1.0);
        assert_relative_eq!(csr.get(1, 1), 3.0);
        assert_relative_eq!(csr.get(2, 2), 5.0);
    }

    #[test]
    fn test_csr_triplets_duplicate() {
        let triplets = vec![
            (0, 0, Complex64::new(1.0, 0.0)),
            (0, 0, Complex64::new(2.0, 0.0)), // Duplicate!
            (1, 1, Complex64::new(3.0, 0.0)),
        ];

        let csr = CsrMatrix::from_triplets(2, 2, triplets).unwrap();

        assert_eq!(csr.nnz(), 2);
        assert_relative_eq!(csr.get(0, 0).re, 3.0); // 1 + 2 = 3
    }

    #[test]
    fn test_csr_triplets_skipping_rows() {
        let csr = CsrMatrix::from_triplets(4, 2, vec![(3, 1, 7.0_f64)]).unwrap();
        assert_eq!(csr.row_ptrs(), &[0, 0, 0, 0, 1]);

        let empty: CsrMatrix<f64> = CsrMatrix::from_triplets(2, 2, Vec::new()).unwrap();
        assert_eq!(empty, CsrMatrix::new(2, 2));
    }

    #[test]
    fn test_csr_triplets_out_of_bounds() {
        let err = CsrMatrix::from_triplets(2, 2, vec![(0, 5, 1.0_f64)]).unwrap_err();
        assert!(matches!(
            err,
            SpmmError::DimensionMismatch {
                what: "column indices",
                ..
            }
        ));

        let err = CsrMatrix::from_triplets(2, 2, vec![(9, 0, 1.0_f64)]).unwrap_err();
        assert!(err.is_dimension_error());
    }

    #[test]
    fn test_csr_from_raw_parts_validates() {
        let ok = CsrMatrix::from_raw_parts(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0_f64, 2.0]);
        assert!(ok.is_ok());

        let bad = CsrMatrix::from_raw_parts(2, 2, vec![0, 1], vec![0, 1], vec![1.0_f64, 2.0]);
        assert!(matches!(bad, Err(SpmmError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_csr_identity() {
        let id: CsrMatrix<f64> = CsrMatrix::identity(3);

        assert_eq!(id.nnz(), 3);
        assert_relative_eq!(id.get(0, 0), 1.0);
        assert_relative_eq!(id.get(1, 1), 1.0);
        assert_relative_eq!(id.get(2, 2), 1.0);
        assert_relative_eq!(id.get(0, 1), 0.0);
        assert_relative_eq!(id.sparsity(), 1.0 / 3.0);
    }

    #[test]
    fn test_csr_builder() {
        let mut builder: CsrBuilder<f64> = CsrBuilder::new(4, 3);

        builder.add_row_entries([(0, 1.0), (2, 2.0)]);
        builder.add_row_entries([(1, 3.0), (2, 0.0)]);
        builder.add_row_entries([(0, 4.0), (2, 5.0)]);

        let csr = builder.finish().unwrap();

        assert_eq!(csr.nnz(), 5);
        assert_eq!(csr.row_ptrs(), &[0, 2, 3, 5, 5]);
        assert_relative_eq!(csr.get(0, 0), 1.0);
        assert_relative_eq!(csr.get(1, 1), 3.0);
    }

    #[test]
    fn test_csr_builder_too_many_rows() {
        let mut builder: CsrBuilder<f64> = CsrBuilder::new(1, 1);
        builder.add_row_entries([(0, 1.0)]);
        builder.add_row_entries([(0, 1.0)]);

        assert!(builder.finish().is_err());
    }

    #[test]
    fn test_csr_to_dense_roundtrip() {
        let original = array![
            [Complex64::new(1.0, 0.5), Complex64::new(0.0, 0.0)],
            [Complex64::new(2.0, -1.0), Complex64::new(3.0, 0.0)],
        ];

        let csr = CsrMatrix::from_dense(&original, 1e-15);
        let recovered = csr.to_dense();

        assert_eq!(original, recovered);
    }
}
