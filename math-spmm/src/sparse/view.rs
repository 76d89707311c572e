//! Borrowed CSR view with validated structure

use crate::error::{Result, SpmmError};
use crate::traits::{Scalar, SparseIndex};
use std::ops::Range;

/// Borrowed Compressed Sparse Row matrix
///
/// Construction checks every CSR invariant once, so the multiply kernel can
/// index the arrays without further bounds reasoning:
/// - `row_ptrs.len() == num_rows + 1` and `row_ptrs[0] == 0`
/// - `row_ptrs` is non-decreasing and ends at `values.len()`
/// - `col_indices.len() == values.len()`
/// - every column index lies in `[0, num_cols)`
///
/// Column indices inside a row need not be sorted or unique; each stored
/// entry contributes to the product in storage order.
#[derive(Debug, Clone, Copy)]
pub struct CsrView<'a, T, I = usize> {
    num_rows: usize,
    num_cols: usize,
    values: &'a [T],
    col_indices: &'a [I],
    row_ptrs: &'a [I],
}

impl<'a, T: Scalar, I: SparseIndex> CsrView<'a, T, I> {
    /// Wrap raw CSR arrays after validating them
    pub fn new(
        num_rows: usize,
        num_cols: usize,
        values: &'a [T],
        col_indices: &'a [I],
        row_ptrs: &'a [I],
    ) -> Result<Self> {
        validate_csr(num_rows, num_cols, values.len(), col_indices, row_ptrs)?;
        Ok(Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        })
    }

    /// Wrap arrays whose invariants were already checked by [`validate_csr`]
    pub(crate) fn from_validated(
        num_rows: usize,
        num_cols: usize,
        values: &'a [T],
        col_indices: &'a [I],
        row_ptrs: &'a [I],
    ) -> Self {
        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
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

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Range of indices in values/col_indices for a given row
    #[inline]
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row].to_usize()..self.row_ptrs[row + 1].to_usize()
    }

    /// The (col, value) pairs of a row in storage order
    #[inline]
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .iter()
            .map(|c| c.to_usize())
            .zip(self.values[range].iter().copied())
    }
}

/// Check the CSR invariants on raw arrays
pub(crate) fn validate_csr<I: SparseIndex>(
    num_rows: usize,
    num_cols: usize,
    nnz: usize,
    col_indices: &[I],
    row_ptrs: &[I],
) -> Result<()> {
    let expected_ptrs = num_rows
        .checked_add(1)
        .ok_or_else(|| SpmmError::dimension("row offsets", format!("{num_rows} rows overflow")))?;
    if row_ptrs.len() != expected_ptrs {
        return Err(SpmmError::mismatch("row offsets", expected_ptrs, row_ptrs.len()));
    }
    if col_indices.len() != nnz {
        return Err(SpmmError::mismatch("column indices", nnz, col_indices.len()));
    }

    let mut prev = 0usize;
    for (row, ptr) in row_ptrs.iter().enumerate() {
        let ptr = ptr.try_to_usize().ok_or_else(|| {
            SpmmError::dimension("row offsets", format!("offset {row} is negative: {ptr:?}"))
        })?;
        if row == 0 && ptr != 0 {
            return Err(SpmmError::dimension(
                "row offsets",
                format!("first offset must be 0, got {ptr}"),
            ));
        }
        if ptr < prev {
            return Err(SpmmError::dimension(
                "row offsets",
                format!("decrease at row {row}: {prev} > {ptr}"),
            ));
        }
        prev = ptr;
    }
    if prev != nnz {
        return Err(SpmmError::mismatch("last row offset (nnz)", nnz, prev));
    }

    for (idx, col) in col_indices.iter().enumerate() {
        match col.try_to_usize() {
            Some(c) if c < num_cols => {}
            _ => {
                return Err(SpmmError::dimension(
                    "column indices",
                    format!("{col:?} at position {idx} outside [0, {num_cols})"),
                ));
            }
        }
    }

    Ok(())
}
