//! Dense operands of the sparse-dense product
//!
//! A dense matrix is a flat buffer plus its shape and element ordering.
//! Element `(i, j)` of a `rows × cols` matrix lives at:
//! - `i * cols + j` for [`DenseLayout::RowMajor`]
//! - `j * rows + i` for [`DenseLayout::ColMajor`]
//!
//! The product writes its result in the same layout as the dense input.

use crate::error::{Result, SpmmError};
use crate::traits::Scalar;
use ndarray::{ArrayBase, Data, Ix2};
use serde::{Deserialize, Serialize};

/// Element ordering of a flat dense buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenseLayout {
    /// Rows are contiguous (C order)
    #[default]
    RowMajor,
    /// Columns are contiguous (Fortran order, as used by MATLAB)
    ColMajor,
}

impl DenseLayout {
    /// Flat offset of element `(i, j)` in a `rows × cols` buffer
    #[inline]
    pub fn offset(self, i: usize, j: usize, rows: usize, cols: usize) -> usize {
        match self {
            DenseLayout::RowMajor => i * cols + j,
            DenseLayout::ColMajor => j * rows + i,
        }
    }
}

fn checked_len(what: &'static str, rows: usize, cols: usize, got: usize) -> Result<()> {
    let expected = rows
        .checked_mul(cols)
        .ok_or_else(|| SpmmError::dimension(what, format!("{rows} x {cols} overflows")))?;
    if expected != got {
        return Err(SpmmError::mismatch(what, expected, got));
    }
    Ok(())
}

/// Read-only dense matrix over a borrowed buffer
#[derive(Debug, Clone, Copy)]
pub struct DenseView<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
    layout: DenseLayout,
}

impl<'a, T: Scalar> DenseView<'a, T> {
    /// Wrap a buffer holding a `rows × cols` matrix
    pub fn new(data: &'a [T], rows: usize, cols: usize, layout: DenseLayout) -> Result<Self> {
        checked_len("dense values", rows, cols, data.len())?;
        Ok(Self {
            data,
            rows,
            cols,
            layout,
        })
    }

    /// Borrow a contiguous ndarray matrix, detecting its layout
    ///
    /// Standard (C order) arrays map to `RowMajor`, Fortran order arrays to
    /// `ColMajor`. Strided views are rejected.
    pub fn from_array<S>(array: &'a ArrayBase<S, Ix2>) -> Result<Self>
    where
        S: Data<Elem = T>,
    {
        let (rows, cols) = array.dim();
        let layout = if array.is_standard_layout() {
            DenseLayout::RowMajor
        } else if array.t().is_standard_layout() {
            DenseLayout::ColMajor
        } else {
            return Err(SpmmError::layout("dense array is not contiguous"));
        };
        let data = array
            .as_slice_memory_order()
            .ok_or_else(|| SpmmError::layout("dense array is not contiguous"))?;
        Self::new(data, rows, cols, layout)
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element ordering
    pub fn layout(&self) -> DenseLayout {
        self.layout
    }

    /// Underlying buffer
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Element `(i, j)`
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[self.layout.offset(i, j, self.rows, self.cols)]
    }
}

/// Dense matrix over a mutable, caller-owned buffer
#[derive(Debug)]
pub struct DenseViewMut<'a, T> {
    data: &'a mut [T],
    rows: usize,
    cols: usize,
    layout: DenseLayout,
}

impl<'a, T: Scalar> DenseViewMut<'a, T> {
    /// Wrap a pre-allocated buffer for a `rows × cols` matrix
    pub fn new(data: &'a mut [T], rows: usize, cols: usize, layout: DenseLayout) -> Result<Self> {
        checked_len("result buffer", rows, cols, data.len())?;
        Ok(Self {
            data,
            rows,
            cols,
            layout,
        })
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element ordering
    pub fn layout(&self) -> DenseLayout {
        self.layout
    }

    /// Underlying buffer
    pub fn as_slice(&self) -> &[T] {
        &*self.data
    }

    /// Underlying buffer, mutably
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut *self.data
    }

    /// Element `(i, j)`
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[self.layout.offset(i, j, self.rows, self.cols)]
    }
}
