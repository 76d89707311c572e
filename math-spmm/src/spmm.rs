//! Sparse (CSR) times dense matrix multiplication
//!
//! Computes `result = A * B` where `A` is a `m × k` CSR matrix and `B` a
//! `k × n` dense matrix, writing into a caller-owned `m × n` buffer.
//!
//! Output rows are split into contiguous ranges, one per worker. Every
//! output element is accumulated over its sparse row in storage order, so
//! the result is bit-identical for any thread count and either layout.
//! All operands are validated before the first write: on error the result
//! buffer is left untouched.

use crate::config::SpmmConfig;
use crate::dense::{DenseLayout, DenseView, DenseViewMut};
use crate::error::{Result, SpmmError};
use crate::parallel::partition_rows;
use crate::sparse::{CsrMatrix, CsrView};
use crate::traits::{Scalar, SparseIndex};
use ndarray::{Array2, ArrayBase, Data, Ix2, ShapeBuilder};
use std::ops::Range;

/// Multiplies CSR matrices with dense matrices using a fixed number of workers
///
/// The worker pool is created once in [`SparseDenseMultiplier::new`] and
/// reused by every call to [`SparseDenseMultiplier::multiply`].
#[derive(Debug)]
pub struct SparseDenseMultiplier {
    config: SpmmConfig,
    #[cfg(feature = "rayon")]
    pool: Option<rayon::ThreadPool>,
}

impl Default for SparseDenseMultiplier {
    fn default() -> Self {
        Self::sequential()
    }
}

impl SparseDenseMultiplier {
    /// Create a multiplier from a configuration
    ///
    /// # Errors
    ///
    /// `InvalidThreadCount` if `config.thread_count` is zero, `ThreadPool` if
    /// the worker pool cannot be spawned.
    pub fn new(config: SpmmConfig) -> Result<Self> {
        if config.thread_count < 1 {
            return Err(SpmmError::InvalidThreadCount { count: 0 });
        }

        #[cfg(feature = "rayon")]
        let pool = if config.thread_count > 1 {
            log::info!("spmm: starting pool with {} workers", config.thread_count);
            Some(crate::parallel::build_pool(config.thread_count)?)
        } else {
            None
        };

        #[cfg(not(feature = "rayon"))]
        if config.thread_count > 1 {
            log::warn!(
                "spmm: rayon feature disabled, {} row blocks will run sequentially",
                config.thread_count
            );
        }

        Ok(Self {
            config,
            #[cfg(feature = "rayon")]
            pool,
        })
    }

    /// Single-threaded multiplier with row-major flat operands
    pub fn sequential() -> Self {
        Self {
            config: SpmmConfig::default(),
            #[cfg(feature = "rayon")]
            pool: None,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SpmmConfig {
        &self.config
    }

    /// Number of row blocks each product is split into
    pub fn thread_count(&self) -> usize {
        self.config.thread_count
    }

    /// Compute `result = sparse * dense`
    ///
    /// Every element of `result` is overwritten; rows of `sparse` without
    /// entries produce zero rows.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if `dense` does not have `sparse.num_cols()` rows,
    /// or `result` is not `sparse.num_rows() × dense.cols()`.
    /// `InvalidLayout` if `result` and `dense` use different layouts.
    pub fn multiply<T: Scalar, I: SparseIndex>(
        &self,
        sparse: &CsrView<'_, T, I>,
        dense: &DenseView<'_, T>,
        result: &mut DenseViewMut<'_, T>,
    ) -> Result<()> {
        check_operands(sparse, dense, result)?;

        let ranges = partition_rows(sparse.num_rows(), self.config.thread_count);
        log::debug!(
            "spmm: {}x{} (nnz {}) * {}x{} {:?} in {} row block(s)",
            sparse.num_rows(),
            sparse.num_cols(),
            sparse.nnz(),
            dense.rows(),
            dense.cols(),
            dense.layout(),
            ranges.len()
        );

        let out = result.as_mut_slice();
        match dense.layout() {
            DenseLayout::RowMajor => {
                let blocks = split_row_major(out, &ranges, dense.cols());
                let work: Vec<(Range<usize>, &mut [T])> =
                    ranges.into_iter().zip(blocks).collect();
                self.run(work, |(rows, block)| row_major_block(sparse, dense, rows, block));
            }
            DenseLayout::ColMajor => {
                let blocks = split_col_major(out, &ranges, sparse.num_rows());
                let work: Vec<(Range<usize>, Vec<&mut [T]>)> =
                    ranges.into_iter().zip(blocks).collect();
                self.run(work, |(rows, columns)| {
                    col_major_block(sparse, dense, rows, columns)
                });
            }
        }

        Ok(())
    }

    /// Compute `result = sparse * dense` on flat slices in the configured layout
    ///
    /// `dense` holds a `sparse.num_cols() × out_cols` matrix and `result`
    /// a `sparse.num_rows() × out_cols` one.
    pub fn multiply_into<T: Scalar>(
        &self,
        sparse: &CsrMatrix<T>,
        dense: &[T],
        out_cols: usize,
        result: &mut [T],
    ) -> Result<()> {
        let layout = self.config.layout;
        let dense = DenseView::new(dense, sparse.num_cols(), out_cols, layout)?;
        let mut result = DenseViewMut::new(result, sparse.num_rows(), out_cols, layout)?;
        self.multiply(&sparse.view(), &dense, &mut result)
    }

    fn run<W, F>(&self, work: Vec<W>, f: F)
    where
        W: Send,
        F: Fn(W) + Sync + Send,
    {
        #[cfg(feature = "rayon")]
        if let Some(pool) = &self.pool {
            if work.len() > 1 {
                pool.install(|| crate::parallel::parallel_for_each(work, f));
                return;
            }
        }

        work.into_iter().for_each(f);
    }
}

impl<T: Scalar> CsrMatrix<T> {
    /// Sparse-dense product returning a new ndarray matrix
    ///
    /// The result has the same memory order as `dense` (C or Fortran).
    pub fn mul_dense<S>(&self, dense: &ArrayBase<S, Ix2>) -> Result<Array2<T>>
    where
        S: Data<Elem = T>,
    {
        let dense = DenseView::from_array(dense)?;
        let shape = (self.num_rows(), dense.cols());

        let mut out = vec![T::zero(); shape.0 * shape.1];
        let mut result = DenseViewMut::new(&mut out, shape.0, shape.1, dense.layout())?;
        SparseDenseMultiplier::sequential().multiply(&self.view(), &dense, &mut result)?;

        let array = match dense.layout() {
            DenseLayout::RowMajor => Array2::from_shape_vec(shape, out),
            DenseLayout::ColMajor => Array2::from_shape_vec(shape.f(), out),
        };
        array.map_err(|e| SpmmError::layout(e.to_string()))
    }
}

/// Flat sparse-dense product over raw CSR arrays
///
/// Arguments follow the host binding's order: CSR values, column indices and
/// row offsets of the `sparse_rows × shared_dim` sparse matrix, the
/// row-major `shared_dim × output_cols` dense values, the three dimensions,
/// the pre-sized row-major `sparse_rows × output_cols` result and the number
/// of worker threads. At most `sparse_rows` workers are started, since each
/// one owns at least one output row.
///
/// # Errors
///
/// `InvalidThreadCount` if `thread_count < 1`; `DimensionMismatch` if any
/// length, offset, index or dimension is inconsistent. `result` is not
/// modified on error.
#[allow(clippy::too_many_arguments)]
pub fn spmm(
    sp_values: &[f64],
    sp_col_indices: &[i32],
    sp_row_offsets: &[i32],
    dense_values: &[f64],
    sparse_rows: i32,
    shared_dim: i32,
    output_cols: i32,
    result: &mut [f64],
    thread_count: i32,
) -> Result<()> {
    spmm_with_layout(
        sp_values,
        sp_col_indices,
        sp_row_offsets,
        dense_values,
        sparse_rows,
        shared_dim,
        output_cols,
        result,
        thread_count,
        DenseLayout::RowMajor,
    )
}

/// [`spmm`] with an explicit dense/result layout and generic element/index types
#[allow(clippy::too_many_arguments)]
pub fn spmm_with_layout<T: Scalar, I: SparseIndex>(
    sp_values: &[T],
    sp_col_indices: &[I],
    sp_row_offsets: &[I],
    dense_values: &[T],
    sparse_rows: i32,
    shared_dim: i32,
    output_cols: i32,
    result: &mut [T],
    thread_count: i32,
    layout: DenseLayout,
) -> Result<()> {
    if thread_count < 1 {
        return Err(SpmmError::InvalidThreadCount {
            count: i64::from(thread_count),
        });
    }
    let rows = dimension("sparse rows", sparse_rows)?;
    let shared = dimension("shared dimension", shared_dim)?;
    let out_cols = dimension("output columns", output_cols)?;

    let sparse = CsrView::new(rows, shared, sp_values, sp_col_indices, sp_row_offsets)?;
    let dense = DenseView::new(dense_values, shared, out_cols, layout)?;
    let mut result = DenseViewMut::new(result, rows, out_cols, layout)?;

    // One worker per row at most
    let workers = (thread_count as usize).min(rows).max(1);
    let multiplier = SparseDenseMultiplier::new(SpmmConfig {
        thread_count: workers,
        layout,
    })?;
    multiplier.multiply(&sparse, &dense, &mut result)
}

fn dimension(what: &'static str, value: i32) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| SpmmError::dimension(what, format!("must be non-negative, got {value}")))
}

fn check_operands<T: Scalar, I: SparseIndex>(
    sparse: &CsrView<'_, T, I>,
    dense: &DenseView<'_, T>,
    result: &DenseViewMut<'_, T>,
) -> Result<()> {
    if dense.rows() != sparse.num_cols() {
        return Err(SpmmError::mismatch(
            "dense rows (shared dimension)",
            sparse.num_cols(),
            dense.rows(),
        ));
    }
    if result.rows() != sparse.num_rows() {
        return Err(SpmmError::mismatch("result rows", sparse.num_rows(), result.rows()));
    }
    if result.cols() != dense.cols() {
        return Err(SpmmError::mismatch("result columns", dense.cols(), result.cols()));
    }
    if result.layout() != dense.layout() {
        return Err(SpmmError::layout(format!(
            "result layout {:?} differs from dense layout {:?}",
            result.layout(),
            dense.layout()
        )));
    }
    Ok(())
}

/// Split a row-major buffer into one contiguous block per row range
fn split_row_major<'r, T>(
    mut out: &'r mut [T],
    ranges: &[Range<usize>],
    cols: usize,
) -> Vec<&'r mut [T]> {
    let mut blocks = Vec::with_capacity(ranges.len());
    for range in ranges {
        let (head, tail) = std::mem::take(&mut out).split_at_mut(range.len() * cols);
        blocks.push(head);
        out = tail;
    }
    blocks
}

/// Split a column-major buffer into, per row range, that range's segment of every column
fn split_col_major<'r, T>(
    out: &'r mut [T],
    ranges: &[Range<usize>],
    rows: usize,
) -> Vec<Vec<&'r mut [T]>> {
    let mut blocks: Vec<Vec<&'r mut [T]>> = ranges.iter().map(|_| Vec::new()).collect();
    if rows == 0 {
        return blocks;
    }

    for mut column in out.chunks_mut(rows) {
        for (block, range) in blocks.iter_mut().zip(ranges) {
            let (head, tail) = std::mem::take(&mut column).split_at_mut(range.len());
            block.push(head);
            column = tail;
        }
    }
    blocks
}

fn row_major_block<T: Scalar, I: SparseIndex>(
    sparse: &CsrView<'_, T, I>,
    dense: &DenseView<'_, T>,
    rows: Range<usize>,
    block: &mut [T],
) {
    let cols = dense.cols();
    if cols == 0 {
        return;
    }
    let b = dense.as_slice();

    for (row, out) in rows.zip(block.chunks_exact_mut(cols)) {
        out.fill(T::zero());
        for (k, v) in sparse.row_entries(row) {
            let b_row = &b[k * cols..(k + 1) * cols];
            for (o, &bk) in out.iter_mut().zip(b_row) {
                *o += v * bk;
            }
        }
    }
}

fn col_major_block<T: Scalar, I: SparseIndex>(
    sparse: &CsrView<'_, T, I>,
    dense: &DenseView<'_, T>,
    rows: Range<usize>,
    columns: Vec<&mut [T]>,
) {
    let shared = dense.rows();
    let b = dense.as_slice();

    for (c, segment) in columns.into_iter().enumerate() {
        let b_col = &b[c * shared..(c + 1) * shared];
        for (row, out) in rows.clone().zip(segment.iter_mut()) {
            let mut acc = T::zero();
            for (k, v) in sparse.row_entries(row) {
                acc += v * b_col[k];
            }
            *out = acc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    fn sample() -> CsrMatrix<f64> {
        // [1 0 2]
        // [0 0 0]
        // [0 3 4]
        CsrMatrix::from_triplets(3, 3, vec![(0, 0, 1.0), (0, 2, 2.0), (2, 1, 3.0), (2, 2, 4.0)])
            .unwrap()
    }

    #[test]
    fn test_two_by_two_example() {
        let mut result = [0.0; 2];
        spmm(
            &[1.0, 2.0],
            &[0, 1],
            &[0, 1, 2],
            &[3.0, 4.0],
            2,
            2,
            1,
            &mut result,
            1,
        )
        .unwrap();
        assert_eq!(result, [3.0, 8.0]);
    }

    #[test]
    fn test_row_major_product() {
        let a = sample();
        let b = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]; // 3x2
        let mut out = [f64::NAN; 6];

        SparseDenseMultiplier::sequential()
            .multiply_into(&a, &b, 2, &mut out)
            .unwrap();

        assert_eq!(out, [11.0, 14.0, 0.0, 0.0, 29.0, 36.0]);
    }

    #[test]
    fn test_col_major_product() {
        let a = sample();
        let b = [1.0, 3.0, 5.0, 2.0, 4.0, 6.0]; // same 3x2 matrix, column-major
        let mut out = [f64::NAN; 6];

        let multiplier = SparseDenseMultiplier::new(SpmmConfig {
            thread_count: 2,
            layout: DenseLayout::ColMajor,
        })
        .unwrap();
        multiplier.multiply_into(&a, &b, 2, &mut out).unwrap();

        assert_eq!(out, [11.0, 0.0, 29.0, 14.0, 0.0, 36.0]);
    }

    #[test]
    fn test_layout_mismatch_rejected() {
        let a = sample();
        let b = [0.0; 6];
        let mut out = [7.0; 6];
        let dense = DenseView::new(&b, 3, 2, DenseLayout::RowMajor).unwrap();
        let mut result = DenseViewMut::new(&mut out, 3, 2, DenseLayout::ColMajor).unwrap();

        let err = SparseDenseMultiplier::sequential()
            .multiply(&a.view(), &dense, &mut result)
            .unwrap_err();
        assert!(err.is_layout_error());
        assert_eq!(out, [7.0; 6]);
    }

    #[test]
    fn test_shared_dimension_mismatch() {
        let a = sample();
        let b = [1.0; 4]; // 2x2, needs 3 rows
        let mut out = [0.0; 6];

        let err = SparseDenseMultiplier::sequential()
            .multiply_into(&a, &b, 2, &mut out)
            .unwrap_err();
        assert!(err.is_dimension_error());
    }

    #[test]
    fn test_zero_thread_config() {
        let err = SparseDenseMultiplier::new(SpmmConfig::with_threads(0)).unwrap_err();
        assert!(err.is_thread_count_error());
    }

    #[test]
    fn test_negative_dimension() {
        let mut result = [0.0; 1];
        let err = spmm(&[], &[], &[0], &[], -1, 1, 1, &mut result, 1).unwrap_err();
        assert!(matches!(
            err,
            SpmmError::DimensionMismatch {
                what: "sparse rows",
                ..
            }
        ));
        assert_eq!(result, [0.0]);
    }

    #[test]
    fn test_thread_count_far_above_rows() {
        let mut result = [f64::NAN; 2];
        spmm(
            &[1.0, 2.0],
            &[0, 1],
            &[0, 1, 2],
            &[3.0, 4.0],
            2,
            2,
            1,
            &mut result,
            i32::MAX,
        )
        .unwrap();
        assert_eq!(result, [3.0, 8.0]);

        let mut empty: [f64; 0] = [];
        spmm(&[], &[], &[0], &[], 0, 0, 0, &mut empty, 50_000).unwrap();
    }

    #[test]
    fn test_empty_matrices() {
        let a: CsrMatrix<f64> = CsrMatrix::new(0, 3);
        let mut out: [f64; 0] = [];
        SparseDenseMultiplier::new(SpmmConfig::with_threads(4))
            .unwrap()
            .multiply_into(&a, &[1.0; 6], 2, &mut out)
            .unwrap();

        let a: CsrMatrix<f64> = CsrMatrix::identity(3);
        let mut out: [f64; 0] = [];
        SparseDenseMultiplier::sequential()
            .multiply_into(&a, &[], 0, &mut out)
            .unwrap();
    }

    #[test]
    fn test_duplicate_columns_accumulate() {
        let values = [1.0, 2.0];
        let cols = [0usize, 0];
        let ptrs = [0usize, 2];
        let sparse = CsrView::new(1, 1, &values, &cols, &ptrs).unwrap();
        let b = [5.0];
        let dense = DenseView::new(&b, 1, 1, DenseLayout::RowMajor).unwrap();
        let mut out = [0.0];
        let mut result = DenseViewMut::new(&mut out, 1, 1, DenseLayout::RowMajor).unwrap();

        SparseDenseMultiplier::sequential()
            .multiply(&sparse, &dense, &mut result)
            .unwrap();
        assert_eq!(out, [15.0]);
    }

    #[test]
    fn test_mul_dense_ndarray() {
        let a = sample();
        let b = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let c = a.mul_dense(&b).unwrap();

        assert_eq!(c, array![[11.0, 14.0], [0.0, 0.0], [29.0, 36.0]]);

        let b_f =
            Array2::from_shape_vec((3, 2).f(), vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]).unwrap();
        let c_f = a.mul_dense(&b_f).unwrap();
        assert_eq!(c_f, c);
        assert!(!c_f.is_standard_layout());
    }

    #[test]
    fn test_complex_product() {
        let a = CsrMatrix::from_triplets(
            2,
            2,
            vec![(0, 1, Complex64::new(0.0, 1.0)), (1, 0, Complex64::new(2.0, 0.0))],
        )
        .unwrap();
        let b = array![[Complex64::new(1.0, 1.0)], [Complex64::new(3.0, 0.0)]];

        let c = a.mul_dense(&b).unwrap();
        assert_relative_eq!(c[[0, 0]].re, 0.0);
        assert_relative_eq!(c[[0, 0]].im, 3.0);
        assert_relative_eq!(c[[1, 0]].re, 2.0);
        assert_relative_eq!(c[[1, 0]].im, 2.0);
    }

    #[test]
    fn test_split_col_major_segments() {
        let mut buf: Vec<usize> = (0..8).collect(); // 4 rows x 2 cols
        let ranges = partition_rows(4, 3); // 0..2, 2..3, 3..4
        let blocks = split_col_major(&mut buf, &ranges, 4);

        assert_eq!(blocks.len(), 3);
        assert_eq!(&*blocks[0][0], &[0, 1]);
        assert_eq!(&*blocks[0][1], &[4, 5]);
        assert_eq!(&*blocks[1][0], &[2]);
        assert_eq!(&*blocks[2][1], &[7]);
    }
}
