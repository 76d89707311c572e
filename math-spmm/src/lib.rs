//! Sparse (CSR) times dense matrix multiplication
//!
//! This crate computes `C = A * B` where `A` is stored in Compressed Sparse
//! Row format and `B`, `C` are dense matrices in row-major or column-major
//! order. The output buffer is owned by the caller and is only written after
//! every operand has been validated.
//!
//! # Features
//!
//! - **Typed CSR operands**: owned [`CsrMatrix`] or borrowed [`CsrView`] with
//!   `usize`, `u32`, `i32` or `i64` indices
//! - **Dense layouts**: [`DenseLayout::RowMajor`] and [`DenseLayout::ColMajor`]
//! - **Row-parallel workers**: deterministic results for any thread count
//!   (rayon, behind the default `rayon` feature)
//! - **Generic Scalar Types**: Works with f64, f32, Complex64, Complex32
//!
//! # Example
//!
//! ```
//! use math_audio_spmm::{CsrMatrix, SparseDenseMultiplier, SpmmConfig};
//!
//! // [1 0]
//! // [0 2]
//! let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 1, 2.0)])?;
//! let b = [3.0, 4.0]; // 2x1, row-major
//! let mut c = [0.0; 2];
//!
//! let multiplier = SparseDenseMultiplier::new(SpmmConfig::with_threads(2))?;
//! multiplier.multiply_into(&a, &b, 1, &mut c)?;
//! assert_eq!(c, [3.0, 8.0]);
//! # Ok::<(), math_audio_spmm::SpmmError>(())
//! ```

pub mod config;
pub mod dense;
pub mod error;
pub mod parallel;
pub mod sparse;
pub mod spmm;
pub mod testdata;
pub mod traits;

// Re-export main types
pub use config::SpmmConfig;
pub use dense::{DenseLayout, DenseView, DenseViewMut};
pub use error::{Result, SpmmError};
pub use sparse::{CsrBuilder, CsrMatrix, CsrView};
pub use spmm::{SparseDenseMultiplier, spmm, spmm_with_layout};
pub use traits::{Scalar, SparseIndex};
