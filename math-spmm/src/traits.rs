//! Core traits for the sparse-dense product
//!
//! - [`Scalar`]: element types stored in sparse and dense operands
//! - [`SparseIndex`]: integer types usable for CSR column indices and row offsets

use num_complex::{Complex32, Complex64};
use num_traits::{Float, FromPrimitive, NumAssign, ToPrimitive, Zero};
use std::fmt::Debug;

/// Trait for element types of the sparse and dense operands.
///
/// Abstracts over real and complex numbers so the same kernel serves
/// `f64`/`f32` systems and complex-valued (e.g. frequency domain) ones.
///
/// # Implementations
///
/// Provided for `f64`, `f32`, `Complex64` and `Complex32`.
pub trait Scalar: NumAssign + Clone + Copy + Send + Sync + Debug + Zero + 'static {
    /// The real number type underlying this scalar
    type Real: Float + NumAssign + FromPrimitive + ToPrimitive + Send + Sync + Debug + 'static;

    /// Magnitude |z|
    fn norm(&self) -> Self::Real;
}

impl Scalar for Complex64 {
    type Real = f64;

    #[inline]
    fn norm(&self) -> f64 {
        Complex64::norm(*self)
    }
}

impl Scalar for Complex32 {
    type Real = f32;

    #[inline]
    fn norm(&self) -> f32 {
        Complex32::norm(*self)
    }
}

impl Scalar for f64 {
    type Real = f64;

    #[inline]
    fn norm(&self) -> f64 {
        self.abs()
    }
}

impl Scalar for f32 {
    type Real = f32;

    #[inline]
    fn norm(&self) -> f32 {
        self.abs()
    }
}

/// Integer type used for CSR column indices and row offsets.
///
/// Host environments commonly hand over 32-bit signed indices, so borrowed
/// CSR views accept them directly instead of requiring a copy into `usize`.
pub trait SparseIndex: Copy + Send + Sync + Debug + 'static {
    /// Convert to `usize`, returning `None` for negative or unrepresentable values
    fn try_to_usize(self) -> Option<usize>;

    /// Convert to `usize` for a value already checked by [`SparseIndex::try_to_usize`]
    fn to_usize(self) -> usize;
}

macro_rules! impl_sparse_index {
    ($($ty:ty),*) => {
        $(
            impl SparseIndex for $ty {
                #[inline]
                fn try_to_usize(self) -> Option<usize> {
                    usize::try_from(self).ok()
                }

                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_sparse_index!(usize, u32, u64, i32, i64);
