//! Sparse matrix structures (CSR format)
//!
//! This module provides the owned [`CsrMatrix`] and the borrowed [`CsrView`]
//! used as the left operand of the sparse-dense product.

mod csr;
mod view;

pub use csr::{CsrBuilder, CsrMatrix};
pub use view::CsrView;
