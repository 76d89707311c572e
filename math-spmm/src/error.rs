//! Error types for sparse-dense multiplication.
//!
//! All shape checks run before the kernel touches the output buffer, so any
//! error returned here guarantees the result buffer was left unmodified.

use thiserror::Error;

/// Errors that can occur while validating or running a sparse-dense product.
#[derive(Debug, Error)]
pub enum SpmmError {
    /// An operand violates a shape, length or CSR storage invariant.
    ///
    /// Covers buffer lengths, negative dimensions, row offsets that do not
    /// start at zero or decrease, and column indices outside the matrix.
    #[error("dimension mismatch for {what}: {reason}")]
    DimensionMismatch {
        /// Which buffer or dimension is inconsistent
        what: &'static str,
        /// What was expected and what was found
        reason: String,
    },

    /// Dense operands are well sized but stored in incompatible orders.
    #[error("invalid dense layout: {reason}")]
    InvalidLayout {
        /// Human readable description of the layout problem
        reason: String,
    },

    /// The requested number of worker threads is below one.
    #[error("invalid thread count: {count} (must be >= 1)")]
    InvalidThreadCount {
        /// The rejected thread count
        count: i64,
    },

    /// The dedicated worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// A configuration file could not be read, written or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A specialized `Result` type for SpMM operations.
pub type Result<T> = std::result::Result<T, SpmmError>;

impl SpmmError {
    /// Length or size `got` where `expected` was required
    pub(crate) fn mismatch(what: &'static str, expected: usize, got: usize) -> Self {
        SpmmError::DimensionMismatch {
            what,
            reason: format!("expected {expected}, got {got}"),
        }
    }

    pub(crate) fn dimension(what: &'static str, reason: impl Into<String>) -> Self {
        SpmmError::DimensionMismatch {
            what,
            reason: reason.into(),
        }
    }

    pub(crate) fn layout(reason: impl Into<String>) -> Self {
        SpmmError::InvalidLayout {
            reason: reason.into(),
        }
    }

    /// Returns `true` if an operand's shape or storage invariants were violated.
    pub fn is_dimension_error(&self) -> bool {
        matches!(self, SpmmError::DimensionMismatch { .. })
    }

    /// Returns `true` if dense operands use unsupported or mismatched layouts.
    pub fn is_layout_error(&self) -> bool {
        matches!(self, SpmmError::InvalidLayout { .. })
    }

    /// Returns `true` if this is a thread count error.
    pub fn is_thread_count_error(&self) -> bool {
        matches!(self, SpmmError::InvalidThreadCount { .. })
    }

    /// Returns `true` if this is a configuration or worker pool error.
    pub fn is_config_error(&self) -> bool {
        matches!(self, SpmmError::Config(_) | SpmmError::ThreadPool(_))
    }
}
