//! Error types for matrix and layout operations.

use thiserror::Error;

/// Errors raised by matrices, operators and the DOF layout.
#[derive(Debug, Error)]
pub enum Error {
    /// Vector or operator dimension does not match the layout.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Entry lies outside the matrix.
    #[error("Entry ({row}, {col}) is outside a {size}x{size} matrix")]
    EntryOutOfBounds { row: usize, col: usize, size: usize },

    /// Matrix was used before `init`.
    #[error("Matrix has not been initialized")]
    NotInitialized,

    /// Diagonal matrices only store diagonal entries.
    #[error("Diagonal matrix cannot hold off-diagonal entry ({row}, {col})")]
    OffDiagonalEntry { row: usize, col: usize },

    /// Shell matrix has no operator attached.
    #[error("Shell matrix has no attached operator")]
    ShellNotAttached,

    /// faer rejected the triplet set.
    #[error("Sparse matrix construction failed: {0}")]
    Construction(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
