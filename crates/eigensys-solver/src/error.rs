//! Error types for eigen solvers.

use thiserror::Error;

/// Errors reported by eigen solvers.
#[derive(Debug, Error)]
pub enum Error {
    /// Operator, vector or preconditioner dimensions disagree.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Solver parameters are inconsistent.
    #[error("Invalid solver parameters: {0}")]
    InvalidParameters(String),

    /// The problem type does not fit the requested solve.
    #[error("Problem type {problem_type} cannot be solved as a {form} problem")]
    ProblemTypeMismatch {
        problem_type: &'static str,
        form: &'static str,
    },

    /// B matrix is singular.
    #[error("Singular matrix")]
    SingularMatrix,

    /// B matrix of a GHEP problem is not positive definite.
    #[error("Matrix B is not positive definite")]
    NotPositiveDefinite,

    /// Eigenpair index beyond the stored results.
    #[error("Eigenpair index {index} out of range ({available} available)")]
    IndexOutOfRange { index: usize, available: usize },

    /// Error from matrices or operators.
    #[error("Core error: {0}")]
    Core(#[from] eigensys_core::Error),
}

/// Result type for solver operations.
pub type Result<T> = std::result::Result<T, Error>;
