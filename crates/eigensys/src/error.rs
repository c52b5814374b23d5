//! Error types for eigenvalue systems.

use thiserror::Error;

/// Errors raised by [`EigenSystem`](crate::EigenSystem) operations.
#[derive(Debug, Error)]
pub enum EigenSystemError {
    /// Invalid combination of problem type, shell flags and slot state.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An auxiliary matrix with this name already exists.
    #[error("Matrix '{0}' is already registered")]
    DuplicateName(String),

    /// No auxiliary matrix with this name.
    #[error("No matrix named '{0}'")]
    NotFound(String),

    /// Eigenpair index at or beyond the converged count.
    #[error("Eigenpair index {index} out of range ({n_converged} converged)")]
    IndexOutOfRange { index: usize, n_converged: usize },

    /// Failure reported by the eigen solver.
    #[error("Eigen solver failure: {0}")]
    SolverFailure(#[from] eigensys_solver::Error),

    /// Matrix or layout error.
    #[error("Matrix error: {0}")]
    Core(#[from] eigensys_core::Error),
}

/// Result type for eigenvalue system operations.
pub type Result<T> = std::result::Result<T, EigenSystemError>;
