//! Eigen solvers for eigensys.
//!
//! The [`EigenSolver`] trait is the contract an eigenvalue system dispatches
//! to. [`DenseEigenSolver`] is a reference backend for small problems that
//! materializes the operators and uses dense decompositions.
//!
//! # Module Structure
//!
//! - [`types`] - Problem types, spectrum selection and solver parameters
//! - [`eigen_solver`] - The solver trait
//! - [`dense`] - Dense reference backend

pub mod dense;
pub mod eigen_solver;
pub mod error;
pub mod types;

pub use dense::DenseEigenSolver;
pub use eigen_solver::EigenSolver;
pub use error::{Error, Result};
pub use types::{EigenProblemType, EigenSolverParams, PositionOfSpectrum, SolveData};
