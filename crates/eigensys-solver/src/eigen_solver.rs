//! The eigen solver contract.

use eigensys_core::LinearOperator;
use nalgebra::DVector;

use crate::error::Result;
use crate::types::{EigenProblemType, EigenSolverParams, PositionOfSpectrum, SolveData};

/// An eigen solver backend.
///
/// A solve computes and stores a set of converged eigenpairs, indexed from 0
/// in the order given by the position of spectrum. Fewer converged pairs than
/// requested is a normal outcome reported through [`SolveData::n_converged`],
/// not an error.
pub trait EigenSolver: Send {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Set the problem type of subsequent solves.
    fn set_eigenproblem_type(&mut self, problem_type: EigenProblemType);

    /// Current problem type.
    fn eigenproblem_type(&self) -> EigenProblemType;

    /// Select which eigenvalues to compute.
    fn set_position_of_spectrum(&mut self, position: PositionOfSpectrum);

    /// Current spectrum selection.
    fn position_of_spectrum(&self) -> PositionOfSpectrum;

    /// Provide a starting vector for subsequent solves.
    ///
    /// It stays in effect until replaced. Its dimension is checked when the
    /// solve runs.
    fn set_initial_space(&mut self, initial_space: DVector<f64>);

    /// Solve the standard problem A*x = lambda*x.
    fn solve_standard(
        &mut self,
        matrix_a: &dyn LinearOperator,
        precond: Option<&dyn LinearOperator>,
        params: &EigenSolverParams,
    ) -> Result<SolveData>;

    /// Solve the generalized problem A*x = lambda*B*x.
    fn solve_generalized(
        &mut self,
        matrix_a: &dyn LinearOperator,
        matrix_b: &dyn LinearOperator,
        precond: Option<&dyn LinearOperator>,
        params: &EigenSolverParams,
    ) -> Result<SolveData>;

    /// Eigenvalue `i` as `(real, imag)`, copying its eigenvector into `solution`.
    fn eigenpair(&self, i: usize, solution: &mut DVector<f64>) -> Result<(f64, f64)>;

    /// Eigenvalue `i` as `(real, imag)`.
    fn eigenvalue(&self, i: usize) -> Result<(f64, f64)>;

    /// Discard stored results. The initial space is kept.
    fn clear(&mut self);
}
