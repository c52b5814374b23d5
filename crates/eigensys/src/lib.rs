//! Eigenvalue systems.
//!
//! [`EigenSystem`] manages the matrices of a standard (`A*x = lambda*x`) or
//! generalized (`A*x = lambda*B*x`) eigenvalue problem on top of a base
//! [`System`]: it allocates assembled or matrix-free operator slots from the
//! DOF layout, lets an [`EigenAssembly`] fill them, dispatches the solve to an
//! [`EigenSolver`] and records how many eigenpairs converged.
//!
//! ```ignore
//! use eigensys::{DenseEigenSolver, DofMap, EigenSystem};
//!
//! let mut system = EigenSystem::new("modes", 0, DofMap::banded(99, 1), Box::new(DenseEigenSolver::new()))
//!     .with_assembly(Box::new(my_assembly));
//! system.init()?;
//! system.solve()?;
//! for i in 0..system.get_n_converged() {
//!     let (re, im) = system.get_eigenpair(i)?;
//! }
//! ```

pub mod assembly;
pub mod error;
pub mod registry;
pub mod system;

pub use assembly::{EigenAssembly, Operators, PrecondSlot};
pub use error::{EigenSystemError, Result};
pub use registry::MatrixRegistry;
pub use system::EigenSystem;

pub use eigensys_core::{
    DofMap, LinearOperator, MatrixBuildType, ParallelType, ShellMatrix, SparseMatrix, System,
};
pub use eigensys_solver::{
    DenseEigenSolver, EigenProblemType, EigenSolver, EigenSolverParams, PositionOfSpectrum,
    SolveData,
};
