//! Core data structures for eigensys.
//!
//! This crate provides the pieces an eigenvalue system is built on:
//!
//! - [`DofMap`] - degree-of-freedom layout and sparsity pattern
//! - [`SparseMatrix`] - assembled operator storage backed by faer CSC matrices
//! - [`ShellMatrix`] - matrix-free operator slot
//! - [`LinearOperator`] - the action `y = A * x` shared by both forms
//! - [`System`] - base system owning the DOF layout and the solution buffer

pub mod dof_map;
pub mod error;
pub mod operator;
pub mod shell_matrix;
pub mod sparse_matrix;
pub mod system;

pub use dof_map::DofMap;
pub use error::{Error, Result};
pub use operator::{DiagonalOperator, JacobiOperator, LinearOperator, to_dense};
pub use shell_matrix::ShellMatrix;
pub use sparse_matrix::{MatrixBuildType, ParallelType, SparseMatrix};
pub use system::System;
