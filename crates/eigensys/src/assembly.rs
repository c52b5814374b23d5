//! Problem-specific operator assembly.
//!
//! An [`EigenAssembly`] is attached to an [`EigenSystem`](crate::EigenSystem)
//! at construction and fills the operator slots whenever the system
//! assembles. The slots are handed over as [`Operators`], which reflects the
//! configured form: assembled sparse matrices, or shell slots to which
//! matrix-free operators are attached.

use eigensys_core::{DofMap, ShellMatrix, SparseMatrix};
use eigensys_solver::EigenProblemType;

use crate::error::Result;

/// Preconditioner slot in shell mode.
pub enum PrecondSlot<'a> {
    /// Assembled preconditioning matrix.
    Assembled(&'a mut SparseMatrix),
    /// Matrix-free preconditioner.
    Shell(&'a mut ShellMatrix),
}

/// Operator slots to be filled by an assembly.
pub enum Operators<'a> {
    /// Assembled form. Matrices are zeroed before and closed after the fill.
    Assembled {
        matrix_a: &'a mut SparseMatrix,
        /// Present iff the problem is generalized.
        matrix_b: Option<&'a mut SparseMatrix>,
    },
    /// Matrix-free form.
    Shell {
        shell_a: &'a mut ShellMatrix,
        /// Present iff the problem is generalized.
        shell_b: Option<&'a mut ShellMatrix>,
        precond: PrecondSlot<'a>,
    },
}

impl Operators<'_> {
    /// Whether the slots are matrix-free.
    pub fn is_shell(&self) -> bool {
        matches!(self, Operators::Shell { .. })
    }

    /// Whether a B slot is present.
    pub fn is_generalized(&self) -> bool {
        match self {
            Operators::Assembled { matrix_b, .. } => matrix_b.is_some(),
            Operators::Shell { shell_b, .. } => shell_b.is_some(),
        }
    }
}

/// Fills the operators of a specific eigenvalue problem.
pub trait EigenAssembly: Send {
    /// The problem type this assembly discretizes.
    ///
    /// Used to configure the system when the assembly is attached.
    fn problem_type(&self) -> EigenProblemType;

    /// Fill A (and B for generalized problems) for the given layout.
    fn fill_operators(&self, dof_map: &DofMap, operators: Operators<'_>) -> Result<()>;
}
