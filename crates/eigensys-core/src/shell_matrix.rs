//! Matrix-free operator slots.

use crate::dof_map::DofMap;
use crate::error::{Error, Result};
use crate::operator::LinearOperator;

/// A matrix represented only by its action.
///
/// The slot is sized by the DOF layout when it is allocated; the actual
/// operator is attached later (typically during assembly).
pub struct ShellMatrix {
    size: usize,
    operator: Option<Box<dyn LinearOperator>>,
}

impl std::fmt::Debug for ShellMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellMatrix")
            .field("size", &self.size)
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl ShellMatrix {
    /// Create an empty slot of the given size.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            operator: None,
        }
    }

    /// Create an empty slot sized by the layout.
    pub fn with_layout(dof_map: &DofMap) -> Self {
        Self::new(dof_map.n_dofs())
    }

    /// Slot size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Attach the operator providing the action of this matrix.
    pub fn attach(&mut self, operator: Box<dyn LinearOperator>) -> Result<()> {
        if operator.dim() != self.size {
            return Err(Error::DimensionMismatch {
                expected: self.size,
                actual: operator.dim(),
            });
        }
        self.operator = Some(operator);
        Ok(())
    }

    /// Whether an operator is attached.
    pub fn is_attached(&self) -> bool {
        self.operator.is_some()
    }

    /// The attached operator.
    pub fn operator(&self) -> Result<&dyn LinearOperator> {
        self.operator.as_deref().ok_or(Error::ShellNotAttached)
    }
}
