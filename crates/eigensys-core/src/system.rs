//! Base system: DOF layout plus solution buffer.

use nalgebra::DVector;

use crate::dof_map::DofMap;

/// The base every specialized system extends.
///
/// Owns the degree-of-freedom layout that matrices are sized from and the
/// solution vector that eigenvectors are copied into.
#[derive(Debug, Clone)]
pub struct System {
    name: String,
    number: u32,
    dof_map: DofMap,
    solution: DVector<f64>,
}

impl System {
    /// Create a system with the given layout and a zero solution.
    pub fn new(name: impl Into<String>, number: u32, dof_map: DofMap) -> Self {
        let solution = DVector::zeros(dof_map.n_dofs());
        Self {
            name: name.into(),
            number,
            dof_map,
            solution,
        }
    }

    /// System name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// System number within its owner.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// DOF layout.
    pub fn dof_map(&self) -> &DofMap {
        &self.dof_map
    }

    /// Mutable DOF layout, e.g. to record refinement.
    ///
    /// Call [`reinit`](System::reinit) (or the owning system's `reinit`)
    /// after changing it.
    pub fn dof_map_mut(&mut self) -> &mut DofMap {
        &mut self.dof_map
    }

    /// Replace the DOF layout.
    pub fn set_dof_map(&mut self, dof_map: DofMap) {
        self.dof_map = dof_map;
    }

    /// Number of degrees of freedom.
    pub fn n_dofs(&self) -> usize {
        self.dof_map.n_dofs()
    }

    /// Solution buffer.
    pub fn solution(&self) -> &DVector<f64> {
        &self.solution
    }

    /// Mutable solution buffer.
    pub fn solution_mut(&mut self) -> &mut DVector<f64> {
        &mut self.solution
    }

    /// Resize the solution buffer to the current layout.
    ///
    /// The buffer is zeroed when its size changes.
    pub fn reinit(&mut self) {
        let n = self.dof_map.n_dofs();
        if self.solution.len() != n {
            self.solution = DVector::zeros(n);
        }
    }

    /// Zero the solution buffer.
    pub fn clear(&mut self) {
        self.solution.fill(0.0);
    }
}
