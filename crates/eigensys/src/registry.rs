//! Named auxiliary matrices.

use eigensys_core::{DofMap, MatrixBuildType, ParallelType, SparseMatrix};
use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::error::{EigenSystemError, Result};

/// Owning registry of named matrices that do not take part in the solve.
///
/// Names are unique; registering an existing name is an error. Matrices are
/// kept in registration order.
#[derive(Debug, Default)]
pub struct MatrixRegistry {
    matrices: IndexMap<String, SparseMatrix>,
}

impl MatrixRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register and allocate a matrix sized by the layout.
    pub fn add(
        &mut self,
        name: &str,
        dof_map: &DofMap,
        parallel_type: ParallelType,
        build_type: MatrixBuildType,
    ) -> Result<&mut SparseMatrix> {
        match self.matrices.entry(name.to_string()) {
            Entry::Occupied(_) => Err(EigenSystemError::DuplicateName(name.to_string())),
            Entry::Vacant(slot) => {
                log::debug!("Registered auxiliary matrix '{}'", name);
                Ok(slot.insert(SparseMatrix::with_layout(
                    dof_map,
                    parallel_type,
                    build_type,
                )))
            }
        }
    }

    /// Whether a matrix with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.matrices.contains_key(name)
    }

    /// Matrix registered under `name`.
    pub fn get(&self, name: &str) -> Result<&SparseMatrix> {
        self.matrices
            .get(name)
            .ok_or_else(|| EigenSystemError::NotFound(name.to_string()))
    }

    /// Mutable matrix registered under `name`.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut SparseMatrix> {
        self.matrices
            .get_mut(name)
            .ok_or_else(|| EigenSystemError::NotFound(name.to_string()))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.matrices.keys().map(String::as_str)
    }

    /// Number of registered matrices.
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    /// Re-size every matrix to a new layout, discarding entries.
    pub fn reinit(&mut self, dof_map: &DofMap) {
        for matrix in self.matrices.values_mut() {
            matrix.init(dof_map);
        }
    }

    /// Drop every matrix.
    pub fn clear(&mut self) {
        self.matrices.clear();
    }
}
