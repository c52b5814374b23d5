//! Degree-of-freedom layout.
//!
//! The [`DofMap`] is the only thing matrices need to know about the
//! discretization: how many unknowns there are, which of them are local, and
//! which pairs of unknowns couple (the sparsity pattern).

use std::collections::BTreeSet;

/// Degree-of-freedom layout and coupling graph of a system.
#[derive(Debug, Clone, Default)]
pub struct DofMap {
    n_dofs: usize,
    /// Off-diagonal couplings per row.
    couplings: Vec<BTreeSet<usize>>,
}

impl DofMap {
    /// Create a layout with `n_dofs` uncoupled unknowns.
    pub fn new(n_dofs: usize) -> Self {
        Self {
            n_dofs,
            couplings: vec![BTreeSet::new(); n_dofs],
        }
    }

    /// Create a layout with nearest-neighbour couplings (a banded pattern).
    pub fn banded(n_dofs: usize, half_bandwidth: usize) -> Self {
        let mut map = Self::new(n_dofs);
        for i in 0..n_dofs {
            for offset in 1..=half_bandwidth {
                if i + offset < n_dofs {
                    map.couplings[i].insert(i + offset);
                    map.couplings[i + offset].insert(i);
                }
            }
        }
        map
    }

    /// Number of degrees of freedom.
    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    /// Half-open range of DOFs owned by this process.
    ///
    /// Only a single process is supported, so this is always `0..n_dofs`.
    pub fn local_range(&self) -> std::ops::Range<usize> {
        0..self.n_dofs
    }

    /// Record that DOFs `i` and `j` couple. Out-of-range pairs are ignored.
    pub fn add_coupling(&mut self, i: usize, j: usize) {
        if i >= self.n_dofs || j >= self.n_dofs || i == j {
            return;
        }
        self.couplings[i].insert(j);
        self.couplings[j].insert(i);
    }

    /// Change the number of DOFs, dropping the coupling graph.
    pub fn resize(&mut self, n_dofs: usize) {
        log::debug!("DOF layout resized from {} to {}", self.n_dofs, n_dofs);
        self.n_dofs = n_dofs;
        self.couplings = vec![BTreeSet::new(); n_dofs];
    }

    /// Total number of pattern entries, diagonal included.
    ///
    /// Used to preallocate assembled matrices.
    pub fn n_nonzeros(&self) -> usize {
        self.couplings.iter().map(|c| c.len() + 1).sum()
    }
}
