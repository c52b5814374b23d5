//! Assembled sparse matrices.
//!
//! Entries are accumulated as `(row, col, value)` triplets during assembly and
//! compressed into a faer `SparseColMat<usize, f64>` on [`SparseMatrix::close`].
//! Duplicate entries at the same position are summed.

use faer::sparse::{SparseColMat, Triplet};
use nalgebra::DMatrix;

use crate::dof_map::DofMap;
use crate::error::{Error, Result};
use crate::operator::LinearOperator;

/// Distribution of a matrix across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParallelType {
    /// Every process holds the whole matrix.
    Serial,
    /// Rows are distributed over processes.
    #[default]
    Parallel,
    /// Distributed with ghost rows.
    Ghosted,
}

/// Storage layout requested for a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixBuildType {
    /// General sparse storage following the DOF sparsity pattern.
    #[default]
    Automatic,
    /// Diagonal-only storage.
    Diagonal,
}

/// Assembled sparse matrix sized by a [`DofMap`].
pub struct SparseMatrix {
    size: usize,
    parallel_type: ParallelType,
    build_type: MatrixBuildType,
    initialized: bool,
    entries: Vec<(usize, usize, f64)>,
    compressed: Option<SparseColMat<usize, f64>>,
}

impl std::fmt::Debug for SparseMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseMatrix")
            .field("size", &self.size)
            .field("parallel_type", &self.parallel_type)
            .field("build_type", &self.build_type)
            .field("initialized", &self.initialized)
            .field("entries", &self.entries.len())
            .field("closed", &self.closed())
            .finish()
    }
}

impl Default for SparseMatrix {
    fn default() -> Self {
        Self::new(ParallelType::default(), MatrixBuildType::default())
    }
}

impl SparseMatrix {
    /// Create an uninitialized matrix.
    pub fn new(parallel_type: ParallelType, build_type: MatrixBuildType) -> Self {
        Self {
            size: 0,
            parallel_type,
            build_type,
            initialized: false,
            entries: Vec::new(),
            compressed: None,
        }
    }

    /// Create a matrix and initialize it to the given layout.
    pub fn with_layout(
        dof_map: &DofMap,
        parallel_type: ParallelType,
        build_type: MatrixBuildType,
    ) -> Self {
        let mut matrix = Self::new(parallel_type, build_type);
        matrix.init(dof_map);
        matrix
    }

    /// Size the matrix to the layout, discarding all entries.
    pub fn init(&mut self, dof_map: &DofMap) {
        self.size = dof_map.n_dofs();
        let capacity = match self.build_type {
            MatrixBuildType::Automatic => dof_map.n_nonzeros(),
            MatrixBuildType::Diagonal => self.size,
        };
        self.entries = Vec::with_capacity(capacity);
        self.compressed = None;
        self.initialized = true;
    }

    /// Release all storage and return to the uninitialized state.
    pub fn clear(&mut self) {
        self.size = 0;
        self.entries = Vec::new();
        self.compressed = None;
        self.initialized = false;
    }

    /// Whether [`init`](SparseMatrix::init) has been called since the last clear.
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the compressed form is up to date.
    pub fn closed(&self) -> bool {
        self.compressed.is_some()
    }

    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of stored triplets (duplicates counted separately).
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Distribution tag.
    pub fn parallel_type(&self) -> ParallelType {
        self.parallel_type
    }

    /// Storage layout tag.
    pub fn build_type(&self) -> MatrixBuildType {
        self.build_type
    }

    /// Add `value` to entry `(row, col)`.
    pub fn add(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        if row >= self.size || col >= self.size {
            return Err(Error::EntryOutOfBounds {
                row,
                col,
                size: self.size,
            });
        }
        if self.build_type == MatrixBuildType::Diagonal && row != col {
            return Err(Error::OffDiagonalEntry { row, col });
        }

        self.entries.push((row, col, value));
        self.compressed = None;
        Ok(())
    }

    /// Remove all entries, keeping the size.
    pub fn zero(&mut self) {
        self.entries.clear();
        self.compressed = None;
    }

    /// Compress the accumulated triplets.
    pub fn close(&mut self) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        let faer_triplets: Vec<_> = self
            .entries
            .iter()
            .map(|&(r, c, v)| Triplet::new(r, c, v))
            .collect();

        let matrix =
            SparseColMat::<usize, f64>::try_new_from_triplets(self.size, self.size, &faer_triplets)
                .map_err(|e| Error::Construction(format!("{e:?}")))?;

        self.compressed = Some(matrix);
        Ok(())
    }

    /// Value of entry `(row, col)`, zero if not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.entries
            .iter()
            .filter(|&&(r, c, _)| r == row && c == col)
            .map(|&(_, _, v)| v)
            .sum()
    }

    /// Dense copy of the matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.size, self.size);
        for &(r, c, v) in &self.entries {
            dense[(r, c)] += v;
        }
        dense
    }
}

impl LinearOperator for SparseMatrix {
    fn dim(&self) -> usize {
        self.size
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        let n = self.size;
        assert_eq!(x.len(), n);
        assert_eq!(y.len(), n);

        y.iter_mut().for_each(|yi| *yi = 0.0);

        let Some(matrix) = &self.compressed else {
            for &(i, j, aij) in &self.entries {
                y[i] += aij * x[j];
            }
            return;
        };

        // CSC matrix-vector multiplication: y = A * x
        // For each column j, add A[:, j] * x[j] to y
        let mat_ref = matrix.as_ref();
        let col_ptrs = mat_ref.col_ptr();
        let row_indices = mat_ref.row_idx();
        let values = mat_ref.val();

        for j in 0..n {
            let xj = x[j];
            for idx in col_ptrs[j]..col_ptrs[j + 1] {
                y[row_indices[idx]] += values[idx] * xj;
            }
        }
    }

    fn diagonal(&self) -> Option<Vec<f64>> {
        let mut diag = vec![0.0; self.size];
        for &(r, c, v) in &self.entries {
            if r == c {
                diag[r] += v;
            }
        }
        Some(diag)
    }
}
