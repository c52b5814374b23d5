//! Linear operator abstraction.
//!
//! Both assembled and matrix-free ("shell") matrices are consumed by eigen
//! solvers through [`LinearOperator`], which only exposes the action
//! `y = A * x`.

use nalgebra::DMatrix;

/// A square real linear operator.
pub trait LinearOperator: Send + Sync {
    /// Dimension of the operator.
    fn dim(&self) -> usize;

    /// Apply the operator: y = A * x.
    ///
    /// `x` and `y` must both have length [`dim`](LinearOperator::dim).
    fn apply(&self, x: &[f64], y: &mut [f64]);

    /// Diagonal of the operator, if cheaply available.
    fn diagonal(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Materialize an operator as a dense matrix by applying it to unit vectors.
pub fn to_dense(op: &dyn LinearOperator) -> DMatrix<f64> {
    let n = op.dim();
    let mut dense = DMatrix::zeros(n, n);
    let mut unit = vec![0.0; n];
    let mut column = vec![0.0; n];

    for j in 0..n {
        unit[j] = 1.0;
        op.apply(&unit, &mut column);
        unit[j] = 0.0;
        for (i, &v) in column.iter().enumerate() {
            dense[(i, j)] = v;
        }
    }

    dense
}

/// Diagonal operator y = diag(d) * x.
#[derive(Debug, Clone)]
pub struct DiagonalOperator {
    diag: Vec<f64>,
}

impl DiagonalOperator {
    /// Create from the diagonal entries.
    pub fn new(diag: Vec<f64>) -> Self {
        Self { diag }
    }
}

impl LinearOperator for DiagonalOperator {
    fn dim(&self) -> usize {
        self.diag.len()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.diag.len());
        assert_eq!(y.len(), self.diag.len());

        for ((yi, &xi), &di) in y.iter_mut().zip(x).zip(&self.diag) {
            *yi = di * xi;
        }
    }

    fn diagonal(&self) -> Option<Vec<f64>> {
        Some(self.diag.clone())
    }
}

/// Jacobi (diagonal) preconditioner: y = x / diag(A).
///
/// Near-zero diagonal entries (< 1e-30) are treated as 1.0.
#[derive(Debug, Clone)]
pub struct JacobiOperator {
    inv_diag: Vec<f64>,
}

impl JacobiOperator {
    /// Create from the diagonal of the operator being preconditioned.
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let inv_diag = diag
            .iter()
            .map(|&d| if d.abs() < 1e-30 { 1.0 } else { 1.0 / d })
            .collect();

        Self { inv_diag }
    }

    /// Create from any operator that exposes its diagonal.
    pub fn from_operator(op: &dyn LinearOperator) -> Option<Self> {
        op.diagonal().map(|d| Self::from_diagonal(&d))
    }
}

impl LinearOperator for JacobiOperator {
    fn dim(&self) -> usize {
        self.inv_diag.len()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.inv_diag.len());
        assert_eq!(y.len(), self.inv_diag.len());

        for ((yi, &xi), &inv_di) in y.iter_mut().zip(x).zip(&self.inv_diag) {
            *yi = xi * inv_di;
        }
    }

    fn diagonal(&self) -> Option<Vec<f64>> {
        Some(self.inv_diag.clone())
    }
}
