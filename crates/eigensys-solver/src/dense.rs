//! Dense reference eigen solver.
//!
//! Operators are materialized as dense matrices, so this backend is meant for
//! small systems (a few thousand DOFs at most) and for validating assemblies.
//!
//! - HEP: symmetric eigendecomposition.
//! - GHEP: Cholesky reduction `L^-1 A L^-T`, then as HEP. Eigenvectors are
//!   B-normalized.
//! - NHEP: real Schur form for the eigenvalues, complex inverse iteration for
//!   the eigenvectors.
//! - GNHEP/GHIEP: LU reduction to `B^-1 A`, then as NHEP.
//!
//! A pair counts as converged when its relative residual
//! `|A x - lambda B x| / ((|A| + |lambda| |B|) |x|)` is within tolerance.

use eigensys_core::{LinearOperator, to_dense};
use nalgebra::linalg::{Schur, SymmetricEigen};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64 as C64;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::eigen_solver::EigenSolver;
use crate::error::{Error, Result};
use crate::types::{EigenProblemType, EigenSolverParams, PositionOfSpectrum, SolveData};

/// Relative shift applied to each eigenvalue before inverse iteration.
const SHIFT_PERTURBATION: f64 = 1e-10;

/// Eigenpair produced by a decomposition, before the convergence check.
struct Candidate {
    value: C64,
    vector: DVector<C64>,
}

/// Converged eigenpair kept for retrieval.
struct StoredPair {
    value: C64,
    /// Real part of the phase-normalized eigenvector.
    vector: DVector<f64>,
}

/// Dense eigen solver backed by nalgebra decompositions.
pub struct DenseEigenSolver {
    problem_type: EigenProblemType,
    position: PositionOfSpectrum,
    initial_space: Option<DVector<f64>>,
    pairs: Vec<StoredPair>,
}

impl Default for DenseEigenSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DenseEigenSolver {
    /// Create a solver for NHEP problems, largest magnitude first.
    pub fn new() -> Self {
        Self {
            problem_type: EigenProblemType::default(),
            position: PositionOfSpectrum::default(),
            initial_space: None,
            pairs: Vec::new(),
        }
    }

    fn check_inputs(&self, n: usize, precond: Option<&dyn LinearOperator>) -> Result<()> {
        if n == 0 {
            return Err(Error::InvalidParameters("operator has zero dimension".into()));
        }
        if let Some(precond) = precond {
            if precond.dim() != n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    actual: precond.dim(),
                });
            }
            // Dense decompositions are exact; the preconditioner is only validated.
            log::trace!("Dense backend does not use the {}x{} preconditioner", n, n);
        }
        if let Some(initial) = &self.initial_space {
            if initial.len() != n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    actual: initial.len(),
                });
            }
        }
        Ok(())
    }

    fn sort_by_position(&self, values: &mut [C64]) {
        let position = self.position;
        values.sort_by(|x, y| {
            position
                .sort_key(x.re, x.im)
                .total_cmp(&position.sort_key(y.re, y.im))
        });
    }

    /// Hermitian path: symmetric eigendecomposition, with Cholesky reduction
    /// when `b` is given.
    fn hermitian(
        &self,
        a: &DMatrix<f64>,
        b: Option<&DMatrix<f64>>,
        params: &EigenSolverParams,
    ) -> Result<(Vec<Candidate>, usize)> {
        let n = a.nrows();

        let (reduced, factor) = match b {
            None => (a.clone(), None),
            Some(b) => {
                let l = b.clone().cholesky().ok_or(Error::NotPositiveDefinite)?.l();
                // L^-1 A L^-T = L^-1 (L^-1 A)^T for symmetric A
                let la = l.solve_lower_triangular(a).ok_or(Error::SingularMatrix)?;
                let reduced = l
                    .solve_lower_triangular(&la.transpose())
                    .ok_or(Error::SingularMatrix)?;
                (reduced, Some(l))
            }
        };
        let symmetric = (&reduced + reduced.transpose()) * 0.5;

        if self.initial_space.is_some() {
            log::debug!("Initial space is not used by the dense Hermitian path");
        }

        let Some(eigen) =
            SymmetricEigen::try_new(symmetric, f64::EPSILON, sweep_limit(params, n))
        else {
            log::warn!("Symmetric eigendecomposition did not converge");
            return Ok((Vec::new(), params.max_iterations));
        };

        let position = self.position;
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| {
            position
                .sort_key(eigen.eigenvalues[i], 0.0)
                .total_cmp(&position.sort_key(eigen.eigenvalues[j], 0.0))
        });
        order.truncate(params.n_eigenpairs);

        let candidates = order
            .into_iter()
            .map(|i| {
                let y: DVector<f64> = eigen.eigenvectors.column(i).into_owned();
                let x = match &factor {
                    None => y,
                    Some(l) => l
                        .transpose()
                        .solve_upper_triangular(&y)
                        .ok_or(Error::SingularMatrix)?,
                };
                Ok(Candidate {
                    value: C64::new(eigen.eigenvalues[i], 0.0),
                    vector: x.map(|v| C64::new(v, 0.0)),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((candidates, 1))
    }

    /// Non-Hermitian path: Schur eigenvalues plus inverse iteration.
    fn non_hermitian(
        &self,
        c: &DMatrix<f64>,
        params: &EigenSolverParams,
    ) -> Result<(Vec<Candidate>, usize)> {
        let n = c.nrows();

        let Some(schur) = Schur::try_new(c.clone(), f64::EPSILON, sweep_limit(params, n))
        else {
            log::warn!("Schur decomposition did not converge");
            return Ok((Vec::new(), params.max_iterations));
        };

        let mut values: Vec<C64> = schur.complex_eigenvalues().iter().copied().collect();
        self.sort_by_position(&mut values);
        values.truncate(params.n_eigenpairs);

        let complex_c = c.map(|v| C64::new(v, 0.0));
        let start = self.start_vector(n);
        let norm_c = c.norm().max(f64::MIN_POSITIVE);

        let compute =
            |value: &C64| inverse_iteration(&complex_c, *value, &start, norm_c, params);

        #[cfg(feature = "parallel")]
        let results: Vec<(Candidate, usize)> = values.par_iter().map(compute).collect();
        #[cfg(not(feature = "parallel"))]
        let results: Vec<(Candidate, usize)> = values.iter().map(compute).collect();

        let iterations = results.iter().map(|(_, steps)| *steps).max().unwrap_or(1);
        let candidates = results.into_iter().map(|(candidate, _)| candidate).collect();

        Ok((candidates, iterations))
    }

    fn start_vector(&self, n: usize) -> DVector<C64> {
        match &self.initial_space {
            Some(initial) if initial.norm() > 0.0 => initial.map(|v| C64::new(v, 0.0)),
            _ => DVector::from_fn(n, |i, _| C64::new(((i + 1) as f64).sqrt(), 0.0)),
        }
    }

    /// Keep the candidates whose residual is within tolerance.
    fn accept(
        &mut self,
        candidates: Vec<Candidate>,
        a: &DMatrix<f64>,
        b: Option<&DMatrix<f64>>,
        params: &EigenSolverParams,
        iterations: usize,
    ) -> SolveData {
        let norm_a = a.norm();
        let norm_b = b.map_or(1.0, |b| b.norm());
        let complex_a = a.map(|v| C64::new(v, 0.0));
        let complex_b = b.map(|b| b.map(|v| C64::new(v, 0.0)));

        self.pairs = candidates
            .into_iter()
            .filter(|candidate| {
                let ax = &complex_a * &candidate.vector;
                let bx = match &complex_b {
                    Some(b) => b * &candidate.vector,
                    None => candidate.vector.clone(),
                };
                let r = (ax - bx * candidate.value).norm();
                let scale = (norm_a + candidate.value.norm() * norm_b) * candidate.vector.norm();
                let residual = if scale > 0.0 { r / scale } else { r };
                log::trace!(
                    "lambda = {:.6e}{:+.6e}i, relative residual {:.3e}",
                    candidate.value.re,
                    candidate.value.im,
                    residual
                );
                residual <= params.tolerance
            })
            .map(|candidate| StoredPair {
                value: candidate.value,
                vector: phase_normalized_real(&candidate.vector),
            })
            .collect();

        SolveData {
            n_converged: self.pairs.len(),
            n_iterations: iterations,
        }
    }

    fn stored(&self, i: usize) -> Result<&StoredPair> {
        self.pairs.get(i).ok_or(Error::IndexOutOfRange {
            index: i,
            available: self.pairs.len(),
        })
    }
}

impl EigenSolver for DenseEigenSolver {
    fn name(&self) -> &str {
        "dense-nalgebra"
    }

    fn set_eigenproblem_type(&mut self, problem_type: EigenProblemType) {
        self.problem_type = problem_type;
    }

    fn eigenproblem_type(&self) -> EigenProblemType {
        self.problem_type
    }

    fn set_position_of_spectrum(&mut self, position: PositionOfSpectrum) {
        self.position = position;
    }

    fn position_of_spectrum(&self) -> PositionOfSpectrum {
        self.position
    }

    fn set_initial_space(&mut self, initial_space: DVector<f64>) {
        self.initial_space = Some(initial_space);
    }

    fn solve_standard(
        &mut self,
        matrix_a: &dyn LinearOperator,
        precond: Option<&dyn LinearOperator>,
        params: &EigenSolverParams,
    ) -> Result<SolveData> {
        params.validate()?;
        if self.problem_type.is_generalized() {
            return Err(Error::ProblemTypeMismatch {
                problem_type: self.problem_type.name(),
                form: "standard",
            });
        }
        let n = matrix_a.dim();
        self.check_inputs(n, precond)?;
        self.pairs.clear();

        log::debug!("Dense {} solve, n = {}", self.problem_type, n);
        let a = to_dense(matrix_a);
        let (candidates, iterations) = match self.problem_type {
            EigenProblemType::Hep => self.hermitian(&a, None, params)?,
            _ => self.non_hermitian(&a, params)?,
        };

        Ok(self.accept(candidates, &a, None, params, iterations))
    }

    fn solve_generalized(
        &mut self,
        matrix_a: &dyn LinearOperator,
        matrix_b: &dyn LinearOperator,
        precond: Option<&dyn LinearOperator>,
        params: &EigenSolverParams,
    ) -> Result<SolveData> {
        params.validate()?;
        if !self.problem_type.is_generalized() {
            return Err(Error::ProblemTypeMismatch {
                problem_type: self.problem_type.name(),
                form: "generalized",
            });
        }
        let n = matrix_a.dim();
        if matrix_b.dim() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: matrix_b.dim(),
            });
        }
        self.check_inputs(n, precond)?;
        self.pairs.clear();

        log::debug!("Dense {} solve, n = {}", self.problem_type, n);
        let a = to_dense(matrix_a);
        let b = to_dense(matrix_b);
        let (candidates, iterations) = if self.problem_type == EigenProblemType::Ghep {
            self.hermitian(&a, Some(&b), params)?
        } else {
            let reduced = b.clone().lu().solve(&a).ok_or(Error::SingularMatrix)?;
            self.non_hermitian(&reduced, params)?
        };

        Ok(self.accept(candidates, &a, Some(&b), params, iterations))
    }

    fn eigenpair(&self, i: usize, solution: &mut DVector<f64>) -> Result<(f64, f64)> {
        let pair = self.stored(i)?;
        if solution.len() != pair.vector.len() {
            return Err(Error::DimensionMismatch {
                expected: pair.vector.len(),
                actual: solution.len(),
            });
        }
        solution.copy_from(&pair.vector);
        Ok((pair.value.re, pair.value.im))
    }

    fn eigenvalue(&self, i: usize) -> Result<(f64, f64)> {
        let pair = self.stored(i)?;
        Ok((pair.value.re, pair.value.im))
    }

    fn clear(&mut self) {
        self.pairs.clear();
    }
}

/// Iteration cap handed to the nalgebra decompositions.
fn sweep_limit(params: &EigenSolverParams, n: usize) -> usize {
    params.max_iterations.saturating_mul(n)
}

/// Inverse iteration on `c - (value + delta) I` from `start`.
///
/// Returns the unit-norm eigenvector estimate and the number of steps taken.
fn inverse_iteration(
    c: &DMatrix<C64>,
    value: C64,
    start: &DVector<C64>,
    norm_c: f64,
    params: &EigenSolverParams,
) -> (Candidate, usize) {
    let n = c.nrows();
    let shift = value + C64::new(1.0, 1.0) * (SHIFT_PERTURBATION * norm_c);

    let mut shifted = c.clone();
    for i in 0..n {
        shifted[(i, i)] -= shift;
    }
    let lu = shifted.lu();

    let mut x = start.unscale(start.norm());
    let mut steps = 0;
    while steps < params.max_iterations {
        steps += 1;
        let Some(y) = lu.solve(&x) else {
            break;
        };
        let norm = y.norm();
        if !norm.is_finite() || norm == 0.0 {
            break;
        }
        x = y.unscale(norm);

        let residual = (c * &x - &x * value).norm() / norm_c;
        if residual <= params.tolerance {
            break;
        }
    }

    (Candidate { value, vector: x }, steps)
}

/// Rotate `v` so its largest component is real and positive, then take the
/// real part.
fn phase_normalized_real(v: &DVector<C64>) -> DVector<f64> {
    let Some((_, &pivot)) = v
        .iter()
        .enumerate()
        .max_by(|(_, x), (_, y)| x.norm().total_cmp(&y.norm()))
    else {
        return DVector::zeros(0);
    };
    if pivot.norm() == 0.0 {
        return v.map(|z| z.re);
    }
    let phase = pivot.conj() / pivot.norm();
    v.map(|z| (z * phase).re)
}
