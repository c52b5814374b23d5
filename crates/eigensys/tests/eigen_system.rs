//! Integration tests for eigensys.
//!
//! Solves 1D Laplace eigenproblems on the unit interval with the dense
//! backend and checks against the closed-form discrete eigenvalues.

use std::f64::consts::PI;

use eigensys::{
    DenseEigenSolver, DofMap, EigenAssembly, EigenProblemType, EigenSolverParams, EigenSystem,
    EigenSystemError, LinearOperator, Operators, PositionOfSpectrum, PrecondSlot, Result,
};
use eigensys_core::JacobiOperator;

/// Symmetric tridiagonal operator with constant bands.
struct Tridiagonal {
    n: usize,
    diag: f64,
    off: f64,
}

impl LinearOperator for Tridiagonal {
    fn dim(&self) -> usize {
        self.n
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        for i in 0..self.n {
            let mut v = self.diag * x[i];
            if i > 0 {
                v += self.off * x[i - 1];
            }
            if i + 1 < self.n {
                v += self.off * x[i + 1];
            }
            y[i] = v;
        }
    }

    fn diagonal(&self) -> Option<Vec<f64>> {
        Some(vec![self.diag; self.n])
    }
}

/// -u'' = lambda u with homogeneous Dirichlet ends.
///
/// Standard types use finite differences; generalized types use linear
/// finite elements with a consistent mass matrix.
struct Laplace1d {
    problem_type: EigenProblemType,
}

impl Laplace1d {
    /// (diag, off) bands of A and, for generalized problems, of B.
    fn bands(&self, n: usize) -> ((f64, f64), Option<(f64, f64)>) {
        let h = 1.0 / (n + 1) as f64;
        if self.problem_type.is_generalized() {
            ((2.0 / h, -1.0 / h), Some((4.0 * h / 6.0, h / 6.0)))
        } else {
            ((2.0 / (h * h), -1.0 / (h * h)), None)
        }
    }
}

fn fill_tridiagonal(
    matrix: &mut eigensys::SparseMatrix,
    n: usize,
    (diag, off): (f64, f64),
) -> Result<()> {
    for i in 0..n {
        matrix.add(i, i, diag)?;
        if i + 1 < n {
            matrix.add(i, i + 1, off)?;
            matrix.add(i + 1, i, off)?;
        }
    }
    Ok(())
}

impl EigenAssembly for Laplace1d {
    fn problem_type(&self) -> EigenProblemType {
        self.problem_type
    }

    fn fill_operators(&self, dof_map: &DofMap, operators: Operators<'_>) -> Result<()> {
        if operators.is_generalized() != self.problem_type.is_generalized() {
            return Err(EigenSystemError::Configuration(format!(
                "{} assembly got mismatched operator slots",
                self.problem_type
            )));
        }

        let n = dof_map.n_dofs();
        let (a_bands, b_bands) = self.bands(n);
        match operators {
            Operators::Assembled { matrix_a, matrix_b } => {
                fill_tridiagonal(matrix_a, n, a_bands)?;
                if let (Some(matrix_b), Some(bands)) = (matrix_b, b_bands) {
                    fill_tridiagonal(matrix_b, n, bands)?;
                }
            }
            Operators::Shell {
                shell_a,
                shell_b,
                precond,
            } => {
                let a = Tridiagonal {
                    n,
                    diag: a_bands.0,
                    off: a_bands.1,
                };
                let jacobi = vec![a_bands.0; n];
                shell_a.attach(Box::new(a))?;
                if let (Some(shell_b), Some((diag, off))) = (shell_b, b_bands) {
                    shell_b.attach(Box::new(Tridiagonal { n, diag, off }))?;
                }
                match precond {
                    PrecondSlot::Assembled(m) => {
                        for (i, d) in jacobi.iter().enumerate() {
                            m.add(i, i, 1.0 / d)?;
                        }
                    }
                    PrecondSlot::Shell(shell) => {
                        shell.attach(Box::new(JacobiOperator::from_diagonal(&jacobi)))?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// k-th smallest eigenvalue of the finite difference Laplacian.
fn fd_eigenvalue(k: usize, n: usize) -> f64 {
    let h = 1.0 / (n + 1) as f64;
    let s = (k as f64 * PI * h / 2.0).sin();
    4.0 * s * s / (h * h)
}

/// k-th smallest eigenvalue of the linear finite element pencil.
fn fe_eigenvalue(k: usize, n: usize) -> f64 {
    let h = 1.0 / (n + 1) as f64;
    let c = (k as f64 * PI * h).cos();
    6.0 / (h * h) * (1.0 - c) / (2.0 + c)
}

fn laplace_system(n: usize, problem_type: EigenProblemType) -> EigenSystem {
    let mut system = EigenSystem::new(
        "laplace",
        0,
        DofMap::banded(n, 1),
        Box::new(DenseEigenSolver::new()),
    )
    .with_assembly(Box::new(Laplace1d { problem_type }));
    system.set_position_of_spectrum(PositionOfSpectrum::SmallestReal);
    system.set_solver_params(EigenSolverParams::default().with_eigenpairs(3));
    system
}

fn eigenvalues(system: &EigenSystem) -> Vec<f64> {
    (0..system.get_n_converged())
        .map(|i| system.get_eigenvalue(i).unwrap().0)
        .collect()
}

#[test]
fn test_standard_assembled_matches_discrete_spectrum() {
    let n = 40;
    let mut system = laplace_system(n, EigenProblemType::Hep);
    system.init().unwrap();
    system.solve().unwrap();

    assert_eq!(system.get_n_converged(), 3);
    assert!(system.get_n_iterations() >= 1);
    for (k, lambda) in eigenvalues(&system).into_iter().enumerate() {
        let expected = fd_eigenvalue(k + 1, n);
        assert!(
            (lambda - expected).abs() < 1e-8 * expected,
            "lambda_{} = {}, expected {}",
            k + 1,
            lambda,
            expected
        );
    }

    // The fundamental mode approximates (pi)^2
    let (lambda0, _) = system.get_eigenvalue(0).unwrap();
    assert!((lambda0 - PI * PI).abs() / (PI * PI) < 1e-3);
}

#[test]
fn test_eigenpair_vector_satisfies_residual() {
    let n = 20;
    let mut system = laplace_system(n, EigenProblemType::Hep);
    system.init().unwrap();
    system.solve().unwrap();

    let (lambda, im) = system.get_eigenpair(1).unwrap();
    assert_eq!((lambda, im), system.get_eigenvalue(1).unwrap());
    assert_eq!(im, 0.0);

    let x: Vec<f64> = system.solution().iter().copied().collect();
    let mut ax = vec![0.0; n];
    system.matrix_a().unwrap().apply(&x, &mut ax);
    let norm_x = x.iter().map(|v| v * v).sum::<f64>().sqrt();
    let residual = ax
        .iter()
        .zip(&x)
        .map(|(a, v)| (a - lambda * v).powi(2))
        .sum::<f64>()
        .sqrt();
    assert!(norm_x > 0.0);
    assert!(residual < 1e-8 * lambda * norm_x);
}

#[test]
fn test_generalized_assembled_matches_fe_spectrum() {
    let n = 30;
    let mut system = laplace_system(n, EigenProblemType::Ghep);
    system.set_use_shell_matrices(false);
    system.reinit().unwrap();

    assert!(system.generalized());
    assert_eq!(system.n_matrices(), 2);
    assert!(system.matrix_b().is_some());
    assert!(system.shell_matrix_a().is_none());

    system.solve().unwrap();
    assert_eq!(system.get_n_converged(), 3);
    for (k, lambda) in eigenvalues(&system).into_iter().enumerate() {
        let expected = fe_eigenvalue(k + 1, n);
        assert!(
            (lambda - expected).abs() < 1e-8 * expected,
            "lambda_{} = {}, expected {}",
            k + 1,
            lambda,
            expected
        );
    }
}

#[test]
fn test_generalized_assembly_on_standard_type_is_rejected() {
    let mut system = laplace_system(10, EigenProblemType::Ghep);
    system.set_eigenproblem_type(EigenProblemType::Hep);
    system.init().unwrap();

    // Solving K alone would silently return wrong eigenvalues
    let result = system.solve();
    assert!(
        matches!(result, Err(EigenSystemError::Configuration(_))),
        "{result:?}"
    );
    assert_eq!(system.get_n_converged(), 0);

    // Back to the assembly's type, everything works again
    system.set_eigenproblem_type(EigenProblemType::Ghep);
    system.reinit().unwrap();
    system.solve().unwrap();
    let (lambda, _) = system.get_eigenvalue(0).unwrap();
    assert!((lambda - fe_eigenvalue(1, 10)).abs() < 1e-8 * lambda);
}

#[test]
fn test_non_hermitian_generalized_path() {
    let n = 12;
    let mut system = laplace_system(n, EigenProblemType::Gnhep);
    system.init().unwrap();
    system.solve().unwrap();

    assert_eq!(system.get_n_converged(), 3);
    let (lambda, im) = system.get_eigenvalue(0).unwrap();
    assert!(im.abs() < 1e-8);
    assert!((lambda - fe_eigenvalue(1, n)).abs() < 1e-6 * lambda);
}

#[test]
fn test_shell_mode_agrees_with_assembled() {
    let n = 25;
    for problem_type in [EigenProblemType::Hep, EigenProblemType::Ghep] {
        let mut assembled = laplace_system(n, problem_type);
        assembled.init().unwrap();
        assembled.solve().unwrap();

        for shell_precond in [false, true] {
            let mut shell = laplace_system(n, problem_type);
            shell.set_use_shell_matrices(true);
            shell.set_use_shell_precond_matrix(shell_precond);
            shell.init().unwrap();
            shell.solve().unwrap();

            assert!(shell.matrix_a().is_none());
            assert!(shell.shell_matrix_a().unwrap().is_attached());
            assert_eq!(shell.get_n_converged(), assembled.get_n_converged());
            for (s, a) in eigenvalues(&shell).iter().zip(eigenvalues(&assembled)) {
                assert!((s - a).abs() < 1e-9 * a, "{problem_type}: {s} vs {a}");
            }
        }
    }
}

#[test]
fn test_clear_then_reinit_matches_fresh_system() {
    let n = 16;
    let mut fresh = laplace_system(n, EigenProblemType::Hep);
    fresh.init().unwrap();
    fresh.solve().unwrap();

    let mut reused = laplace_system(n, EigenProblemType::Hep);
    reused.init().unwrap();
    reused.solve().unwrap();
    reused.clear();
    assert_eq!(reused.get_n_converged(), 0);
    assert!(matches!(
        reused.get_eigenvalue(0),
        Err(EigenSystemError::IndexOutOfRange { .. })
    ));

    reused.reinit().unwrap();
    reused.solve().unwrap();
    assert_eq!(reused.get_n_converged(), fresh.get_n_converged());
    assert_eq!(reused.get_n_iterations(), fresh.get_n_iterations());
    for (r, f) in eigenvalues(&reused).iter().zip(eigenvalues(&fresh)) {
        assert!((r - f).abs() < 1e-12 * f);
    }
}

#[test]
fn test_refinement_through_reinit() {
    let mut system = laplace_system(10, EigenProblemType::Hep);
    system.init().unwrap();
    system.solve().unwrap();
    let coarse = system.get_eigenvalue(0).unwrap().0;

    system.base_mut().set_dof_map(DofMap::banded(21, 1));
    system.reinit().unwrap();
    assert_eq!(system.matrix_a().unwrap().size(), 21);
    system.solve().unwrap();

    let (fine, _) = system.get_eigenpair(0).unwrap();
    assert_eq!(system.solution().len(), 21);
    assert!((fine - PI * PI).abs() < (coarse - PI * PI).abs());
}

#[test]
fn test_unreachable_tolerance_converges_nothing() {
    let mut system = laplace_system(8, EigenProblemType::Hep);
    system.set_solver_params(
        EigenSolverParams::default()
            .with_eigenpairs(2)
            .with_tolerance(1e-300),
    );
    system.init().unwrap();

    // Not an error; the count tells the caller
    system.solve().unwrap();
    assert_eq!(system.get_n_converged(), 0);
    assert!(matches!(
        system.get_eigenpair(0),
        Err(EigenSystemError::IndexOutOfRange {
            index: 0,
            n_converged: 0
        })
    ));
}

#[test]
fn test_invalid_parameters_surface_as_solver_failure() {
    let mut system = laplace_system(8, EigenProblemType::Hep);
    system.set_solver_params(EigenSolverParams::default().with_eigenpairs(0));
    system.init().unwrap();

    assert!(matches!(
        system.solve(),
        Err(EigenSystemError::SolverFailure(_))
    ));
    assert_eq!(system.get_n_converged(), 0);
}
