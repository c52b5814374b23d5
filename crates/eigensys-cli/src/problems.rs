//! 1D model eigenproblems on `(0, L)` with homogeneous Dirichlet ends.
//!
//! Unknowns are the interior grid values, so `n` DOFs give the spacing
//! `h = L / (n + 1)`. Standard problems use central finite differences;
//! generalized problems use linear finite elements with a consistent mass
//! matrix.

use eigensys::{
    DofMap, EigenAssembly, EigenProblemType, EigenSystemError, LinearOperator, Operators,
    PrecondSlot, Result, SparseMatrix,
};
use eigensys_core::JacobiOperator;

/// Which differential operator to discretize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    /// `-u'' = lambda u`
    Laplace,
    /// `-u'' + c u' = lambda u`
    Convection,
}

impl ProblemKind {
    /// Parse from a CLI name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "laplace" | "laplacian" => Some(Self::Laplace),
            "convection" | "convection-diffusion" => Some(Self::Convection),
            _ => None,
        }
    }

    /// Problem type used when none is requested.
    pub fn default_problem_type(self) -> EigenProblemType {
        match self {
            Self::Laplace => EigenProblemType::Hep,
            Self::Convection => EigenProblemType::Nhep,
        }
    }
}

/// Constant-coefficient tridiagonal stencil.
///
/// Row `i` reads `lower * x[i-1] + diag * x[i] + upper * x[i+1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stencil {
    pub lower: f64,
    pub diag: f64,
    pub upper: f64,
}

impl Stencil {
    fn scaled(self, factor: f64) -> Self {
        Self {
            lower: self.lower * factor,
            diag: self.diag * factor,
            upper: self.upper * factor,
        }
    }

    fn add(self, other: Self) -> Self {
        Self {
            lower: self.lower + other.lower,
            diag: self.diag + other.diag,
            upper: self.upper + other.upper,
        }
    }

    /// Add the stencil to every row of an assembled matrix.
    pub fn assemble_into(&self, matrix: &mut SparseMatrix) -> Result<()> {
        let n = matrix.size();
        for i in 0..n {
            if i > 0 && self.lower != 0.0 {
                matrix.add(i, i - 1, self.lower)?;
            }
            matrix.add(i, i, self.diag)?;
            if i + 1 < n && self.upper != 0.0 {
                matrix.add(i, i + 1, self.upper)?;
            }
        }
        Ok(())
    }
}

/// Matrix-free application of a [`Stencil`].
#[derive(Debug, Clone)]
pub struct StencilOperator {
    n: usize,
    stencil: Stencil,
}

impl StencilOperator {
    pub fn new(n: usize, stencil: Stencil) -> Self {
        Self { n, stencil }
    }
}

impl LinearOperator for StencilOperator {
    fn dim(&self) -> usize {
        self.n
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        let Stencil { lower, diag, upper } = self.stencil;
        for i in 0..self.n {
            let mut v = diag * x[i];
            if i > 0 {
                v += lower * x[i - 1];
            }
            if i + 1 < self.n {
                v += upper * x[i + 1];
            }
            y[i] = v;
        }
    }

    fn diagonal(&self) -> Option<Vec<f64>> {
        Some(vec![self.stencil.diag; self.n])
    }
}

/// Assembly for the 1D model problems.
#[derive(Debug, Clone)]
pub struct ModelProblem {
    kind: ProblemKind,
    problem_type: EigenProblemType,
    length: f64,
    velocity: f64,
}

impl ModelProblem {
    pub fn new(
        kind: ProblemKind,
        problem_type: EigenProblemType,
        length: f64,
        velocity: f64,
    ) -> Self {
        Self {
            kind,
            problem_type,
            length,
            velocity,
        }
    }

    /// Grid spacing for `n` interior unknowns.
    pub fn spacing(&self, n: usize) -> f64 {
        self.length / (n + 1) as f64
    }

    fn velocity(&self) -> f64 {
        match self.kind {
            ProblemKind::Laplace => 0.0,
            ProblemKind::Convection => self.velocity,
        }
    }

    /// Stencils of A and, for generalized problems, of B.
    pub fn stencils(&self, n: usize) -> (Stencil, Option<Stencil>) {
        let h = self.spacing(n);
        let c = self.velocity();
        let diffusion = Stencil {
            lower: -1.0,
            diag: 2.0,
            upper: -1.0,
        };
        let convection = Stencil {
            lower: -c / 2.0,
            diag: 0.0,
            upper: c / 2.0,
        };

        if self.problem_type.is_generalized() {
            let stiffness = diffusion.scaled(1.0 / h).add(convection);
            let mass = Stencil {
                lower: 1.0,
                diag: 4.0,
                upper: 1.0,
            }
            .scaled(h / 6.0);
            (stiffness, Some(mass))
        } else {
            let a = diffusion
                .scaled(1.0 / (h * h))
                .add(convection.scaled(1.0 / h));
            (a, None)
        }
    }

    /// Exact eigenvalue `k` (1-based) of the continuous Laplace problem.
    pub fn continuous_eigenvalue(&self, k: usize) -> f64 {
        let w = k as f64 * std::f64::consts::PI / self.length;
        w * w
    }
}

impl EigenAssembly for ModelProblem {
    fn problem_type(&self) -> EigenProblemType {
        self.problem_type
    }

    fn fill_operators(&self, dof_map: &DofMap, operators: Operators<'_>) -> Result<()> {
        if operators.is_generalized() != self.problem_type.is_generalized() {
            return Err(EigenSystemError::Configuration(format!(
                "{} model problem cannot fill {} operator slots",
                self.problem_type,
                if operators.is_generalized() { "generalized" } else { "standard" }
            )));
        }

        let n = dof_map.n_dofs();
        let (a, b) = self.stencils(n);

        match operators {
            Operators::Assembled { matrix_a, matrix_b } => {
                a.assemble_into(matrix_a)?;
                if let (Some(matrix_b), Some(b)) = (matrix_b, b) {
                    b.assemble_into(matrix_b)?;
                }
            }
            Operators::Shell {
                shell_a,
                shell_b,
                precond,
            } => {
                let op_a = StencilOperator::new(n, a);
                let jacobi = JacobiOperator::from_operator(&op_a)
                    .unwrap_or_else(|| JacobiOperator::from_diagonal(&vec![1.0; n]));
                shell_a.attach(Box::new(op_a))?;
                if let (Some(shell_b), Some(b)) = (shell_b, b) {
                    shell_b.attach(Box::new(StencilOperator::new(n, b)))?;
                }
                match precond {
                    PrecondSlot::Assembled(matrix) => {
                        let inv_diag = jacobi.diagonal().unwrap_or_default();
                        for (i, d) in inv_diag.into_iter().enumerate() {
                            matrix.add(i, i, d)?;
                        }
                    }
                    PrecondSlot::Shell(shell) => {
                        shell.attach(Box::new(jacobi))?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eigensys::{DenseEigenSolver, EigenSolverParams, EigenSystem, PositionOfSpectrum};
    use eigensys_core::to_dense;

    fn system(kind: ProblemKind, problem_type: EigenProblemType, n: usize) -> EigenSystem {
        let mut system = EigenSystem::new(
            "model",
            0,
            DofMap::banded(n, 1),
            Box::new(DenseEigenSolver::new()),
        )
        .with_assembly(Box::new(ModelProblem::new(kind, problem_type, 1.0, 2.0)));
        system.set_position_of_spectrum(PositionOfSpectrum::SmallestReal);
        system.set_solver_params(EigenSolverParams::default().with_eigenpairs(2));
        system
    }

    #[test]
    fn problem_kind_names() {
        assert_eq!(ProblemKind::from_name("Laplace"), Some(ProblemKind::Laplace));
        assert_eq!(
            ProblemKind::from_name("convection-diffusion"),
            Some(ProblemKind::Convection)
        );
        assert_eq!(ProblemKind::from_name("heat"), None);
        assert!(ProblemKind::Laplace.default_problem_type().is_hermitian());
        assert!(!ProblemKind::Convection.default_problem_type().is_hermitian());
    }

    #[test]
    fn laplace_stencils() {
        let problem = ModelProblem::new(ProblemKind::Laplace, EigenProblemType::Hep, 2.0, 5.0);
        let h = problem.spacing(3);
        assert!((h - 0.5).abs() < 1e-15);

        let (a, b) = problem.stencils(3);
        assert!(b.is_none());
        assert!((a.diag - 8.0).abs() < 1e-12);
        assert!((a.lower + 4.0).abs() < 1e-12);
        assert_eq!(a.lower, a.upper);
    }

    #[test]
    fn generalized_convection_stencils() {
        let problem =
            ModelProblem::new(ProblemKind::Convection, EigenProblemType::Gnhep, 1.0, 3.0);
        let (k, m) = problem.stencils(1);
        let m = m.unwrap();

        // h = 0.5
        assert!((k.diag - 4.0).abs() < 1e-12);
        assert!((k.lower - (-2.0 - 1.5)).abs() < 1e-12);
        assert!((k.upper - (-2.0 + 1.5)).abs() < 1e-12);
        assert!((m.diag - 4.0 * 0.5 / 6.0).abs() < 1e-12);
        assert!((m.lower - 0.5 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn stencil_operator_matches_assembled() {
        let stencil = Stencil {
            lower: -1.0,
            diag: 3.0,
            upper: 0.5,
        };
        let mut matrix = SparseMatrix::with_layout(
            &DofMap::banded(4, 1),
            eigensys::ParallelType::Serial,
            eigensys::MatrixBuildType::Automatic,
        );
        stencil.assemble_into(&mut matrix).unwrap();

        let assembled = to_dense(&matrix);
        let shell = to_dense(&StencilOperator::new(4, stencil));
        assert!((assembled - shell).abs().max() < 1e-15);
        assert_eq!(
            StencilOperator::new(4, stencil).diagonal(),
            Some(vec![3.0; 4])
        );
    }

    #[test]
    fn laplace_modes_approach_continuum() {
        let mut system = system(ProblemKind::Laplace, EigenProblemType::Hep, 50);
        system.init().unwrap();
        system.solve().unwrap();

        let problem = ModelProblem::new(ProblemKind::Laplace, EigenProblemType::Hep, 1.0, 0.0);
        for k in 0..2 {
            let (lambda, _) = system.get_eigenvalue(k).unwrap();
            let exact = problem.continuous_eigenvalue(k + 1);
            assert!((lambda - exact).abs() / exact < 5e-3, "{lambda} vs {exact}");
        }
    }

    #[test]
    fn convection_spectrum_is_real_and_shifted() {
        // -u'' + c u' has eigenvalues (k pi)^2 + c^2 / 4
        let mut system = system(ProblemKind::Convection, EigenProblemType::Nhep, 40);
        system.init().unwrap();
        system.solve().unwrap();

        assert_eq!(system.get_n_converged(), 2);
        let (lambda, im) = system.get_eigenvalue(0).unwrap();
        let exact = std::f64::consts::PI.powi(2) + 1.0;
        assert!(im.abs() < 1e-8);
        assert!((lambda - exact).abs() / exact < 1e-2, "{lambda} vs {exact}");
    }

    #[test]
    fn slots_must_match_problem_type() {
        let problem = ModelProblem::new(ProblemKind::Laplace, EigenProblemType::Ghep, 1.0, 0.0);
        let dof_map = DofMap::banded(3, 1);
        let mut matrix_a = SparseMatrix::with_layout(
            &dof_map,
            eigensys::ParallelType::Serial,
            eigensys::MatrixBuildType::Automatic,
        );

        let result = problem.fill_operators(
            &dof_map,
            Operators::Assembled {
                matrix_a: &mut matrix_a,
                matrix_b: None,
            },
        );
        assert!(matches!(result, Err(EigenSystemError::Configuration(_))));
        assert_eq!(matrix_a.nnz(), 0);
    }

    #[test]
    fn generalized_problem_on_standard_system_fails() {
        let mut system = system(ProblemKind::Laplace, EigenProblemType::Ghep, 10);
        system.set_eigenproblem_type(EigenProblemType::Hep);
        system.init().unwrap();

        assert!(matches!(
            system.solve(),
            Err(EigenSystemError::Configuration(_))
        ));
        assert_eq!(system.get_n_converged(), 0);
    }

    #[test]
    fn shell_preconditioner_forms() {
        for shell_precond in [false, true] {
            let mut system = system(ProblemKind::Laplace, EigenProblemType::Ghep, 10);
            system.set_use_shell_matrices(true);
            system.set_use_shell_precond_matrix(shell_precond);
            system.init().unwrap();
            system.solve().unwrap();

            if shell_precond {
                assert!(system.shell_precond_matrix().unwrap().is_attached());
            } else {
                let precond = system.precond_matrix().unwrap();
                assert_eq!(precond.nnz(), 10);
                // 1 / (2 / h) with h = 1/11
                assert!((precond.get(0, 0) - 1.0 / 22.0).abs() < 1e-14);
            }
            assert_eq!(system.get_n_converged(), 2);
        }
    }
}
