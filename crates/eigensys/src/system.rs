//! The eigenvalue system.

use eigensys_core::{
    DofMap, LinearOperator, MatrixBuildType, ParallelType, ShellMatrix, SparseMatrix, System,
};
use eigensys_solver::{EigenProblemType, EigenSolver, EigenSolverParams, PositionOfSpectrum};
use nalgebra::DVector;

use crate::assembly::{EigenAssembly, Operators, PrecondSlot};
use crate::error::{EigenSystemError, Result};
use crate::registry::MatrixRegistry;

/// Manages the operators, configuration and results of an eigenvalue problem.
///
/// Handles standard problems `A*x = lambda*x` and generalized problems
/// `A*x = lambda*B*x`. The operator slots are allocated by
/// [`init`](EigenSystem::init)/[`reinit`](EigenSystem::reinit) in either
/// assembled or shell form and filled by the attached [`EigenAssembly`].
///
/// Slot layout by configuration:
///
/// | shell matrices | shell precond | allocated slots                                  |
/// |----------------|---------------|--------------------------------------------------|
/// | no             | no            | `matrix_a` (+ `matrix_b`)                        |
/// | yes            | no            | `shell_matrix_a` (+ `shell_matrix_b`), `precond_matrix` |
/// | yes            | yes           | `shell_matrix_a` (+ `shell_matrix_b`), `shell_precond_matrix` |
///
/// The B slots exist only for generalized problem types.
pub struct EigenSystem {
    base: System,
    eigen_solver: Box<dyn EigenSolver>,
    assembly: Option<Box<dyn EigenAssembly>>,
    solver_params: EigenSolverParams,

    eigen_problem_type: EigenProblemType,
    is_generalized: bool,
    use_shell_matrices: bool,
    use_shell_precond_matrix: bool,
    assemble_before_solve: bool,
    initialized: bool,

    matrix_a: Option<SparseMatrix>,
    matrix_b: Option<SparseMatrix>,
    precond_matrix: Option<SparseMatrix>,
    shell_matrix_a: Option<ShellMatrix>,
    shell_matrix_b: Option<ShellMatrix>,
    shell_precond_matrix: Option<ShellMatrix>,

    matrices: MatrixRegistry,

    n_converged_eigenpairs: usize,
    n_iterations: usize,
}

impl EigenSystem {
    /// Create a system over the given layout, solving with `eigen_solver`.
    ///
    /// The problem type defaults to NHEP. Nothing is allocated until
    /// [`init`](EigenSystem::init).
    pub fn new(
        name: impl Into<String>,
        number: u32,
        dof_map: DofMap,
        mut eigen_solver: Box<dyn EigenSolver>,
    ) -> Self {
        let eigen_problem_type = EigenProblemType::default();
        eigen_solver.set_eigenproblem_type(eigen_problem_type);

        Self {
            base: System::new(name, number, dof_map),
            eigen_solver,
            assembly: None,
            solver_params: EigenSolverParams::default(),
            eigen_problem_type,
            is_generalized: eigen_problem_type.is_generalized(),
            use_shell_matrices: false,
            use_shell_precond_matrix: false,
            assemble_before_solve: true,
            initialized: false,
            matrix_a: None,
            matrix_b: None,
            precond_matrix: None,
            shell_matrix_a: None,
            shell_matrix_b: None,
            shell_precond_matrix: None,
            matrices: MatrixRegistry::new(),
            n_converged_eigenpairs: 0,
            n_iterations: 0,
        }
    }

    /// Attach the problem-specific assembly, adopting its problem type.
    pub fn with_assembly(mut self, assembly: Box<dyn EigenAssembly>) -> Self {
        self.attach_assembly(assembly);
        self
    }

    /// Attach the problem-specific assembly, adopting its problem type.
    pub fn attach_assembly(&mut self, assembly: Box<dyn EigenAssembly>) {
        self.set_eigenproblem_type(assembly.problem_type());
        self.assembly = Some(assembly);
    }

    /// System type identifier.
    pub fn system_type(&self) -> &'static str {
        "Eigen"
    }

    /// System name.
    pub fn name(&self) -> &str {
        self.base.name()
    }

    /// System number.
    pub fn number(&self) -> u32 {
        self.base.number()
    }

    /// The base system (DOF layout and solution buffer).
    pub fn base(&self) -> &System {
        &self.base
    }

    /// Mutable base system. Call [`reinit`](EigenSystem::reinit) after
    /// changing the layout.
    pub fn base_mut(&mut self) -> &mut System {
        &mut self.base
    }

    /// The solution buffer eigenvectors are copied into.
    pub fn solution(&self) -> &DVector<f64> {
        self.base.solution()
    }

    /// The eigen solver.
    pub fn eigen_solver(&self) -> &dyn EigenSolver {
        self.eigen_solver.as_ref()
    }

    /// Mutable eigen solver.
    pub fn eigen_solver_mut(&mut self) -> &mut dyn EigenSolver {
        self.eigen_solver.as_mut()
    }

    /// Whether the slots have been allocated.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Set the problem type, keeping the generalized flag consistent.
    pub fn set_eigenproblem_type(&mut self, eigen_problem_type: EigenProblemType) {
        self.eigen_problem_type = eigen_problem_type;
        self.is_generalized = eigen_problem_type.is_generalized();
        self.eigen_solver.set_eigenproblem_type(eigen_problem_type);
    }

    /// Problem type.
    pub fn get_eigenproblem_type(&self) -> EigenProblemType {
        self.eigen_problem_type
    }

    /// Whether the problem is generalized.
    pub fn generalized(&self) -> bool {
        self.is_generalized
    }

    /// Whether shell matrices are used.
    pub fn use_shell_matrices(&self) -> bool {
        self.use_shell_matrices
    }

    /// Use shell matrices from the next `init`/`reinit` on.
    pub fn set_use_shell_matrices(&mut self, use_shell_matrices: bool) {
        self.use_shell_matrices = use_shell_matrices;
    }

    /// Whether a shell preconditioning matrix is used.
    pub fn use_shell_precond_matrix(&self) -> bool {
        self.use_shell_precond_matrix
    }

    /// Use a shell preconditioning matrix from the next `init`/`reinit` on.
    pub fn set_use_shell_precond_matrix(&mut self, use_shell_precond_matrix: bool) {
        self.use_shell_precond_matrix = use_shell_precond_matrix;
    }

    /// Whether [`solve`](EigenSystem::solve) assembles first.
    pub fn assemble_before_solve(&self) -> bool {
        self.assemble_before_solve
    }

    /// Set whether [`solve`](EigenSystem::solve) assembles first.
    pub fn set_assemble_before_solve(&mut self, assemble_before_solve: bool) {
        self.assemble_before_solve = assemble_before_solve;
    }

    /// Select which eigenvalues the solver computes.
    pub fn set_position_of_spectrum(&mut self, position: PositionOfSpectrum) {
        self.eigen_solver.set_position_of_spectrum(position);
    }

    /// Current spectrum selection.
    pub fn position_of_spectrum(&self) -> PositionOfSpectrum {
        self.eigen_solver.position_of_spectrum()
    }

    /// Solver parameters.
    pub fn solver_params(&self) -> &EigenSolverParams {
        &self.solver_params
    }

    /// Replace the solver parameters.
    pub fn set_solver_params(&mut self, params: EigenSolverParams) {
        self.solver_params = params;
    }

    /// Provide a starting vector for subsequent solves.
    ///
    /// The vector survives `clear` and `reinit`; the solver checks it against
    /// the layout when it runs.
    pub fn set_initial_space(&mut self, initial_space: DVector<f64>) {
        self.eigen_solver.set_initial_space(initial_space);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Allocate the solution buffer and the operator slots.
    pub fn init(&mut self) -> Result<()> {
        self.base.reinit();
        self.init_data()
    }

    /// Allocate the operator slots and size the registry to the layout.
    pub fn init_data(&mut self) -> Result<()> {
        self.is_generalized = self.eigen_problem_type.is_generalized();
        self.init_matrices()?;
        self.matrices.reinit(self.base.dof_map());
        self.initialized = true;
        Ok(())
    }

    /// Allocate the operator slots for the current configuration.
    pub fn init_matrices(&mut self) -> Result<()> {
        self.check_shell_flags()?;
        self.release_matrices();

        let dof_map = self.base.dof_map();
        if self.use_shell_matrices {
            self.shell_matrix_a = Some(ShellMatrix::with_layout(dof_map));
            if self.is_generalized {
                self.shell_matrix_b = Some(ShellMatrix::with_layout(dof_map));
            }
            if self.use_shell_precond_matrix {
                self.shell_precond_matrix = Some(ShellMatrix::with_layout(dof_map));
            } else {
                self.precond_matrix = Some(assembled(dof_map));
            }
        } else {
            self.matrix_a = Some(assembled(dof_map));
            if self.is_generalized {
                self.matrix_b = Some(assembled(dof_map));
            }
        }

        log::debug!(
            "Allocated {} {} operator(s) for '{}' ({} DOFs, local {:?})",
            self.n_matrices(),
            if self.use_shell_matrices { "shell" } else { "assembled" },
            self.base.name(),
            dof_map.n_dofs(),
            dof_map.local_range()
        );
        Ok(())
    }

    /// Re-derive every slot from the current layout.
    ///
    /// Configuration flags are kept. Previous results are discarded since
    /// their eigenvectors no longer match the layout.
    pub fn reinit(&mut self) -> Result<()> {
        self.base.reinit();
        self.eigen_solver.clear();
        self.set_n_converged(0);
        self.set_n_iterations(0);
        self.init_data()
    }

    /// Release every matrix and result. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.base.clear();
        self.release_matrices();
        self.matrices.clear();
        self.eigen_solver.clear();
        self.set_n_converged(0);
        self.set_n_iterations(0);
        self.initialized = false;
    }

    fn release_matrices(&mut self) {
        self.matrix_a = None;
        self.matrix_b = None;
        self.precond_matrix = None;
        self.shell_matrix_a = None;
        self.shell_matrix_b = None;
        self.shell_precond_matrix = None;
    }

    fn check_shell_flags(&self) -> Result<()> {
        if self.use_shell_precond_matrix && !self.use_shell_matrices {
            return Err(EigenSystemError::Configuration(
                "a shell preconditioning matrix requires shell matrices".into(),
            ));
        }
        Ok(())
    }

    /// The attached assembly must fill the operators this system solves with.
    fn check_assembly(&self) -> Result<()> {
        let Some(assembly) = self.assembly.as_deref() else {
            return Ok(());
        };
        let assembly_type = assembly.problem_type();
        if assembly_type.is_generalized() != self.is_generalized {
            return Err(EigenSystemError::Configuration(format!(
                "assembly discretizes a {} problem but '{}' is configured as {}",
                assembly_type,
                self.base.name(),
                self.eigen_problem_type
            )));
        }
        Ok(())
    }

    fn check_initialized(&self, action: &str) -> Result<()> {
        if !self.initialized {
            return Err(EigenSystemError::Configuration(format!(
                "system '{}' must be initialized before {}",
                self.base.name(),
                action
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Operator slots
    // ------------------------------------------------------------------

    /// System matrix A (assembled form).
    pub fn matrix_a(&self) -> Option<&SparseMatrix> {
        self.matrix_a.as_ref()
    }

    /// Mutable system matrix A.
    pub fn matrix_a_mut(&mut self) -> Option<&mut SparseMatrix> {
        self.matrix_a.as_mut()
    }

    /// Second matrix B of generalized problems (assembled form).
    pub fn matrix_b(&self) -> Option<&SparseMatrix> {
        self.matrix_b.as_ref()
    }

    /// Mutable matrix B.
    pub fn matrix_b_mut(&mut self) -> Option<&mut SparseMatrix> {
        self.matrix_b.as_mut()
    }

    /// Assembled preconditioning matrix (shell mode only).
    pub fn precond_matrix(&self) -> Option<&SparseMatrix> {
        self.precond_matrix.as_ref()
    }

    /// Mutable assembled preconditioning matrix.
    pub fn precond_matrix_mut(&mut self) -> Option<&mut SparseMatrix> {
        self.precond_matrix.as_mut()
    }

    /// Shell form of A.
    pub fn shell_matrix_a(&self) -> Option<&ShellMatrix> {
        self.shell_matrix_a.as_ref()
    }

    /// Mutable shell form of A.
    pub fn shell_matrix_a_mut(&mut self) -> Option<&mut ShellMatrix> {
        self.shell_matrix_a.as_mut()
    }

    /// Shell form of B.
    pub fn shell_matrix_b(&self) -> Option<&ShellMatrix> {
        self.shell_matrix_b.as_ref()
    }

    /// Mutable shell form of B.
    pub fn shell_matrix_b_mut(&mut self) -> Option<&mut ShellMatrix> {
        self.shell_matrix_b.as_mut()
    }

    /// Shell preconditioning matrix.
    pub fn shell_precond_matrix(&self) -> Option<&ShellMatrix> {
        self.shell_precond_matrix.as_ref()
    }

    /// Mutable shell preconditioning matrix.
    pub fn shell_precond_matrix_mut(&mut self) -> Option<&mut ShellMatrix> {
        self.shell_precond_matrix.as_mut()
    }

    /// Number of matrices defining the problem: 2 if generalized, else 1.
    pub fn n_matrices(&self) -> usize {
        if self.is_generalized { 2 } else { 1 }
    }

    // ------------------------------------------------------------------
    // Auxiliary matrices
    // ------------------------------------------------------------------

    /// Register an auxiliary matrix sized by the current layout.
    ///
    /// None of these matrices is involved in the solve. Fails with
    /// [`EigenSystemError::DuplicateName`] if `name` is taken.
    pub fn add_matrix(
        &mut self,
        name: &str,
        parallel_type: ParallelType,
        build_type: MatrixBuildType,
    ) -> Result<&mut SparseMatrix> {
        self.matrices
            .add(name, self.base.dof_map(), parallel_type, build_type)
    }

    /// Whether an auxiliary matrix named `name` exists.
    pub fn have_matrix(&self, name: &str) -> bool {
        self.matrices.contains(name)
    }

    /// Auxiliary matrix named `name`.
    pub fn get_matrix(&self, name: &str) -> Result<&SparseMatrix> {
        self.matrices.get(name)
    }

    /// Mutable auxiliary matrix named `name`.
    pub fn get_matrix_mut(&mut self, name: &str) -> Result<&mut SparseMatrix> {
        self.matrices.get_mut(name)
    }

    /// The auxiliary matrix registry.
    pub fn matrices(&self) -> &MatrixRegistry {
        &self.matrices
    }

    // ------------------------------------------------------------------
    // Assembly and solve
    // ------------------------------------------------------------------

    /// Fill the operator slots through the attached assembly.
    ///
    /// Without an assembly this is a no-op and the slots are expected to be
    /// filled by the caller.
    pub fn assemble(&mut self) -> Result<()> {
        self.check_initialized("assembly")?;
        self.check_assembly()?;

        let Some(assembly) = self.assembly.as_deref() else {
            log::debug!("No assembly attached to '{}'", self.base.name());
            return Ok(());
        };

        let dof_map = self.base.dof_map();
        let operators = if self.use_shell_matrices {
            let shell_a = self
                .shell_matrix_a
                .as_mut()
                .ok_or_else(|| not_allocated("shell matrix A"))?;
            let shell_b = if self.is_generalized {
                Some(
                    self.shell_matrix_b
                        .as_mut()
                        .ok_or_else(|| not_allocated("shell matrix B"))?,
                )
            } else {
                None
            };
            let precond = if self.use_shell_precond_matrix {
                PrecondSlot::Shell(
                    self.shell_precond_matrix
                        .as_mut()
                        .ok_or_else(|| not_allocated("shell preconditioning matrix"))?,
                )
            } else {
                let precond = self
                    .precond_matrix
                    .as_mut()
                    .ok_or_else(|| not_allocated("preconditioning matrix"))?;
                precond.zero();
                PrecondSlot::Assembled(precond)
            };
            Operators::Shell {
                shell_a,
                shell_b,
                precond,
            }
        } else {
            let matrix_a = self
                .matrix_a
                .as_mut()
                .ok_or_else(|| not_allocated("matrix A"))?;
            matrix_a.zero();
            let matrix_b = if self.is_generalized {
                let matrix_b = self
                    .matrix_b
                    .as_mut()
                    .ok_or_else(|| not_allocated("matrix B"))?;
                matrix_b.zero();
                Some(matrix_b)
            } else {
                None
            };
            Operators::Assembled { matrix_a, matrix_b }
        };

        log::debug!(
            "Assembling {} operators of '{}'",
            if operators.is_shell() { "shell" } else { "assembled" },
            self.base.name()
        );
        assembly.fill_operators(dof_map, operators)?;

        for matrix in [
            &mut self.matrix_a,
            &mut self.matrix_b,
            &mut self.precond_matrix,
        ]
        .into_iter()
        .flatten()
        {
            if matrix.initialized() {
                matrix.close()?;
            }
        }
        Ok(())
    }

    /// Assemble (if enabled) and solve, recording the converged pair count
    /// and the iteration count.
    ///
    /// Fewer converged pairs than requested is not an error; check
    /// [`get_n_converged`](EigenSystem::get_n_converged).
    pub fn solve(&mut self) -> Result<()> {
        self.check_shell_flags()?;
        self.check_initialized("solve")?;
        self.check_assembly()?;

        if self.assemble_before_solve {
            self.assemble()?;
        }

        let params = &self.solver_params;
        let solver = self.eigen_solver.as_mut();

        let data = if self.use_shell_matrices {
            let a = attached(self.shell_matrix_a.as_ref(), "shell matrix A")?;
            let precond: Option<&dyn LinearOperator> = if self.use_shell_precond_matrix {
                self.shell_precond_matrix
                    .as_ref()
                    .and_then(|shell| shell.operator().ok())
            } else {
                self.precond_matrix
                    .as_ref()
                    .filter(|m| m.nnz() > 0)
                    .map(|m| m as &dyn LinearOperator)
            };

            if self.is_generalized {
                let b = attached(self.shell_matrix_b.as_ref(), "shell matrix B")?;
                solver.solve_generalized(a, b, precond, params)?
            } else {
                solver.solve_standard(a, precond, params)?
            }
        } else {
            let a = self
                .matrix_a
                .as_ref()
                .ok_or_else(|| not_allocated("matrix A"))?;
            if self.is_generalized {
                let b = self
                    .matrix_b
                    .as_ref()
                    .ok_or_else(|| not_allocated("matrix B"))?;
                solver.solve_generalized(a, b, None, params)?
            } else {
                solver.solve_standard(a, None, params)?
            }
        };

        self.set_n_converged(data.n_converged);
        self.set_n_iterations(data.n_iterations);

        let wanted = self.solver_params.n_eigenpairs.min(self.base.n_dofs());
        if data.n_converged < wanted {
            log::warn!(
                "'{}': {} of {} requested eigenpairs converged after {} iterations",
                self.base.name(),
                data.n_converged,
                wanted,
                data.n_iterations
            );
        } else {
            log::info!(
                "'{}': {} eigenpairs converged after {} iterations ({})",
                self.base.name(),
                data.n_converged,
                data.n_iterations,
                self.eigen_solver.name()
            );
        }
        Ok(())
    }

    /// Eigenvalue `i` as `(real, imag)`; copies its eigenvector into the
    /// solution buffer.
    pub fn get_eigenpair(&mut self, i: usize) -> Result<(f64, f64)> {
        self.check_index(i)?;
        Ok(self.eigen_solver.eigenpair(i, self.base.solution_mut())?)
    }

    /// Eigenvalue `i` as `(real, imag)`, leaving the solution buffer alone.
    pub fn get_eigenvalue(&self, i: usize) -> Result<(f64, f64)> {
        self.check_index(i)?;
        Ok(self.eigen_solver.eigenvalue(i)?)
    }

    /// Number of converged eigenpairs of the last solve.
    pub fn get_n_converged(&self) -> usize {
        self.n_converged_eigenpairs
    }

    /// Number of solver iterations of the last solve.
    pub fn get_n_iterations(&self) -> usize {
        self.n_iterations
    }

    fn set_n_converged(&mut self, nconv: usize) {
        self.n_converged_eigenpairs = nconv;
    }

    fn set_n_iterations(&mut self, its: usize) {
        self.n_iterations = its;
    }

    fn check_index(&self, i: usize) -> Result<()> {
        if i >= self.n_converged_eigenpairs {
            return Err(EigenSystemError::IndexOutOfRange {
                index: i,
                n_converged: self.n_converged_eigenpairs,
            });
        }
        Ok(())
    }
}

fn assembled(dof_map: &DofMap) -> SparseMatrix {
    SparseMatrix::with_layout(dof_map, ParallelType::Parallel, MatrixBuildType::Automatic)
}

fn not_allocated(slot: &str) -> EigenSystemError {
    EigenSystemError::Configuration(format!(
        "{slot} is not allocated; call reinit after changing the configuration"
    ))
}

fn attached<'a>(shell: Option<&'a ShellMatrix>, slot: &str) -> Result<&'a dyn LinearOperator> {
    shell
        .ok_or_else(|| not_allocated(slot))?
        .operator()
        .map_err(|_| EigenSystemError::Configuration(format!("{slot} has no attached operator")))
}
