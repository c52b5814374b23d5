//! eigensys CLI.
//!
//! Solves 1D model eigenproblems through an [`EigenSystem`] with the dense
//! backend, optionally refining the grid and re-solving after `reinit`.

mod output;
mod problems;

use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use eigensys::{
    DenseEigenSolver, DofMap, EigenProblemType, EigenSolverParams, EigenSystem,
    PositionOfSpectrum,
};

use crate::output::{SolveReport, print_json, print_report};
use crate::problems::{ModelProblem, ProblemKind};

#[derive(Parser, Debug)]
#[command(name = "eigensys")]
#[command(about = "Solve 1D model eigenproblems with eigensys")]
#[command(version)]
struct Cli {
    /// Model problem: laplace or convection
    #[arg(long, default_value = "laplace")]
    problem: String,

    /// Number of elements on the interval
    #[arg(short = 'n', long, default_value_t = 32)]
    elements: usize,

    /// Interval length
    #[arg(long, default_value_t = 1.0)]
    length: f64,

    /// Convection velocity (convection problem only)
    #[arg(long, default_value_t = 1.0)]
    velocity: f64,

    /// Problem type: nhep, hep, gnhep, ghep, ghiep [default: hep for laplace, nhep for convection]
    #[arg(long = "type")]
    problem_type: Option<String>,

    /// Use matrix-free shell operators
    #[arg(long)]
    shell: bool,

    /// Use a matrix-free Jacobi preconditioner (requires --shell)
    #[arg(long)]
    shell_precond: bool,

    /// Number of requested eigenpairs
    #[arg(long, default_value_t = 5)]
    nev: usize,

    /// Number of basis vectors [default: max(20, 2 * nev)]
    #[arg(long)]
    ncv: Option<usize>,

    /// Convergence tolerance (relative residual)
    #[arg(long, default_value_t = 1e-10)]
    tol: f64,

    /// Maximum number of solver iterations
    #[arg(long, default_value_t = 1000)]
    max_iter: usize,

    /// Position of spectrum: lm, sm, lr, sr, li, si, tm, tr
    #[arg(long, default_value = "sr")]
    position: String,

    /// Target value for tm/tr positions
    #[arg(long, default_value_t = 0.0)]
    target: f64,

    /// Number of uniform refinements, each followed by reinit and re-solve
    #[arg(long, default_value_t = 0)]
    refinements: usize,

    /// Include eigenvectors in JSON output
    #[arg(long)]
    vectors: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let kind = ProblemKind::from_name(&cli.problem)
        .ok_or_else(|| anyhow!("unknown problem '{}'", cli.problem))?;
    let problem_type = match &cli.problem_type {
        Some(name) => EigenProblemType::from_name(name)
            .ok_or_else(|| anyhow!("unknown problem type '{}'", name))?,
        None => kind.default_problem_type(),
    };
    if kind == ProblemKind::Convection && problem_type.is_hermitian() {
        bail!("convection is non-Hermitian; use --type nhep or --type gnhep");
    }
    let position = PositionOfSpectrum::from_name(&cli.position, cli.target)
        .ok_or_else(|| anyhow!("unknown position of spectrum '{}'", cli.position))?;
    if cli.elements < 2 {
        bail!("at least 2 elements are needed, got {}", cli.elements);
    }
    if !(cli.length > 0.0) {
        bail!("interval length must be positive, got {}", cli.length);
    }

    let params = EigenSolverParams::default()
        .with_eigenpairs(cli.nev)
        .with_basis_vectors(cli.ncv.unwrap_or(cli.nev.saturating_mul(2).max(20)))
        .with_tolerance(cli.tol)
        .with_max_iterations(cli.max_iter);

    let problem = ModelProblem::new(kind, problem_type, cli.length, cli.velocity);
    let reference = |k: usize| {
        let lowest_first = matches!(
            position,
            PositionOfSpectrum::SmallestReal | PositionOfSpectrum::SmallestMagnitude
        );
        (kind == ProblemKind::Laplace && lowest_first).then(|| problem.continuous_eigenvalue(k + 1))
    };

    let mut elements = cli.elements;
    let mut system = EigenSystem::new(
        "model",
        0,
        DofMap::banded(elements - 1, 1),
        Box::new(DenseEigenSolver::new()),
    )
    .with_assembly(Box::new(problem.clone()));
    system.set_use_shell_matrices(cli.shell);
    system.set_use_shell_precond_matrix(cli.shell_precond);
    system.set_position_of_spectrum(position);
    system.set_solver_params(params);
    system
        .init()
        .context("failed to initialize the eigen system")?;

    let mut reports = Vec::with_capacity(cli.refinements + 1);
    for level in 0..=cli.refinements {
        if level > 0 {
            elements *= 2;
            system.base_mut().set_dof_map(DofMap::banded(elements - 1, 1));
            system
                .reinit()
                .with_context(|| format!("failed to reinitialize at level {}", level))?;
        }

        system
            .solve()
            .with_context(|| format!("solve failed at level {}", level))?;
        reports.push(SolveReport::collect(
            &mut system,
            level,
            elements,
            reference,
            cli.vectors,
        )?);
    }

    if cli.json {
        print_json(&reports)?;
    } else {
        println!("Eigenvalue Analysis: {:?} on (0, {})", kind, cli.length);
        println!("==========================================");
        println!();
        for report in &reports {
            print_report(report);
        }
        println!("Analysis complete.");
    }
    Ok(())
}
