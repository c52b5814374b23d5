//! Result collection and formatting.

use eigensys::{EigenSystem, Result};
use nalgebra::DVector;
use serde::Serialize;

/// One converged eigenpair.
#[derive(Debug, Serialize)]
pub struct EigenpairReport {
    pub index: usize,
    pub real: f64,
    pub imag: f64,
    /// Continuum eigenvalue for comparison, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<f64>,
    /// Sign changes of the eigenvector (interior nodes of the mode).
    pub sign_changes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f64>>,
}

/// Outcome of one solve.
#[derive(Debug, Serialize)]
pub struct SolveReport {
    pub level: usize,
    pub elements: usize,
    pub n_dofs: usize,
    pub problem_type: String,
    pub form: &'static str,
    pub n_converged: usize,
    pub n_iterations: usize,
    pub eigenpairs: Vec<EigenpairReport>,
}

impl SolveReport {
    /// Read every converged pair of the last solve out of the system.
    pub fn collect(
        system: &mut EigenSystem,
        level: usize,
        elements: usize,
        reference: impl Fn(usize) -> Option<f64>,
        with_vectors: bool,
    ) -> Result<Self> {
        let mut eigenpairs = Vec::with_capacity(system.get_n_converged());
        for i in 0..system.get_n_converged() {
            let (real, imag) = system.get_eigenpair(i)?;
            let x = system.solution();
            eigenpairs.push(EigenpairReport {
                index: i,
                real,
                imag,
                reference: reference(i),
                sign_changes: sign_changes(x),
                vector: with_vectors.then(|| x.iter().copied().collect()),
            });
        }

        Ok(Self {
            level,
            elements,
            n_dofs: system.base().n_dofs(),
            problem_type: system.get_eigenproblem_type().to_string(),
            form: if system.use_shell_matrices() {
                "shell"
            } else {
                "assembled"
            },
            n_converged: system.get_n_converged(),
            n_iterations: system.get_n_iterations(),
            eigenpairs,
        })
    }
}

/// Sign changes along the vector, ignoring entries below 1e-8 of its max.
pub fn sign_changes(x: &DVector<f64>) -> usize {
    let cutoff = 1e-8 * x.amax();
    let mut changes = 0;
    let mut last = 0.0_f64;
    for &v in x.iter().filter(|v| v.abs() > cutoff) {
        if last != 0.0 && v.signum() != last.signum() {
            changes += 1;
        }
        last = v;
    }
    changes
}

/// Print a report in tabular format.
pub fn print_report(report: &SolveReport) {
    println!(
        "Level {}: {} elements, {} DOFs ({}, {})",
        report.level, report.elements, report.n_dofs, report.problem_type, report.form
    );
    println!(
        "Converged {} eigenpairs in {} iterations.",
        report.n_converged, report.n_iterations
    );
    println!();

    if report.eigenpairs.is_empty() {
        println!("  (no converged eigenpairs)");
        println!();
        return;
    }

    println!(
        "  {:>4}  {:>18}  {:>14}  {:>14}  {:>5}",
        "k", "Re(lambda)", "Im(lambda)", "rel. error", "nodes"
    );
    for pair in &report.eigenpairs {
        let error = pair
            .reference
            .map(|r| format!("{:14.4e}", (pair.real - r).abs() / r.abs()))
            .unwrap_or_else(|| format!("{:>14}", "-"));
        println!(
            "  {:>4}  {:>18.10e}  {:>14.6e}  {}  {:>5}",
            pair.index, pair.real, pair.imag, error, pair.sign_changes
        );
    }
    println!();
}

/// Print all reports as a JSON array.
pub fn print_json(reports: &[SolveReport]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(reports)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_changes_count_mode_nodes() {
        let first = DVector::from_vec(vec![0.3, 0.8, 1.0, 0.8, 0.3]);
        let second = DVector::from_vec(vec![0.5, 1.0, 1e-18, -1.0, -0.5]);
        let third = DVector::from_vec(vec![0.5, -1.0, 0.2, 1.0, -0.4]);

        assert_eq!(sign_changes(&first), 0);
        assert_eq!(sign_changes(&second), 1);
        assert_eq!(sign_changes(&third), 3);
    }

    #[test]
    fn json_skips_missing_fields() {
        let report = SolveReport {
            level: 0,
            elements: 4,
            n_dofs: 3,
            problem_type: "HEP".into(),
            form: "assembled",
            n_converged: 1,
            n_iterations: 1,
            eigenpairs: vec![EigenpairReport {
                index: 0,
                real: 9.37,
                imag: 0.0,
                reference: None,
                sign_changes: 0,
                vector: None,
            }],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["form"], "assembled");
        assert_eq!(json["eigenpairs"][0]["real"], 9.37);
        assert!(json["eigenpairs"][0].get("reference").is_none());
        assert!(json["eigenpairs"][0].get("vector").is_none());
    }
}
