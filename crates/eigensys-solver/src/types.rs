//! Problem types, spectrum selection and solver configuration.

use std::fmt;

/// The kind of eigenvalue problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EigenProblemType {
    /// Non-Hermitian standard problem A*x = lambda*x.
    #[default]
    Nhep,
    /// Hermitian standard problem.
    Hep,
    /// Generalized non-Hermitian problem A*x = lambda*B*x.
    Gnhep,
    /// Generalized Hermitian problem with B positive definite.
    Ghep,
    /// Generalized Hermitian problem with B indefinite.
    Ghiep,
}

impl EigenProblemType {
    /// All problem types.
    pub const ALL: [EigenProblemType; 5] = [
        EigenProblemType::Nhep,
        EigenProblemType::Hep,
        EigenProblemType::Gnhep,
        EigenProblemType::Ghep,
        EigenProblemType::Ghiep,
    ];

    /// Whether the problem involves a second matrix B.
    pub fn is_generalized(self) -> bool {
        matches!(self, Self::Gnhep | Self::Ghep | Self::Ghiep)
    }

    /// Whether A (and B) are Hermitian.
    pub fn is_hermitian(self) -> bool {
        matches!(self, Self::Hep | Self::Ghep | Self::Ghiep)
    }

    /// Short name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Nhep => "NHEP",
            Self::Hep => "HEP",
            Self::Gnhep => "GNHEP",
            Self::Ghep => "GHEP",
            Self::Ghiep => "GHIEP",
        }
    }

    /// Parse from a string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "nhep" => Some(Self::Nhep),
            "hep" => Some(Self::Hep),
            "gnhep" => Some(Self::Gnhep),
            "ghep" => Some(Self::Ghep),
            "ghiep" => Some(Self::Ghiep),
            _ => None,
        }
    }
}

impl fmt::Display for EigenProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which part of the spectrum to compute.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PositionOfSpectrum {
    /// Eigenvalues of largest magnitude.
    #[default]
    LargestMagnitude,
    /// Eigenvalues of smallest magnitude.
    SmallestMagnitude,
    /// Eigenvalues of largest real part.
    LargestReal,
    /// Eigenvalues of smallest real part.
    SmallestReal,
    /// Eigenvalues of largest imaginary part.
    LargestImaginary,
    /// Eigenvalues of smallest imaginary part.
    SmallestImaginary,
    /// Eigenvalues closest to the target in magnitude.
    TargetMagnitude(f64),
    /// Eigenvalues whose real part is closest to the target.
    TargetReal(f64),
}

impl PositionOfSpectrum {
    /// Parse from a string. Target positions take the target value separately.
    pub fn from_name(name: &str, target: f64) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "largest-magnitude" | "lm" => Some(Self::LargestMagnitude),
            "smallest-magnitude" | "sm" => Some(Self::SmallestMagnitude),
            "largest-real" | "lr" => Some(Self::LargestReal),
            "smallest-real" | "sr" => Some(Self::SmallestReal),
            "largest-imaginary" | "li" => Some(Self::LargestImaginary),
            "smallest-imaginary" | "si" => Some(Self::SmallestImaginary),
            "target-magnitude" | "tm" => Some(Self::TargetMagnitude(target)),
            "target-real" | "tr" => Some(Self::TargetReal(target)),
            _ => None,
        }
    }

    /// Sort key: eigenvalues with smaller keys come first.
    pub fn sort_key(self, re: f64, im: f64) -> f64 {
        match self {
            Self::LargestMagnitude => -re.hypot(im),
            Self::SmallestMagnitude => re.hypot(im),
            Self::LargestReal => -re,
            Self::SmallestReal => re,
            Self::LargestImaginary => -im,
            Self::SmallestImaginary => im,
            Self::TargetMagnitude(t) => (re - t).hypot(im),
            Self::TargetReal(t) => (re - t).abs(),
        }
    }
}

/// Eigen solver parameters.
#[derive(Debug, Clone)]
pub struct EigenSolverParams {
    /// Number of requested eigenpairs (nev).
    pub n_eigenpairs: usize,
    /// Number of basis vectors (ncv). Must be at least `n_eigenpairs`.
    pub n_basis_vectors: usize,
    /// Convergence tolerance (relative residual).
    pub tolerance: f64,
    /// Maximum number of solver iterations.
    pub max_iterations: usize,
}

impl Default for EigenSolverParams {
    fn default() -> Self {
        Self {
            n_eigenpairs: 5,
            n_basis_vectors: 20,
            tolerance: 1e-10,
            max_iterations: 1000,
        }
    }
}

impl EigenSolverParams {
    /// Set the number of requested eigenpairs.
    pub fn with_eigenpairs(mut self, nev: usize) -> Self {
        self.n_eigenpairs = nev;
        self
    }

    /// Set the number of basis vectors.
    pub fn with_basis_vectors(mut self, ncv: usize) -> Self {
        self.n_basis_vectors = ncv;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Set the iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Check the parameters for consistency.
    pub fn validate(&self) -> crate::Result<()> {
        if self.n_eigenpairs == 0 {
            return Err(crate::Error::InvalidParameters(
                "at least one eigenpair must be requested".into(),
            ));
        }
        if self.n_basis_vectors < self.n_eigenpairs {
            return Err(crate::Error::InvalidParameters(format!(
                "{} basis vectors cannot hold {} eigenpairs",
                self.n_basis_vectors, self.n_eigenpairs
            )));
        }
        if !(self.tolerance > 0.0) {
            return Err(crate::Error::InvalidParameters(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(crate::Error::InvalidParameters(
                "max_iterations must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a solve as reported by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolveData {
    /// Number of converged eigenpairs.
    pub n_converged: usize,
    /// Number of solver iterations.
    pub n_iterations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generalized_flag() {
        for ept in EigenProblemType::ALL {
            let expected = matches!(
                ept,
                EigenProblemType::Gnhep | EigenProblemType::Ghep | EigenProblemType::Ghiep
            );
            assert_eq!(ept.is_generalized(), expected, "{ept}");
        }
    }

    #[test]
    fn problem_type_names_roundtrip() {
        for ept in EigenProblemType::ALL {
            assert_eq!(EigenProblemType::from_name(ept.name()), Some(ept));
        }
        assert_eq!(EigenProblemType::from_name("invalid"), None);
    }

    #[test]
    fn spectrum_sort_keys() {
        let lm = PositionOfSpectrum::LargestMagnitude;
        assert!(lm.sort_key(-5.0, 0.0) < lm.sort_key(3.0, 0.0));

        let tr = PositionOfSpectrum::TargetReal(2.0);
        assert!(tr.sort_key(2.1, 9.0) < tr.sort_key(3.0, 0.0));

        assert_eq!(
            PositionOfSpectrum::from_name("TM", 4.0),
            Some(PositionOfSpectrum::TargetMagnitude(4.0))
        );
        assert_eq!(PositionOfSpectrum::from_name("middle", 0.0), None);
    }

    #[test]
    fn params_default() {
        let params = EigenSolverParams::default();
        assert_eq!(params.n_eigenpairs, 5);
        assert_eq!(params.n_basis_vectors, 20);
        assert!((params.tolerance - 1e-10).abs() < 1e-20);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn params_validation() {
        let too_few_basis = EigenSolverParams::default()
            .with_eigenpairs(10)
            .with_basis_vectors(4);
        assert!(matches!(
            too_few_basis.validate(),
            Err(crate::Error::InvalidParameters(_))
        ));

        let zero = EigenSolverParams::default().with_eigenpairs(0);
        assert!(zero.validate().is_err());

        let bad_tol = EigenSolverParams::default().with_tolerance(0.0);
        assert!(bad_tol.validate().is_err());
    }
}
