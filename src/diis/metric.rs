use crate::diis::DiisError;
use crate::matrix::DiisMatrix;
use crate::submatrix::DomainSubmatrix;
use ndarray::Zip;
use std::fmt;
use std::str::FromStr;

/// Inner product that is used to build the DIIS matrix from two error matrices.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorMetric {
    /// Frobenius inner product, sum_ij A_ij * B_ij
    Orthogonal,
}

impl FromStr for ErrorMetric {
    type Err = DiisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "orthogonal" | "frobenius" => Ok(ErrorMetric::Orthogonal),
            _ => Err(DiisError::UnsupportedMetric(s.to_string())),
        }
    }
}

impl fmt::Display for ErrorMetric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorMetric::Orthogonal => f.pad("orthogonal"),
        }
    }
}

impl ErrorMetric {
    /// Overlap of two error matrices of the dense backend.
    pub fn overlap<M: DiisMatrix>(&self, a: &M, b: &M) -> f64 {
        match self {
            ErrorMetric::Orthogonal => a.dot_product(b),
        }
    }

    /// Overlap of two error blocks of the same, locally owned domain.
    pub fn domain_overlap(
        &self,
        a: &DomainSubmatrix,
        b: &DomainSubmatrix,
    ) -> Result<f64, DiisError> {
        if a.domain.is_none() || a.domain != b.domain {
            return Err(DiisError::InvalidArgument(format!(
                "error blocks belong to different or remote domains ({:?}, {:?})",
                a.domain, b.domain
            )));
        }
        if a.data.dim() != b.data.dim() {
            return Err(DiisError::InvalidArgument(format!(
                "error blocks of {:?} have different shapes {:?} and {:?}",
                a.domain,
                a.data.dim(),
                b.data.dim()
            )));
        }
        match self {
            ErrorMetric::Orthogonal => Ok(Zip::from(&a.data)
                .and(&b.data)
                .fold(0.0, |acc, &x, &y| acc + x * y)),
        }
    }
}
