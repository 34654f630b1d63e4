use crate::diis::DiisError;
use ndarray::prelude::*;
use ndarray_linalg::{Eigh, UPLO};

/// Full eigendecomposition of a real symmetric matrix.
pub trait SymmetricEigensolver {
    /// Returns the eigenvalues in ascending order and the orthonormal eigenvectors as the
    /// columns of the second array.
    fn eigh(&self, matrix: Array2<f64>) -> Result<(Array1<f64>, Array2<f64>), DiisError>;
}

/// LAPACK (dsyev) based eigensolver of ndarray-linalg.
#[derive(Debug, Default, Copy, Clone)]
pub struct LapackEigensolver;

impl SymmetricEigensolver for LapackEigensolver {
    fn eigh(&self, matrix: Array2<f64>) -> Result<(Array1<f64>, Array2<f64>), DiisError> {
        matrix
            .eigh(UPLO::Lower)
            .map_err(|err| DiisError::EigensolverFailure(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::AbsDiffEq;

    #[test]
    fn lapack_eigh_of_bordered_matrix() {
        let b: Array2<f64> = array![[0.0, -1.0], [-1.0, 0.0]];
        let (e, v) = LapackEigensolver.eigh(b.clone()).unwrap();
        assert!(e.abs_diff_eq(&array![-1.0, 1.0], 1e-12));
        let reconstructed: Array2<f64> = v.dot(&Array2::from_diag(&e)).dot(&v.t());
        assert!(reconstructed.abs_diff_eq(&b, 1e-12));
    }
}
