use ndarray::prelude::*;
use ndarray::Zip;

mod block_sparse;
pub use block_sparse::BlockSparseMatrix;

/// Operations the dense DIIS backend needs from a (possibly block-sparse) matrix type.
///
/// Every history slot is created once from a template with [DiisMatrix::create_like] and is
/// afterwards only overwritten with [DiisMatrix::copy_from]. The extrapolated matrix is built
/// with [DiisMatrix::set] and [DiisMatrix::add_scaled].
pub trait DiisMatrix: Sized {
    /// New matrix with the same shape (and sparsity pattern) as `template`, all values zero.
    fn create_like(template: &Self) -> Self;
    /// Overwrite `self` with the structure and values of `src`.
    fn copy_from(&mut self, src: &Self);
    /// `self = alpha * self + beta * src`
    fn add_scaled(&mut self, src: &Self, alpha: f64, beta: f64);
    /// Frobenius inner product `sum_ij A_ij * B_ij` over the whole stored structure.
    fn dot_product(&self, other: &Self) -> f64;
    /// Set every stored element to `value`.
    fn set(&mut self, value: f64);
    /// Whether `other` has the same shape (or block partitioning) as `self`.
    fn is_compatible(&self, other: &Self) -> bool;
}

impl<D: Dimension> DiisMatrix for Array<f64, D> {
    fn create_like(template: &Self) -> Self {
        Array::zeros(template.raw_dim())
    }

    fn copy_from(&mut self, src: &Self) {
        // the slot may have been created from a different template
        if self.shape() != src.shape() {
            *self = src.clone();
        } else {
            self.assign(src);
        }
    }

    fn add_scaled(&mut self, src: &Self, alpha: f64, beta: f64) {
        Zip::from(self).and(src).for_each(|a, &b| *a = alpha * *a + beta * b);
    }

    fn dot_product(&self, other: &Self) -> f64 {
        Zip::from(self)
            .and(other)
            .fold(0.0, |acc, &a, &b| acc + a * b)
    }

    fn set(&mut self, value: f64) {
        self.fill(value);
    }

    fn is_compatible(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }
}
