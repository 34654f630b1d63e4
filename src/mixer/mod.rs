use crate::diis::DiisError;
use ndarray::Array1;

pub mod diis;
pub use diis::DiisMixer;

/// Trait that produces the next input of a fixed-point iteration from the current input
/// and its residual, for the acceleration of self-consistent loops
pub trait Mixer {
    fn mix(&mut self, x_inp: Array1<f64>, residual: Array1<f64>) -> Result<Array1<f64>, DiisError>;
    /// Forget everything from previous iterations.
    fn reset(&mut self);
}

/// Simple damped update, x_next = x + alpha * r
pub struct LinearMixer {
    alpha: f64,
}

impl LinearMixer {
    pub fn new(alpha: f64) -> Self {
        LinearMixer { alpha }
    }
}

impl Mixer for LinearMixer {
    fn mix(&mut self, x_inp: Array1<f64>, residual: Array1<f64>) -> Result<Array1<f64>, DiisError> {
        Ok(x_inp + residual.mapv(|x| x * self.alpha))
    }

    fn reset(&mut self) {}
}
