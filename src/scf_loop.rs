use crate::diis::DiisError;
use crate::io::LoopConfig;
use crate::mixer::Mixer;
use crate::utils::Timer;
use log::{info, log_enabled, warn, Level};
use ndarray::prelude::*;
use ndarray_stats::QuantileExt;
use std::fmt;

/// Fixed-point problem x = g(x), given by its residual r(x) = g(x) - x.
pub trait FixedPointProblem {
    fn residual(&self, x: ArrayView1<f64>) -> Array1<f64>;
}

#[derive(Debug, Clone)]
pub struct ConvergenceError {
    pub message: String,
    pub iteration: usize,
    pub residual_norm: f64,
}

impl ConvergenceError {
    pub fn new(iter: usize, residual_norm: f64) -> Self {
        let message: String = format! {"Self-consistent loop not converged after {} iterations. \
                                        The norm of the residual at the last iteration was {}",
                                       iter,
                                       residual_norm};
        Self {
            message,
            iteration: iter,
            residual_norm,
        }
    }
}

impl fmt::Display for ConvergenceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write! {f, "{}", self.message.as_str()}
    }
}

impl std::error::Error for ConvergenceError {}

#[derive(Debug)]
pub enum LoopError {
    NotConverged(ConvergenceError),
    Mixer(DiisError),
}

impl fmt::Display for LoopError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            LoopError::NotConverged(err) => write!(f, "{}", err),
            LoopError::Mixer(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for LoopError {}

impl From<DiisError> for LoopError {
    fn from(err: DiisError) -> Self {
        LoopError::Mixer(err)
    }
}

#[derive(Debug, Clone)]
pub struct Convergence {
    pub solution: Array1<f64>,
    /// number of mixing steps that were needed
    pub iterations: usize,
    pub residual_norm: f64,
    /// wall time of the loop in seconds
    pub wall_time: f64,
}

/// Iterates x_{n+1} = mixer(x_n, r(x_n)) until the norm of the residual drops below
/// the convergence threshold.
pub fn run_self_consistent<P: FixedPointProblem, X: Mixer>(
    problem: &P,
    mixer: &mut X,
    guess: Array1<f64>,
    config: &LoopConfig,
) -> Result<Convergence, LoopError> {
    let timer: Timer = Timer::start();
    let mut x: Array1<f64> = guess;
    let mut residual_norm: f64 = f64::INFINITY;

    if log_enabled!(Level::Info) {
        print_loop_init(config);
    }

    for i in 0..config.max_iter {
        let residual: Array1<f64> = problem.residual(x.view());
        residual_norm = residual.dot(&residual).sqrt();
        let residual_max: f64 = *residual.mapv(f64::abs).max().unwrap_or(&0.0);

        if log_enabled!(Level::Info) {
            print_iteration(i, residual_norm, residual_max);
        }
        if residual_norm < config.convergence {
            if log_enabled!(Level::Info) {
                print_loop_end(&timer, i);
            }
            return Ok(Convergence {
                solution: x,
                iterations: i,
                residual_norm,
                wall_time: timer.seconds(),
            });
        }
        x = mixer.mix(x, residual)?;
    }
    warn!("self-consistent loop did not converge");
    Err(LoopError::NotConverged(ConvergenceError::new(
        config.max_iter,
        residual_norm,
    )))
}

fn print_loop_init(config: &LoopConfig) {
    info!("{:^80}", "");
    info!("{: ^80}", "Self-consistent fixed-point iteration");
    info!("{:-^80}", "");
    info!("{: <25} {:>12}", "max. iterations:", config.max_iter);
    info!("{: <25} {:>12.4e}", "convergence threshold:", config.convergence);
    info!("{: <25} {:>12.4}", "mixing parameter:", config.mixing);
    info!("{:-^80}", "");
    info!("{: <5} {: >20} {: >20}", "Iter.", "|r|", "max |r_i|");
    info!("{:-^80}", "");
}

fn print_iteration(iter: usize, norm: f64, max: f64) {
    info!("{: >5} {:>20.12e} {:>20.12e}", iter, norm, max);
}

fn print_loop_end(timer: &Timer, iter: usize) {
    info!("{:-^80}", "");
    info!("converged after {} iterations", iter);
    info!("{}", timer);
    info!("{:-^80}", "");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::LinearMixer;

    // x = 0.5 * x + 1 has the fixed point x = 2
    struct Contraction;

    impl FixedPointProblem for Contraction {
        fn residual(&self, x: ArrayView1<f64>) -> Array1<f64> {
            x.mapv(|v| 1.0 - 0.5 * v)
        }
    }

    #[test]
    fn linear_mixing_converges_for_a_contraction() {
        let config = LoopConfig {
            max_iter: 100,
            convergence: 1e-10,
            mixing: 1.0,
        };
        let mut mixer = LinearMixer::new(config.mixing);
        let result =
            run_self_consistent(&Contraction, &mut mixer, array![0.0, 10.0], &config).unwrap();
        assert!((result.solution[0] - 2.0).abs() < 1e-9);
        assert!((result.solution[1] - 2.0).abs() < 1e-9);
        assert!(result.wall_time >= 0.0);
    }

    #[test]
    fn reports_non_convergence() {
        let config = LoopConfig {
            max_iter: 3,
            convergence: 1e-12,
            mixing: 1.0,
        };
        let mut mixer = LinearMixer::new(config.mixing);
        match run_self_consistent(&Contraction, &mut mixer, array![0.0], &config) {
            Err(LoopError::NotConverged(err)) => assert_eq!(err.iteration, 3),
            _ => panic!("expected a convergence error"),
        }
    }
}
