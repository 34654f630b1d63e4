use approx::AbsDiffEq;
use ndarray::prelude::*;
use pulay::io::{Configuration, LoopConfig};
use pulay::mixer::{DiisMixer, LinearMixer, Mixer};
use pulay::scf_loop::{run_self_consistent, Convergence, FixedPointProblem};

// a.x = b with a diagonally dominant, iterated as x -> x + (b - a.x) / diag(a)
struct LinearModel {
    a: Array2<f64>,
    b: Array1<f64>,
}

impl LinearModel {
    fn new() -> Self {
        LinearModel {
            a: array![
                [1.0, 0.1, 0.3, 0.2],
                [0.1, 1.5, 0.2, 0.1],
                [0.3, 0.2, 1.8, 0.2],
                [0.2, 0.1, 0.2, 1.3],
            ],
            b: array![0.9, 1.5, 1.1, 0.4],
        }
    }

    fn guess(&self) -> Array1<f64> {
        &self.b / &self.a.diag()
    }
}

impl FixedPointProblem for LinearModel {
    fn residual(&self, x: ArrayView1<f64>) -> Array1<f64> {
        (&self.b - &self.a.dot(&x)) / &self.a.diag()
    }
}

fn loop_config() -> LoopConfig {
    LoopConfig {
        max_iter: 60,
        convergence: 1e-7,
        mixing: 1.0,
    }
}

fn run<X: Mixer>(mixer: &mut X) -> Convergence {
    let model = LinearModel::new();
    run_self_consistent(&model, mixer, model.guess(), &loop_config()).unwrap()
}

#[test]
fn diis_needs_fewer_iterations_than_plain_mixing() {
    let _ = env_logger::builder().is_test(true).try_init();
    let model = LinearModel::new();

    let plain: Convergence = run(&mut LinearMixer::new(1.0));
    let config = Configuration::default();
    let diis: Convergence = run(&mut DiisMixer::new(&config.diis, 1.0).unwrap());

    assert!(diis.iterations < plain.iterations);
    assert!(model.a.dot(&diis.solution).abs_diff_eq(&model.b, 1e-6));
    assert!(diis.solution.abs_diff_eq(&plain.solution, 1e-6));
}

#[test]
fn single_domain_matches_dense_backend() {
    let config = Configuration::default();
    let mut submatrix_config = config.diis.clone();
    submatrix_config.backend = String::from("submatrix");
    submatrix_config.domains = 1;

    let model = LinearModel::new();
    let x: Array1<f64> = model.guess();
    let mut dense = DiisMixer::new(&config.diis, 1.0).unwrap();
    let mut domains = DiisMixer::new(&submatrix_config, 1.0).unwrap();
    let mut x_dense: Array1<f64> = x.clone();
    let mut x_domains: Array1<f64> = x;
    for _ in 0..4 {
        let r_dense = model.residual(x_dense.view());
        let r_domains = model.residual(x_domains.view());
        x_dense = dense.mix(x_dense, r_dense).unwrap();
        x_domains = domains.mix(x_domains, r_domains).unwrap();
        assert!(x_dense.abs_diff_eq(&x_domains, 1e-12));
    }
    assert_eq!(dense.history_length(), 4);
}

#[test]
fn invalid_names_are_rejected_by_the_mixer() {
    let mut config = Configuration::default().diis;
    config.error_metric = String::from("commutator");
    assert!(DiisMixer::new(&config, 1.0).is_err());
}
