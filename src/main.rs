use anyhow::Result;
use clap::{crate_version, Arg, Command};
use log::{info, LevelFilter};
use ndarray::prelude::*;
use pulay::defaults::CONFIG_FILE_NAME;
use pulay::io::{write_header, Configuration};
use pulay::mixer::{DiisMixer, LinearMixer, Mixer};
use pulay::scf_loop::{run_self_consistent, FixedPointProblem};
use std::io::Write;
use std::path::Path;

/// Linear equation a.x = b with a diagonally dominant matrix a, solved by the Jacobi-like
/// iteration x -> x + (b - a.x) / diag(a).
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

fn solve<X: Mixer>(name: &str, model: &LinearModel, mixer: &mut X, config: &Configuration) -> Result<()> {
    info!("{: ^80}", name);
    let result = run_self_consistent(model, mixer, model.guess(), &config.scf_loop)?;
    info!("solution: {:10.6}", result.solution);
    info!(
        "residual: {:10.3e} after {} iterations ({:.3} s)",
        result.residual_norm, result.iterations, result.wall_time
    );
    Ok(())
}

fn main() -> Result<()> {
    let matches = Command::new("pulay")
        .version(crate_version!())
        .about("DIIS acceleration of a self-consistent fixed-point iteration")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .takes_value(true)
                .help("TOML configuration file"),
        )
        .get_matches();

    let config_path: &str = matches.value_of("config").unwrap_or(CONFIG_FILE_NAME);
    let config: Configuration = Configuration::from_file(Path::new(config_path))?;

    let log_level: LevelFilter = match config.verbose {
        2 => LevelFilter::Trace,
        1 => LevelFilter::Debug,
        0 => LevelFilter::Info,
        -1 => LevelFilter::Warn,
        -2 => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    env_logger::Builder::new()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter(None, log_level)
        .parse_env("RUST_LOG")
        .init();

    write_header();

    let model: LinearModel = LinearModel::new();

    let mut linear_mixer: LinearMixer = LinearMixer::new(config.scf_loop.mixing);
    solve("Plain iteration", &model, &mut linear_mixer, &config)?;

    let mut diis_mixer: DiisMixer = DiisMixer::new(&config.diis, config.scf_loop.mixing)?;
    solve("DIIS accelerated iteration", &model, &mut diis_mixer, &config)?;
    diis_mixer.reset();

    Ok(())
}
