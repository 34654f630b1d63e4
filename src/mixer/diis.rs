use crate::diis::{BackendKind, DiisError, DiisInput, DiisOutput, DiisState, ErrorMetric};
use crate::io::DiisConfig;
use crate::mixer::Mixer;
use crate::submatrix::{init_submatrices, DomainId, DomainSubmatrix};
use ndarray::prelude::*;
use std::ops::Range;

enum Engine {
    Dense(DiisState<Array1<f64>>),
    Domains(DiisState),
}

/// DIIS accelerated fixed-point mixer.
///
/// In every iteration the plain step x + alpha * r is stored together with the residual r,
/// and the next input is the DIIS extrapolation of the stored steps. For the submatrix backend
/// the vector is split into contiguous domains that are extrapolated independently.
pub struct DiisMixer {
    // current iteration
    iter: usize,
    // mixing parameter of the plain step
    alpha: f64,
    metric: ErrorMetric,
    backend: BackendKind,
    max_history: usize,
    n_domains: usize,
    // iterations before this one only take the plain step
    start_iteration: usize,
    engine: Option<Engine>,
}

impl DiisMixer {
    pub fn new(config: &DiisConfig, alpha: f64) -> Result<Self, DiisError> {
        if config.max_history == 0 {
            return Err(DiisError::InvalidArgument(String::from(
                "the maximal history length has to be positive",
            )));
        }
        Ok(DiisMixer {
            iter: 0,
            alpha,
            metric: config.metric()?,
            backend: config.backend()?,
            max_history: config.max_history,
            n_domains: config.domains.max(1),
            start_iteration: config.start_iteration,
            engine: None,
        })
    }

    /// History length of the underlying DIIS, 0 before the first iteration.
    pub fn history_length(&self) -> usize {
        match &self.engine {
            Some(Engine::Dense(state)) => state.history_length(),
            Some(Engine::Domains(state)) => state.history_length(),
            None => 0,
        }
    }

    fn domain_ranges(&self, n: usize) -> Vec<Range<usize>> {
        let n_domains: usize = self.n_domains.min(n).max(1);
        let chunk: usize = (n + n_domains - 1) / n_domains;
        (0..n_domains)
            .map(|d| (d * chunk).min(n)..((d + 1) * chunk).min(n))
            .filter(|range| !range.is_empty())
            .collect()
    }

    fn split(ranges: &[Range<usize>], v: ArrayView1<f64>) -> Vec<DomainSubmatrix> {
        ranges
            .iter()
            .enumerate()
            .map(|(d, range)| {
                DomainSubmatrix::owned(
                    DomainId(d + 1),
                    v.slice(s![range.clone()]).to_owned().insert_axis(Axis(1)),
                )
            })
            .collect()
    }

    fn join(blocks: &[DomainSubmatrix]) -> Array1<f64> {
        blocks
            .iter()
            .flat_map(|block| block.data.iter().cloned())
            .collect()
    }
}

impl Mixer for DiisMixer {
    fn mix(&mut self, x_inp: Array1<f64>, residual: Array1<f64>) -> Result<Array1<f64>, DiisError> {
        let x_out: Array1<f64> = &x_inp + &residual.mapv(|x| x * self.alpha);
        let ranges: Vec<Range<usize>> = self.domain_ranges(x_out.len());

        if self.engine.is_none() {
            self.engine = Some(match self.backend {
                BackendKind::Dense => Engine::Dense(DiisState::new_dense(
                    &residual,
                    &x_out,
                    self.metric,
                    self.max_history,
                )?),
                BackendKind::Submatrix => Engine::Domains(DiisState::new_submatrix(
                    &Self::split(&ranges, residual.view()),
                    self.metric,
                    self.max_history,
                )?),
            });
        }
        let use_diis: bool = self.iter >= self.start_iteration;
        self.iter += 1;

        let x_next: Array1<f64> = match self.engine.as_mut() {
            Some(Engine::Dense(state)) => {
                state.push(DiisInput::Dense {
                    variable: &x_out,
                    error: &residual,
                })?;
                if use_diis {
                    let mut x_next: Array1<f64> = Array1::zeros(x_out.raw_dim());
                    state.extrapolate(DiisOutput::Dense(&mut x_next))?;
                    x_next
                } else {
                    x_out
                }
            }
            Some(Engine::Domains(state)) => {
                let variables: Vec<DomainSubmatrix> = Self::split(&ranges, x_out.view());
                let errors: Vec<DomainSubmatrix> = Self::split(&ranges, residual.view());
                state.push(DiisInput::Submatrix {
                    variables: &variables,
                    errors: &errors,
                })?;
                if use_diis {
                    let mut blocks: Vec<DomainSubmatrix> = init_submatrices(variables.len());
                    state.extrapolate(DiisOutput::Submatrix(&mut blocks))?;
                    Self::join(&blocks)
                } else {
                    x_out
                }
            }
            None => x_out,
        };
        Ok(x_next)
    }

    fn reset(&mut self) {
        if let Some(Engine::Dense(state)) = self.engine.as_mut() {
            state.release();
        }
        if let Some(Engine::Domains(state)) = self.engine.as_mut() {
            state.release();
        }
        self.engine = None;
        self.iter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Configuration;

    #[test]
    fn domains_cover_the_whole_vector() {
        let mut config = Configuration::default().diis;
        config.backend = String::from("submatrix");
        config.domains = 3;
        let mixer = DiisMixer::new(&config, 1.0).unwrap();
        let v: Array1<f64> = Array1::range(0.0, 7.0, 1.0);
        let blocks = DiisMixer::split(&mixer.domain_ranges(v.len()), v.view());
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[2].data.dim(), (1, 1));
        assert_eq!(DiisMixer::join(&blocks), v);
    }

    #[test]
    fn first_step_is_the_plain_step() {
        let config = Configuration::default().diis;
        let mut mixer = DiisMixer::new(&config, 0.5).unwrap();
        let x: Array1<f64> = array![1.0, 2.0];
        let r: Array1<f64> = array![2.0, -2.0];
        let next = mixer.mix(x, r).unwrap();
        assert_eq!(next, array![2.0, 1.0]);
        assert_eq!(mixer.history_length(), 1);
        mixer.reset();
        assert_eq!(mixer.history_length(), 0);
    }
}
