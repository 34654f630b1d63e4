use crate::matrix::DiisMatrix;
use crate::submatrix::{
    add_submatrices, copy_submatrices, init_submatrices, release_submatrices, set_submatrices,
    DomainSubmatrix, Transpose,
};
use log::{log_enabled, Level};
use ndarray::prelude::*;
use std::fmt;
use std::str::FromStr;

mod correlation;
mod eigensolver;
mod logging;
mod metric;

pub use correlation::CorrelationMatrix;
pub use eigensolver::{LapackEigensolver, SymmetricEigensolver};
pub use metric::ErrorMetric;
use logging::*;

#[derive(Debug, Clone, PartialEq)]
pub enum DiisError {
    /// Wrong or missing backend specific argument, or an invalid history length.
    InvalidArgument(String),
    /// The requested error metric is not implemented.
    UnsupportedMetric(String),
    /// Backend tag is neither `dense` nor `submatrix`.
    UnknownBackend(String),
    /// The diagonalization of the DIIS matrix failed.
    EigensolverFailure(String),
}

impl fmt::Display for DiisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            DiisError::InvalidArgument(msg) => write!(f, "DIIS: invalid argument: {}", msg),
            DiisError::UnsupportedMetric(name) => {
                write!(f, "DIIS: error metric '{}' is not implemented", name)
            }
            DiisError::UnknownBackend(name) => write!(f, "DIIS: unknown backend '{}'", name),
            DiisError::EigensolverFailure(msg) => {
                write!(f, "DIIS: diagonalization of the DIIS matrix failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for DiisError {}

/// Storage layout of the history.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// One matrix for the whole system
    Dense,
    /// One small block per decomposition domain
    Submatrix,
}

impl FromStr for BackendKind {
    type Err = DiisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dense" => Ok(BackendKind::Dense),
            "submatrix" | "domain" => Ok(BackendKind::Submatrix),
            _ => Err(DiisError::UnknownBackend(s.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BackendKind::Dense => f.pad("dense"),
            BackendKind::Submatrix => f.pad("submatrix"),
        }
    }
}

/// New (variable, error) pair for [DiisState::push].
pub enum DiisInput<'a, M> {
    Dense {
        variable: &'a M,
        error: &'a M,
    },
    Submatrix {
        variables: &'a [DomainSubmatrix],
        errors: &'a [DomainSubmatrix],
    },
}

/// Target of [DiisState::extrapolate].
pub enum DiisOutput<'a, M> {
    Dense(&'a mut M),
    Submatrix(&'a mut [DomainSubmatrix]),
}

enum History<M> {
    Dense {
        variables: Vec<M>,
        errors: Vec<M>,
    },
    /// Indexed by [history slot][domain]
    Submatrix {
        variables: Vec<Vec<DomainSubmatrix>>,
        errors: Vec<Vec<DomainSubmatrix>>,
        n_domains: usize,
    },
    Released,
}

/// Direct Inversion of the Iterative Subspace (DIIS), [Pulay:1980:393].
///
/// The last `max_history` (variable, error) pairs are kept in a circular buffer. Every
/// [push](DiisState::push) updates the bordered DIIS matrix B, and
/// [extrapolate](DiisState::extrapolate) returns the linear combination of the stored
/// variables whose predicted error is minimal under the constraint that the weights sum to 1.
///
/// For the dense backend there is exactly one DIIS matrix. For the submatrix backend every
/// domain that is owned by this process has its own matrix and history, remote domains
/// are skipped.
pub struct DiisState<M = Array2<f64>> {
    history: History<M>,
    kind: BackendKind,
    metric: ErrorMetric,
    max_history: usize,
    history_length: usize,
    // 0-based slot that is written by the next push
    insertion_slot: usize,
    // one entry per domain, `None` for remote domains
    correlation: Vec<Option<CorrelationMatrix>>,
}

impl DiisState {
    /// DIIS for a domain decomposed system. The number of domains, their ownership and the
    /// block shapes of both the variables and the errors are taken from `sample_errors`.
    pub fn new_submatrix(
        sample_errors: &[DomainSubmatrix],
        metric: ErrorMetric,
        max_history: usize,
    ) -> Result<Self, DiisError> {
        if max_history == 0 {
            return Err(DiisError::InvalidArgument(String::from(
                "the maximal history length has to be positive",
            )));
        }
        if sample_errors.is_empty() {
            return Err(DiisError::InvalidArgument(String::from(
                "no domains in the sample submatrices",
            )));
        }
        let n_domains: usize = sample_errors.len();
        let empty_row = |_: usize| {
            let mut row: Vec<DomainSubmatrix> = init_submatrices(n_domains);
            copy_submatrices(&mut row, sample_errors, false);
            row
        };
        let variables: Vec<Vec<DomainSubmatrix>> = (0..max_history).map(empty_row).collect();
        let errors: Vec<Vec<DomainSubmatrix>> = (0..max_history).map(empty_row).collect();
        let correlation: Vec<Option<CorrelationMatrix>> = sample_errors
            .iter()
            .map(|sample| sample.domain.map(|_| CorrelationMatrix::new()))
            .collect();

        print_diis_init(BackendKind::Submatrix, metric, max_history, n_domains);

        Ok(DiisState {
            history: History::Submatrix {
                variables,
                errors,
                n_domains,
            },
            kind: BackendKind::Submatrix,
            metric,
            max_history,
            history_length: 0,
            insertion_slot: 0,
            correlation,
        })
    }
}

impl<M: DiisMatrix> DiisState<M> {
    /// DIIS for a single (dense or block sparse) matrix. The history slots are created with
    /// the structure of the samples.
    pub fn new_dense(
        sample_error: &M,
        sample_variable: &M,
        metric: ErrorMetric,
        max_history: usize,
    ) -> Result<Self, DiisError> {
        if max_history == 0 {
            return Err(DiisError::InvalidArgument(String::from(
                "the maximal history length has to be positive",
            )));
        }
        let variables: Vec<M> = (0..max_history)
            .map(|_| M::create_like(sample_variable))
            .collect();
        let errors: Vec<M> = (0..max_history)
            .map(|_| M::create_like(sample_error))
            .collect();

        print_diis_init(BackendKind::Dense, metric, max_history, 1);

        Ok(DiisState {
            history: History::Dense { variables, errors },
            kind: BackendKind::Dense,
            metric,
            max_history,
            history_length: 0,
            insertion_slot: 0,
            // the whole matrix is treated as a single, locally owned domain
            correlation: vec![Some(CorrelationMatrix::new())],
        })
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    pub fn error_metric(&self) -> ErrorMetric {
        self.metric
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Number of valid entries in the history.
    pub fn history_length(&self) -> usize {
        self.history_length
    }

    /// History slot that will be overwritten by the next push. Slots are counted from 0,
    /// slot `i` occupies row and column `i + 1` of the DIIS matrix.
    pub fn insertion_slot(&self) -> usize {
        self.insertion_slot
    }

    pub fn is_released(&self) -> bool {
        matches!(self.history, History::Released)
    }

    /// DIIS matrix of `domain` (always 0 for the dense backend). `None` if the domain is
    /// not owned by this process.
    pub fn correlation_matrix(&self, domain: usize) -> Option<ArrayView2<f64>> {
        self.correlation
            .get(domain)
            .and_then(|corr| corr.as_ref())
            .map(|corr| corr.view())
    }

    pub fn variable(&self, slot: usize) -> Option<&M> {
        match &self.history {
            History::Dense { variables, .. } => variables.get(slot),
            _ => None,
        }
    }

    pub fn error(&self, slot: usize) -> Option<&M> {
        match &self.history {
            History::Dense { errors, .. } => errors.get(slot),
            _ => None,
        }
    }

    pub fn domain_variable(&self, slot: usize, domain: usize) -> Option<&DomainSubmatrix> {
        match &self.history {
            History::Submatrix { variables, .. } => variables.get(slot)?.get(domain),
            _ => None,
        }
    }

    pub fn domain_error(&self, slot: usize, domain: usize) -> Option<&DomainSubmatrix> {
        match &self.history {
            History::Submatrix { errors, .. } => errors.get(slot)?.get(domain),
            _ => None,
        }
    }

    /// Stores a new (variable, error) pair in the current history slot and updates the
    /// DIIS matrix of every owned domain.
    pub fn push(&mut self, input: DiisInput<'_, M>) -> Result<(), DiisError> {
        let slot: usize = self.insertion_slot;

        // copy the new pair into the history, overwriting the oldest entry once
        // the buffer is full
        match (&mut self.history, input) {
            (History::Dense { variables, errors }, DiisInput::Dense { variable, error }) => {
                if !errors[slot].is_compatible(error) || !variables[slot].is_compatible(variable) {
                    return Err(DiisError::InvalidArgument(String::from(
                        "the pushed matrices do not match the structure of the samples",
                    )));
                }
                variables[slot].copy_from(variable);
                errors[slot].copy_from(error);
            }
            (
                History::Submatrix {
                    variables,
                    errors,
                    n_domains,
                },
                DiisInput::Submatrix {
                    variables: new_variables,
                    errors: new_errors,
                },
            ) => {
                if new_variables.len() != *n_domains || new_errors.len() != *n_domains {
                    return Err(DiisError::InvalidArgument(format!(
                        "expected {} domains, got {} variables and {} errors",
                        n_domains,
                        new_variables.len(),
                        new_errors.len()
                    )));
                }
                // nothing is written before both payloads are known to fit the stored slots
                check_domains("error", &errors[slot], new_errors)?;
                check_domains("variable", &variables[slot], new_variables)?;
                copy_submatrices(&mut variables[slot], new_variables, true);
                copy_submatrices(&mut errors[slot], new_errors, true);
            }
            (History::Released, _) => {
                return Err(DiisError::InvalidArgument(String::from(
                    "push after release",
                )))
            }
            _ => {
                return Err(DiisError::InvalidArgument(format!(
                    "the pushed data does not belong to the {} backend",
                    self.kind
                )))
            }
        }

        let previous_length: usize = self.history_length;
        self.history_length = (self.history_length + 1).min(self.max_history);
        let n: usize = self.history_length;

        let grow: bool = n > previous_length;
        let metric: ErrorMetric = self.metric;
        match &self.history {
            History::Dense { errors, .. } => {
                if let Some(corr) = self.correlation[0].as_mut() {
                    update_correlation(corr, slot, n, grow, |row| {
                        Ok(metric.overlap(&errors[row], &errors[slot]))
                    })?;
                }
            }
            History::Submatrix { errors, .. } => {
                for (domain, corr) in self.correlation.iter_mut().enumerate() {
                    if let Some(corr) = corr {
                        update_correlation(corr, slot, n, grow, |row| {
                            metric.domain_overlap(&errors[row][domain], &errors[slot][domain])
                        })?;
                    }
                }
            }
            History::Released => {}
        }

        print_push(slot, n, self.max_history);

        self.insertion_slot = (slot + 1) % self.max_history;
        Ok(())
    }

    /// Extrapolation with the LAPACK eigensolver. See [DiisState::extrapolate_with].
    pub fn extrapolate(
        &self,
        output: DiisOutput<'_, M>,
    ) -> Result<Vec<Option<Array1<f64>>>, DiisError> {
        self.extrapolate_with(&LapackEigensolver, output)
    }

    /// Writes the DIIS extrapolated variable into `output` and returns the coefficients of
    /// every domain (`None` for remote domains). The first coefficient is the Lagrange
    /// multiplier, the following ones are the weights of the history slots.
    pub fn extrapolate_with<S: SymmetricEigensolver>(
        &self,
        solver: &S,
        output: DiisOutput<'_, M>,
    ) -> Result<Vec<Option<Array1<f64>>>, DiisError> {
        if self.is_released() {
            return Err(DiisError::InvalidArgument(String::from(
                "extrapolate after release",
            )));
        }
        if self.history_length == 0 {
            return Err(DiisError::InvalidArgument(String::from(
                "extrapolate called before the first push",
            )));
        }
        let n: usize = self.history_length;

        match (&self.history, output) {
            (History::Dense { variables, .. }, DiisOutput::Dense(out)) => {
                let corr: &CorrelationMatrix = self.correlation[0].as_ref().ok_or_else(|| {
                    DiisError::InvalidArgument(String::from("missing DIIS matrix"))
                })?;
                let coefficients: Array1<f64> = diis_coefficients(solver, corr.view())?;
                if log_enabled!(Level::Debug) {
                    print_coefficients(0, coefficients.view());
                }
                if out.is_compatible(&variables[0]) {
                    out.set(0.0);
                } else {
                    *out = M::create_like(&variables[0]);
                }
                for (m, variable) in variables.iter().take(n).enumerate() {
                    out.add_scaled(variable, 1.0, coefficients[m + 1]);
                }
                Ok(vec![Some(coefficients)])
            }
            (
                History::Submatrix {
                    variables,
                    n_domains,
                    ..
                },
                DiisOutput::Submatrix(out),
            ) => {
                if out.len() != *n_domains {
                    return Err(DiisError::InvalidArgument(format!(
                        "expected {} output domains, got {}",
                        n_domains,
                        out.len()
                    )));
                }
                // all domains are solved before the output is touched
                let mut all_coefficients: Vec<Option<Array1<f64>>> =
                    Vec::with_capacity(*n_domains);
                for (domain, corr) in self.correlation.iter().enumerate() {
                    let coefficients: Option<Array1<f64>> = match corr {
                        Some(corr) => Some(diis_coefficients(solver, corr.view())?),
                        None => None,
                    };
                    if let Some(coefficients) = coefficients.as_ref() {
                        if log_enabled!(Level::Debug) {
                            print_coefficients(domain, coefficients.view());
                        }
                    }
                    all_coefficients.push(coefficients);
                }
                for (domain, coefficients) in all_coefficients.iter().enumerate() {
                    let coefficients: &Array1<f64> = match coefficients {
                        Some(coefficients) => coefficients,
                        None => continue,
                    };
                    let target: &mut [DomainSubmatrix] = &mut out[domain..domain + 1];
                    // the output takes the structure of the first history entry
                    copy_submatrices(target, &variables[0][domain..domain + 1], false);
                    set_submatrices(target, 0.0);
                    for m in 0..n {
                        add_submatrices(
                            1.0,
                            target,
                            coefficients[m + 1],
                            &variables[m][domain..domain + 1],
                            Transpose::No,
                        );
                    }
                }
                Ok(all_coefficients)
            }
            _ => Err(DiisError::InvalidArgument(format!(
                "the output does not belong to the {} backend",
                self.kind
            ))),
        }
    }

    /// Frees the history and all DIIS matrices. Calling it more than once has no effect.
    pub fn release(&mut self) {
        if let History::Submatrix {
            variables, errors, ..
        } = &mut self.history
        {
            variables.iter_mut().for_each(release_submatrices);
            errors.iter_mut().for_each(release_submatrices);
        }
        self.history = History::Released;
        self.correlation.clear();
        self.history_length = 0;
        self.insertion_slot = 0;
    }
}

/// Every pushed block has to carry the domain tag and the shape of the stored block.
fn check_domains(
    kind: &str,
    stored: &[DomainSubmatrix],
    pushed: &[DomainSubmatrix],
) -> Result<(), DiisError> {
    for (d, (old, new)) in stored.iter().zip(pushed.iter()).enumerate() {
        if old.domain != new.domain {
            return Err(DiisError::InvalidArgument(format!(
                "{} block {} belongs to domain {:?}, expected {:?}",
                kind, d, new.domain, old.domain
            )));
        }
        if old.data.dim() != new.data.dim() {
            return Err(DiisError::InvalidArgument(format!(
                "{} block {} has the shape {:?}, expected {:?}",
                kind,
                d,
                new.data.dim(),
                old.data.dim()
            )));
        }
    }
    Ok(())
}

/// Borders the new slot and recomputes its overlaps with the first `n` entries, the
/// diagonal one included.
fn update_correlation<F>(
    corr: &mut CorrelationMatrix,
    slot: usize,
    n: usize,
    grow: bool,
    overlap: F,
) -> Result<(), DiisError>
where
    F: Fn(usize) -> Result<f64, DiisError>,
{
    if grow {
        corr.grow(n + 1);
    }
    corr.set_border(slot);
    for row in 0..n {
        corr.set_overlap(row, slot, overlap(row)?);
    }
    Ok(())
}

/// Solves B.c = (-1, 0, ..., 0)^T via the eigendecomposition of the symmetric DIIS matrix,
/// c = V.diag(1/e).V^T.(-1, 0, ..., 0)^T. A zero eigenvalue is not caught and leads to
/// non-finite coefficients.
fn diis_coefficients<S: SymmetricEigensolver>(
    solver: &S,
    b: ArrayView2<f64>,
) -> Result<Array1<f64>, DiisError> {
    let (eigenvalues, eigenvectors): (Array1<f64>, Array2<f64>) = solver.eigh(b.to_owned())?;
    let tmp: Array1<f64> = Array1::from_shape_fn(eigenvalues.len(), |k| {
        -1.0 * eigenvectors[[0, k]] / eigenvalues[k]
    });
    Ok(eigenvectors.dot(&tmp))
}
