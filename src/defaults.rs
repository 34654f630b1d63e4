// DIIS ENGINE
// maximal number of (variable, error) pairs that are kept in the history
pub const DIIS_LIMIT: usize = 8;
// metric that is used to compute the overlap of two error matrices
pub const DIIS_ERROR_METRIC: &str = "orthogonal";
// storage of the history, "dense" or "submatrix"
pub const DIIS_BACKEND: &str = "dense";
// number of domains the variable is split into for the submatrix backend
pub const DIIS_DOMAINS: usize = 1;
// extrapolated values are only used from this iteration on, before that
// the plain fixed-point step is taken
pub const DIIS_START_ITERATION: usize = 1;

// SELF-CONSISTENT LOOP
// stop the iteration after max_iter steps
pub const MAX_ITER: usize = 250;
// convergence threshold for the norm of the residual
pub const CONVERGENCE: f64 = 1.0e-7;
// the plain step is x_next = x + a * r(x)
pub const LINEAR_MIXING_COEFFICIENT: f64 = 1.0;

// config file
pub const CONFIG_FILE_NAME: &str = "pulay.toml";
