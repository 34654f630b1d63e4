pub mod defaults;
pub mod diis;
pub mod io;
pub mod matrix;
pub mod mixer;
pub mod scf_loop;
pub mod submatrix;
mod utils;

pub use diis::{
    BackendKind, CorrelationMatrix, DiisError, DiisInput, DiisOutput, DiisState, ErrorMetric,
    LapackEigensolver, SymmetricEigensolver,
};
pub use matrix::{BlockSparseMatrix, DiisMatrix};
pub use submatrix::{DomainId, DomainSubmatrix, Transpose};
