use ndarray::prelude::*;
use std::fmt;

/// Identifier of a decomposition domain that is owned by the current process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainId(pub usize);

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "domain {}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transpose {
    No,
    Yes,
}

/// Small dense block that belongs to one decomposition domain. Domains that are not
/// owned by the current process carry no id and no data.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSubmatrix {
    /// `None` if the domain is handled by another process
    pub domain: Option<DomainId>,
    pub data: Array2<f64>,
}

impl DomainSubmatrix {
    pub fn owned(domain: DomainId, data: Array2<f64>) -> Self {
        DomainSubmatrix {
            domain: Some(domain),
            data,
        }
    }

    pub fn remote() -> Self {
        DomainSubmatrix {
            domain: None,
            data: Array2::zeros([0, 0]),
        }
    }

    pub fn is_owned(&self) -> bool {
        self.domain.is_some()
    }
}

/// `n_domains` empty, not owned submatrices.
pub fn init_submatrices(n_domains: usize) -> Vec<DomainSubmatrix> {
    (0..n_domains).map(|_| DomainSubmatrix::remote()).collect()
}

/// Copies the domain tags and the block shapes of `src` into `dst`. The values are only copied
/// if `copy_data` is set, otherwise the blocks in `dst` are zero.
pub fn copy_submatrices(dst: &mut [DomainSubmatrix], src: &[DomainSubmatrix], copy_data: bool) {
    assert_eq!(dst.len(), src.len(), "copy_submatrices: number of domains differs");
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        d.domain = s.domain;
        if !s.is_owned() {
            d.data = Array2::zeros([0, 0]);
        } else if copy_data {
            if d.data.dim() == s.data.dim() {
                d.data.assign(&s.data);
            } else {
                d.data = s.data.clone();
            }
        } else {
            d.data = Array2::zeros(s.data.raw_dim());
        }
    }
}

/// `dst = alpha * dst + beta * op(src)` for every owned domain, with `op` the optional transpose.
pub fn add_submatrices(
    alpha: f64,
    dst: &mut [DomainSubmatrix],
    beta: f64,
    src: &[DomainSubmatrix],
    transpose: Transpose,
) {
    assert_eq!(dst.len(), src.len(), "add_submatrices: number of domains differs");
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        if !d.is_owned() {
            continue;
        }
        assert_eq!(d.domain, s.domain, "add_submatrices: domains do not match");
        let s_data: ArrayView2<f64> = match transpose {
            Transpose::No => s.data.view(),
            Transpose::Yes => s.data.t(),
        };
        d.data *= alpha;
        d.data.scaled_add(beta, &s_data);
    }
}

/// Sets all elements of the owned blocks to `value`.
pub fn set_submatrices(matrices: &mut [DomainSubmatrix], value: f64) {
    matrices
        .iter_mut()
        .filter(|m| m.is_owned())
        .for_each(|m| m.data.fill(value));
}

/// Frees the data of all blocks, the domain tags are reset.
pub fn release_submatrices(matrices: &mut Vec<DomainSubmatrix>) {
    matrices.clear();
    matrices.shrink_to_fit();
}
