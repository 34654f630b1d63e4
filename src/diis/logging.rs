use crate::diis::{BackendKind, ErrorMetric};
use log::{debug, info, trace};
use ndarray::prelude::*;

pub fn print_diis_init(backend: BackendKind, metric: ErrorMetric, max_history: usize, n_domains: usize) {
    info!("{:^80}", "");
    info!("{: ^80}", "DIIS convergence accelerator");
    info!("{:-^80}", "");
    info!("{: <25} {:>12}", "backend:", backend);
    info!("{: <25} {:>12}", "error metric:", metric);
    info!("{: <25} {:>12}", "max. history length:", max_history);
    if backend == BackendKind::Submatrix {
        info!("{: <25} {:>12}", "number of domains:", n_domains);
    }
    info!("{:-^80}", "");
}

pub fn print_push(slot: usize, history_length: usize, max_history: usize) {
    debug!(
        "DIIS push into slot {: >3}, history length {: >3} / {}",
        slot, history_length, max_history
    );
}

/// The sum of the mixing weights (without the Lagrange multiplier) should be 1.
pub fn print_coefficients(domain: usize, coefficients: ArrayView1<f64>) {
    let checksum: f64 = coefficients.slice(s![1..]).sum();
    debug!(
        "DIIS domain {: >4}: sum of coefficients {:>18.14}, Lagrange multiplier {:>14.8e}",
        domain, checksum, coefficients[0]
    );
    trace!("{: >10} {: >18}", "slot", "coefficient");
    for (slot, c) in coefficients.slice(s![1..]).iter().enumerate() {
        trace!("{: >10} {:>18.12}", slot + 1, c);
    }
}
