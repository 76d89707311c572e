//! Random operands for tests, benchmarks and the command-line driver

use crate::error::Result;
use crate::sparse::{CsrBuilder, CsrMatrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate a random `rows × cols` CSR matrix
///
/// Each entry is stored with probability `density`; values are uniform in
/// `[-1, 1)`. Some rows may end up empty, which the kernel must handle.
pub fn random_csr(rows: usize, cols: usize, density: f64, seed: u64) -> Result<CsrMatrix<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let density = density.clamp(0.0, 1.0);

    let mut triplets = Vec::new();
    for i in 0..rows {
        for j in 0..cols {
            if rng.random::<f64>() < density {
                triplets.push((i, j, rng.random_range(-1.0..1.0)));
            }
        }
    }

    CsrMatrix::from_triplets(rows, cols, triplets)
}

/// Generate `len` random values uniform in `[-1, 1)`
pub fn random_dense(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(-1.0..1.0)).collect()
}

/// Banded `n × n` matrix with `bandwidth` diagonals on each side of the main one
///
/// Resembles the stencils produced by finite element assembly.
pub fn banded_csr(n: usize, bandwidth: usize) -> Result<CsrMatrix<f64>> {
    let mut builder = CsrBuilder::with_capacity(n, n, n * (2 * bandwidth + 1));
    for i in 0..n {
        let lo = i.saturating_sub(bandwidth);
        let hi = (i + bandwidth).min(n.saturating_sub(1));
        builder.add_row_entries((lo..=hi).map(|j| {
            let v = if i == j {
                2.0 * bandwidth as f64 + 1.0
            } else {
                -1.0
            };
            (j, v)
        }));
    }
    builder.finish()
}
