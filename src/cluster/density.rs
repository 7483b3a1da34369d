//! Local density (rho).
//!
//! Each pair of points contributes a kernel weight `k(d, dc)` to the density
//! of both endpoints:
//!
//! ```text
//! rho_i = Σ_{j ≠ i} k(d_ij, dc)
//! ```
//!
//! The cutoff kernel counts neighbors closer than `dc`; the Gaussian kernel is
//! a smooth version of that count and rarely produces ties.

use rayon::prelude::*;
use tracing::debug;

use super::threshold::check_dc;
use crate::distance::DistanceIndex;
use crate::error::{Error, Result};

/// Density kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Kernel {
    /// `exp(-(d / dc)²)`.
    #[default]
    Gaussian,
    /// `1` if `d < dc`, else `0`.
    Cutoff,
}

impl Kernel {
    /// Contribution of a pair at distance `d`.
    #[inline]
    pub fn weight(self, d: f32, dc: f32) -> f64 {
        match self {
            Kernel::Gaussian => {
                let r = f64::from(d) / f64::from(dc);
                (-r * r).exp()
            }
            Kernel::Cutoff => {
                if d < dc {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Compute rho for every point of `index`.
pub fn local_density<D: DistanceIndex + ?Sized>(
    index: &D,
    dc: f32,
    kernel: Kernel,
) -> Result<Vec<f64>> {
    density(index, dc, kernel, false)
}

pub(crate) fn density<D: DistanceIndex + ?Sized>(
    index: &D,
    dc: f32,
    kernel: Kernel,
    parallel: bool,
) -> Result<Vec<f64>> {
    let n = index.n_points();
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    check_dc(dc)?;
    index.check_complete()?;

    let rho = if parallel {
        // One row sum per point: every pair is evaluated twice, but each
        // point's sum has a fixed order regardless of scheduling.
        (0..n)
            .into_par_iter()
            .map(|i| -> Result<f64> {
                let mut sum = 0.0f64;
                for j in (0..n).filter(|&j| j != i) {
                    sum += kernel.weight(index.distance(i, j)?, dc);
                }
                Ok(sum)
            })
            .collect::<Result<Vec<f64>>>()?
    } else {
        let mut rho = vec![0.0f64; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let w = kernel.weight(index.distance(i, j)?, dc);
                rho[i] += w;
                rho[j] += w;
            }
        }
        rho
    };

    debug!(
        n_points = n,
        dc,
        ?kernel,
        max_rho = rho.iter().copied().fold(0.0f64, f64::max),
        "computed local density"
    );
    Ok(rho)
}
