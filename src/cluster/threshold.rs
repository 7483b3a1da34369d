//! Cutoff distance (`dc`) selection.
//!
//! `dc` is the neighborhood radius every density estimate is measured
//! against. The published operating point is "each point sees roughly 1-2% of
//! all points as neighbors", reached either by reading a fixed percentile off
//! the sorted pairwise distances or by bisecting until the neighbor fraction
//! lands inside a target band.
//!
//! Both data-driven modes work on the `N(N-1)/2` unordered off-diagonal
//! distances, sorted once. The flattened view of all `N²` ordered pairs
//! (self pairs included) that the percentile rank is defined on is just N
//! zeros followed by every off-diagonal distance twice, so ranks and neighbor
//! counts translate directly.

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::distance::{pair_count, DistanceIndex};
use crate::error::{Error, Result};

/// Default percentile for [`DcSelection::Percentile`].
pub const DEFAULT_PERCENT: f64 = 2.0;

/// Default lower edge of the auto-mode neighbor fraction band.
pub const DEFAULT_LOWER_FRACTION: f64 = 0.01;

/// Default upper edge of the auto-mode neighbor fraction band.
pub const DEFAULT_UPPER_FRACTION: f64 = 0.02;

/// Default interval width at which the auto-mode search gives up.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// How to choose `dc`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DcSelection {
    /// Take the distance at a fixed percentile of all ordered pairs.
    Percentile {
        /// Percentile in `(0, 100]`.
        percent: f64,
    },
    /// Bisect `[min_distance, max_distance]` until the neighbor fraction
    /// falls inside `[lower, upper]`.
    Auto {
        /// Lower edge of the target band.
        lower: f64,
        /// Upper edge of the target band.
        upper: f64,
        /// Stop once the search interval is narrower than this.
        tolerance: f64,
    },
    /// Use this value as is.
    Fixed(f32),
}

impl Default for DcSelection {
    fn default() -> Self {
        Self::Percentile {
            percent: DEFAULT_PERCENT,
        }
    }
}

impl DcSelection {
    /// Percentile mode with the given percent.
    pub fn percentile(percent: f64) -> Self {
        Self::Percentile { percent }
    }

    /// Auto mode with the default band and tolerance.
    pub fn auto() -> Self {
        Self::Auto {
            lower: DEFAULT_LOWER_FRACTION,
            upper: DEFAULT_UPPER_FRACTION,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Self::Percentile { percent } => {
                if !(percent > 0.0 && percent <= 100.0) {
                    return Err(Error::InvalidParameter {
                        name: "percent",
                        message: "must be in (0, 100]",
                    });
                }
            }
            Self::Auto {
                lower,
                upper,
                tolerance,
            } => {
                if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower > upper {
                    return Err(Error::InvalidParameter {
                        name: "neighbor_fraction",
                        message: "band must satisfy 0 <= lower <= upper <= 1",
                    });
                }
                if !(tolerance > 0.0 && tolerance.is_finite()) {
                    return Err(Error::InvalidParameter {
                        name: "tolerance",
                        message: "must be positive and finite",
                    });
                }
            }
            Self::Fixed(dc) => check_dc(dc)?,
        }
        Ok(())
    }
}

/// The selected cutoff distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DcChoice {
    /// Cutoff distance.
    pub dc: f32,
    /// Share of all ordered pairs (self pairs included) closer than `dc`.
    pub neighbor_fraction: f64,
    /// False when the auto search ran out of interval before reaching the
    /// target band. Always true for the other modes.
    pub converged: bool,
}

pub(crate) fn check_dc(dc: f32) -> Result<()> {
    if !(dc > 0.0 && dc.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "dc",
            message: "must be positive and finite",
        });
    }
    Ok(())
}

/// Choose `dc` for the points of `index`.
pub fn select_dc<D: DistanceIndex + ?Sized>(
    index: &D,
    selection: &DcSelection,
) -> Result<DcChoice> {
    select(index, selection, false)
}

pub(crate) fn select<D: DistanceIndex + ?Sized>(
    index: &D,
    selection: &DcSelection,
    parallel: bool,
) -> Result<DcChoice> {
    let n = index.n_points();
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    selection.validate()?;
    index.check_complete()?;

    let choice = match *selection {
        DcSelection::Fixed(dc) => {
            let neighbor_fraction = if n > 1 {
                fraction_of(count_below(index, dc, parallel)?, n, dc)
            } else {
                1.0
            };
            DcChoice {
                dc,
                neighbor_fraction,
                converged: true,
            }
        }
        DcSelection::Percentile { percent } => {
            let pairs = data_driven_pairs(index, parallel)?;
            let dc = percentile_dc(&pairs, n, percent);
            DcChoice {
                dc,
                neighbor_fraction: neighbor_fraction(&pairs, n, dc),
                converged: true,
            }
        }
        DcSelection::Auto {
            lower,
            upper,
            tolerance,
        } => {
            let pairs = data_driven_pairs(index, parallel)?;
            bisect_dc(
                &pairs,
                n,
                f64::from(index.min_distance()),
                f64::from(index.max_distance()),
                (lower, upper),
                tolerance,
            )
        }
    };

    check_dc(choice.dc)?;
    debug!(
        n_points = n,
        dc = choice.dc,
        neighbor_fraction = choice.neighbor_fraction,
        converged = choice.converged,
        "selected cutoff distance"
    );
    Ok(choice)
}

fn data_driven_pairs<D: DistanceIndex + ?Sized>(index: &D, parallel: bool) -> Result<Vec<f32>> {
    let n = index.n_points();
    if n < 2 {
        return Err(Error::TooFewPoints { min: 2, n_points: n });
    }
    sorted_pairs(index, parallel)
}

/// Off-diagonal distances `d(i, j)`, `i < j`, in ascending order.
fn sorted_pairs<D: DistanceIndex + ?Sized>(index: &D, parallel: bool) -> Result<Vec<f32>> {
    let n = index.n_points();
    let row = |i: usize| -> Result<Vec<f32>> {
        ((i + 1)..n).map(|j| index.distance(i, j)).collect()
    };

    let mut pairs: Vec<f32> = if parallel {
        let rows = (0..n).into_par_iter().map(row).collect::<Result<Vec<_>>>()?;
        rows.into_iter().flatten().collect()
    } else {
        let capacity = pair_count(n).ok_or(Error::InvalidParameter {
            name: "n_points",
            message: "too many points to enumerate every pair",
        })?;
        let mut pairs = Vec::with_capacity(capacity);
        for i in 0..n {
            pairs.extend(row(i)?);
        }
        pairs
    };

    if parallel {
        pairs.par_sort_unstable_by(|a, b| a.total_cmp(b));
    } else {
        pairs.sort_unstable_by(|a, b| a.total_cmp(b));
    }
    Ok(pairs)
}

/// Rank `floor(N(N+1)/2 * percent/100) * 2 + N` of the ordered-pair list,
/// i.e. the `k`-th smallest off-diagonal distance.
fn percentile_dc(pairs: &[f32], n: usize, percent: f64) -> f32 {
    let half = (n * (n + 1) / 2) as f64;
    let k = (half * percent / 100.0).floor() as usize;
    pairs[k.min(pairs.len() - 1)]
}

/// Number of unordered off-diagonal pairs closer than `dc`, in one pass.
fn count_below<D: DistanceIndex + ?Sized>(index: &D, dc: f32, parallel: bool) -> Result<usize> {
    let n = index.n_points();
    let row = |i: usize| -> Result<usize> {
        let mut below = 0usize;
        for j in (i + 1)..n {
            if index.distance(i, j)? < dc {
                below += 1;
            }
        }
        Ok(below)
    };
    let rows = if parallel {
        (0..n).into_par_iter().map(row).collect::<Result<Vec<_>>>()?
    } else {
        (0..n).map(row).collect::<Result<Vec<_>>>()?
    };
    Ok(rows.into_iter().sum())
}

/// Share of the `N²` ordered pairs with distance strictly below `dc`.
fn neighbor_fraction(pairs: &[f32], n: usize, dc: f32) -> f64 {
    fraction_of(pairs.partition_point(|&d| d < dc), n, dc)
}

/// Neighbor fraction given the number of unordered pairs below `dc`.
fn fraction_of(below: usize, n: usize, dc: f32) -> f64 {
    let self_pairs = if dc > 0.0 { n as f64 } else { 0.0 };
    let n = n as f64;
    (self_pairs + 2.0 * below as f64) / (n * n)
}

fn bisect_dc(
    pairs: &[f32],
    n: usize,
    mut lo: f64,
    mut hi: f64,
    (lower, upper): (f64, f64),
    tolerance: f64,
) -> DcChoice {
    let mut steps = 0usize;
    loop {
        let mid = (lo + hi) / 2.0;
        let dc = mid as f32;
        let fraction = neighbor_fraction(pairs, n, dc);
        steps += 1;
        trace!(step = steps, lo, hi, dc, fraction, "dc bisection step");

        if fraction < lower {
            lo = mid;
        } else if fraction > upper {
            hi = mid;
        } else {
            return DcChoice {
                dc,
                neighbor_fraction: fraction,
                converged: true,
            };
        }

        if hi - lo < tolerance {
            warn!(
                dc,
                fraction,
                lower,
                upper,
                steps,
                "auto dc search did not reach the target neighbor band; using last midpoint"
            );
            return DcChoice {
                dc,
                neighbor_fraction: fraction,
                converged: false,
            };
        }
    }
}
