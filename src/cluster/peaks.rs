//! Nearest denser neighbor (delta) search.
//!
//! Points are ranked by decreasing density, ties broken by ascending index, so
//! "denser than `i`" means "ranked before `i`". For every point except the
//! first (the root), `delta` is the distance to the closest point ranked
//! before it and `nneigh` records which point that is. The root has no denser
//! neighbor; its delta is set to the largest delta among the others so it
//! always stands out in the decision graph.
//!
//! The scan is O(N²): rank `r` compares against the `r` points before it.

use std::cmp::Ordering;

use rayon::prelude::*;
use tracing::debug;

use crate::distance::DistanceIndex;
use crate::error::{Error, Result};

/// Output of the nearest denser neighbor search.
#[derive(Clone, Debug, PartialEq)]
pub struct Peaks {
    /// Point indices by decreasing density (ties by ascending index).
    pub order: Vec<usize>,
    /// Distance to the nearest denser point.
    pub delta: Vec<f32>,
    /// The nearest denser point; `None` only for the root.
    pub nneigh: Vec<Option<usize>>,
}

impl Peaks {
    /// The densest point.
    pub fn root(&self) -> usize {
        self.order[0]
    }
}

/// Point indices sorted by `rho` descending, ties by ascending index.
pub fn density_order(rho: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rho.len()).collect();
    order.sort_by(|&a, &b| match rho[b].total_cmp(&rho[a]) {
        Ordering::Equal => a.cmp(&b),
        other => other,
    });
    order
}

/// Compute delta and nneigh for every point of `index` given its densities.
pub fn nearest_denser<D: DistanceIndex + ?Sized>(index: &D, rho: &[f64]) -> Result<Peaks> {
    peaks(index, rho, false)
}

pub(crate) fn peaks<D: DistanceIndex + ?Sized>(
    index: &D,
    rho: &[f64],
    parallel: bool,
) -> Result<Peaks> {
    let n = index.n_points();
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    if rho.len() != n {
        return Err(Error::LengthMismatch {
            name: "rho",
            expected: n,
            found: rho.len(),
        });
    }
    index.check_complete()?;

    let order = density_order(rho);
    let max_distance = index.max_distance();

    // Nearest point among the ranks before `rank`; the first one wins on
    // equal distance.
    let scan = |rank: usize| -> Result<(f32, Option<usize>)> {
        let i = order[rank];
        let mut best = max_distance;
        let mut neighbor = None;
        for &j in &order[..rank] {
            let d = index.distance(i, j)?;
            if neighbor.is_none() || d < best {
                best = d;
                neighbor = Some(j);
            }
        }
        Ok((best, neighbor))
    };

    let scanned: Vec<(f32, Option<usize>)> = if parallel {
        (1..n).into_par_iter().map(scan).collect::<Result<_>>()?
    } else {
        (1..n).map(scan).collect::<Result<_>>()?
    };

    let mut delta = vec![max_distance; n];
    let mut nneigh = vec![None; n];
    for (&i, (d, neighbor)) in order[1..].iter().zip(scanned) {
        delta[i] = d;
        nneigh[i] = neighbor;
    }

    let root = order[0];
    if n > 1 {
        delta[root] = order[1..]
            .iter()
            .map(|&i| delta[i])
            .fold(f32::NEG_INFINITY, f32::max);
    }

    debug!(
        n_points = n,
        root,
        root_rho = rho[root],
        root_delta = delta[root],
        "computed nearest denser neighbors"
    );
    Ok(Peaks {
        order,
        delta,
        nneigh,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::density::{local_density, Kernel};
    use crate::distance::{DistanceMatrix, DistanceTable};

    fn line(xs: &[f32]) -> DistanceMatrix {
        DistanceMatrix::from_fn(xs.len(), |i, j| (xs[i] - xs[j]).abs()).unwrap()
    }

    #[test]
    fn order_breaks_ties_by_index() {
        let rho = [1.0, 3.0, 3.0, 0.5, 1.0];
        assert_eq!(density_order(&rho), vec![1, 2, 0, 4, 3]);
    }

    #[test]
    fn two_groups_on_a_line() {
        let m = line(&[0.0, 1.0, 2.0, 10.0, 11.0]);
        let rho = [1.0, 2.0, 1.5, 1.2, 1.1];
        let p = nearest_denser(&m, &rho).unwrap();

        assert_eq!(p.order, vec![1, 2, 3, 4, 0]);
        assert_eq!(p.root(), 1);
        assert_eq!(p.nneigh, vec![Some(1), None, Some(1), Some(2), Some(3)]);
        assert_eq!(p.delta[0], 1.0);
        assert_eq!(p.delta[2], 1.0);
        assert_eq!(p.delta[3], 8.0);
        assert_eq!(p.delta[4], 1.0);
        // Root takes the largest separation of the others.
        assert_eq!(p.delta[1], 8.0);
    }

    #[test]
    fn invariants_hold_on_density_output() {
        let xs: Vec<f32> = (0..40).map(|i| ((i * 37) % 23) as f32 * 0.7).collect();
        let m = line(&xs);
        let rho = local_density(&m, 2.0, Kernel::Cutoff).unwrap();
        let p = nearest_denser(&m, &rho).unwrap();

        let mut rank = vec![0usize; xs.len()];
        for (r, &i) in p.order.iter().enumerate() {
            rank[i] = r;
        }
        assert_eq!(p.nneigh.iter().filter(|nb| nb.is_none()).count(), 1);
        for i in 0..xs.len() {
            match p.nneigh[i] {
                None => assert_eq!(i, p.root()),
                Some(j) => {
                    assert!(rank[j] < rank[i]);
                    assert!(rho[j] >= rho[i]);
                    assert!(p.delta[i] <= m.max_distance());
                    assert_eq!(p.delta[i], m.get(i, j));
                }
            }
        }
    }

    #[test]
    fn neighbor_at_max_distance_is_recorded() {
        let m = DistanceMatrix::from_fn(2, |_, _| 5.0).unwrap();
        let p = nearest_denser(&m, &[2.0, 1.0]).unwrap();
        assert_eq!(p.nneigh, vec![None, Some(0)]);
        assert_eq!(p.delta, vec![5.0, 5.0]);
    }

    #[test]
    fn single_point_is_its_own_root() {
        let m = DistanceMatrix::from_fn(1, |_, _| 0.0).unwrap();
        let p = nearest_denser(&m, &[0.0]).unwrap();
        assert_eq!(p.nneigh, vec![None]);
        assert_eq!(p.delta, vec![0.0]);
    }

    #[test]
    fn parallel_is_identical() {
        let xs: Vec<f32> = (0..60).map(|i| ((i * 13) % 29) as f32).collect();
        let m = line(&xs);
        let rho = local_density(&m, 3.0, Kernel::Gaussian).unwrap();
        assert_eq!(peaks(&m, &rho, false).unwrap(), peaks(&m, &rho, true).unwrap());
    }

    #[test]
    fn length_mismatch() {
        let m = line(&[0.0, 1.0, 2.0]);
        assert!(matches!(
            nearest_denser(&m, &[1.0, 2.0]),
            Err(Error::LengthMismatch { name: "rho", expected: 3, found: 2 })
        ));
    }

    #[test]
    fn missing_pair_propagates() {
        let mut t = DistanceTable::new(3);
        t.insert(0, 1, 1.0).unwrap();
        assert!(matches!(
            nearest_denser(&t, &[3.0, 2.0, 1.0]),
            Err(Error::MissingDistance { .. })
        ));
    }
}
