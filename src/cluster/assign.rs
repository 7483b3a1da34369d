//! Center selection and label propagation.
//!
//! A center must clear both thresholds at once: density alone cannot tell a
//! cluster core from a point inside a larger denser cluster, and separation
//! alone cannot tell a real peak from an isolated outlier.
//!
//! Every other point inherits the label of its nearest denser neighbor.
//! Walking points in density order guarantees that neighbor is resolved
//! first, so one pass suffices.

use tracing::debug;

use crate::error::{Error, Result};

fn check_len(name: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::LengthMismatch {
            name,
            expected,
            found,
        });
    }
    Ok(())
}

/// Points with `rho >= density_threshold` and `delta >= distance_threshold`,
/// in ascending index order.
pub fn select_centers(
    rho: &[f64],
    delta: &[f32],
    density_threshold: f64,
    distance_threshold: f32,
) -> Result<Vec<usize>> {
    check_len("delta", rho.len(), delta.len())?;
    if !density_threshold.is_finite() {
        return Err(Error::InvalidParameter {
            name: "density_threshold",
            message: "must be finite",
        });
    }
    if !distance_threshold.is_finite() {
        return Err(Error::InvalidParameter {
            name: "distance_threshold",
            message: "must be finite",
        });
    }

    Ok(rho
        .iter()
        .zip(delta)
        .enumerate()
        .filter(|&(_, (&r, &d))| r >= density_threshold && d >= distance_threshold)
        .map(|(i, _)| i)
        .collect())
}

/// Label every point with the center it descends from.
///
/// Centers label themselves. Other points take the label of `nneigh[i]`,
/// visited in `order`; a point whose chain reaches a non-center root is
/// left as `None` (halo).
pub fn propagate_labels(
    order: &[usize],
    nneigh: &[Option<usize>],
    centers: &[usize],
) -> Result<Vec<Option<usize>>> {
    let n = nneigh.len();
    check_len("order", n, order.len())?;

    let mut seen = vec![false; n];
    for &i in order {
        if i >= n || std::mem::replace(&mut seen[i], true) {
            return Err(Error::InvalidParameter {
                name: "order",
                message: "must be a permutation of the point indices",
            });
        }
    }

    if nneigh.iter().flatten().any(|&j| j >= n) {
        return Err(Error::InvalidParameter {
            name: "nneigh",
            message: "neighbor index out of range",
        });
    }

    let mut is_center = vec![false; n];
    let mut labels: Vec<Option<usize>> = vec![None; n];
    for &c in centers {
        if c >= n {
            return Err(Error::InvalidParameter {
                name: "centers",
                message: "center index out of range",
            });
        }
        is_center[c] = true;
        labels[c] = Some(c);
    }

    for &i in order {
        if is_center[i] {
            continue;
        }
        labels[i] = nneigh[i].and_then(|j| labels[j]);
    }

    debug!(
        n_points = n,
        n_centers = centers.len(),
        n_halo = labels.iter().filter(|l| l.is_none()).count(),
        "propagated cluster labels"
    );
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_thresholds_are_required() {
        let rho = [5.0, 5.0, 1.0, 1.0];
        let delta = [4.0, 0.5, 4.0, 0.5];
        assert_eq!(select_centers(&rho, &delta, 2.0, 2.0).unwrap(), vec![0]);
        // Thresholds are inclusive.
        assert_eq!(select_centers(&rho, &delta, 1.0, 0.5).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn center_selection_length_mismatch() {
        assert!(matches!(
            select_centers(&[1.0, 2.0], &[1.0], 0.0, 0.0),
            Err(Error::LengthMismatch { name: "delta", expected: 2, found: 1 })
        ));
        assert!(select_centers(&[1.0], &[1.0], f64::NAN, 0.0).is_err());
        assert!(select_centers(&[1.0], &[1.0], 0.0, f32::NAN).is_err());
    }

    #[test]
    fn labels_follow_the_chain() {
        // Chain: 0 (root) <- 1 <- 2, and 3 (center) <- 4.
        let order = [0, 3, 1, 2, 4];
        let nneigh = [None, Some(0), Some(1), Some(0), Some(3)];
        let labels = propagate_labels(&order, &nneigh, &[0, 3]).unwrap();
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), Some(3), Some(3)]);
    }

    #[test]
    fn points_under_a_non_center_root_are_halo() {
        let order = [0, 1, 2];
        let nneigh = [None, Some(0), Some(1)];
        let labels = propagate_labels(&order, &nneigh, &[]).unwrap();
        assert_eq!(labels, vec![None, None, None]);

        // A center further down still captures its own subtree.
        let labels = propagate_labels(&order, &nneigh, &[1]).unwrap();
        assert_eq!(labels, vec![None, Some(1), Some(1)]);
    }

    #[test]
    fn rejects_bad_order_and_centers() {
        let nneigh = [None, Some(0)];
        assert!(matches!(
            propagate_labels(&[0], &nneigh, &[0]),
            Err(Error::LengthMismatch { name: "order", .. })
        ));
        assert!(propagate_labels(&[0, 0], &nneigh, &[0]).is_err());
        assert!(propagate_labels(&[0, 2], &nneigh, &[0]).is_err());
        assert!(propagate_labels(&[0, 1], &nneigh, &[5]).is_err());
    }

    #[test]
    fn rejects_out_of_range_neighbor() {
        let nneigh = [None, Some(7)];
        assert!(matches!(
            propagate_labels(&[0, 1], &nneigh, &[0]),
            Err(Error::InvalidParameter { name: "nneigh", .. })
        ));
    }
}
