use dpeak::cluster::threshold::select_dc;
use dpeak::cluster::{Clustering, DcSelection, DensityPeaks, Kernel};
use dpeak::distance::{DistanceIndex, DistanceMatrix, Euclidean};
use dpeak::Error;
use proptest::prelude::*;

fn points(min: usize, max: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(0.0f32..1.0, 2), min..max)
}

fn kernels() -> impl Strategy<Value = Kernel> {
    prop_oneof![Just(Kernel::Gaussian), Just(Kernel::Cutoff)]
}

proptest! {
    #[test]
    fn prop_rho_is_finite_and_bounded(data in points(2, 40), kernel in kernels()) {
        let matrix = DistanceMatrix::from_vectors(&data, &Euclidean).unwrap();
        let fit = DensityPeaks::new(0.0, 0.0)
            .with_dc(0.3)
            .with_kernel(kernel)
            .fit(&matrix)
            .unwrap();

        let max_rho = (data.len() - 1) as f64;
        for &r in fit.rho() {
            prop_assert!(r.is_finite());
            prop_assert!(r >= 0.0);
            prop_assert!(r <= max_rho);
            if kernel == Kernel::Cutoff {
                prop_assert_eq!(r.fract(), 0.0);
            }
        }
    }

    #[test]
    fn prop_single_root_and_denser_neighbors(data in points(2, 40), kernel in kernels()) {
        let matrix = DistanceMatrix::from_vectors(&data, &Euclidean).unwrap();
        let fit = DensityPeaks::new(0.0, 0.0)
            .with_dc(0.3)
            .with_kernel(kernel)
            .fit(&matrix)
            .unwrap();

        let n = data.len();
        let mut rank = vec![0usize; n];
        for (r, &i) in fit.order().iter().enumerate() {
            rank[i] = r;
        }

        let roots: Vec<usize> = (0..n).filter(|&i| fit.nneigh()[i].is_none()).collect();
        prop_assert_eq!(roots.len(), 1);
        let root = roots[0];
        prop_assert_eq!(root, fit.order()[0]);

        let mut max_other = f32::NEG_INFINITY;
        for i in (0..n).filter(|&i| i != root) {
            let j = fit.nneigh()[i].unwrap();
            prop_assert!(rank[j] < rank[i]);
            prop_assert!(fit.rho()[j] >= fit.rho()[i]);
            prop_assert!(fit.delta()[i] <= matrix.max_distance());
            prop_assert_eq!(fit.delta()[i], matrix.get(i, j));
            max_other = max_other.max(fit.delta()[i]);
        }
        prop_assert_eq!(fit.delta()[root], max_other);
    }

    #[test]
    fn prop_labels_trace_back_to_centers(
        data in points(2, 40),
        density_threshold in 0.0f64..3.0,
        distance_threshold in 0.0f32..0.6,
    ) {
        let matrix = DistanceMatrix::from_vectors(&data, &Euclidean).unwrap();
        let fit = DensityPeaks::new(density_threshold, distance_threshold)
            .with_dc(0.3)
            .fit(&matrix)
            .unwrap();

        for &c in fit.centers() {
            prop_assert_eq!(fit.labels()[c], Some(c));
        }
        for i in 0..data.len() {
            let Some(c) = fit.labels()[i] else { continue };
            prop_assert!(fit.centers().contains(&c));
            let mut j = i;
            let mut steps = 0;
            while j != c {
                prop_assert_eq!(fit.labels()[j], Some(c));
                j = fit.nneigh()[j].unwrap();
                steps += 1;
                prop_assert!(steps <= data.len(), "label chain does not terminate");
            }
        }
    }

    #[test]
    fn prop_auto_dc_lands_in_band_or_gives_up(data in points(30, 120)) {
        let matrix = DistanceMatrix::from_vectors(&data, &Euclidean).unwrap();
        let choice = select_dc(&matrix, &DcSelection::auto()).unwrap();
        prop_assert!(choice.dc >= matrix.min_distance());
        prop_assert!(choice.dc <= matrix.max_distance());
        if choice.converged {
            prop_assert!(choice.neighbor_fraction >= 0.01);
            prop_assert!(choice.neighbor_fraction <= 0.02);
        }
    }

    #[test]
    fn prop_rerun_is_identical(data in points(2, 30), kernel in kernels()) {
        let matrix = DistanceMatrix::from_vectors(&data, &Euclidean).unwrap();
        let model = DensityPeaks::new(0.5, 0.2).with_dc(0.25).with_kernel(kernel);
        let a = model.fit(&matrix).unwrap();
        let b = model.fit(&matrix).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_fit_predict_labels_every_point(data in points(2, 30)) {
        // The root clears a zero density threshold and has the largest delta,
        // so with a zero distance threshold nothing is left unassigned.
        let labels = DensityPeaks::new(0.0, 0.0)
            .with_dc(0.3)
            .fit_predict(&data)
            .unwrap();
        prop_assert_eq!(labels.len(), data.len());
        prop_assert!(labels.iter().all(|l| l.is_some()));
    }
}

#[test]
fn single_point_is_rejected() {
    let data = vec![vec![0.5, 0.5]];
    let matrix = DistanceMatrix::from_vectors(&data, &Euclidean).unwrap();
    let err = DensityPeaks::new(0.0, 0.0).fit(&matrix).unwrap_err();
    assert!(matches!(err, Error::TooFewPoints { min: 2, n_points: 1 }));
    assert!(err.is_invalid_input());
}

#[test]
fn two_tight_pairs_far_apart() {
    let d = |i: usize, j: usize| if i / 2 == j / 2 { 1.0 } else { 10.0 };
    let matrix = DistanceMatrix::from_fn(4, d).unwrap();
    let fit = DensityPeaks::new(0.5, 5.0).with_dc(2.0).fit(&matrix).unwrap();

    assert_eq!(fit.n_clusters(), 2);
    let pair_of = |i: usize| i / 2;
    let centers = fit.centers();
    assert_ne!(pair_of(centers[0]), pair_of(centers[1]));
    for i in 0..4 {
        let c = fit.labels()[i].unwrap();
        assert_eq!(pair_of(c), pair_of(i));
    }
}
