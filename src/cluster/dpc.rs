//! Density peak clustering (Rodriguez & Laio, 2014).
//!
//! # The Algorithm
//!
//! Cluster centers are points that are denser than their neighbors *and* far
//! from any denser point. For each point `i`:
//!
//! - `rho_i`: local density within the cutoff distance `dc`
//! - `delta_i`: distance to the nearest point with higher density
//!
//! Plotting `delta` against `rho` (the *decision graph*) makes centers stand
//! out in the upper right corner. Centers are chosen with two thresholds and
//! every other point joins the cluster of its nearest denser neighbor.
//!
//! ## Steps
//!
//! 1. Choose `dc` ([`DcSelection`]).
//! 2. Compute `rho` ([`Kernel`]).
//! 3. Compute `delta` and the nearest denser neighbor.
//! 4. Select centers: `rho >= density_threshold && delta >= distance_threshold`.
//! 5. Propagate labels down the density order.
//!
//! Steps 1-3 do not depend on the thresholds, so [`DensityPeaks::decision_graph`]
//! stops there; thresholds can then be read off the graph and applied with
//! [`DecisionGraph::assign`] without recomputing anything.
//!
//! ## Complexity
//!
//! - **Time**: O(N²) distance lookups, plus O(N² log N) for the pair sort of
//!   the data-driven `dc` modes.
//! - **Space**: O(N) per-point vectors, plus O(N²) for the sorted pairs.
//!
//! ## References
//!
//! Rodriguez, A., Laio, A. (2014). "Clustering by fast search and find of
//! density peaks." Science 344(6191).

use std::collections::BTreeMap;

use tracing::{info, warn};

use super::assign::{propagate_labels, select_centers};
use super::density::{self, Kernel};
use super::peaks::{self, Peaks};
use super::threshold::{self, DcChoice, DcSelection};
use super::traits::Clustering;
use crate::distance::{DistanceIndex, DistanceMatrix, Euclidean};
use crate::error::{Error, Result};

/// Parameters of a density peak clustering run.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityPeaksParams {
    /// Minimum rho for a center (inclusive).
    pub density_threshold: f64,

    /// Minimum delta for a center (inclusive).
    pub distance_threshold: f32,

    /// How `dc` is chosen.
    pub dc: DcSelection,

    /// Density kernel.
    pub kernel: Kernel,

    /// Spread the O(N²) loops over the rayon thread pool.
    ///
    /// Results are reproducible either way, but Gaussian densities may differ
    /// in the last bits between the two modes.
    pub parallel: bool,
}

impl DensityPeaksParams {
    /// Parameters with the given thresholds and default `dc`, kernel and
    /// sequential execution.
    pub fn new(density_threshold: f64, distance_threshold: f32) -> Self {
        Self {
            density_threshold,
            distance_threshold,
            dc: DcSelection::default(),
            kernel: Kernel::default(),
            parallel: false,
        }
    }
}

/// Density peak clusterer.
#[derive(Clone, Debug)]
pub struct DensityPeaks {
    params: DensityPeaksParams,
}

impl DensityPeaks {
    /// Create a clusterer with the two center thresholds.
    ///
    /// Thresholds are usually read off the decision graph
    /// ([`DensityPeaks::decision_graph`]).
    pub fn new(density_threshold: f64, distance_threshold: f32) -> Self {
        Self::from_params(DensityPeaksParams::new(density_threshold, distance_threshold))
    }

    /// Create a clusterer from a full parameter set.
    pub fn from_params(params: DensityPeaksParams) -> Self {
        Self { params }
    }

    /// Set the density threshold.
    pub fn with_density_threshold(mut self, density_threshold: f64) -> Self {
        self.params.density_threshold = density_threshold;
        self
    }

    /// Set the separation threshold.
    pub fn with_distance_threshold(mut self, distance_threshold: f32) -> Self {
        self.params.distance_threshold = distance_threshold;
        self
    }

    /// Set how `dc` is chosen.
    pub fn with_dc_selection(mut self, dc: DcSelection) -> Self {
        self.params.dc = dc;
        self
    }

    /// Use a fixed `dc`.
    pub fn with_dc(self, dc: f32) -> Self {
        self.with_dc_selection(DcSelection::Fixed(dc))
    }

    /// Set the density kernel.
    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.params.kernel = kernel;
        self
    }

    /// Enable or disable data-parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.params.parallel = parallel;
        self
    }

    /// Current parameters.
    pub fn params(&self) -> &DensityPeaksParams {
        &self.params
    }

    /// Run steps 1-3: choose `dc`, compute rho, delta and nneigh.
    pub fn decision_graph<D: DistanceIndex + ?Sized>(&self, index: &D) -> Result<DecisionGraph> {
        let n = index.n_points();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if n < 2 {
            return Err(Error::TooFewPoints { min: 2, n_points: n });
        }
        // Incomplete sources fail here, before anything is sized by N.
        index.check_complete()?;

        let parallel = self.params.parallel;
        let dc = threshold::select(index, &self.params.dc, parallel)?;
        let rho = density::density(index, dc.dc, self.params.kernel, parallel)?;
        let peaks = peaks::peaks(index, &rho, parallel)?;
        Ok(DecisionGraph { dc, rho, peaks })
    }

    /// Run the whole pipeline on `index`.
    pub fn fit<D: DistanceIndex + ?Sized>(&self, index: &D) -> Result<DensityPeaksFit> {
        self.check_thresholds()?;
        self.decision_graph(index)?
            .assign(self.params.density_threshold, self.params.distance_threshold)
    }

    fn check_thresholds(&self) -> Result<()> {
        if !self.params.density_threshold.is_finite() {
            return Err(Error::InvalidParameter {
                name: "density_threshold",
                message: "must be finite",
            });
        }
        if !self.params.distance_threshold.is_finite() {
            return Err(Error::InvalidParameter {
                name: "distance_threshold",
                message: "must be finite",
            });
        }
        Ok(())
    }
}

impl Clustering for DensityPeaks {
    /// Cluster dense vectors under Euclidean distance.
    ///
    /// Labels are compact cluster ids (see [`DensityPeaksFit::cluster_ids`]).
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<Option<usize>>> {
        let matrix = DistanceMatrix::from_vectors(data, &Euclidean)?;
        Ok(self.fit(&matrix)?.cluster_ids())
    }
}

/// Threshold-independent products of a run: `dc`, rho, delta, nneigh.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionGraph {
    dc: DcChoice,
    rho: Vec<f64>,
    peaks: Peaks,
}

impl DecisionGraph {
    /// The selected cutoff distance.
    pub fn dc(&self) -> &DcChoice {
        &self.dc
    }

    /// Local densities.
    pub fn rho(&self) -> &[f64] {
        &self.rho
    }

    /// Distances to the nearest denser point.
    pub fn delta(&self) -> &[f32] {
        &self.peaks.delta
    }

    /// Nearest denser points (`None` for the root).
    pub fn nneigh(&self) -> &[Option<usize>] {
        &self.peaks.nneigh
    }

    /// Point indices by decreasing density.
    pub fn order(&self) -> &[usize] {
        &self.peaks.order
    }

    /// `(rho, delta)` per point, in index order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.rho.iter().copied().zip(self.peaks.delta.iter().copied())
    }

    /// Select centers and propagate labels (steps 4-5).
    pub fn assign(
        &self,
        density_threshold: f64,
        distance_threshold: f32,
    ) -> Result<DensityPeaksFit> {
        let centers = select_centers(
            &self.rho,
            &self.peaks.delta,
            density_threshold,
            distance_threshold,
        )?;
        let labels = propagate_labels(&self.peaks.order, &self.peaks.nneigh, &centers)?;

        let n_halo = labels.iter().filter(|l| l.is_none()).count();
        if n_halo > 0 {
            warn!(
                n_halo,
                root = self.peaks.root(),
                "densest point is not a center; points that descend from it are unassigned"
            );
        }
        info!(
            n_points = labels.len(),
            dc = self.dc.dc,
            dc_converged = self.dc.converged,
            n_centers = centers.len(),
            n_halo,
            "density peak clustering finished"
        );

        Ok(DensityPeaksFit {
            graph: self.clone(),
            centers,
            labels,
        })
    }
}

/// Result of a density peak clustering run.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityPeaksFit {
    graph: DecisionGraph,
    centers: Vec<usize>,
    labels: Vec<Option<usize>>,
}

impl DensityPeaksFit {
    /// Number of points clustered.
    pub fn n_points(&self) -> usize {
        self.labels.len()
    }

    /// The cutoff distance used.
    pub fn dc(&self) -> f32 {
        self.graph.dc.dc
    }

    /// Share of ordered pairs closer than `dc`.
    pub fn neighbor_fraction(&self) -> f64 {
        self.graph.dc.neighbor_fraction
    }

    /// False when the auto `dc` search stopped outside its target band.
    pub fn dc_converged(&self) -> bool {
        self.graph.dc.converged
    }

    /// The threshold-independent part of the run.
    pub fn graph(&self) -> &DecisionGraph {
        &self.graph
    }

    /// Local densities.
    pub fn rho(&self) -> &[f64] {
        self.graph.rho()
    }

    /// Distances to the nearest denser point.
    pub fn delta(&self) -> &[f32] {
        self.graph.delta()
    }

    /// Nearest denser points (`None` for the root).
    pub fn nneigh(&self) -> &[Option<usize>] {
        self.graph.nneigh()
    }

    /// Point indices by decreasing density.
    pub fn order(&self) -> &[usize] {
        self.graph.order()
    }

    /// `(rho, delta)` per point, for the decision graph.
    pub fn decision_graph(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.graph.points()
    }

    /// Center indices, ascending.
    pub fn centers(&self) -> &[usize] {
        &self.centers
    }

    /// Number of clusters (= number of centers).
    pub fn n_clusters(&self) -> usize {
        self.centers.len()
    }

    /// Center index per point; `None` for unassigned (halo) points.
    pub fn labels(&self) -> &[Option<usize>] {
        &self.labels
    }

    /// Compact cluster id per point: the position of the point's center in
    /// [`centers`](Self::centers).
    pub fn cluster_ids(&self) -> Vec<Option<usize>> {
        self.labels
            .iter()
            .map(|l| l.and_then(|c| self.centers.binary_search(&c).ok()))
            .collect()
    }

    /// Unassigned points.
    pub fn halo(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Members of each cluster keyed by center index.
    pub fn clusters(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut clusters: BTreeMap<usize, Vec<usize>> =
            self.centers.iter().map(|&c| (c, Vec::new())).collect();
        for (i, label) in self.labels.iter().enumerate() {
            if let Some(c) = label {
                clusters.entry(*c).or_default().push(i);
            }
        }
        clusters
    }
}
