//! Density peak clustering.
//!
//! The pipeline runs in five stages, each usable on its own:
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | cutoff distance | [`threshold`] | `dc` |
//! | local density | [`density`] | `rho` |
//! | nearest denser neighbor | [`peaks`] | `delta`, `nneigh`, density order |
//! | center selection | [`assign`] | centers |
//! | label propagation | [`assign`] | labels |
//!
//! [`DensityPeaks`] drives all of them against a
//! [`DistanceIndex`](crate::distance::DistanceIndex).
//!
//! ## Usage
//!
//! ```rust
//! use dpeak::cluster::{Clustering, DensityPeaks};
//! use dpeak::distance::DistanceMatrix;
//!
//! // Two tight pairs far apart.
//! let xs = [0.0f32, 1.0, 20.0, 21.0];
//! let matrix = DistanceMatrix::from_fn(xs.len(), |i, j| (xs[i] - xs[j]).abs()).unwrap();
//!
//! let fit = DensityPeaks::new(0.5, 5.0).with_dc(2.0).fit(&matrix).unwrap();
//! assert_eq!(fit.n_clusters(), 2);
//! assert_eq!(fit.labels()[0], fit.labels()[1]);
//! assert_ne!(fit.labels()[0], fit.labels()[2]);
//!
//! // Or straight from vectors, with compact cluster ids.
//! let data = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![20.0, 0.0], vec![20.0, 1.0]];
//! let labels = DensityPeaks::new(0.5, 5.0).with_dc(2.0).fit_predict(&data).unwrap();
//! assert_eq!(labels, vec![Some(0), Some(0), Some(1), Some(1)]);
//! ```

pub mod assign;
pub mod density;
mod dpc;
pub mod peaks;
pub mod threshold;
mod traits;

pub use density::Kernel;
pub use dpc::{DecisionGraph, DensityPeaks, DensityPeaksFit, DensityPeaksParams};
pub use peaks::Peaks;
pub use threshold::{DcChoice, DcSelection};
pub use traits::Clustering;
