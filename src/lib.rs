//! Density peak clustering.
//!
//! `dpeak` finds cluster centers as points that are both locally dense and far
//! from any denser point, then assigns every other point to the center its
//! nearest-denser-neighbor chain leads to. It works on pairwise distances only.
//!
//! - [`distance`]: distance sources ([`DistanceMatrix`], [`DistanceTable`]),
//!   pairwise metrics and the flat-file formats
//! - [`cluster`]: the clustering pipeline ([`DensityPeaks`]) and its stages

#![forbid(unsafe_code)]

pub mod cluster;
pub mod distance;
pub mod error;

pub use cluster::{
    Clustering, DcChoice, DcSelection, DecisionGraph, DensityPeaks, DensityPeaksFit,
    DensityPeaksParams, Kernel,
};
pub use distance::{DistanceIndex, DistanceMatrix, DistanceTable, Metric};
pub use error::{Error, Result};
