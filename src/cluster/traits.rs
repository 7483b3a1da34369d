use crate::error::Result;

/// Common interface for clustering raw vectors (one optional label per point).
pub trait Clustering {
    /// Fit the model and return one cluster label per input point.
    ///
    /// Points the algorithm cannot attach to any cluster are `None`.
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<Option<usize>>>;
}
