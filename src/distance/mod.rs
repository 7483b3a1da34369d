//! Pairwise distance sources.
//!
//! Density peak clustering never looks at coordinates, only at pairwise
//! distances. Everything downstream is written against [`DistanceIndex`]:
//!
//! - [`DistanceMatrix`]: dense, always complete. Built from vectors with a
//!   [`Metric`] or from an arbitrary closure.
//! - [`DistanceTable`]: sparse, filled pair by pair (typically from a distance
//!   file, see [`io`]). Absent pairs surface as [`Error::MissingDistance`].
//!
//! Distances are symmetric, zero on the diagonal, finite and non-negative.

pub mod io;
mod metric;

use std::collections::HashMap;

pub use metric::{check_pair, Cosine, Euclidean, Metric, Pearson};

use crate::error::{Error, Result};

/// Read-only access to the pairwise distances of `n_points()` points.
pub trait DistanceIndex: Sync {
    /// Number of points (N).
    fn n_points(&self) -> usize;

    /// Distance between points `i` and `j`.
    ///
    /// Fails with [`Error::MissingDistance`] when the pair is unknown or an
    /// index is out of range.
    fn distance(&self, i: usize, j: usize) -> Result<f32>;

    /// Largest off-diagonal distance (0 when there are no pairs).
    fn max_distance(&self) -> f32;

    /// Smallest off-diagonal distance (0 when there are no pairs).
    fn min_distance(&self) -> f32;

    /// Fail with [`Error::MissingDistance`] if some pair is known to be absent.
    ///
    /// Run before any O(N²) work. Sources that are complete by construction
    /// keep the default.
    fn check_complete(&self) -> Result<()> {
        Ok(())
    }
}

/// Number of unordered off-diagonal pairs among `n` points, if it fits.
pub(crate) fn pair_count(n: usize) -> Option<usize> {
    n.checked_mul(n.saturating_sub(1)).map(|p| p / 2)
}

fn check_distance(i: usize, j: usize, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 || (i == j && value != 0.0) {
        return Err(Error::InvalidDistance { i, j, value });
    }
    Ok(())
}

/// Dense symmetric distance matrix stored row-major.
#[derive(Clone, Debug)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f32>,
    min: f32,
    max: f32,
}

impl DistanceMatrix {
    /// Build a matrix from `dist_fn(i, j)`, evaluated once per pair `i < j`.
    pub fn from_fn(n: usize, mut dist_fn: impl FnMut(usize, usize) -> f32) -> Result<Self> {
        let mut data = vec![0.0f32; n * n];
        let mut min = f32::INFINITY;
        let mut max = 0.0f32;
        for i in 0..n {
            for j in (i + 1)..n {
                let d = dist_fn(i, j);
                check_distance(i, j, d)?;
                data[i * n + j] = d;
                data[j * n + i] = d;
                min = min.min(d);
                max = max.max(d);
            }
        }
        if n < 2 {
            min = 0.0;
        }
        Ok(Self { n, data, min, max })
    }

    /// Build a matrix from dense vectors using `metric`.
    pub fn from_vectors<M: Metric + ?Sized>(data: &[Vec<f32>], metric: &M) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        let d = data[0].len();
        for point in data.iter().skip(1) {
            if point.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: point.len(),
                });
            }
        }

        let n = data.len();
        let mut first_err = None;
        let matrix = Self::from_fn(n, |i, j| match metric.distance(&data[i], &data[j]) {
            Ok(v) => v,
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
                0.0
            }
        })?;
        match first_err {
            Some(e) => Err(e),
            None => Ok(matrix),
        }
    }

    /// Distance between `i` and `j` without bounds reporting.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.n + j]
    }

    /// One row of the matrix.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.n..(i + 1) * self.n]
    }
}

impl DistanceIndex for DistanceMatrix {
    fn n_points(&self) -> usize {
        self.n
    }

    fn distance(&self, i: usize, j: usize) -> Result<f32> {
        if i >= self.n || j >= self.n {
            return Err(Error::MissingDistance { i, j });
        }
        Ok(self.get(i, j))
    }

    fn max_distance(&self) -> f32 {
        self.max
    }

    fn min_distance(&self) -> f32 {
        self.min
    }
}

/// Sparse symmetric distance table keyed by unordered pairs.
///
/// Self-distances are implicit zeros. Pairs never inserted are reported as
/// missing when the algorithm asks for them.
#[derive(Clone, Debug)]
pub struct DistanceTable {
    n: usize,
    entries: HashMap<(usize, usize), f32>,
    min: f32,
    max: f32,
}

impl DistanceTable {
    /// Create an empty table over `n` points.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            entries: HashMap::new(),
            min: f32::INFINITY,
            max: 0.0,
        }
    }

    #[inline]
    fn key(i: usize, j: usize) -> (usize, usize) {
        if i <= j {
            (i, j)
        } else {
            (j, i)
        }
    }

    /// Record the distance between `i` and `j`, returning the previous value.
    ///
    /// A self pair is accepted only with distance 0 and is not stored.
    pub fn insert(&mut self, i: usize, j: usize, distance: f32) -> Result<Option<f32>> {
        if i >= self.n || j >= self.n {
            return Err(Error::InvalidParameter {
                name: "point",
                message: "index out of range for this table",
            });
        }
        check_distance(i, j, distance)?;
        if i == j {
            return Ok(None);
        }
        let prev = self.entries.insert(Self::key(i, j), distance);
        match prev {
            Some(old) if old != distance && (old == self.min || old == self.max) => {
                self.recompute_bounds();
            }
            _ => {
                self.min = self.min.min(distance);
                self.max = self.max.max(distance);
            }
        }
        Ok(prev)
    }

    fn recompute_bounds(&mut self) {
        let (min, max) = self
            .entries
            .values()
            .fold((f32::INFINITY, 0.0f32), |(lo, hi), &d| (lo.min(d), hi.max(d)));
        self.min = min;
        self.max = max;
    }

    /// Number of stored off-diagonal pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no off-diagonal pair is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether every unordered pair has an entry.
    pub fn is_complete(&self) -> bool {
        pair_count(self.n) == Some(self.entries.len())
    }
}

impl DistanceIndex for DistanceTable {
    fn n_points(&self) -> usize {
        self.n
    }

    fn distance(&self, i: usize, j: usize) -> Result<f32> {
        if i >= self.n || j >= self.n {
            return Err(Error::MissingDistance { i, j });
        }
        if i == j {
            return Ok(0.0);
        }
        self.entries
            .get(&Self::key(i, j))
            .copied()
            .ok_or(Error::MissingDistance { i, j })
    }

    fn max_distance(&self) -> f32 {
        self.max
    }

    fn min_distance(&self) -> f32 {
        if self.entries.is_empty() {
            0.0
        } else {
            self.min
        }
    }

    fn check_complete(&self) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        // Fewer pairs are stored than exist, so this stops within len() + 1 lookups.
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                if !self.entries.contains_key(&(i, j)) {
                    return Err(Error::MissingDistance { i, j });
                }
            }
        }
        Ok(())
    }
}
