use crate::error::{Error, Result};

/// A pairwise distance between two equal-length vectors.
///
/// Implementations must reject empty or mismatched vectors with
/// [`Error::InvalidVector`]; [`check_pair`] does that for them.
pub trait Metric: Sync {
    /// Distance between `a` and `b`.
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32>;
}

impl<F> Metric for F
where
    F: Fn(&[f32], &[f32]) -> Result<f32> + Sync,
{
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        self(a, b)
    }
}

/// Fail unless `a` and `b` are non-empty and of equal length.
pub fn check_pair(a: &[f32], b: &[f32]) -> Result<()> {
    if a.is_empty() || a.len() != b.len() {
        return Err(Error::InvalidVector {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

#[inline]
fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean (L2) distance.
#[derive(Clone, Copy, Debug, Default)]
pub struct Euclidean;

impl Metric for Euclidean {
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        check_pair(a, b)?;
        Ok(squared_euclidean(a, b).sqrt())
    }
}

/// Cosine distance, `1 - cos(a, b)`, in `[0, 2]`.
///
/// A zero vector has no direction; its distance to anything is 1.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cosine;

impl Metric for Cosine {
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        check_pair(a, b)?;
        let denom = dot(a, a).sqrt() * dot(b, b).sqrt();
        if denom <= f32::EPSILON {
            return Ok(1.0);
        }
        let cos = (dot(a, b) / denom).clamp(-1.0, 1.0);
        Ok(1.0 - cos)
    }
}

/// Pearson correlation distance, `1 - r`, in `[0, 2]`.
///
/// A constant vector has no correlation with anything; its distance is 1.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pearson;

impl Metric for Pearson {
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        check_pair(a, b)?;
        let n = a.len() as f32;
        let mean_a = a.iter().sum::<f32>() / n;
        let mean_b = b.iter().sum::<f32>() / n;

        let mut cov = 0.0f32;
        let mut var_a = 0.0f32;
        let mut var_b = 0.0f32;
        for (x, y) in a.iter().zip(b.iter()) {
            let da = x - mean_a;
            let db = y - mean_b;
            cov += da * db;
            var_a += da * da;
            var_b += db * db;
        }

        let denom = (var_a * var_b).sqrt();
        if denom <= f32::EPSILON {
            return Ok(1.0);
        }
        Ok(1.0 - (cov / denom).clamp(-1.0, 1.0))
    }
}
