use thiserror::Error;

/// Errors returned by the clustering pipeline and its distance sources.
#[derive(Debug, Error)]
pub enum Error {
    /// No points at all.
    #[error("empty input")]
    EmptyInput,

    /// Too few points to define density or separation.
    #[error("too few points: need at least {min}, found {n_points}")]
    TooFewPoints {
        /// Minimum number of points required.
        min: usize,
        /// Number of points supplied.
        n_points: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// A per-point vector does not have one entry per point.
    #[error("length mismatch for {name}: expected {expected}, found {found}")]
    LengthMismatch {
        /// Name of the offending input.
        name: &'static str,
        /// Expected length (the number of points).
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Points in a dataset have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// Two vectors handed to a metric cannot be compared.
    #[error("invalid vector pair: lengths {left} and {right}")]
    InvalidVector {
        /// Length of the first vector.
        left: usize,
        /// Length of the second vector.
        right: usize,
    },

    /// A distance value is negative or not finite.
    #[error("invalid distance between points {i} and {j}: {value}")]
    InvalidDistance {
        /// First point index.
        i: usize,
        /// Second point index.
        j: usize,
        /// Offending value.
        value: f32,
    },

    /// A pair referenced by the algorithm has no distance entry.
    #[error("missing distance between points {i} and {j}")]
    MissingDistance {
        /// First point index.
        i: usize,
        /// Second point index.
        j: usize,
    },

    /// A line of a distance or vector file could not be parsed.
    #[error("malformed record on line {line}: {message}")]
    MalformedRecord {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// I/O failure while reading or writing a file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is caused by bad caller input (as opposed to an
    /// incomplete distance source or an I/O failure).
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, Error::MissingDistance { .. } | Error::Io(_))
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_input_errors() {
        assert!(Error::EmptyInput.is_invalid_input());
        assert!(Error::TooFewPoints { min: 2, n_points: 1 }.is_invalid_input());
        assert!(Error::InvalidVector { left: 0, right: 3 }.is_invalid_input());
        assert!(!Error::MissingDistance { i: 0, j: 1 }.is_invalid_input());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = Error::MalformedRecord {
            line: 7,
            message: "expected 3 fields, found 2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed record on line 7: expected 3 fields, found 2"
        );
        let err = Error::MissingDistance { i: 3, j: 9 };
        assert_eq!(err.to_string(), "missing distance between points 3 and 9");
    }
}
