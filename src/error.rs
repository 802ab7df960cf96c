use std::fmt;
use thiserror::Error;

/// The iterative solves inside the grid-to-geographic pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Solve {
    /// Finding the latitude on the central meridian whose meridional arc matches a northing.
    FootPointLatitude,
    /// Recovering geodetic latitude from Earth-centred Cartesian coordinates.
    GeodeticLatitude,
}

impl fmt::Display for Solve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Solve::FootPointLatitude => f.write_str("foot-point latitude"),
            Solve::GeodeticLatitude => f.write_str("geodetic latitude"),
        }
    }
}

/// An iterative solve did not settle within its iteration cap.
///
/// This is what very-far-out-of-grid (or non-finite) inputs tend to produce; it is never retried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{solve} solve did not converge within {iterations} iterations")]
pub struct ConvergenceError {
    pub(crate) solve: Solve,
    pub(crate) iterations: usize,
}

impl ConvergenceError {
    /// Which solve gave up.
    #[must_use]
    pub fn solve(&self) -> Solve {
        self.solve
    }

    /// How many iterations were spent before giving up.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Reasons decoding well-known text into geographic geometry can fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The text names a geometry type other than `POLYGON` or `MULTIPOLYGON`.
    #[error("unsupported geometry type `{keyword}` (only POLYGON and MULTIPOLYGON are decoded)")]
    Unsupported { keyword: String },

    /// The text is not structurally valid: unbalanced parentheses, a point with the wrong number
    /// of ordinates, a non-numeric ordinate, and so on.
    #[error("malformed geometry at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: String },

    /// A vertex parsed fine but could not be transformed.
    #[error("could not transform vertex: {0}")]
    Convergence(#[from] ConvergenceError),
}

impl DecodeError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            offset,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConvergenceError, DecodeError, Solve};

    #[test]
    fn messages() {
        let err = ConvergenceError {
            solve: Solve::FootPointLatitude,
            iterations: 100,
        };
        insta::assert_snapshot!(
            err,
            @"foot-point latitude solve did not converge within 100 iterations"
        );
        insta::assert_snapshot!(
            DecodeError::from(err),
            @"could not transform vertex: foot-point latitude solve did not converge within 100 iterations"
        );
        insta::assert_snapshot!(
            DecodeError::malformed(9, "expected `)`"),
            @"malformed geometry at byte 9: expected `)`"
        );
        insta::assert_snapshot!(
            DecodeError::Unsupported { keyword: "POINT".into() },
            @"unsupported geometry type `POINT` (only POLYGON and MULTIPOLYGON are decoded)"
        );
    }
}
