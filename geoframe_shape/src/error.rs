//! Shape errors

use geoframe::FrameError;
use thiserror::Error;

/// Shape construction and query errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("Invalid {what}: {value} (must be finite and positive)")]
    InvalidDimension { what: &'static str, value: f64 },

    #[error("Convex polytope from {0} vertices has no volume")]
    DegeneratePolytope(usize),

    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),
}

/// Result type for shape operations
pub type ShapeResult<T> = Result<T, ShapeError>;

impl ShapeError {
    /// Whether this error comes from mixing two frames without a conversion
    pub fn is_frame_mismatch(&self) -> bool {
        matches!(self, ShapeError::Frame(e) if e.is_frame_mismatch())
    }
}

/// Fail with `InvalidDimension` unless `value` is finite and strictly positive
pub(crate) fn check_positive(what: &'static str, value: f64) -> ShapeResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ShapeError::InvalidDimension { what, value })
    }
}
