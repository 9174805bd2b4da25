//! Error types for deformation calls.

use thiserror::Error;

use crate::spline::MAX_ORDER;

/// Failure modes of the deformation engine.
///
/// Every variant is raised while validating a call, before any filtering
/// or sampling work starts, so no output buffer is touched on failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeformError {
    /// Spline order outside the supported range.
    #[error("Invalid spline order {order}: supported orders are 0 through {max}")]
    InvalidOrder { order: usize, max: usize },

    /// Arrays in a batch disagree in shape, or the displacement field
    /// does not match the dimensionality of the inputs.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Crop range is malformed or out of bounds.
    #[error("Invalid crop: {0}")]
    InvalidCrop(String),
}

/// Result type for deformation operations.
pub type Result<T> = std::result::Result<T, DeformError>;

impl DeformError {
    /// Create a shape mismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create an invalid crop error.
    pub fn invalid_crop(msg: impl Into<String>) -> Self {
        Self::InvalidCrop(msg.into())
    }
}

/// Check that a spline order is within the supported range.
pub fn check_order(order: usize) -> Result<()> {
    if order > MAX_ORDER {
        return Err(DeformError::InvalidOrder {
            order,
            max: MAX_ORDER,
        });
    }
    Ok(())
}
