//! Error types for Isoform

use thiserror::Error;

/// Result type alias using Isoform's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Isoform operations
///
/// Only constructors and the mesher can fail. Composing valid fields is pure
/// arithmetic and never produces an error.
#[derive(Error, Debug)]
pub enum Error {
    /// A constructor received a degenerate or out-of-range parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A field or meshing call needed bounds that were not supplied
    #[error("Missing bounds: {0}")]
    MissingBounds(String),

    /// The voxel grid would exceed the configured memory budget
    #[error(
        "Resolution {resolution} needs {required_bytes} bytes for the voxel grid, \
         over the {limit_bytes} byte budget; maximum safe resolution is {max_resolution}"
    )]
    MemoryLimit {
        resolution: u32,
        required_bytes: u64,
        limit_bytes: u64,
        max_resolution: u32,
    },

    /// Export failed
    #[error("Export failed: {0}")]
    Export(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }
}

/// Reject values that are not strictly positive and finite
pub(crate) fn ensure_positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(format!("{name} must be positive, got {value}")))
    }
}

/// Reject NaN and infinities
pub(crate) fn ensure_finite(name: &str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid(format!("{name} must be finite, got {value}")))
    }
}

/// Reject vectors with non-finite components
pub(crate) fn ensure_finite_vec(name: &str, value: glam::Vec3) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid(format!("{name} must be finite, got {value}")))
    }
}
