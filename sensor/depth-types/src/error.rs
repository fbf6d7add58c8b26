//! Error types for sensor data.

use thiserror::Error;

/// Errors that can occur when working with sensor data.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Camera intrinsics violate the pinhole model invariants.
    #[error("invalid intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// Buffer size mismatch (e.g., depth buffer wrong size for its dimensions).
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch {
        /// Expected buffer size.
        expected: usize,
        /// Actual buffer size.
        actual: usize,
    },

    /// Depth image could not be encoded or decoded.
    #[cfg(feature = "png")]
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// The file does not hold a single-channel 16-bit image.
    #[error("unsupported image layout: {0}")]
    UnsupportedLayout(String),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SensorError {
    /// Creates an invalid intrinsics error.
    #[must_use]
    pub fn invalid_intrinsics(reason: impl Into<String>) -> Self {
        Self::InvalidIntrinsics(reason.into())
    }

    /// Creates a buffer size mismatch error.
    #[must_use]
    pub const fn buffer_mismatch(expected: usize, actual: usize) -> Self {
        Self::BufferSizeMismatch { expected, actual }
    }

    /// Creates an unsupported layout error.
    #[must_use]
    pub fn unsupported_layout(reason: impl Into<String>) -> Self {
        Self::UnsupportedLayout(reason.into())
    }
}

/// Result type for sensor data operations.
pub type Result<T> = std::result::Result<T, SensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_intrinsics() {
        let err = SensorError::invalid_intrinsics("fx must be positive");
        let msg = format!("{err}");
        assert!(msg.contains("invalid intrinsics"));
        assert!(msg.contains("fx"));
    }

    #[test]
    fn error_buffer_mismatch() {
        let err = SensorError::buffer_mismatch(100, 50);
        let msg = format!("{err}");
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn error_unsupported_layout() {
        let err = SensorError::unsupported_layout("rgb8");
        assert!(err.to_string().contains("rgb8"));
    }

    #[test]
    fn error_variants_all_have_constructors() {
        let errors = [
            SensorError::invalid_intrinsics("fy"),
            SensorError::buffer_mismatch(4, 3),
            SensorError::unsupported_layout("rgba8"),
            SensorError::from(std::io::Error::other("disk")),
        ];
        for err in &errors {
            let built_by_helper = match err {
                SensorError::InvalidIntrinsics(_)
                | SensorError::BufferSizeMismatch { .. }
                | SensorError::UnsupportedLayout(_)
                | SensorError::Io(_) => true,
                #[cfg(feature = "png")]
                SensorError::Image(_) => false,
            };
            assert!(built_by_helper, "{err}");
        }
    }

    #[test]
    fn error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.png");
        let err = SensorError::from(io);
        assert!(err.to_string().contains("I/O error"));
    }
}
