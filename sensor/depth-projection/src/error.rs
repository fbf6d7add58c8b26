//! Error types for the projection pipeline.

use depth_types::{FrameId, SensorError, Timestamp};
use thiserror::Error;

/// Errors that abort the projection of a whole frame.
///
/// Points that cannot be projected (behind the camera, outside the image)
/// are dropped silently and never produce one of these.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The transform's frame does not match the data it is applied to.
    #[error("frame mismatch: expected {expected}, got {actual}")]
    FrameMismatch {
        /// Frame the data is declared in.
        expected: FrameId,
        /// Frame the transform was built for.
        actual: FrameId,
    },

    /// Camera intrinsics violate the pinhole invariants.
    #[error("invalid intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// No transform between the requested frames could be supplied.
    #[error("transform unavailable from {source_frame} to {target_frame} at {stamp}: {reason}")]
    TransformUnavailable {
        /// Frame the points are in.
        source_frame: FrameId,
        /// Frame the points should be moved to.
        target_frame: FrameId,
        /// Requested capture time.
        stamp: Timestamp,
        /// Why the lookup failed.
        reason: String,
    },

    /// Rotation is not a proper orthonormal matrix.
    #[error("invalid transform: {0}")]
    InvalidTransform(String),

    /// Invalid pipeline configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error from the sensor data layer.
    #[error(transparent)]
    Sensor(SensorError),
}

impl ProjectionError {
    /// Creates a frame mismatch error.
    #[must_use]
    pub fn frame_mismatch(expected: impl Into<FrameId>, actual: impl Into<FrameId>) -> Self {
        Self::FrameMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a transform unavailable error.
    #[must_use]
    pub fn transform_unavailable(
        source_frame: impl Into<FrameId>,
        target_frame: impl Into<FrameId>,
        stamp: Timestamp,
        reason: impl Into<String>,
    ) -> Self {
        Self::TransformUnavailable {
            source_frame: source_frame.into(),
            target_frame: target_frame.into(),
            stamp,
            reason: reason.into(),
        }
    }

    /// Creates an invalid transform error.
    #[must_use]
    pub fn invalid_transform(reason: impl Into<String>) -> Self {
        Self::InvalidTransform(reason.into())
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

impl From<SensorError> for ProjectionError {
    fn from(err: SensorError) -> Self {
        match err {
            SensorError::InvalidIntrinsics(reason) => Self::InvalidIntrinsics(reason),
            other => Self::Sensor(other),
        }
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
