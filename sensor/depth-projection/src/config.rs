//! Pipeline configuration.
//!
//! [`PipelineConfig`] bundles the range gate, the depth convention and the
//! parallelism policy of a [`crate::FramePipeline`].
//!
//! # Presets
//!
//! - [`PipelineConfig::default()`] - Near field: forward 0-6 m, lateral ±6 m
//! - [`PipelineConfig::unbounded()`] - Only drops points behind the camera
//! - [`PipelineConfig::kitti()`] - Forward reach of an automotive lidar (80 m)
//!
//! # Example
//!
//! ```
//! use depth_projection::{AxisRange, DepthMode, PipelineConfig};
//!
//! // Use a preset
//! let config = PipelineConfig::kitti();
//! assert!(config.validate().is_ok());
//!
//! // Or customize settings
//! let config = PipelineConfig::unbounded()
//!     .with_z_range(AxisRange::new(0.0, 40.0))
//!     .with_depth_mode(DepthMode::Range)
//!     .with_parallel(false);
//! assert!(!config.parallel);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};
use crate::gate::{AxisRange, RangeGate};
use crate::projector::DepthMode;

/// Cloud size from which the parallel path is used by default.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 50_000;

/// Configuration for a [`crate::FramePipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Camera-frame bounding box applied before projection.
    pub gate: RangeGate,

    /// Distance stored in each pixel.
    pub depth_mode: DepthMode,

    /// Whether large clouds are processed on the rayon thread pool.
    pub parallel: bool,

    /// Minimum number of points before the parallel path is taken.
    pub parallel_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gate: RangeGate::default(),
            depth_mode: DepthMode::default(),
            parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    /// Configuration that keeps every point in front of the camera.
    ///
    /// # Example
    ///
    /// ```
    /// use depth_projection::PipelineConfig;
    ///
    /// let config = PipelineConfig::unbounded();
    /// assert!(config.gate.x.is_none() && config.gate.z.is_none());
    /// ```
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            gate: RangeGate::unbounded(),
            ..Self::default()
        }
    }

    /// Configuration for outdoor driving data.
    ///
    /// # Example
    ///
    /// ```
    /// use depth_projection::PipelineConfig;
    ///
    /// let config = PipelineConfig::kitti();
    /// assert_eq!(config.gate.z.map(|z| z.max), Some(80.0));
    /// ```
    #[must_use]
    pub fn kitti() -> Self {
        Self {
            gate: RangeGate::kitti(),
            ..Self::default()
        }
    }

    /// Replace the whole range gate.
    #[must_use]
    pub const fn with_gate(mut self, gate: RangeGate) -> Self {
        self.gate = gate;
        self
    }

    /// Set the lateral (x) bounds.
    #[must_use]
    pub const fn with_x_range(mut self, range: AxisRange) -> Self {
        self.gate = self.gate.with_x(range);
        self
    }

    /// Set the vertical (y) bounds.
    #[must_use]
    pub const fn with_y_range(mut self, range: AxisRange) -> Self {
        self.gate = self.gate.with_y(range);
        self
    }

    /// Set the forward (z) bounds.
    #[must_use]
    pub const fn with_z_range(mut self, range: AxisRange) -> Self {
        self.gate = self.gate.with_z(range);
        self
    }

    /// Set the depth convention.
    #[must_use]
    pub const fn with_depth_mode(mut self, mode: DepthMode) -> Self {
        self.depth_mode = mode;
        self
    }

    /// Enable or disable parallel processing.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the cloud size from which parallel processing kicks in.
    #[must_use]
    pub const fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Returns true if a cloud of `points` points takes the parallel path.
    #[must_use]
    pub const fn use_parallel(&self, points: usize) -> bool {
        self.parallel && points >= self.parallel_threshold
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::InvalidConfig`] if any gate bound is NaN or
    /// inverted, or the parallel threshold is zero.
    pub fn validate(&self) -> Result<()> {
        self.gate.validate()?;
        if self.parallel_threshold == 0 {
            return Err(ProjectionError::invalid_config(
                "parallel_threshold must be at least 1",
            ));
        }
        Ok(())
    }
}
