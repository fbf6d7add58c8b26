//! Axis-aligned range gating in the camera frame.
//!
//! The gate is a single predicate over all three axes. A point survives only
//! if every configured axis bound holds at once, and the forward axis must
//! always be strictly positive.

use depth_types::{LidarPoint, PointCloudFrame};
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};
use crate::transform::point_to_dvec3;

/// Inclusive bounds on one axis, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    /// Lower bound (inclusive).
    pub min: f64,
    /// Upper bound (inclusive).
    pub max: f64,
}

impl AxisRange {
    /// Creates a range from its bounds.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Creates a range symmetric around zero.
    #[must_use]
    pub const fn symmetric(half_width: f64) -> Self {
        Self {
            min: -half_width,
            max: half_width,
        }
    }

    /// Returns true if `value` lies within the bounds.
    ///
    /// NaN is never contained.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    fn validate(&self, axis: &str) -> Result<()> {
        if self.min.is_nan() || self.max.is_nan() {
            return Err(ProjectionError::invalid_config(format!(
                "{axis} bounds must not be NaN"
            )));
        }
        if self.min > self.max {
            return Err(ProjectionError::invalid_config(format!(
                "{axis} bounds are inverted: min {} > max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Camera-frame bounding box used to discard points before projection.
///
/// `None` on an axis means that axis is unbounded. Independently of the
/// configured bounds, points with `z <= 0` are always rejected.
///
/// # Example
///
/// ```
/// use depth_projection::{AxisRange, RangeGate};
/// use glam::DVec3;
///
/// let gate = RangeGate::unbounded().with_z(AxisRange::new(0.0, 6.0));
/// assert!(gate.contains(DVec3::new(100.0, 0.0, 3.0)));
/// assert!(!gate.contains(DVec3::new(0.0, 0.0, 7.0)));
/// assert!(!gate.contains(DVec3::new(0.0, 0.0, 0.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeGate {
    /// Lateral bounds.
    #[serde(default)]
    pub x: Option<AxisRange>,
    /// Vertical bounds.
    #[serde(default)]
    pub y: Option<AxisRange>,
    /// Forward bounds.
    #[serde(default)]
    pub z: Option<AxisRange>,
}

impl Default for RangeGate {
    /// Near field in front of the camera: `z` in [0, 6] m, `x` in [-6, 6] m.
    fn default() -> Self {
        Self {
            x: Some(AxisRange::symmetric(6.0)),
            y: None,
            z: Some(AxisRange::new(0.0, 6.0)),
        }
    }
}

impl RangeGate {
    /// A gate that only enforces `z > 0`.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            x: None,
            y: None,
            z: None,
        }
    }

    /// Forward reach of a typical automotive lidar: `z` in [0, 80] m.
    #[must_use]
    pub const fn kitti() -> Self {
        Self {
            x: None,
            y: None,
            z: Some(AxisRange::new(0.0, 80.0)),
        }
    }

    /// Sets the lateral bounds.
    #[must_use]
    pub const fn with_x(mut self, range: AxisRange) -> Self {
        self.x = Some(range);
        self
    }

    /// Sets the vertical bounds.
    #[must_use]
    pub const fn with_y(mut self, range: AxisRange) -> Self {
        self.y = Some(range);
        self
    }

    /// Sets the forward bounds.
    #[must_use]
    pub const fn with_z(mut self, range: AxisRange) -> Self {
        self.z = Some(range);
        self
    }

    /// Checks that every configured axis has ordered, non-NaN bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::InvalidConfig`] naming the offending axis.
    pub fn validate(&self) -> Result<()> {
        for (axis, range) in [("x", &self.x), ("y", &self.y), ("z", &self.z)] {
            if let Some(range) = range {
                range.validate(axis)?;
            }
        }
        Ok(())
    }

    /// Evaluates the gate on one camera-frame point.
    #[must_use]
    pub fn contains(&self, point: DVec3) -> bool {
        if point.z.is_nan() || point.z <= 0.0 {
            return false;
        }
        let within = |range: &Option<AxisRange>, value: f64| {
            range.as_ref().is_none_or(|r| r.contains(value))
        };
        within(&self.x, point.x) && within(&self.y, point.y) && within(&self.z, point.z)
    }

    /// Returns the surviving points in their original order.
    #[must_use]
    pub fn apply(&self, points: &[LidarPoint]) -> Vec<LidarPoint> {
        points
            .iter()
            .filter(|p| self.contains(point_to_dvec3(p)))
            .copied()
            .collect()
    }

    /// Gates a whole cloud, keeping its header.
    #[must_use]
    pub fn apply_cloud(&self, cloud: &PointCloudFrame) -> PointCloudFrame {
        PointCloudFrame::from_points(cloud.header.clone(), self.apply(&cloud.points))
    }
}
