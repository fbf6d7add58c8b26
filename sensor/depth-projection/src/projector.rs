//! Pinhole projection of camera-frame points onto the pixel grid.

use depth_types::CameraIntrinsics;
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which distance is stored as a pixel's depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthMode {
    /// Distance along the optical axis (`z`). Standard depth-map convention.
    #[default]
    OpticalAxis,
    /// Euclidean distance from the camera centre.
    Range,
}

impl DepthMode {
    /// Computes the depth of a camera-frame point under this mode.
    #[must_use]
    pub fn depth_of(self, point: DVec3) -> f64 {
        match self {
            Self::OpticalAxis => point.z,
            Self::Range => point.length(),
        }
    }
}

/// A point mapped to an integer pixel, prior to bounds checking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Pixel column.
    pub u: i64,
    /// Pixel row.
    pub v: i64,
    /// Metric depth in meters (> 0).
    pub depth: f64,
}

impl ProjectedPoint {
    /// Creates a projected point.
    #[must_use]
    pub const fn new(u: i64, v: i64, depth: f64) -> Self {
        Self { u, v, depth }
    }

    /// Returns the pixel as unsigned coordinates if it lies in a `width` x `height` grid.
    #[must_use]
    pub fn pixel_in(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let u = u32::try_from(self.u).ok()?;
        let v = u32::try_from(self.v).ok()?;
        (u < width && v < height).then_some((u, v))
    }
}

/// Maps camera-frame points to pixels through a distortion-free pinhole model.
///
/// The camera frame is the optical convention: `z` forward, `x` right, `y`
/// down. Continuous coordinates are `u = fx * x / z + cx` and
/// `v = fy * y / z + cy`, rounded half away from zero.
///
/// # Example
///
/// ```
/// use depth_projection::PinholeProjector;
/// use depth_types::CameraIntrinsics;
/// use glam::DVec3;
///
/// let projector = PinholeProjector::new(CameraIntrinsics::ideal(500.0, 640, 480)).unwrap();
/// let hit = projector.project(DVec3::new(0.0, 0.0, 2.0)).unwrap();
/// assert_eq!((hit.u, hit.v), (320, 240));
/// assert!(projector.project(DVec3::new(0.0, 0.0, -1.0)).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeProjector {
    intrinsics: CameraIntrinsics,
    mode: DepthMode,
}

impl PinholeProjector {
    /// Creates a projector storing optical-axis depth.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProjectionError::InvalidIntrinsics`] if the intrinsics
    /// fail validation.
    pub fn new(intrinsics: CameraIntrinsics) -> Result<Self> {
        intrinsics.validate()?;
        Ok(Self {
            intrinsics,
            mode: DepthMode::default(),
        })
    }

    /// Sets the depth mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: DepthMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the camera intrinsics.
    #[must_use]
    pub const fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Returns the depth mode.
    #[must_use]
    pub const fn mode(&self) -> DepthMode {
        self.mode
    }

    /// Projects one camera-frame point.
    ///
    /// Returns `None` when the point cannot be projected: `z <= 0`, or any
    /// coordinate is not finite. The result may lie outside the image; that
    /// is checked by the accumulator.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn project(&self, point: DVec3) -> Option<ProjectedPoint> {
        if !point.is_finite() {
            return None;
        }
        let [u, v] = self.intrinsics.project(point.to_array())?;
        // Saturating cast keeps far-off-image coordinates out of bounds.
        Some(ProjectedPoint {
            u: u.round() as i64,
            v: v.round() as i64,
            depth: self.mode.depth_of(point),
        })
    }
}
