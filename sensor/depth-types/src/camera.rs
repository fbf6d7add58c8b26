//! Camera calibration types.
//!
//! Provides the pinhole intrinsics the lidar cloud is projected through.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorError};
use crate::{FrameId, Header};

/// Camera intrinsic parameters (pinhole model, no distortion).
///
/// # Pinhole Model
///
/// Projects a camera-frame point `[X, Y, Z]` (z forward, x right, y down) to
/// continuous pixel coordinates:
/// ```text
/// u = fx * X/Z + cx
/// v = fy * Y/Z + cy
/// ```
///
/// # Invariants
///
/// `width`, `height`, `fx` and `fy` must be positive and the principal point
/// finite. [`CameraIntrinsics::validate`] checks this; nothing corrects it.
///
/// # Example
///
/// ```
/// use depth_types::CameraIntrinsics;
///
/// let intrinsics = CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0, 640, 480);
///
/// assert!(intrinsics.validate().is_ok());
/// assert_eq!(intrinsics.aspect_ratio(), 640.0 / 480.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraIntrinsics {
    /// Focal length in pixels (x direction).
    pub fx: f64,
    /// Focal length in pixels (y direction).
    pub fy: f64,
    /// Principal point x-coordinate in pixels.
    pub cx: f64,
    /// Principal point y-coordinate in pixels.
    pub cy: f64,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl CameraIntrinsics {
    /// Creates new camera intrinsics.
    #[must_use]
    pub const fn new(fx: f64, fy: f64, cx: f64, cy: f64, width: u32, height: u32) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            width,
            height,
        }
    }

    /// Creates intrinsics for an ideal pinhole camera centered in the image.
    ///
    /// Uses the given focal length and places the principal point at the image center.
    #[must_use]
    pub fn ideal(focal_length: f64, width: u32, height: u32) -> Self {
        Self {
            fx: focal_length,
            fy: focal_length,
            cx: f64::from(width) / 2.0,
            cy: f64::from(height) / 2.0,
            width,
            height,
        }
    }

    /// Checks the pinhole invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidIntrinsics`] if the width or height is
    /// zero, a focal length is not a positive finite number, or the principal
    /// point is not finite.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SensorError::invalid_intrinsics(format!(
                "image size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.fx.is_finite() && self.fx > 0.0) {
            return Err(SensorError::invalid_intrinsics(format!(
                "fx must be positive, got {}",
                self.fx
            )));
        }
        if !(self.fy.is_finite() && self.fy > 0.0) {
            return Err(SensorError::invalid_intrinsics(format!(
                "fy must be positive, got {}",
                self.fy
            )));
        }
        if !(self.cx.is_finite() && self.cy.is_finite()) {
            return Err(SensorError::invalid_intrinsics(format!(
                "principal point must be finite, got ({}, {})",
                self.cx, self.cy
            )));
        }
        Ok(())
    }

    /// Returns the number of pixels in the image.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns the image aspect ratio (width / height).
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Returns the horizontal field of view in radians.
    #[must_use]
    pub fn fov_x(&self) -> f64 {
        2.0 * (f64::from(self.width) / (2.0 * self.fx)).atan()
    }

    /// Returns the vertical field of view in radians.
    #[must_use]
    pub fn fov_y(&self) -> f64 {
        2.0 * (f64::from(self.height) / (2.0 * self.fy)).atan()
    }

    /// Checks whether an integer pixel lies inside the image.
    #[must_use]
    pub fn contains_pixel(&self, u: i64, v: i64) -> bool {
        u >= 0 && v >= 0 && u < i64::from(self.width) && v < i64::from(self.height)
    }

    /// Projects a camera-frame point to continuous pixel coordinates.
    ///
    /// Returns `None` if the point is behind or on the camera plane (Z <= 0).
    #[must_use]
    pub fn project(&self, point: [f64; 3]) -> Option<[f64; 2]> {
        let [x, y, z] = point;
        if z.is_nan() || z <= 0.0 {
            return None;
        }
        Some([self.fx.mul_add(x / z, self.cx), self.fy.mul_add(y / z, self.cy)])
    }

    /// Back-projects a pixel at a given forward (z) depth to a camera-frame point.
    #[must_use]
    pub fn unproject(&self, pixel: [f64; 2], depth: f64) -> [f64; 3] {
        let x = (pixel[0] - self.cx) / self.fx;
        let y = (pixel[1] - self.cy) / self.fy;
        [x * depth, y * depth, depth]
    }
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self::ideal(500.0, 640, 480)
    }
}

/// Camera calibration as delivered alongside an image stream.
///
/// Pairs the intrinsics with the header naming the camera's optical frame,
/// the frame a lidar-to-camera transform must target.
///
/// # Example
///
/// ```
/// use depth_types::{CameraInfo, CameraIntrinsics, Header, Timestamp};
///
/// let info = CameraInfo::new(
///     Header::new(Timestamp::zero(), "camera_optical"),
///     CameraIntrinsics::ideal(500.0, 800, 600),
/// );
/// assert_eq!(info.frame_id(), "camera_optical");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraInfo {
    /// Capture time and optical frame of the camera.
    pub header: Header,
    /// Pinhole intrinsics.
    pub intrinsics: CameraIntrinsics,
}

impl CameraInfo {
    /// Creates camera info.
    #[must_use]
    pub const fn new(header: Header, intrinsics: CameraIntrinsics) -> Self {
        Self { header, intrinsics }
    }

    /// Returns the camera's optical frame.
    #[must_use]
    pub const fn frame_id(&self) -> &FrameId {
        &self.header.frame_id
    }
}
