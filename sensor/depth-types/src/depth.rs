//! KITTI-style depth images.
//!
//! Provides the 16-bit depth raster produced by projecting a lidar cloud into
//! a camera's image plane.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::codec::{INVALID_DEPTH, decode_depth};
use crate::error::{Result, SensorError};
use crate::CameraIntrinsics;

/// A single-channel 16-bit depth image in the KITTI encoding.
///
/// # Depth Values
///
/// - Each pixel holds `round(depth_m * 256)`; see [`crate::encode_depth`]
/// - `0` marks a pixel without a measurement
/// - Pixels are stored row-major: `data[v * width + u]`
///
/// The buffer always holds exactly `width * height` values; the fields are
/// private so that invariant cannot be broken after construction.
///
/// # Example
///
/// ```
/// use depth_types::DepthImage;
///
/// let mut image = DepthImage::new(640, 480);
/// assert_eq!(image.pixel_count(), 640 * 480);
/// assert_eq!(image.valid_pixel_count(), 0);
///
/// if let Some(pixel) = image.get_mut(10, 20) {
///     *pixel = 512;
/// }
/// assert_eq!(image.depth_at(10, 20), Some(2.0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepthImage {
    width: u32,
    height: u32,
    data: Vec<u16>,
}

impl DepthImage {
    /// Creates an image with every pixel set to "no measurement".
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![INVALID_DEPTH; width as usize * height as usize],
        }
    }

    /// Creates an image sized to a camera's resolution.
    #[must_use]
    pub fn for_camera(intrinsics: &CameraIntrinsics) -> Self {
        Self::new(intrinsics.width, intrinsics.height)
    }

    /// Wraps an existing row-major buffer of encoded depths.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::BufferSizeMismatch`] if `data.len()` is not
    /// `width * height`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u16>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(SensorError::buffer_mismatch(expected, data.len()));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Returns the image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the total number of pixels.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.data.len()
    }

    /// Returns the encoded pixels in row-major order.
    #[must_use]
    pub fn data(&self) -> &[u16] {
        &self.data
    }

    /// Returns the encoded pixels mutably.
    pub fn data_mut(&mut self) -> &mut [u16] {
        &mut self.data
    }

    /// Consumes the image and returns its buffer.
    #[must_use]
    pub fn into_raw(self) -> Vec<u16> {
        self.data
    }

    /// Returns the buffer index of a pixel, or `None` if out of bounds.
    #[must_use]
    pub fn index(&self, u: u32, v: u32) -> Option<usize> {
        (u < self.width && v < self.height).then(|| v as usize * self.width as usize + u as usize)
    }

    /// Gets the encoded value at a pixel.
    ///
    /// Returns `None` if coordinates are out of bounds.
    #[must_use]
    pub fn get(&self, u: u32, v: u32) -> Option<u16> {
        self.index(u, v).map(|idx| self.data[idx])
    }

    /// Gets a mutable reference to the encoded value at a pixel.
    pub fn get_mut(&mut self, u: u32, v: u32) -> Option<&mut u16> {
        let idx = self.index(u, v)?;
        self.data.get_mut(idx)
    }

    /// Gets the decoded depth in meters at a pixel.
    ///
    /// Returns `None` if coordinates are out of bounds or the pixel holds no
    /// measurement.
    #[must_use]
    pub fn depth_at(&self, u: u32, v: u32) -> Option<f64> {
        self.get(u, v)
            .filter(|&value| value != INVALID_DEPTH)
            .map(decode_depth)
    }

    /// Counts the pixels holding a measurement.
    #[must_use]
    pub fn valid_pixel_count(&self) -> usize {
        self.data.iter().filter(|&&d| d != INVALID_DEPTH).count()
    }

    /// Returns the fraction of pixels with a measurement (0.0 to 1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn valid_fraction(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.valid_pixel_count() as f64 / self.data.len() as f64
    }

    /// Back-projects a pixel to a camera-frame point using its depth.
    ///
    /// The stored depth is the forward (z) distance, so the result is
    /// `[(u - cx) / fx * z, (v - cy) / fy * z, z]`. Returns `None` if the
    /// pixel is out of bounds or holds no measurement.
    #[must_use]
    pub fn unproject_pixel(&self, u: u32, v: u32, intrinsics: &CameraIntrinsics) -> Option<[f64; 3]> {
        let depth = self.depth_at(u, v)?;
        Some(intrinsics.unproject([f64::from(u), f64::from(v)], depth))
    }

    /// Converts every measured pixel back to a camera-frame point.
    #[must_use]
    pub fn to_point_cloud(&self, intrinsics: &CameraIntrinsics) -> Vec<[f64; 3]> {
        let mut points = Vec::with_capacity(self.valid_pixel_count());
        for v in 0..self.height {
            for u in 0..self.width {
                if let Some(point) = self.unproject_pixel(u, v, intrinsics) {
                    points.push(point);
                }
            }
        }
        points
    }

    /// Returns depth statistics (min, max, mean) for measured pixels.
    ///
    /// Returns `None` if no pixel holds a measurement.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn depth_stats(&self) -> Option<DepthStats> {
        let mut count = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;

        for depth in self
            .data
            .iter()
            .filter(|&&d| d != INVALID_DEPTH)
            .map(|&d| decode_depth(d))
        {
            count += 1;
            min = min.min(depth);
            max = max.max(depth);
            sum += depth;
        }

        (count > 0).then(|| DepthStats {
            min,
            max,
            mean: sum / count as f64,
            valid_pixels: count,
        })
    }
}

/// Statistics over the measured pixels of a depth image.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthStats {
    /// Minimum depth in meters.
    pub min: f64,
    /// Maximum depth in meters.
    pub max: f64,
    /// Mean depth in meters.
    pub mean: f64,
    /// Number of measured pixels.
    pub valid_pixels: usize,
}
