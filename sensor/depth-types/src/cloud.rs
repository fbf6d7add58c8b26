//! Point cloud types.
//!
//! Provides the lidar sweep consumed by the projection pipeline.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{FrameId, Header, Timestamp};

/// A single lidar return with optional intensity.
///
/// # Example
///
/// ```
/// use depth_types::LidarPoint;
///
/// let point = LidarPoint::new([3.0, 4.0, 0.0]);
/// assert!((point.range() - 5.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LidarPoint {
    /// 3D position in meters: `[x, y, z]`.
    pub position: [f32; 3],

    /// Intensity/reflectivity, if the sensor reports it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub intensity: Option<f32>,
}

impl LidarPoint {
    /// Creates a point without intensity.
    #[must_use]
    pub const fn new(position: [f32; 3]) -> Self {
        Self {
            position,
            intensity: None,
        }
    }

    /// Creates a point with intensity.
    #[must_use]
    pub const fn with_intensity(position: [f32; 3], intensity: f32) -> Self {
        Self {
            position,
            intensity: Some(intensity),
        }
    }

    /// Returns the x coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.position[0]
    }

    /// Returns the y coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.position[1]
    }

    /// Returns the z coordinate.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.position[2]
    }

    /// Returns the Euclidean distance from the frame origin.
    #[must_use]
    pub fn range(&self) -> f32 {
        let [x, y, z] = self.position;
        x.hypot(y).hypot(z)
    }

    /// Checks if this point is valid (finite position).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
    }
}

impl Default for LidarPoint {
    fn default() -> Self {
        Self::new([0.0, 0.0, 0.0])
    }
}

impl From<[f32; 3]> for LidarPoint {
    fn from(position: [f32; 3]) -> Self {
        Self::new(position)
    }
}

/// One lidar sweep: an ordered set of points sharing a frame and capture time.
///
/// Point order carries no meaning for projection, but transforms and the
/// range gate preserve it so results can be traced back to input indices.
///
/// # Example
///
/// ```
/// use depth_types::{PointCloudFrame, Header, Timestamp};
///
/// let cloud = PointCloudFrame::from_positions(
///     Header::new(Timestamp::from_secs_f64(1.0), "lidar"),
///     vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
/// );
///
/// assert_eq!(cloud.len(), 3);
/// assert_eq!(cloud.frame_id(), "lidar");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointCloudFrame {
    /// Capture time and frame of the points.
    pub header: Header,

    /// Point data.
    pub points: Vec<LidarPoint>,
}

impl PointCloudFrame {
    /// Creates an empty cloud.
    #[must_use]
    pub const fn new(header: Header) -> Self {
        Self {
            header,
            points: Vec::new(),
        }
    }

    /// Creates a cloud from points.
    #[must_use]
    pub const fn from_points(header: Header, points: Vec<LidarPoint>) -> Self {
        Self { header, points }
    }

    /// Creates a cloud from raw positions, without intensity.
    #[must_use]
    pub fn from_positions(header: Header, positions: Vec<[f32; 3]>) -> Self {
        let points = positions.into_iter().map(LidarPoint::new).collect();
        Self { header, points }
    }

    /// Returns the coordinate frame of the points.
    #[must_use]
    pub const fn frame_id(&self) -> &FrameId {
        &self.header.frame_id
    }

    /// Returns the capture timestamp.
    #[must_use]
    pub const fn stamp(&self) -> Timestamp {
        self.header.stamp
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Checks if the cloud is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Appends a point.
    pub fn push(&mut self, point: impl Into<LidarPoint>) {
        self.points.push(point.into());
    }

    /// Returns an iterator over the points.
    pub fn iter(&self) -> std::slice::Iter<'_, LidarPoint> {
        self.points.iter()
    }

    /// Returns the number of points with finite coordinates.
    #[must_use]
    pub fn valid_point_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_valid()).count()
    }

    /// Returns all positions.
    #[must_use]
    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Returns the axis-aligned bounding box of all valid points.
    ///
    /// Returns `None` if there are no valid points.
    #[must_use]
    pub fn bounding_box(&self) -> Option<([f32; 3], [f32; 3])> {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        let mut any_valid = false;

        for point in self.points.iter().filter(|p| p.is_valid()) {
            any_valid = true;
            for axis in 0..3 {
                min[axis] = min[axis].min(point.position[axis]);
                max[axis] = max[axis].max(point.position[axis]);
            }
        }

        any_valid.then_some((min, max))
    }
}

impl<'a> IntoIterator for &'a PointCloudFrame {
    type Item = &'a LidarPoint;
    type IntoIter = std::slice::Iter<'a, LidarPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
