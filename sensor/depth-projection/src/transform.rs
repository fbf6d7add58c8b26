//! Rigid transforms between sensor frames.

use depth_types::{FrameId, LidarPoint, PointCloudFrame, Timestamp};
use glam::{DMat3, DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};

/// Tolerance used when checking that a rotation is orthonormal.
pub const ROTATION_TOLERANCE: f64 = 1e-6;

/// A 3D rigid body transform (rotation + translation).
///
/// Maps a point `p` to `R * p + t`. The rotation must be a unit quaternion;
/// constructors taking raw quaternions trust the caller, while
/// [`Transform3D::from_rotation_matrix`] checks orthonormality.
///
/// # Example
///
/// ```
/// use depth_projection::Transform3D;
/// use glam::DVec3;
///
/// // Identity transform
/// let t = Transform3D::identity();
/// let point = DVec3::new(1.0, 2.0, 3.0);
/// assert!((t.apply_point(point) - point).length() < 1e-12);
///
/// // Translation only
/// let t = Transform3D::from_translation(DVec3::new(10.0, 0.0, 0.0));
/// assert!((t.apply_point(DVec3::ZERO).x - 10.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    /// Rotation component (unit quaternion).
    #[serde(with = "quat_serde")]
    pub rotation: DQuat,

    /// Translation component in meters.
    #[serde(with = "vec3_serde")]
    pub translation: DVec3,
}

mod quat_serde {
    use glam::DQuat;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct QuatData {
        x: f64,
        y: f64,
        z: f64,
        w: f64,
    }

    pub fn serialize<S: Serializer>(q: &DQuat, s: S) -> std::result::Result<S::Ok, S::Error> {
        QuatData {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
        .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<DQuat, D::Error> {
        let data = QuatData::deserialize(d)?;
        Ok(DQuat::from_xyzw(data.x, data.y, data.z, data.w))
    }
}

mod vec3_serde {
    use glam::DVec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Vec3Data {
        x: f64,
        y: f64,
        z: f64,
    }

    pub fn serialize<S: Serializer>(v: &DVec3, s: S) -> std::result::Result<S::Ok, S::Error> {
        Vec3Data {
            x: v.x,
            y: v.y,
            z: v.z,
        }
        .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<DVec3, D::Error> {
        let data = Vec3Data::deserialize(d)?;
        Ok(DVec3::new(data.x, data.y, data.z))
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform3D {
    /// Creates an identity transform (no rotation or translation).
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            rotation: DQuat::IDENTITY,
            translation: DVec3::ZERO,
        }
    }

    /// Creates a transform with only translation.
    #[must_use]
    pub const fn from_translation(translation: DVec3) -> Self {
        Self {
            rotation: DQuat::IDENTITY,
            translation,
        }
    }

    /// Creates a transform with only rotation.
    #[must_use]
    pub const fn from_rotation(rotation: DQuat) -> Self {
        Self {
            rotation,
            translation: DVec3::ZERO,
        }
    }

    /// Creates a transform from rotation and translation.
    #[must_use]
    pub const fn new(rotation: DQuat, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Creates a transform from a 3x3 rotation matrix and a translation.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::InvalidTransform`] if the matrix has
    /// non-finite entries, is not orthonormal (`RᵀR ≠ I`), or is a reflection
    /// (`det R ≠ 1`), all within [`ROTATION_TOLERANCE`].
    ///
    /// # Example
    ///
    /// ```
    /// use depth_projection::Transform3D;
    /// use glam::{DMat3, DVec3};
    ///
    /// let ok = Transform3D::from_rotation_matrix(DMat3::from_rotation_z(0.3), DVec3::ZERO);
    /// assert!(ok.is_ok());
    ///
    /// let mirror = DMat3::from_diagonal(DVec3::new(1.0, 1.0, -1.0));
    /// assert!(Transform3D::from_rotation_matrix(mirror, DVec3::ZERO).is_err());
    /// ```
    pub fn from_rotation_matrix(rotation: DMat3, translation: DVec3) -> Result<Self> {
        if !rotation.is_finite() || !translation.is_finite() {
            return Err(ProjectionError::invalid_transform(
                "rotation and translation must be finite",
            ));
        }

        let gram = rotation.transpose() * rotation;
        let deviation = (gram - DMat3::IDENTITY)
            .to_cols_array()
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if deviation > ROTATION_TOLERANCE {
            return Err(ProjectionError::invalid_transform(format!(
                "rotation matrix is not orthonormal (max |RᵀR - I| = {deviation:e})"
            )));
        }

        let det = rotation.determinant();
        if (det - 1.0).abs() > ROTATION_TOLERANCE {
            return Err(ProjectionError::invalid_transform(format!(
                "rotation matrix determinant is {det}, expected 1"
            )));
        }

        Ok(Self {
            rotation: DQuat::from_mat3(&rotation),
            translation,
        })
    }

    /// Creates a transform from a 4x4 homogeneous matrix.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Transform3D::from_rotation_matrix`] for the
    /// upper-left 3x3 block.
    pub fn from_matrix(mat: DMat4) -> Result<Self> {
        Self::from_rotation_matrix(DMat3::from_mat4(mat), mat.w_axis.truncate())
    }

    /// Converts the transform to a 4x4 homogeneous matrix.
    #[must_use]
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// Returns the rotation as a 3x3 matrix.
    #[must_use]
    pub fn rotation_matrix(&self) -> DMat3 {
        DMat3::from_quat(self.rotation)
    }

    /// Applies the transform to a point.
    #[must_use]
    pub fn apply_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation
    }

    /// Applies the transform to a direction vector.
    ///
    /// Only rotation is applied, not translation.
    #[must_use]
    pub fn apply_direction(&self, direction: DVec3) -> DVec3 {
        self.rotation * direction
    }

    /// Returns the inverse transform.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            rotation: inv_rotation,
            translation: inv_rotation * (-self.translation),
        }
    }

    /// Composes this transform with another (self * other).
    ///
    /// The result applies `other` first, then `self`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
            translation: self.rotation * other.translation + self.translation,
        }
    }

    /// Returns true if the rotation is a finite unit quaternion within `tolerance`.
    #[must_use]
    pub fn is_rigid(&self, tolerance: f64) -> bool {
        self.rotation.is_finite()
            && self.translation.is_finite()
            && (self.rotation.length() - 1.0).abs() <= tolerance
    }

    /// Returns true if this is approximately the identity transform.
    #[must_use]
    pub fn is_identity(&self, epsilon: f64) -> bool {
        let rot_diff = (self.rotation - DQuat::IDENTITY).length();
        let trans_diff = self.translation.length();
        rot_diff < epsilon && trans_diff < epsilon
    }
}

/// Moves a batch of points through a transform.
///
/// The output has the same length and order as the input; intensities are
/// carried over.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn transform_points(transform: &Transform3D, points: &[LidarPoint]) -> Vec<LidarPoint> {
    points
        .iter()
        .map(|p| {
            let moved = transform.apply_point(point_to_dvec3(p));
            LidarPoint {
                position: [moved.x as f32, moved.y as f32, moved.z as f32],
                intensity: p.intensity,
            }
        })
        .collect()
}

/// Widens a lidar point to double precision.
#[must_use]
pub fn point_to_dvec3(point: &LidarPoint) -> DVec3 {
    let [x, y, z] = point.position;
    DVec3::new(f64::from(x), f64::from(y), f64::from(z))
}

/// A rigid transform labelled with the frames it connects.
///
/// Maps points expressed in `source_frame` into `target_frame`, valid at
/// `stamp`. This is what a transform-tree lookup hands to the pipeline.
///
/// # Example
///
/// ```
/// use depth_projection::{StampedTransform, Transform3D};
/// use depth_types::Timestamp;
/// use glam::DVec3;
///
/// let tf = StampedTransform::new(
///     "lidar",
///     "camera_optical",
///     Timestamp::zero(),
///     Transform3D::from_translation(DVec3::new(0.0, 0.0, 0.1)),
/// );
/// assert_eq!(tf.inverse().source_frame, "camera_optical");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedTransform {
    /// Frame the transform maps points out of.
    pub source_frame: FrameId,
    /// Frame the transform maps points into.
    pub target_frame: FrameId,
    /// Time at which the transform is valid.
    #[serde(default)]
    pub stamp: Timestamp,
    /// The rigid motion itself.
    pub transform: Transform3D,
}

impl StampedTransform {
    /// Creates a stamped transform.
    #[must_use]
    pub fn new(
        source_frame: impl Into<FrameId>,
        target_frame: impl Into<FrameId>,
        stamp: Timestamp,
        transform: Transform3D,
    ) -> Self {
        Self {
            source_frame: source_frame.into(),
            target_frame: target_frame.into(),
            stamp,
            transform,
        }
    }

    /// Returns the transform mapping `target_frame` back into `source_frame`.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            source_frame: self.target_frame.clone(),
            target_frame: self.source_frame.clone(),
            stamp: self.stamp,
            transform: self.transform.inverse(),
        }
    }

    /// Moves a cloud into the target frame.
    ///
    /// The caller is responsible for the cloud being in `source_frame`; see
    /// [`crate::FramePipeline`] for the checked path. The output keeps the
    /// cloud's stamp and sequence number and is labelled with `target_frame`.
    #[must_use]
    pub fn transform_cloud(&self, cloud: &PointCloudFrame) -> PointCloudFrame {
        let mut header = cloud.header.clone();
        header.frame_id = self.target_frame.clone();
        PointCloudFrame::from_points(header, transform_points(&self.transform, &cloud.points))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use depth_types::Header;
    use std::f64::consts::PI;

    #[test]
    fn transform_identity() {
        let t = Transform3D::identity();
        let point = DVec3::new(1.0, 2.0, 3.0);
        assert!((t.apply_point(point) - point).length() < 1e-12);
        assert!(Transform3D::default().is_identity(1e-12));
    }

    #[test]
    fn transform_rotation_z() {
        // Rotate 90 degrees around Z
        let t = Transform3D::from_rotation(DQuat::from_rotation_z(PI / 2.0));
        let result = t.apply_point(DVec3::X);

        assert!(result.x.abs() < 1e-12);
        assert!((result.y - 1.0).abs() < 1e-12);
        assert!(result.z.abs() < 1e-12);
    }

    #[test]
    fn transform_direction_ignores_translation() {
        let t = Transform3D::from_translation(DVec3::new(100.0, 0.0, 0.0));
        assert!((t.apply_direction(DVec3::X) - DVec3::X).length() < 1e-12);
    }

    #[test]
    fn transform_inverse() {
        let t = Transform3D::new(DQuat::from_rotation_y(PI / 4.0), DVec3::new(10.0, 20.0, 30.0));
        assert!(t.compose(&t.inverse()).is_identity(1e-9));

        let p = DVec3::new(-3.0, 0.5, 7.25);
        assert!((t.inverse().apply_point(t.apply_point(p)) - p).length() < 1e-9);
    }

    #[test]
    fn transform_compose_order() {
        let rotate = Transform3D::from_rotation(DQuat::from_rotation_z(PI / 2.0));
        let shift = Transform3D::from_translation(DVec3::X);

        // shift first, then rotate: (1,0,0) -> (2,0,0) -> (0,2,0)
        let p = rotate.compose(&shift).apply_point(DVec3::X);
        assert!((p - DVec3::new(0.0, 2.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn transform_from_rotation_matrix() {
        let m = DMat3::from_rotation_x(0.7) * DMat3::from_rotation_z(-1.1);
        let t = Transform3D::from_rotation_matrix(m, DVec3::new(1.0, 2.0, 3.0)).unwrap();
        let p = DVec3::new(0.3, -0.2, 5.0);
        let expected = m * p + DVec3::new(1.0, 2.0, 3.0);
        assert!((t.apply_point(p) - expected).length() < 1e-9);
        assert!(t.is_rigid(1e-9));
    }

    #[test]
    fn transform_rejects_non_orthonormal() {
        let scaled = DMat3::from_diagonal(DVec3::new(2.0, 1.0, 1.0));
        let err = Transform3D::from_rotation_matrix(scaled, DVec3::ZERO);
        assert!(matches!(err, Err(ProjectionError::InvalidTransform(_))));
    }

    #[test]
    fn transform_rejects_reflection() {
        let mirror = DMat3::from_diagonal(DVec3::new(1.0, -1.0, 1.0));
        assert!(Transform3D::from_rotation_matrix(mirror, DVec3::ZERO).is_err());
    }

    #[test]
    fn transform_rejects_nan() {
        let m = DMat3::from_rotation_y(0.2);
        assert!(Transform3D::from_rotation_matrix(m, DVec3::new(f64::NAN, 0.0, 0.0)).is_err());
    }

    #[test]
    fn transform_matrix_round_trip() {
        let t = Transform3D::new(DQuat::from_rotation_x(0.4), DVec3::new(1.0, 2.0, 3.0));
        let restored = Transform3D::from_matrix(t.to_matrix()).unwrap();
        assert!((t.translation - restored.translation).length() < 1e-12);
        let p = DVec3::new(0.5, 0.5, 0.5);
        assert!((t.apply_point(p) - restored.apply_point(p)).length() < 1e-9);
    }

    #[test]
    fn transform_is_rigid() {
        assert!(Transform3D::identity().is_rigid(1e-12));
        let scaled = Transform3D::from_rotation(DQuat::from_xyzw(0.0, 0.0, 0.0, 2.0));
        assert!(!scaled.is_rigid(1e-6));
    }

    #[test]
    fn transform_serialization() {
        let t = Transform3D::new(DQuat::from_rotation_z(0.5), DVec3::new(1.0, 2.0, 3.0));
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"w\""));
        let parsed: Transform3D = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn transform_points_preserves_order_and_intensity() {
        let t = Transform3D::from_translation(DVec3::new(0.0, 0.0, 1.0));
        let points = vec![
            LidarPoint::with_intensity([1.0, 0.0, 0.0], 0.2),
            LidarPoint::new([0.0, 1.0, 0.0]),
        ];
        let moved = transform_points(&t, &points);
        assert_eq!(moved.len(), 2);
        assert_eq!(moved[0].position, [1.0, 0.0, 1.0]);
        assert_eq!(moved[0].intensity, Some(0.2));
        assert_eq!(moved[1].position, [0.0, 1.0, 1.0]);
    }

    #[test]
    fn stamped_transform_cloud_relabels_frame() {
        let tf = StampedTransform::new(
            "lidar",
            "camera",
            Timestamp::zero(),
            Transform3D::from_translation(DVec3::new(1.0, 0.0, 0.0)),
        );
        let cloud = PointCloudFrame::from_positions(
            Header::new(Timestamp::from_nanos(9), "lidar").with_seq(4),
            vec![[0.0, 0.0, 2.0]],
        );
        let moved = tf.transform_cloud(&cloud);
        assert_eq!(moved.frame_id(), "camera");
        assert_eq!(moved.stamp(), Timestamp::from_nanos(9));
        assert_eq!(moved.header.seq, 4);
        assert_eq!(moved.points[0].position, [1.0, 0.0, 2.0]);
    }

    #[test]
    fn stamped_transform_inverse_swaps_frames() {
        let tf = StampedTransform::new("a", "b", Timestamp::zero(), Transform3D::identity());
        let inv = tf.inverse();
        assert_eq!(inv.source_frame, "b");
        assert_eq!(inv.target_frame, "a");
    }

    #[test]
    fn stamped_transform_serialization() {
        let json = r#"{
            "source_frame": "lidar",
            "target_frame": "camera",
            "transform": {
                "rotation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0},
                "translation": {"x": 0.1, "y": 0.0, "z": 0.0}
            }
        }"#;
        let tf: StampedTransform = serde_json::from_str(json).unwrap();
        assert_eq!(tf.source_frame, "lidar");
        assert!(tf.stamp.is_zero());
        assert!((tf.transform.translation.x - 0.1).abs() < 1e-12);
    }
}
