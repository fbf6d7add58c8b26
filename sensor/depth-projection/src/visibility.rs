//! Field-of-view test for known object positions.
//!
//! Given object points in a world frame and the world-to-camera transform at
//! one instant, reports which objects the camera sees and where.

use depth_types::CameraIntrinsics;
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transform::Transform3D;

/// Limits applied by [`find_visible`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityParams {
    /// Objects at or beyond this distance from the camera centre are ignored (meters).
    pub max_range: f64,
    /// Width of the image margin, in pixels, treated as outside the view.
    pub border: u32,
}

impl Default for VisibilityParams {
    fn default() -> Self {
        Self {
            max_range: 10.0,
            border: 1,
        }
    }
}

impl VisibilityParams {
    /// Set the maximum range.
    #[must_use]
    pub const fn with_max_range(mut self, max_range: f64) -> Self {
        self.max_range = max_range;
        self
    }

    /// Set the image margin.
    #[must_use]
    pub const fn with_border(mut self, border: u32) -> Self {
        self.border = border;
        self
    }
}

/// An object that falls inside the camera view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisiblePoint {
    /// Position of the object in the input slice.
    pub index: usize,
    /// Continuous pixel coordinates `[u, v]`.
    pub pixel: [f64; 2],
    /// Euclidean distance from the camera centre (meters).
    pub range: f64,
}

impl VisiblePoint {
    /// Integer pixel containing the object (coordinates truncated).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pixel_index(&self) -> (u32, u32) {
        // Both coordinates are >= border >= 0 here.
        (self.pixel[0] as u32, self.pixel[1] as u32)
    }
}

/// Returns the objects visible to the camera, in input order.
///
/// An object is visible when, after `world_to_camera`, it is in front of the
/// camera (`z > 0`), projects to `border <= u < width - border` and
/// `border <= v < height - border`, and its range is below
/// `params.max_range`.
///
/// # Errors
///
/// Returns [`crate::ProjectionError::InvalidIntrinsics`] if the intrinsics
/// are invalid.
///
/// # Example
///
/// ```
/// use depth_projection::{find_visible, Transform3D, VisibilityParams};
/// use depth_types::CameraIntrinsics;
/// use glam::DVec3;
///
/// let camera = CameraIntrinsics::ideal(500.0, 640, 480);
/// let objects = [DVec3::new(0.0, 0.0, 5.0), DVec3::new(0.0, 0.0, 15.0)];
///
/// let hits = find_visible(&objects, &camera, &Transform3D::identity(), &VisibilityParams::default())
///     .unwrap();
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].pixel_index(), (320, 240));
/// ```
pub fn find_visible(
    objects: &[DVec3],
    camera: &CameraIntrinsics,
    world_to_camera: &Transform3D,
    params: &VisibilityParams,
) -> Result<Vec<VisiblePoint>> {
    camera.validate()?;

    let border = f64::from(params.border);
    let u_max = f64::from(camera.width) - border;
    let v_max = f64::from(camera.height) - border;

    let hits = objects
        .iter()
        .enumerate()
        .filter_map(|(index, object)| {
            let p = world_to_camera.apply_point(*object);
            let [u, v] = camera.project(p.to_array())?;
            let inside = u >= border && u < u_max && v >= border && v < v_max;
            let range = p.length();
            (inside && range < params.max_range).then_some(VisiblePoint {
                index,
                pixel: [u, v],
                range,
            })
        })
        .collect();

    Ok(hits)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn camera() -> CameraIntrinsics {
        CameraIntrinsics::ideal(500.0, 640, 480)
    }

    #[test]
    fn visible_filters_range_and_direction() {
        let objects = [
            DVec3::new(0.0, 0.0, 5.0),   // visible
            DVec3::new(0.0, 0.0, -5.0),  // behind
            DVec3::new(0.0, 0.0, 10.0),  // at max range
            DVec3::new(1.0, 0.5, 4.0),   // visible, off centre
            DVec3::new(20.0, 0.0, 1.0),  // outside image
        ];
        let hits =
            find_visible(&objects, &camera(), &Transform3D::identity(), &VisibilityParams::default())
                .unwrap();
        let indices: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(indices, vec![0, 3]);
        assert_eq!(hits[0].range, 5.0);
        assert_eq!(hits[1].pixel, [445.0, 302.5]);
        assert_eq!(hits[1].pixel_index(), (445, 302));
    }

    #[test]
    fn visible_respects_border() {
        // u = 500 * x + 320: 0.1 and 2.0
        let objects = [DVec3::new(-0.6398, 0.0, 1.0), DVec3::new(-0.636, 0.0, 1.0)];
        let identity = Transform3D::identity();

        let hits = find_visible(&objects, &camera(), &identity, &VisibilityParams::default())
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].index, 1);

        let no_border = VisibilityParams::default().with_border(0);
        let hits = find_visible(&objects, &camera(), &identity, &no_border).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn visible_applies_transform() {
        let world_to_camera = Transform3D::from_translation(DVec3::new(0.0, 0.0, -20.0));
        let objects = [DVec3::new(0.0, 0.0, 25.0)];
        let hits = find_visible(
            &objects,
            &camera(),
            &world_to_camera,
            &VisibilityParams::default(),
        )
        .unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].range - 5.0).abs() < 1e-12);
    }

    #[test]
    fn visible_custom_range() {
        let objects = [DVec3::new(0.0, 0.0, 30.0)];
        let params = VisibilityParams::default().with_max_range(50.0);
        let hits = find_visible(&objects, &camera(), &Transform3D::identity(), &params).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn visible_rejects_invalid_camera() {
        let bad = CameraIntrinsics::new(500.0, -1.0, 320.0, 240.0, 640, 480);
        assert!(find_visible(&[], &bad, &Transform3D::identity(), &VisibilityParams::default())
            .is_err());
    }
}
