//! Boundary to whatever system supplies sensor-to-camera transforms.

use std::collections::HashMap;

use depth_types::{FrameId, Timestamp};

use crate::error::{ProjectionError, Result};
use crate::transform::{StampedTransform, Transform3D};

/// Source of rigid transforms between named frames.
///
/// Implementations wrap a transform tree, a calibration file, or a fixed
/// table. The pipeline only asks for one transform per frame and never
/// retries; a failed lookup aborts that frame.
pub trait TransformProvider {
    /// Looks up the transform mapping points from `source` into `target` at `stamp`.
    ///
    /// # Errors
    ///
    /// Returns an error if no such transform is known. The pipeline reports
    /// any error as [`ProjectionError::TransformUnavailable`].
    fn lookup(&self, target: &FrameId, source: &FrameId, stamp: Timestamp)
    -> Result<StampedTransform>;
}

/// Fixed, time-invariant transforms keyed by frame pair.
///
/// A lookup succeeds for a stored edge, for the inverse of a stored edge, and
/// for identical frames. No chaining through intermediate frames is done.
///
/// # Example
///
/// ```
/// use depth_projection::{StaticTransforms, Transform3D, TransformProvider};
/// use depth_types::{FrameId, Timestamp};
/// use glam::DVec3;
///
/// let mut transforms = StaticTransforms::new();
/// transforms.insert("velodyne", "camera", Transform3D::from_translation(DVec3::Z));
///
/// let tf = transforms
///     .lookup(&FrameId::new("camera"), &FrameId::new("velodyne"), Timestamp::zero())
///     .unwrap();
/// assert_eq!(tf.source_frame, "velodyne");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticTransforms {
    edges: HashMap<(FrameId, FrameId), Transform3D>,
}

impl StaticTransforms {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the transform mapping `source` into `target`, replacing any previous one.
    pub fn insert(
        &mut self,
        source: impl Into<FrameId>,
        target: impl Into<FrameId>,
        transform: Transform3D,
    ) {
        self.edges
            .insert((source.into(), target.into()), transform);
    }

    /// Stores a stamped transform under its own frame pair.
    pub fn insert_stamped(&mut self, transform: StampedTransform) {
        self.edges
            .insert((transform.source_frame, transform.target_frame), transform.transform);
    }

    /// Number of stored edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if no edge is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl FromIterator<StampedTransform> for StaticTransforms {
    fn from_iter<I: IntoIterator<Item = StampedTransform>>(iter: I) -> Self {
        let mut table = Self::new();
        for transform in iter {
            table.insert_stamped(transform);
        }
        table
    }
}

impl TransformProvider for StaticTransforms {
    fn lookup(
        &self,
        target: &FrameId,
        source: &FrameId,
        stamp: Timestamp,
    ) -> Result<StampedTransform> {
        let found = if source == target {
            Some(Transform3D::identity())
        } else if let Some(direct) = self.edges.get(&(source.clone(), target.clone())) {
            Some(*direct)
        } else {
            self.edges
                .get(&(target.clone(), source.clone()))
                .map(Transform3D::inverse)
        };

        found
            .map(|transform| StampedTransform::new(source.clone(), target.clone(), stamp, transform))
            .ok_or_else(|| {
                ProjectionError::transform_unavailable(
                    source.clone(),
                    target.clone(),
                    stamp,
                    "no static transform between these frames",
                )
            })
    }
}
