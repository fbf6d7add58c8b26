//! Lidar-to-camera depth projection.
//!
//! This crate turns a lidar point cloud into a KITTI-style 16-bit depth image
//! aligned with a pinhole camera:
//!
//! # Pipeline Stages
//!
//! - [`Transform3D`] / [`StampedTransform`] - Rigid transform from the lidar frame into the camera frame
//! - [`RangeGate`] - Axis-aligned camera-frame box; always drops points with `z <= 0`
//! - [`PinholeProjector`] - Maps a camera-frame point to an integer pixel and a depth
//! - [`DepthAccumulator`] - Rasterizes candidates, nearest point wins
//! - [`FramePipeline`] - Runs the stages for one frame and returns a [`DepthFrame`]
//!
//! # Boundaries
//!
//! - [`TransformProvider`] - Where transforms come from ([`StaticTransforms`] for fixed rigs)
//! - [`find_visible`] - Which known object positions the camera currently sees
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **no middleware dependencies**. Message
//! transport, stream synchronization and transform-tree upkeep stay with
//! the caller.
//!
//! # Example
//!
//! ```
//! use depth_projection::{FramePipeline, PipelineConfig, StaticTransforms, Transform3D};
//! use depth_types::{CameraInfo, CameraIntrinsics, Header, PointCloudFrame, Timestamp};
//! use glam::DVec3;
//!
//! let mut transforms = StaticTransforms::new();
//! transforms.insert("velodyne", "camera", Transform3D::from_translation(DVec3::new(0.0, 0.0, -0.3)));
//!
//! let camera = CameraInfo::new(
//!     Header::new(Timestamp::zero(), "camera"),
//!     CameraIntrinsics::ideal(500.0, 640, 480),
//! );
//! let cloud = PointCloudFrame::from_positions(
//!     Header::new(Timestamp::from_secs_f64(1.5), "velodyne"),
//!     vec![[0.0, 0.0, 2.3], [0.0, 0.0, -4.0]],
//! );
//!
//! let pipeline = FramePipeline::new(PipelineConfig::kitti()).unwrap();
//! let frame = pipeline.process_with_provider(&cloud, &camera, &transforms).unwrap();
//!
//! assert_eq!(frame.image.depth_at(320, 240), Some(2.0));
//! assert_eq!(frame.stats.gated, 1);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod accumulator;
mod config;
mod error;
mod gate;
mod pipeline;
mod projector;
mod provider;
mod transform;
mod visibility;

// Re-export transform types
pub use transform::{
    ROTATION_TOLERANCE, StampedTransform, Transform3D, point_to_dvec3, transform_points,
};

// Re-export projection stages
pub use accumulator::{DepthAccumulator, PARALLEL_MIN_CHUNK, accumulate, accumulate_parallel};
pub use gate::{AxisRange, RangeGate};
pub use projector::{DepthMode, PinholeProjector, ProjectedPoint};

// Re-export pipeline types
pub use config::{DEFAULT_PARALLEL_THRESHOLD, PipelineConfig};
pub use pipeline::{DepthFrame, FramePipeline, ProjectionStats};
pub use provider::{StaticTransforms, TransformProvider};
pub use visibility::{VisibilityParams, VisiblePoint, find_visible};

// Re-export error types
pub use error::{ProjectionError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        AxisRange, DepthAccumulator, DepthFrame, DepthMode, FramePipeline, PinholeProjector,
        PipelineConfig, ProjectedPoint, ProjectionError, ProjectionStats, RangeGate,
        StampedTransform, StaticTransforms, Transform3D, TransformProvider, find_visible,
    };
}
