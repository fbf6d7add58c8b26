//! Sensor data types for projecting lidar point clouds into camera depth maps.
//!
//! This crate provides the data model shared by the projection pipeline and
//! whatever transport layer feeds it:
//! - Point clouds captured by a lidar ([`PointCloudFrame`], [`LidarPoint`])
//! - Pinhole camera calibration ([`CameraIntrinsics`], [`CameraInfo`])
//! - KITTI-style 16-bit depth images ([`DepthImage`])
//! - Message metadata passed through unchanged ([`Header`], [`FrameId`], [`Timestamp`])
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **no middleware dependencies**. It can be used in:
//! - ROS / zenoh bridge nodes
//! - Offline dataset conversion tools
//! - Tests that need synthetic sensor data
//!
//! # Depth Encoding
//!
//! Depth images use the KITTI depth benchmark convention:
//!
//! ```text
//! pixel = round(depth_m * 256)      (saturated to u16)
//! depth_m = pixel / 256.0           (pixel > 0)
//! pixel == 0                        no measurement
//! ```
//!
//! See [`encode_depth`] and [`decode_depth`].
//!
//! # Coordinate Convention
//!
//! Camera frames follow the optical convention: `z` forward along the optical
//! axis, `x` right, `y` down.
//!
//! # Example
//!
//! ```
//! use depth_types::{decode_depth, encode_depth, CameraIntrinsics};
//!
//! let intrinsics = CameraIntrinsics::ideal(500.0, 640, 480);
//! assert!(intrinsics.validate().is_ok());
//!
//! let encoded = encode_depth(2.0);
//! assert_eq!(encoded, 512);
//! assert!((decode_depth(encoded) - 2.0).abs() < 1e-9);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod camera;
mod cloud;
mod codec;
mod depth;
mod error;
mod frame;
#[cfg(feature = "png")]
mod png;
mod time;

// Re-export core types
pub use camera::{CameraInfo, CameraIntrinsics};
pub use cloud::{LidarPoint, PointCloudFrame};
pub use codec::{
    DEPTH_SCALE, INVALID_DEPTH, MAX_ENCODED_DEPTH, decode_depth, encode_depth, max_depth_m,
};
pub use depth::{DepthImage, DepthStats};
pub use error::{Result, SensorError};
pub use frame::{FrameId, Header};
#[cfg(feature = "png")]
pub use png::{decode_png, encode_png, load_png, save_png};
pub use time::Timestamp;
