//! Calibration and configuration files.

use std::path::Path;

use anyhow::{Context, Result};
use depth_projection::{PipelineConfig, StampedTransform};
use depth_types::CameraInfo;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A camera and its extrinsic transform, as stored on disk.
///
/// For `project` the transform maps the lidar frame into the camera frame;
/// for `in-view` it maps the object (world) frame into the camera frame.
///
/// ```json
/// {
///   "camera": {
///     "header": { "stamp": { "nanos": 0 }, "frame_id": "camera" },
///     "intrinsics": { "fx": 721.5, "fy": 721.5, "cx": 609.6, "cy": 172.9,
///                     "width": 1242, "height": 375 }
///   },
///   "transform": {
///     "source_frame": "velodyne",
///     "target_frame": "camera",
///     "transform": {
///       "rotation": { "x": 0.5, "y": -0.5, "z": 0.5, "w": 0.5 },
///       "translation": { "x": 0.0, "y": -0.08, "z": -0.27 }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Camera intrinsics and optical frame.
    pub camera: CameraInfo,
    /// Extrinsic transform into the camera frame.
    pub transform: StampedTransform,
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {what} {}", path.display()))
}

/// Loads a calibration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid calibration.
pub fn load_calibration(path: &Path) -> Result<Calibration> {
    read_json(path, "calibration")
}

/// Loads a pipeline configuration, or the default one when `path` is `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the
/// configuration fails validation.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => read_json(path, "pipeline config")?,
        None => PipelineConfig::default(),
    };
    config.validate().context("Invalid pipeline config")?;
    Ok(config)
}
