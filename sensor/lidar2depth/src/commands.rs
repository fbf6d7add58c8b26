//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use depth_projection::{FramePipeline, VisibilityParams, VisiblePoint, find_visible};
use depth_types::{FrameId, Header, Timestamp, save_png};
use tracing::{info, warn};

use crate::calibration::{load_calibration, load_config};
use crate::cloud_io::{load_cloud, load_positions};

/// Inputs of the `project` subcommand.
#[derive(Debug, Clone)]
pub struct ProjectArgs {
    /// Point cloud file.
    pub cloud: PathBuf,
    /// Calibration JSON.
    pub calib: PathBuf,
    /// Output PNG.
    pub output: PathBuf,
    /// Optional pipeline configuration JSON.
    pub config: Option<PathBuf>,
    /// Capture time of the cloud, seconds.
    pub stamp: Option<f64>,
    /// Frame the cloud is expressed in; defaults to the calibration's source frame.
    pub frame: Option<String>,
}

/// Inputs of the `in-view` subcommand.
#[derive(Debug, Clone)]
pub struct InViewArgs {
    /// Object positions file.
    pub objects: PathBuf,
    /// Calibration JSON (world-to-camera transform).
    pub calib: PathBuf,
    /// Maximum object range, meters.
    pub max_range: f64,
    /// Image margin, pixels.
    pub border: u32,
    /// Capture time to report; defaults to the camera stamp.
    pub stamp: Option<f64>,
    /// Output file; stdout when absent.
    pub output: Option<PathBuf>,
}

/// Renders one cloud to a KITTI depth PNG.
///
/// # Errors
///
/// Returns an error if an input cannot be loaded, the frame is rejected by
/// the pipeline, or the PNG cannot be written.
pub fn project(args: &ProjectArgs) -> Result<()> {
    let calib = load_calibration(&args.calib)?;
    let config = load_config(args.config.as_deref())?;
    let pipeline = FramePipeline::new(config)?;

    let frame_id = args
        .frame
        .as_deref()
        .map_or_else(|| calib.transform.source_frame.clone(), FrameId::new);
    let stamp = args.stamp.map_or(calib.camera.header.stamp, Timestamp::from_secs_f64);
    let cloud = load_cloud(&args.cloud, Header::new(stamp, frame_id))?;

    let frame = pipeline
        .process(&cloud, &calib.camera, &calib.transform)
        .with_context(|| format!("Failed to project {}", args.cloud.display()))?;

    save_png(&frame.image, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let stats = frame.stats;
    info!(
        input = stats.input,
        gated = stats.gated,
        projected = stats.projected,
        written = stats.written,
        occluded = stats.occluded,
        output = %args.output.display(),
        "Wrote depth image"
    );
    if let Some(depth) = frame.image.depth_stats() {
        info!(
            min_m = depth.min,
            max_m = depth.max,
            mean_m = depth.mean,
            coverage = frame.image.valid_fraction(),
            "Depth summary"
        );
    } else {
        warn!("No point landed in the image");
    }

    Ok(())
}

/// Lists the objects the camera sees, one `stamp u v` line each.
///
/// # Errors
///
/// Returns an error if an input cannot be loaded or the output cannot be written.
pub fn in_view(args: &InViewArgs) -> Result<()> {
    let calib = load_calibration(&args.calib)?;
    let objects = load_positions(&args.objects)?;
    let params = VisibilityParams::default()
        .with_max_range(args.max_range)
        .with_border(args.border);

    let hits = find_visible(
        &objects,
        &calib.camera.intrinsics,
        &calib.transform.transform,
        &params,
    )?;
    let stamp = args.stamp.map_or(calib.camera.header.stamp, Timestamp::from_secs_f64);
    let report = format_hits(stamp, hits.iter().map(VisiblePoint::pixel_index));

    info!(objects = objects.len(), visible = hits.len(), "Checked field of view");

    match &args.output {
        Some(path) => write_report(path, &report)?,
        None => print!("{report}"),
    }
    Ok(())
}

fn format_hits(stamp: Timestamp, pixels: impl Iterator<Item = (u32, u32)>) -> String {
    let secs = stamp.as_secs_f64();
    pixels
        .map(|(u, v)| format!("{secs:.6} {u} {v}\n"))
        .collect()
}

fn write_report(path: &Path, report: &str) -> Result<()> {
    std::fs::write(path, report).with_context(|| format!("Failed to write {}", path.display()))
}
