//! lidar2depth: render lidar point clouds as KITTI depth images.
//!
//! # Commands
//!
//! - `lidar2depth project` - Project a cloud through a calibration into a 16-bit PNG
//! - `lidar2depth in-view` - List which known objects a camera sees, as `stamp u v` lines
//!
//! Message transport and transform-tree upkeep are out of scope; inputs come
//! from files and the extrinsic transform is read from the calibration.
//!
//! Logging goes to stderr. Set `RUST_LOG` (e.g. `RUST_LOG=depth_projection=debug`)
//! or pass `--log-level`.

mod calibration;
mod cloud_io;
mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{InViewArgs, ProjectArgs};

/// Lidar to depth-image projection
#[derive(Parser)]
#[command(name = "lidar2depth")]
#[command(about = "Render lidar point clouds as KITTI-style depth images", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project a point cloud into a depth PNG
    Project {
        /// Point cloud (.ply, or text with one `x y z [intensity]` per line)
        #[arg(long)]
        cloud: PathBuf,

        /// Calibration JSON holding `camera` and `transform`
        #[arg(long)]
        calib: PathBuf,

        /// Output 16-bit PNG
        #[arg(long, short)]
        output: PathBuf,

        /// Pipeline configuration JSON (range gate, depth mode, parallelism)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Capture time of the cloud in seconds (defaults to the camera stamp)
        #[arg(long)]
        stamp: Option<f64>,

        /// Frame of the cloud (defaults to the calibration's source frame)
        #[arg(long)]
        frame: Option<String>,
    },

    /// Report which objects are inside the camera's field of view
    InView {
        /// Object positions, one `label x y z` per line, in the transform's source frame
        #[arg(long)]
        objects: PathBuf,

        /// Calibration JSON holding `camera` and the world-to-camera `transform`
        #[arg(long)]
        calib: PathBuf,

        /// Ignore objects at or beyond this distance (meters)
        #[arg(long, default_value_t = 10.0)]
        max_range: f64,

        /// Image margin treated as out of view (pixels)
        #[arg(long, default_value_t = 1)]
        border: u32,

        /// Time to report in seconds (defaults to the camera stamp)
        #[arg(long)]
        stamp: Option<f64>,

        /// Output file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Project {
            cloud,
            calib,
            output,
            config,
            stamp,
            frame,
        } => commands::project(&ProjectArgs {
            cloud,
            calib,
            output,
            config,
            stamp,
            frame,
        }),
        Commands::InView {
            objects,
            calib,
            max_range,
            border,
            stamp,
            output,
        } => commands::in_view(&InViewArgs {
            objects,
            calib,
            max_range,
            border,
            stamp,
            output,
        }),
    }
}
