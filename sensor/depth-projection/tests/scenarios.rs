//! End-to-end frame scenarios.
//!
//! Run with: cargo test -p depth-projection --test scenarios

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use approx::assert_relative_eq;
use depth_projection::{
    FramePipeline, PipelineConfig, ProjectionError, StampedTransform, StaticTransforms,
    Transform3D,
};
use depth_types::{CameraInfo, CameraIntrinsics, Header, PointCloudFrame, Timestamp};
use glam::{DMat3, DVec3};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn camera() -> CameraInfo {
    CameraInfo::new(
        Header::new(Timestamp::from_secs_f64(100.25), "camera_optical"),
        CameraIntrinsics::new(
            500.0,
            500.0,
            f64::from(WIDTH / 2),
            f64::from(HEIGHT / 2),
            WIDTH,
            HEIGHT,
        ),
    )
}

fn lidar_cloud(frame: &str, points: Vec<[f32; 3]>) -> PointCloudFrame {
    PointCloudFrame::from_positions(
        Header::new(Timestamp::from_secs_f64(100.2), frame).with_seq(42),
        points,
    )
}

fn identity(source: &str) -> StampedTransform {
    StampedTransform::new(
        source,
        "camera_optical",
        Timestamp::zero(),
        Transform3D::identity(),
    )
}

fn pipeline() -> FramePipeline {
    FramePipeline::new(PipelineConfig::default()).unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn single_point_on_optical_axis() {
    let cloud = lidar_cloud("lidar", vec![[0.0, 0.0, 2.0]]);
    let frame = pipeline()
        .process(&cloud, &camera(), &identity("lidar"))
        .unwrap();

    assert_eq!(frame.image.get(WIDTH / 2, HEIGHT / 2), Some(512));
    assert_eq!(frame.image.valid_pixel_count(), 1);
}

#[test]
fn point_behind_camera_is_dropped() {
    let cloud = lidar_cloud("lidar", vec![[0.0, 0.0, -1.0], [0.2, 0.1, 3.0]]);
    let frame = pipeline()
        .process(&cloud, &camera(), &identity("lidar"))
        .unwrap();

    assert_eq!(frame.image.valid_pixel_count(), 1);
    assert_eq!(frame.stats.input, 2);
    assert_eq!(frame.stats.gated, 1);
    // (0.2, 0.1, 3.0) -> u = 353.33, v = 256.67
    assert_relative_eq!(frame.image.depth_at(353, 257).unwrap(), 3.0);
}

#[test]
fn nearer_point_wins_shared_pixel() {
    // Both points project to (10, 10): u = 500 * x / z + 320 = 10.
    let far = [-310.0_f32 * 3.0 / 500.0, -230.0_f32 * 3.0 / 500.0, 3.0];
    let near = [-310.0_f32 * 1.5 / 500.0, -230.0_f32 * 1.5 / 500.0, 1.5];

    for points in [vec![far, near], vec![near, far]] {
        let cloud = lidar_cloud("lidar", points);
        let frame = FramePipeline::new(PipelineConfig::unbounded())
            .unwrap()
            .process(&cloud, &camera(), &identity("lidar"))
            .unwrap();

        assert_eq!(frame.image.depth_at(10, 10), Some(1.5));
        assert_eq!(frame.stats.occluded, 1);
    }
}

#[test]
fn empty_cloud_gives_empty_image() {
    let cloud = lidar_cloud("lidar", Vec::new());
    let frame = pipeline()
        .process(&cloud, &camera(), &identity("lidar"))
        .unwrap();

    assert_eq!(frame.image.width(), WIDTH);
    assert_eq!(frame.image.height(), HEIGHT);
    assert!(frame.image.data().iter().all(|&v| v == 0));
    assert_eq!(frame.stats.written, 0);
}

#[test]
fn transform_for_wrong_frame_is_rejected() {
    let cloud = lidar_cloud("base_link", vec![[0.0, 0.0, 2.0]]);
    let err = pipeline()
        .process(&cloud, &camera(), &identity("lidar"))
        .unwrap_err();

    assert!(matches!(
        err,
        ProjectionError::FrameMismatch { ref expected, ref actual }
            if expected == "base_link" && actual == "lidar"
    ));
}

// =============================================================================
// Realistic rig
// =============================================================================

/// Velodyne-style frame (x forward, y left, z up) mounted 8 cm right of and
/// 27 cm above the camera.
fn velodyne_to_camera() -> Transform3D {
    let axes = DMat3::from_cols(
        DVec3::new(0.0, 0.0, 1.0),
        DVec3::new(-1.0, 0.0, 0.0),
        DVec3::new(0.0, -1.0, 0.0),
    );
    Transform3D::from_rotation_matrix(axes, DVec3::new(0.08, -0.27, 0.0)).unwrap()
}

#[test]
fn velodyne_rig_with_provider() {
    let mut transforms = StaticTransforms::new();
    transforms.insert("velodyne", "camera_optical", velodyne_to_camera());

    // 5 m ahead on the optical axis, then one point behind the rig.
    let cloud = lidar_cloud("velodyne", vec![[5.0, 0.08, -0.27], [-5.0, 0.0, 0.0]]);
    let frame = FramePipeline::new(PipelineConfig::kitti())
        .unwrap()
        .process_with_provider(&cloud, &camera(), &transforms)
        .unwrap();

    assert_eq!(frame.header.seq, 42);
    assert_eq!(frame.stats.gated, 1);
    assert_eq!(frame.image.valid_pixel_count(), 1);
    assert_relative_eq!(
        frame.image.depth_at(WIDTH / 2, HEIGHT / 2).unwrap(),
        5.0,
        epsilon = 1.0 / 512.0
    );
}

#[test]
fn missing_transform_aborts_frame() {
    let cloud = lidar_cloud("velodyne", vec![[5.0, 0.0, 0.0]]);
    let err = pipeline()
        .process_with_provider(&cloud, &camera(), &StaticTransforms::new())
        .unwrap_err();

    assert!(matches!(err, ProjectionError::TransformUnavailable { .. }));
}

#[test]
fn depth_map_reprojects_to_input() {
    let points: Vec<[f32; 3]> = vec![[0.5, -0.25, 2.0], [-1.0, 0.5, 4.0], [0.0, 0.0, 5.5]];
    let cloud = lidar_cloud("lidar", points.clone());
    let camera = camera();
    let frame = pipeline()
        .process(&cloud, &camera, &identity("lidar"))
        .unwrap();

    let restored = frame.image.to_point_cloud(&camera.intrinsics);
    assert_eq!(restored.len(), points.len());
    for p in &points {
        let nearest = restored
            .iter()
            .map(|r| {
                DVec3::from_array(*r)
                    .distance(DVec3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2])))
            })
            .fold(f64::INFINITY, f64::min);
        // Pixel quantization at 5.5 m is about 1 cm.
        assert!(nearest < 0.02, "no reprojected point near {p:?}: {nearest}");
    }
}
