//! Benchmarks for depth-projection.
//!
//! Run with: cargo bench -p depth-projection
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p depth-projection -- --save-baseline main
//! 2. After changes: cargo bench -p depth-projection -- --baseline main

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::cast_precision_loss)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use depth_projection::{
    FramePipeline, PipelineConfig, ProjectedPoint, StampedTransform, Transform3D, accumulate,
    accumulate_parallel,
};
use depth_types::{CameraInfo, CameraIntrinsics, Header, PointCloudFrame, Timestamp};
use glam::{DMat3, DVec3};

// =============================================================================
// Synthetic Data
// =============================================================================

/// KITTI-sized camera (1242 x 375).
fn kitti_camera() -> CameraInfo {
    CameraInfo::new(
        Header::new(Timestamp::zero(), "camera"),
        CameraIntrinsics::new(721.5, 721.5, 609.6, 172.9, 1242, 375),
    )
}

/// Lidar x-forward, y-left, z-up into the camera optical frame.
fn lidar_to_camera() -> StampedTransform {
    let axes = DMat3::from_cols(
        DVec3::new(0.0, 0.0, 1.0),
        DVec3::new(-1.0, 0.0, 0.0),
        DVec3::new(0.0, -1.0, 0.0),
    );
    StampedTransform::new(
        "lidar",
        "camera",
        Timestamp::zero(),
        Transform3D::from_rotation_matrix(axes, DVec3::new(0.0, -0.08, -0.27)).unwrap(),
    )
}

/// Spinning-lidar-like sweep: 64 rings over the full azimuth.
fn create_sweep(points: usize) -> PointCloudFrame {
    let per_ring = points / 64;
    let mut cloud = PointCloudFrame::new(Header::new(Timestamp::zero(), "lidar"));
    for ring in 0..64 {
        let elevation = (-24.8 + 26.8 * ring as f32 / 63.0).to_radians();
        for step in 0..per_ring {
            let azimuth = std::f32::consts::TAU * step as f32 / per_ring as f32;
            let range = 5.0 + 40.0 * ((step * 7 + ring * 13) % 97) as f32 / 97.0;
            cloud.push([
                range * elevation.cos() * azimuth.cos(),
                range * elevation.cos() * azimuth.sin(),
                range * elevation.sin(),
            ]);
        }
    }
    cloud
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let camera = kitti_camera();
    let tf = lidar_to_camera();

    for &size in &[10_000_usize, 100_000] {
        let cloud = create_sweep(size);
        group.throughput(Throughput::Elements(cloud.len() as u64));

        let sequential = FramePipeline::new(PipelineConfig::kitti().with_parallel(false)).unwrap();
        group.bench_with_input(BenchmarkId::new("sequential", size), &cloud, |b, cloud| {
            b.iter(|| sequential.process(black_box(cloud), &camera, &tf).unwrap());
        });

        let parallel =
            FramePipeline::new(PipelineConfig::kitti().with_parallel_threshold(1)).unwrap();
        group.bench_with_input(BenchmarkId::new("parallel", size), &cloud, |b, cloud| {
            b.iter(|| parallel.process(black_box(cloud), &camera, &tf).unwrap());
        });
    }

    group.finish();
}

fn bench_accumulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulate");
    let candidates: Vec<ProjectedPoint> = (0..100_000_i64)
        .map(|i| ProjectedPoint::new((i * 37) % 1300 - 30, (i * 11) % 400 - 10, 1.0 + (i % 80) as f64))
        .collect();
    group.throughput(Throughput::Elements(candidates.len() as u64));

    group.bench_function("sequential", |b| {
        b.iter(|| accumulate(1242, 375, black_box(candidates.iter().copied())));
    });
    group.bench_function("parallel", |b| {
        b.iter(|| accumulate_parallel(1242, 375, black_box(&candidates)));
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_accumulate);
criterion_main!(benches);
