//! Per-frame orchestration: transform, gate, project, rasterize.

use depth_types::{CameraInfo, DepthImage, Header, LidarPoint, PointCloudFrame};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::accumulator::{DepthAccumulator, PARALLEL_MIN_CHUNK};
use crate::config::PipelineConfig;
use crate::error::{ProjectionError, Result};
use crate::gate::RangeGate;
use crate::projector::PinholeProjector;
use crate::provider::TransformProvider;
use crate::transform::{ROTATION_TOLERANCE, StampedTransform, Transform3D, point_to_dvec3};

/// Counts collected while processing one frame.
///
/// Each stage only sees what the previous one kept, so the counts are
/// non-increasing from `input` to `in_bounds`, and
/// `in_bounds == written + occluded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectionStats {
    /// Points in the input cloud.
    pub input: usize,
    /// Points that passed the range gate.
    pub gated: usize,
    /// Points the projector accepted.
    pub projected: usize,
    /// Projected points that fell inside the image.
    pub in_bounds: usize,
    /// Pixels holding a depth in the output.
    pub written: usize,
    /// In-bounds points hidden behind a nearer point on the same pixel.
    pub occluded: usize,
}

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    /// Header of the input cloud, passed through unchanged.
    pub header: Header,
    /// The rasterized depth image, sized from the camera intrinsics.
    pub image: DepthImage,
    /// Stage counts for this frame.
    pub stats: ProjectionStats,
}

/// Per-job state of the fused transform/gate/project/rasterize loop.
#[derive(Debug, Clone)]
struct FrameAccumulator {
    raster: DepthAccumulator,
    gated: usize,
    projected: usize,
}

/// Read-only inputs shared by every job.
#[derive(Debug, Clone, Copy)]
struct Stages<'a> {
    transform: &'a Transform3D,
    gate: &'a RangeGate,
    projector: &'a PinholeProjector,
}

impl FrameAccumulator {
    fn new(width: u32, height: u32) -> Self {
        Self {
            raster: DepthAccumulator::new(width, height),
            gated: 0,
            projected: 0,
        }
    }

    fn offer(&mut self, stages: Stages<'_>, point: &LidarPoint) {
        let camera_point = stages.transform.apply_point(point_to_dvec3(point));
        if !stages.gate.contains(camera_point) {
            return;
        }
        self.gated += 1;
        if let Some(candidate) = stages.projector.project(camera_point) {
            self.projected += 1;
            self.raster.insert(candidate);
        }
    }

    fn merge(mut self, other: &Self) -> Self {
        self.raster.merge(&other.raster);
        self.gated += other.gated;
        self.projected += other.projected;
        self
    }
}

/// Converts one lidar frame into a depth image for one camera.
///
/// The pipeline is stateless between calls: every input arrives as an
/// argument and the output is owned by the caller. It can be shared across
/// threads and invoked for several frames at once.
///
/// # Errors
///
/// A frame is rejected as a whole, with no partial image, when
/// - the transform's source frame differs from the cloud's frame, or its
///   target frame differs from a non-empty camera frame
///   ([`ProjectionError::FrameMismatch`]),
/// - the intrinsics are invalid ([`ProjectionError::InvalidIntrinsics`]),
/// - the rotation is not a unit quaternion ([`ProjectionError::InvalidTransform`]),
/// - a provider cannot supply the transform
///   ([`ProjectionError::TransformUnavailable`]).
///
/// Points behind the camera or outside the image are dropped silently.
///
/// # Example
///
/// ```
/// use depth_projection::{FramePipeline, PipelineConfig, StampedTransform, Transform3D};
/// use depth_types::{CameraInfo, CameraIntrinsics, Header, PointCloudFrame, Timestamp};
///
/// let pipeline = FramePipeline::new(PipelineConfig::default()).unwrap();
/// let camera = CameraInfo::new(
///     Header::new(Timestamp::zero(), "camera"),
///     CameraIntrinsics::ideal(500.0, 640, 480),
/// );
/// let cloud = PointCloudFrame::from_positions(
///     Header::new(Timestamp::zero(), "lidar"),
///     vec![[0.0, 0.0, 2.0]],
/// );
/// let tf = StampedTransform::new("lidar", "camera", Timestamp::zero(), Transform3D::identity());
///
/// let frame = pipeline.process(&cloud, &camera, &tf).unwrap();
/// assert_eq!(frame.image.get(320, 240), Some(512));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FramePipeline {
    config: PipelineConfig,
}

impl FramePipeline {
    /// Creates a pipeline with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Projects one cloud with an explicitly supplied transform.
    ///
    /// # Errors
    ///
    /// See the type-level documentation.
    pub fn process(
        &self,
        cloud: &PointCloudFrame,
        camera: &CameraInfo,
        transform: &StampedTransform,
    ) -> Result<DepthFrame> {
        self.run(cloud, camera, transform).inspect_err(|err| {
            warn!(
                seq = cloud.header.seq,
                stamp = %cloud.stamp(),
                error = %err,
                "Dropping frame"
            );
        })
    }

    /// Projects one cloud, asking `provider` for the cloud-to-camera transform.
    ///
    /// The lookup is made at the cloud's stamp. Any lookup failure is
    /// reported as [`ProjectionError::TransformUnavailable`].
    ///
    /// # Errors
    ///
    /// See the type-level documentation.
    pub fn process_with_provider<P>(
        &self,
        cloud: &PointCloudFrame,
        camera: &CameraInfo,
        provider: &P,
    ) -> Result<DepthFrame>
    where
        P: TransformProvider + ?Sized,
    {
        let source = cloud.frame_id();
        let target = camera.frame_id();
        let transform = provider
            .lookup(target, source, cloud.stamp())
            .map_err(|err| match err {
                unavailable @ ProjectionError::TransformUnavailable { .. } => unavailable,
                other => ProjectionError::transform_unavailable(
                    source.clone(),
                    target.clone(),
                    cloud.stamp(),
                    other.to_string(),
                ),
            });

        match transform {
            Ok(transform) => self.process(cloud, camera, &transform),
            Err(err) => {
                warn!(
                    seq = cloud.header.seq,
                    stamp = %cloud.stamp(),
                    error = %err,
                    "Dropping frame"
                );
                Err(err)
            }
        }
    }

    fn check_inputs(
        cloud: &PointCloudFrame,
        camera: &CameraInfo,
        transform: &StampedTransform,
    ) -> Result<()> {
        if transform.source_frame != *cloud.frame_id() {
            return Err(ProjectionError::frame_mismatch(
                cloud.frame_id().clone(),
                transform.source_frame.clone(),
            ));
        }
        if !camera.frame_id().is_empty() && transform.target_frame != *camera.frame_id() {
            return Err(ProjectionError::frame_mismatch(
                camera.frame_id().clone(),
                transform.target_frame.clone(),
            ));
        }
        camera.intrinsics.validate()?;
        if !transform.transform.is_rigid(ROTATION_TOLERANCE) {
            return Err(ProjectionError::invalid_transform(
                "rotation is not a finite unit quaternion",
            ));
        }
        Ok(())
    }

    fn run(
        &self,
        cloud: &PointCloudFrame,
        camera: &CameraInfo,
        transform: &StampedTransform,
    ) -> Result<DepthFrame> {
        Self::check_inputs(cloud, camera, transform)?;

        let projector = PinholeProjector::new(camera.intrinsics)?.with_mode(self.config.depth_mode);
        let stages = Stages {
            transform: &transform.transform,
            gate: &self.config.gate,
            projector: &projector,
        };
        let (width, height) = (camera.intrinsics.width, camera.intrinsics.height);

        let parallel = self.config.use_parallel(cloud.len());
        let result = if parallel {
            cloud
                .points
                .par_iter()
                .with_min_len(PARALLEL_MIN_CHUNK)
                .fold(
                    || FrameAccumulator::new(width, height),
                    |mut acc, point| {
                        acc.offer(stages, point);
                        acc
                    },
                )
                .reduce(
                    || FrameAccumulator::new(width, height),
                    |left, right| left.merge(&right),
                )
        } else {
            let mut acc = FrameAccumulator::new(width, height);
            for point in &cloud.points {
                acc.offer(stages, point);
            }
            acc
        };

        let in_bounds = result.raster.in_bounds();
        let written = result.raster.written();
        let stats = ProjectionStats {
            input: cloud.len(),
            gated: result.gated,
            projected: result.projected,
            in_bounds,
            written,
            occluded: in_bounds - written,
        };

        debug!(
            seq = cloud.header.seq,
            input = stats.input,
            gated = stats.gated,
            projected = stats.projected,
            in_bounds = stats.in_bounds,
            written = stats.written,
            parallel,
            "Projected frame"
        );

        Ok(DepthFrame {
            header: cloud.header.clone(),
            image: result.raster.finish(),
            stats,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::gate::AxisRange;
    use crate::projector::DepthMode;
    use crate::provider::StaticTransforms;
    use depth_types::{CameraIntrinsics, Timestamp};
    use glam::{DQuat, DVec3};

    fn camera() -> CameraInfo {
        CameraInfo::new(
            Header::new(Timestamp::zero(), "camera"),
            CameraIntrinsics::ideal(500.0, 640, 480),
        )
    }

    fn cloud(points: Vec<[f32; 3]>) -> PointCloudFrame {
        PointCloudFrame::from_positions(
            Header::new(Timestamp::from_secs_nanos(12, 500), "lidar").with_seq(3),
            points,
        )
    }

    fn identity() -> StampedTransform {
        StampedTransform::new("lidar", "camera", Timestamp::zero(), Transform3D::identity())
    }

    #[test]
    fn pipeline_single_point() {
        let frame = FramePipeline::default()
            .process(&cloud(vec![[0.0, 0.0, 2.0]]), &camera(), &identity())
            .unwrap();
        assert_eq!(frame.image.width(), 640);
        assert_eq!(frame.image.height(), 480);
        assert_eq!(frame.image.get(320, 240), Some(512));
        assert_eq!(frame.image.valid_pixel_count(), 1);
    }

    #[test]
    fn pipeline_passes_header_through() {
        let input = cloud(vec![[0.0, 0.0, 2.0]]);
        let frame = FramePipeline::default()
            .process(&input, &camera(), &identity())
            .unwrap();
        assert_eq!(frame.header, input.header);
    }

    #[test]
    fn pipeline_applies_transform() {
        // Lidar x-forward to camera z-forward: camera = (-y, -z, x).
        let rotation = DQuat::from_mat3(&glam::DMat3::from_cols(
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(-1.0, 0.0, 0.0),
            DVec3::new(0.0, -1.0, 0.0),
        ));
        let tf = StampedTransform::new(
            "lidar",
            "camera",
            Timestamp::zero(),
            Transform3D::new(rotation, DVec3::ZERO),
        );
        let frame = FramePipeline::default()
            .process(&cloud(vec![[3.0, 0.0, 0.0]]), &camera(), &tf)
            .unwrap();
        assert_eq!(frame.image.depth_at(320, 240), Some(3.0));
    }

    #[test]
    fn pipeline_stats() {
        let points = vec![
            [0.0, 0.0, 2.0],  // written
            [0.0, 0.0, 3.0],  // occluded by the first
            [0.0, 0.0, -1.0], // behind camera
            [0.0, 0.0, 9.0],  // beyond default z range
            [5.0, 0.0, 0.5],  // gated, projects off image
        ];
        let frame = FramePipeline::default()
            .process(&cloud(points), &camera(), &identity())
            .unwrap();
        assert_eq!(
            frame.stats,
            ProjectionStats {
                input: 5,
                gated: 3,
                projected: 3,
                in_bounds: 2,
                written: 1,
                occluded: 1,
            }
        );
    }

    #[test]
    fn pipeline_range_mode() {
        let pipeline =
            FramePipeline::new(PipelineConfig::unbounded().with_depth_mode(DepthMode::Range))
                .unwrap();
        // u = 500 * 1.5 / 8 + 320 = 413.75
        let frame = pipeline
            .process(&cloud(vec![[1.5, 0.0, 8.0]]), &camera(), &identity())
            .unwrap();
        let expected = (1.5_f64 * 1.5 + 64.0).sqrt();
        let stored = frame.image.depth_at(414, 240).unwrap();
        assert!((stored - expected).abs() <= 1.0 / 512.0);
    }

    #[test]
    fn pipeline_frame_mismatch() {
        let mut input = cloud(vec![[0.0, 0.0, 2.0]]);
        input.header.frame_id = "base_link".into();
        let err = FramePipeline::default()
            .process(&input, &camera(), &identity())
            .unwrap_err();
        match err {
            ProjectionError::FrameMismatch { expected, actual } => {
                assert_eq!(expected, "base_link");
                assert_eq!(actual, "lidar");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pipeline_camera_frame_mismatch() {
        let tf = StampedTransform::new(
            "lidar",
            "camera_left",
            Timestamp::zero(),
            Transform3D::identity(),
        );
        let err = FramePipeline::default()
            .process(&cloud(vec![]), &camera(), &tf)
            .unwrap_err();
        assert!(matches!(err, ProjectionError::FrameMismatch { .. }));
    }

    #[test]
    fn pipeline_unnamed_camera_frame_accepted() {
        let mut cam = camera();
        cam.header.frame_id = "".into();
        assert!(FramePipeline::default()
            .process(&cloud(vec![]), &cam, &identity())
            .is_ok());
    }

    #[test]
    fn pipeline_invalid_intrinsics() {
        let mut cam = camera();
        cam.intrinsics.height = 0;
        let err = FramePipeline::default()
            .process(&cloud(vec![[0.0, 0.0, 1.0]]), &cam, &identity())
            .unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidIntrinsics(_)));
    }

    #[test]
    fn pipeline_rejects_non_unit_rotation() {
        let tf = StampedTransform::new(
            "lidar",
            "camera",
            Timestamp::zero(),
            Transform3D::from_rotation(DQuat::from_xyzw(0.0, 0.0, 0.0, 3.0)),
        );
        let err = FramePipeline::default()
            .process(&cloud(vec![]), &camera(), &tf)
            .unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidTransform(_)));
    }

    #[test]
    fn pipeline_rejects_invalid_config() {
        let config = PipelineConfig::default().with_x_range(AxisRange::new(1.0, -1.0));
        assert!(FramePipeline::new(config).is_err());
    }

    #[test]
    fn pipeline_with_provider() {
        let mut transforms = StaticTransforms::new();
        transforms.insert("lidar", "camera", Transform3D::from_translation(DVec3::Z));

        let frame = FramePipeline::default()
            .process_with_provider(&cloud(vec![[0.0, 0.0, 1.0]]), &camera(), &transforms)
            .unwrap();
        assert_eq!(frame.image.get(320, 240), Some(512));
    }

    #[test]
    fn pipeline_provider_failure() {
        let err = FramePipeline::default()
            .process_with_provider(&cloud(vec![[0.0, 0.0, 1.0]]), &camera(), &StaticTransforms::new())
            .unwrap_err();
        match err {
            ProjectionError::TransformUnavailable {
                source_frame,
                target_frame,
                stamp,
                ..
            } => {
                assert_eq!(source_frame, "lidar");
                assert_eq!(target_frame, "camera");
                assert_eq!(stamp, Timestamp::from_secs_nanos(12, 500));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pipeline_provider_other_errors_become_unavailable() {
        struct Broken;
        impl TransformProvider for Broken {
            fn lookup(
                &self,
                _target: &depth_types::FrameId,
                _source: &depth_types::FrameId,
                _stamp: Timestamp,
            ) -> Result<StampedTransform> {
                Err(ProjectionError::invalid_transform("corrupt calibration"))
            }
        }

        let err = FramePipeline::default()
            .process_with_provider(&cloud(vec![]), &camera(), &Broken)
            .unwrap_err();
        assert!(matches!(err, ProjectionError::TransformUnavailable { .. }));
        assert!(err.to_string().contains("corrupt calibration"));
    }

    #[test]
    fn pipeline_parallel_matches_sequential() {
        let points: Vec<[f32; 3]> = (0..20_000_u16)
            .map(|i| {
                let f = f32::from(i);
                [(f * 0.37).sin() * 4.0, (f * 0.11).cos() * 3.0, 0.5 + (f * 0.013) % 5.0]
            })
            .collect();
        let input = cloud(points);

        let sequential = FramePipeline::new(PipelineConfig::default().with_parallel(false))
            .unwrap()
            .process(&input, &camera(), &identity())
            .unwrap();
        let parallel = FramePipeline::new(PipelineConfig::default().with_parallel_threshold(1))
            .unwrap()
            .process(&input, &camera(), &identity())
            .unwrap();

        assert_eq!(sequential, parallel);
        assert!(sequential.stats.written > 0);
    }
}
