use std::fmt;

use crate::{
    config::PipelineConfig,
    crop::crop_pointcloud,
    error::FilterError,
    outlier::remove_radius_outliers,
    pointcloud::PointCloud,
    voxel_grid::VoxelGrid,
    AxisAlignedBoundingBox,
};

/// The stages of the filtering pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Axis-aligned region cropping.
    Crop,
    /// Voxel grid downsampling.
    VoxelDownsample,
    /// Radius outlier removal.
    RadiusOutlierRemoval,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Crop => "crop",
            Stage::VoxelDownsample => "voxel downsample",
            Stage::RadiusOutlierRemoval => "radius outlier removal",
        };
        f.write_str(name)
    }
}

/// The point counts around one executed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    /// The stage that ran.
    pub stage: Stage,
    /// The number of points the stage received.
    pub input_points: usize,
    /// The number of points the stage produced.
    pub output_points: usize,
}

/// Non-fatal conditions met while running the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineWarning {
    /// A stage received no points and produced no points.
    EmptyInput {
        /// The stage that received the empty point cloud.
        stage: Stage,
    },
}

/// A point cloud filtering pipeline.
///
/// Holds the current point cloud and replaces it with the output of every stage that
/// succeeds. A failing stage leaves the current point cloud as it was.
///
/// # Example
///
/// ```
/// use kornia_pcl::{Pipeline, PointCloud};
///
/// let cloud = PointCloud::from_points(vec![
///     [0.0, 0.0, 0.0],
///     [0.01, 0.0, 0.0],
///     [0.01, 0.01, 0.0],
///     [100.0, 100.0, 100.0],
///     [100.01, 100.0, 100.0],
/// ]);
///
/// let mut pipeline = Pipeline::new(cloud);
/// pipeline.crop([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]).unwrap();
/// assert_eq!(pipeline.num_points(), 3);
/// pipeline.voxel_downsample(0.05).unwrap();
/// pipeline.remove_radius_outliers(0, 0.1).unwrap();
/// assert_eq!(pipeline.num_points(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pointcloud: PointCloud,
    reports: Vec<StageReport>,
    warnings: Vec<PipelineWarning>,
}

impl Pipeline {
    /// Create a pipeline starting from `pointcloud`.
    pub fn new(pointcloud: PointCloud) -> Self {
        Self {
            pointcloud,
            reports: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// The number of points in the current point cloud.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.pointcloud.len()
    }

    /// The current point cloud.
    pub fn pointcloud(&self) -> &PointCloud {
        &self.pointcloud
    }

    /// Consume the pipeline and return the current point cloud.
    pub fn into_pointcloud(self) -> PointCloud {
        self.pointcloud
    }

    /// The reports of the stages executed so far, in execution order.
    pub fn reports(&self) -> &[StageReport] {
        &self.reports
    }

    /// The warnings raised so far.
    pub fn warnings(&self) -> &[PipelineWarning] {
        &self.warnings
    }

    /// Crop the current point cloud to `[min, max]`, bounds included.
    pub fn crop(&mut self, min: [f64; 3], max: [f64; 3]) -> Result<&mut Self, FilterError> {
        let bbox = AxisAlignedBoundingBox::new(min, max)?;
        self.crop_to(&bbox);
        Ok(self)
    }

    /// Crop the current point cloud to a bounding box.
    pub fn crop_to(&mut self, bbox: &AxisAlignedBoundingBox) -> &mut Self {
        self.apply(Stage::Crop, |src| crop_pointcloud(src, bbox));
        self
    }

    /// Replace each occupied voxel of edge `voxel_size` by the centroid of its points.
    pub fn voxel_downsample(&mut self, voxel_size: f64) -> Result<&mut Self, FilterError> {
        let downsampled = VoxelGrid::new(voxel_size)?.downsample(&self.pointcloud)?;
        self.apply(Stage::VoxelDownsample, move |_| downsampled);
        Ok(self)
    }

    /// Drop the points with fewer than `min_neighbors` other points within `radius`.
    pub fn remove_radius_outliers(
        &mut self,
        min_neighbors: usize,
        radius: f64,
    ) -> Result<&mut Self, FilterError> {
        let filtered = remove_radius_outliers(&self.pointcloud, min_neighbors, radius)?;
        self.apply(Stage::RadiusOutlierRemoval, move |_| filtered);
        Ok(self)
    }

    /// Run crop, voxel downsampling and radius outlier removal, in this order.
    ///
    /// The whole configuration is validated before the first stage runs, so an invalid
    /// parameter leaves the current point cloud untouched.
    pub fn run(&mut self, config: &PipelineConfig) -> Result<&mut Self, FilterError> {
        config.validate()?;
        self.crop(config.crop.min, config.crop.max)?
            .voxel_downsample(config.voxel.voxel_size)?
            .remove_radius_outliers(config.outlier.min_neighbors, config.outlier.radius)
    }

    fn apply(&mut self, stage: Stage, f: impl FnOnce(&PointCloud) -> PointCloud) {
        let input_points = self.pointcloud.len();
        if input_points == 0 {
            self.warnings.push(PipelineWarning::EmptyInput { stage });
        }

        self.pointcloud = f(&self.pointcloud);

        let report = StageReport {
            stage,
            input_points,
            output_points: self.pointcloud.len(),
        };
        log::info!(
            "{}: {} -> {} points",
            report.stage,
            report.input_points,
            report.output_points
        );
        self.reports.push(report);
    }
}
