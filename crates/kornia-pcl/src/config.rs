use serde::{Deserialize, Serialize};

use crate::{
    bbox::AxisAlignedBoundingBox,
    error::{ensure_positive, FilterError},
};

/// Parameters of the crop stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropConfig {
    /// The minimum corner of the region to keep.
    pub min: [f64; 3],
    /// The maximum corner of the region to keep.
    pub max: [f64; 3],
}

impl CropConfig {
    /// Build the bounding box described by this configuration.
    pub fn bounding_box(&self) -> Result<AxisAlignedBoundingBox, FilterError> {
        AxisAlignedBoundingBox::new(self.min, self.max)
    }
}

/// Parameters of the voxel downsampling stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoxelConfig {
    /// The voxel edge length.
    pub voxel_size: f64,
}

/// Parameters of the radius outlier removal stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierConfig {
    /// The minimum number of neighbors a point needs to be kept.
    pub min_neighbors: usize,
    /// The neighbor search radius.
    pub radius: f64,
}

/// Parameters of the whole filtering pipeline.
///
/// The default values crop to `[0, -10, 30]..[10, 10, 40]`, downsample with 1cm voxels and
/// drop points with fewer than 50 neighbors within 5cm.
///
/// # Example
///
/// ```
/// use kornia_pcl::PipelineConfig;
///
/// let config = PipelineConfig::from_json(r#"{
///     "crop": { "min": [-1.0, -1.0, -1.0], "max": [1.0, 1.0, 1.0] },
///     "voxel": { "voxel_size": 0.05 },
///     "outlier": { "min_neighbors": 0, "radius": 0.1 }
/// }"#).unwrap();
/// assert_eq!(config.voxel.voxel_size, 0.05);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Crop stage parameters.
    pub crop: CropConfig,
    /// Voxel downsampling stage parameters.
    pub voxel: VoxelConfig,
    /// Radius outlier removal stage parameters.
    pub outlier: OutlierConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            crop: CropConfig {
                min: [0.0, -10.0, 30.0],
                max: [10.0, 10.0, 40.0],
            },
            voxel: VoxelConfig { voxel_size: 1e-2 },
            outlier: OutlierConfig {
                min_neighbors: 50,
                radius: 5e-2,
            },
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Config`] if the JSON is malformed, or the validation error
    /// of the first invalid parameter. A negative `min_neighbors` does not fit its unsigned
    /// type, so it is reported as [`FilterError::Config`] rather than
    /// [`FilterError::InvalidParameter`].
    pub fn from_json(json: &str) -> Result<Self, FilterError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, FilterError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every stage parameter.
    pub fn validate(&self) -> Result<(), FilterError> {
        self.crop.bounding_box()?;
        ensure_positive("voxel_size", self.voxel.voxel_size)?;
        ensure_positive("radius", self.outlier.radius)?;
        Ok(())
    }
}
