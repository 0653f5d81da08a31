#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Axis-aligned bounding boxes.
pub mod bbox;

/// Pipeline stage parameters.
pub mod config;

/// Region cropping.
pub mod crop;

/// Error types for the filtering operations.
pub mod error;

/// Geometric helper operations.
pub mod ops;

/// Radius outlier removal.
pub mod outlier;

/// Staged filtering pipeline.
pub mod pipeline;

/// Point cloud container.
pub mod pointcloud;

/// Uniform grid spatial index for radius queries.
pub mod spatial_index;

/// Voxel grid downsampling.
pub mod voxel_grid;

pub use bbox::AxisAlignedBoundingBox;
pub use config::PipelineConfig;
pub use error::FilterError;
pub use pipeline::Pipeline;
pub use pointcloud::PointCloud;
