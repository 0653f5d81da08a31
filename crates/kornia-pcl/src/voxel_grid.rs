use std::collections::HashMap;

use glam::DVec3;

use crate::{
    error::{ensure_positive, FilterError},
    ops::is_finite_point,
    pointcloud::PointCloud,
};

/// Coordinates of a voxel in the grid.
///
/// The floored coordinates stay in `f64`, which holds every integral cell exactly, so
/// distant voxels never collapse into the same index.
pub type VoxelIndex = [f64; 3];

/// Hashable form of a [`VoxelIndex`].
type VoxelKey = [u64; 3];

fn voxel_key(index: &VoxelIndex) -> VoxelKey {
    // adding 0.0 turns -0.0 into 0.0
    index.map(|c| (c + 0.0).to_bits())
}

/// Running sums of the points falling into one voxel.
#[derive(Debug, Clone, Default)]
struct VoxelAccumulator {
    point_sum: DVec3,
    color_sum: [u64; 3],
    normal_sum: DVec3,
    count: usize,
}

impl VoxelAccumulator {
    fn centroid(&self) -> [f64; 3] {
        (self.point_sum / self.count as f64).to_array()
    }

    fn mean_color(&self) -> [u8; 3] {
        let inv_count = 1.0 / self.count as f64;
        self.color_sum
            .map(|c| (c as f64 * inv_count).round().clamp(0.0, 255.0) as u8)
    }

    fn mean_normal(&self) -> [f64; 3] {
        let normal = self.normal_sum / self.count as f64;
        let norm = normal.length();
        if norm > 0.0 {
            (normal / norm).to_array()
        } else {
            normal.to_array()
        }
    }
}

/// A uniform 3D voxel grid for downsampling point clouds.
///
/// Every point is assigned to the voxel `floor(p / voxel_size)` (componentwise), so a
/// point lying exactly on a voxel face belongs to the voxel with the higher index.
/// Each occupied voxel is reduced to the centroid of its points.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    /// The edge length of the cubic voxels.
    voxel_size: f64,
}

impl VoxelGrid {
    /// Creates a new `VoxelGrid` with the specified voxel edge length.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidParameter`] if `voxel_size` is not a finite
    /// positive number.
    pub fn new(voxel_size: f64) -> Result<Self, FilterError> {
        ensure_positive("voxel_size", voxel_size)?;
        Ok(Self { voxel_size })
    }

    /// Gets the voxel edge length.
    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    /// Computes the voxel index for a given point.
    ///
    /// # Arguments
    /// * `point` - The input point as `[x, y, z]`.
    ///
    /// # Returns
    /// The floored voxel coordinates `floor(point / voxel_size)`. They are infinite when the
    /// division overflows.
    pub fn voxel_index(&self, point: &[f64; 3]) -> VoxelIndex {
        point.map(|c| (c / self.voxel_size).floor())
    }

    /// Downsamples the input point cloud by grouping points into voxels and computing centroids.
    ///
    /// Voxels are emitted in the order in which the scan first reaches them, so the output
    /// is deterministic for a given input. Colors are averaged per channel and rounded;
    /// normals are averaged and re-normalized. Points with non-finite coordinates are skipped.
    ///
    /// # Arguments
    /// * `point_cloud` - The input point cloud to downsample.
    ///
    /// # Returns
    /// A new `PointCloud` with one point per occupied voxel.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidParameter`] if a finite point divided by the voxel size
    /// overflows to infinity, since its voxel cannot be told apart from its neighbors'.
    pub fn downsample(&self, point_cloud: &PointCloud) -> Result<PointCloud, FilterError> {
        if point_cloud.is_empty() {
            log::warn!("voxel downsample: received an empty point cloud");
            return Ok(PointCloud::default());
        }

        let colors = point_cloud.colors();
        let normals = point_cloud.normals();

        // voxel index -> slot in `voxels`, slots kept in first-seen order
        let mut slots: HashMap<VoxelKey, usize> = HashMap::new();
        let mut voxels: Vec<VoxelAccumulator> = Vec::new();
        let mut num_skipped = 0usize;

        for (i, point) in point_cloud.points().iter().enumerate() {
            if !is_finite_point(point) {
                num_skipped += 1;
                continue;
            }

            let index = self.voxel_index(point);
            if !is_finite_point(&index) {
                return Err(FilterError::InvalidParameter {
                    name: "voxel_size",
                    value: self.voxel_size,
                });
            }

            let slot = *slots.entry(voxel_key(&index)).or_insert_with(|| {
                voxels.push(VoxelAccumulator::default());
                voxels.len() - 1
            });
            let voxel = &mut voxels[slot];

            voxel.point_sum += DVec3::from_array(*point);
            voxel.count += 1;

            if let Some(color) = colors.map(|c| c[i]) {
                for (acc, &c) in voxel.color_sum.iter_mut().zip(color.iter()) {
                    *acc += c as u64;
                }
            }
            if let Some(normal) = normals.map(|n| n[i]) {
                voxel.normal_sum += DVec3::from_array(normal);
            }
        }

        if num_skipped > 0 {
            log::warn!("voxel downsample: skipped {num_skipped} points with non-finite coordinates");
        }
        log::debug!(
            "voxel downsample: {} points into {} voxels of size {}",
            point_cloud.len(),
            voxels.len(),
            self.voxel_size
        );

        let points = voxels.iter().map(VoxelAccumulator::centroid).collect();
        let colors = colors.map(|_| voxels.iter().map(VoxelAccumulator::mean_color).collect());
        let normals = normals.map(|_| voxels.iter().map(VoxelAccumulator::mean_normal).collect());

        PointCloud::new(points, colors, normals)
    }
}

/// Downsample a point cloud with a voxel grid of edge length `voxel_size`.
///
/// # Errors
///
/// Returns [`FilterError::InvalidParameter`] if `voxel_size <= 0`, or if it is so small that
/// a voxel coordinate overflows. The input is left untouched.
///
/// # Example
///
/// ```
/// use kornia_pcl::{voxel_grid::voxel_downsample, PointCloud};
///
/// let cloud = PointCloud::from_points(vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
/// let downsampled = voxel_downsample(&cloud, 10.0).unwrap();
/// assert_eq!(downsampled.points(), &[[1.0, 0.0, 0.0]]);
/// ```
pub fn voxel_downsample(src: &PointCloud, voxel_size: f64) -> Result<PointCloud, FilterError> {
    VoxelGrid::new(voxel_size)?.downsample(src)
}
