use rayon::prelude::*;

use crate::{bbox::AxisAlignedBoundingBox, error::FilterError, pointcloud::PointCloud};

/// Crop a point cloud to the region covered by a bounding box.
///
/// Keeps every point lying inside the box, faces included, in input order.
/// Colors and normals of the kept points are carried over.
///
/// # Arguments
///
/// * `src` - The point cloud to crop.
/// * `bbox` - The region to keep.
///
/// # Returns
///
/// A new point cloud with the points inside the box. It may be empty.
pub fn crop_pointcloud(src: &PointCloud, bbox: &AxisAlignedBoundingBox) -> PointCloud {
    if src.is_empty() {
        log::warn!("crop: received an empty point cloud");
        return PointCloud::default();
    }

    let inside = src
        .points()
        .par_iter()
        .map(|p| bbox.contains(p))
        .collect::<Vec<_>>();

    let indices = inside
        .iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect::<Vec<_>>();

    log::debug!("crop: kept {} of {} points", indices.len(), src.len());

    src.select(&indices)
}

/// Crop a point cloud to the region `[min, max]`.
///
/// # Errors
///
/// Returns [`FilterError::InvalidBounds`] if `min > max` on any axis. Nothing is
/// cropped in that case.
///
/// # Example
///
/// ```
/// use kornia_pcl::{crop::crop, PointCloud};
///
/// let cloud = PointCloud::from_points(vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
/// let cropped = crop(&cloud, [-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]).unwrap();
/// assert_eq!(cropped.points(), &[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
/// ```
pub fn crop(src: &PointCloud, min: [f64; 3], max: [f64; 3]) -> Result<PointCloud, FilterError> {
    let bbox = AxisAlignedBoundingBox::new(min, max)?;
    Ok(crop_pointcloud(src, &bbox))
}
