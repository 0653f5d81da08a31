use rayon::prelude::*;

use crate::{
    error::{ensure_positive, FilterError},
    pointcloud::PointCloud,
    spatial_index::SpatialIndex,
};

/// Compute the indices of the points that survive radius outlier removal.
///
/// A point is kept when at least `min_neighbors` other points lie within `radius` of it,
/// boundary included. Neighbors are counted against the whole input, so dropping one
/// point never changes the verdict for another. Coincident duplicates count as
/// neighbors of each other.
///
/// # Arguments
///
/// * `src` - The input point cloud.
/// * `min_neighbors` - The minimum number of neighbors required to keep a point.
/// * `radius` - The search radius.
///
/// # Returns
///
/// The indices of the kept points in ascending order.
///
/// # Errors
///
/// Returns [`FilterError::InvalidParameter`] if `radius` is not a finite positive number.
pub fn radius_outlier_inliers(
    src: &PointCloud,
    min_neighbors: usize,
    radius: f64,
) -> Result<Vec<usize>, FilterError> {
    ensure_positive("radius", radius)?;

    if src.is_empty() {
        log::warn!("radius outlier removal: received an empty point cloud");
        return Ok(Vec::new());
    }

    if min_neighbors == 0 {
        return Ok((0..src.len()).collect());
    }

    // the index is complete and read-only before any query runs
    let index = SpatialIndex::for_radius(src.points(), radius)?;

    let inliers = src
        .points()
        .par_iter()
        .enumerate()
        .filter(|(i, p)| {
            index.count_within_radius(p, radius, Some(*i), min_neighbors) >= min_neighbors
        })
        .map(|(i, _)| i)
        .collect::<Vec<_>>();

    log::debug!(
        "radius outlier removal: kept {} of {} points (min_neighbors={}, radius={})",
        inliers.len(),
        src.len(),
        min_neighbors,
        radius
    );

    Ok(inliers)
}

/// Remove the points with fewer than `min_neighbors` other points within `radius`.
///
/// Kept points stay in input order and keep their colors and normals.
///
/// # Errors
///
/// Returns [`FilterError::InvalidParameter`] if `radius` is not a finite positive number.
///
/// # Example
///
/// ```
/// use kornia_pcl::{outlier::remove_radius_outliers, PointCloud};
///
/// let cloud = PointCloud::from_points(vec![
///     [0.0, 0.0, 0.0],
///     [0.1, 0.0, 0.0],
///     [0.0, 0.1, 0.0],
///     [10.0, 10.0, 10.0],
/// ]);
/// let filtered = remove_radius_outliers(&cloud, 1, 0.5).unwrap();
/// assert_eq!(filtered.len(), 3);
/// ```
pub fn remove_radius_outliers(
    src: &PointCloud,
    min_neighbors: usize,
    radius: f64,
) -> Result<PointCloud, FilterError> {
    let inliers = radius_outlier_inliers(src, min_neighbors, radius)?;
    if inliers.len() == src.len() {
        return Ok(src.clone());
    }
    Ok(src.select(&inliers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::squared_distance;
    use rand::Rng;

    fn brute_force_inliers(points: &[[f64; 3]], min_neighbors: usize, radius: f64) -> Vec<usize> {
        (0..points.len())
            .filter(|&i| {
                let count = (0..points.len())
                    .filter(|&j| {
                        j != i && squared_distance(&points[i], &points[j]) <= radius * radius
                    })
                    .count();
                count >= min_neighbors
            })
            .collect()
    }

    #[test]
    fn test_invalid_radius() {
        let cloud = PointCloud::from_points(vec![[0.0; 3]]);
        for radius in [0.0, -0.5, f64::NAN] {
            assert!(matches!(
                remove_radius_outliers(&cloud, 1, radius),
                Err(FilterError::InvalidParameter { name: "radius", .. })
            ));
        }
    }

    #[test]
    fn test_removes_isolated_points() -> Result<(), FilterError> {
        let cloud = PointCloud::from_points(vec![
            [0.0, 0.0, 0.0],
            [10.0, 10.0, 10.0],
            [0.1, 0.0, 0.0],
            [0.0, 0.1, 0.0],
            [-5.0, 0.0, 0.0],
        ]);
        let filtered = remove_radius_outliers(&cloud, 2, 0.5)?;
        assert_eq!(
            filtered.points(),
            &[[0.0, 0.0, 0.0], [0.1, 0.0, 0.0], [0.0, 0.1, 0.0]]
        );
        Ok(())
    }

    #[test]
    fn test_counts_use_original_set() -> Result<(), FilterError> {
        // A, B, C on a line one unit apart: A and C see one neighbor, B sees two
        let cloud = PointCloud::from_points(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);

        // A and C are dropped, B still counts both of them
        assert_eq!(radius_outlier_inliers(&cloud, 2, 1.0)?, vec![1]);

        // nothing is dropped when every point has a neighbor
        assert_eq!(radius_outlier_inliers(&cloud, 1, 1.0)?, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_boundary_is_inclusive() -> Result<(), FilterError> {
        let cloud = PointCloud::from_points(vec![[0.0, 0.0, 0.0], [0.0, 0.0, 0.25]]);
        assert_eq!(radius_outlier_inliers(&cloud, 1, 0.25)?, vec![0, 1]);
        assert!(radius_outlier_inliers(&cloud, 1, 0.125)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_point_is_not_its_own_neighbor() -> Result<(), FilterError> {
        let cloud = PointCloud::from_points(vec![[3.0, 3.0, 3.0]]);
        assert!(remove_radius_outliers(&cloud, 1, 1.0)?.is_empty());

        // a duplicate is a different point
        let cloud = PointCloud::from_points(vec![[3.0, 3.0, 3.0], [3.0, 3.0, 3.0]]);
        assert_eq!(remove_radius_outliers(&cloud, 1, 1.0)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_zero_min_neighbors_keeps_everything() -> Result<(), FilterError> {
        let cloud = PointCloud::from_points(vec![[0.0; 3], [100.0, 0.0, 0.0]]);
        let filtered = remove_radius_outliers(&cloud, 0, 0.01)?;
        assert_eq!(filtered, cloud);
        Ok(())
    }

    #[test]
    fn test_carries_attributes() -> Result<(), FilterError> {
        let cloud = PointCloud::new(
            vec![[0.0, 0.0, 0.0], [9.0, 9.0, 9.0], [0.2, 0.0, 0.0]],
            Some(vec![[1, 2, 3], [4, 5, 6], [7, 8, 9]]),
            None,
        )?;
        let filtered = remove_radius_outliers(&cloud, 1, 0.5)?;
        assert_eq!(filtered.colors(), Some(&[[1, 2, 3], [7, 8, 9]][..]));
        Ok(())
    }

    #[test]
    fn test_matches_brute_force() -> Result<(), FilterError> {
        let mut rng = rand::rng();
        let points = (0..1500)
            .map(|_| {
                [
                    rng.random_range(0.0..4.0),
                    rng.random_range(0.0..4.0),
                    rng.random_range(0.0..4.0),
                ]
            })
            .collect::<Vec<_>>();
        let cloud = PointCloud::from_points(points);

        for (min_neighbors, radius) in [(1, 0.2), (3, 0.35), (8, 0.5)] {
            assert_eq!(
                radius_outlier_inliers(&cloud, min_neighbors, radius)?,
                brute_force_inliers(cloud.points(), min_neighbors, radius)
            );
        }
        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<(), FilterError> {
        let filtered = remove_radius_outliers(&PointCloud::default(), 5, 0.1)?;
        assert!(filtered.is_empty());
        Ok(())
    }
}
