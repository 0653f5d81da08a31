use crate::{error::FilterError, pointcloud::PointCloud};

/// An axis-aligned bounding box defined by its minimum and maximum corners.
///
/// The corners always satisfy `min <= max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignedBoundingBox {
    min: [f64; 3],
    max: [f64; 3],
}

impl AxisAlignedBoundingBox {
    /// Create a new bounding box from its corners.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidBounds`] if `min > max` on any axis or a
    /// coordinate is NaN.
    ///
    /// # Example
    ///
    /// ```
    /// use kornia_pcl::AxisAlignedBoundingBox;
    ///
    /// let bbox = AxisAlignedBoundingBox::new([0.0, -10.0, 30.0], [10.0, 10.0, 40.0]).unwrap();
    /// assert!(bbox.contains(&[5.0, 0.0, 35.0]));
    /// assert!(AxisAlignedBoundingBox::new([1.0, 0.0, 0.0], [0.0, 1.0, 1.0]).is_err());
    /// ```
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Result<Self, FilterError> {
        // written as a negation so NaN corners are rejected too
        if !(0..3).all(|i| min[i] <= max[i]) {
            return Err(FilterError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Compute the tight bounding box of a point cloud.
    ///
    /// Returns `None` for an empty point cloud.
    pub fn from_pointcloud(pointcloud: &PointCloud) -> Option<Self> {
        if pointcloud.is_empty() {
            return None;
        }
        Self::new(
            pointcloud.min_bound().to_array(),
            pointcloud.max_bound().to_array(),
        )
        .ok()
    }

    /// The minimum corner.
    #[inline]
    pub fn min(&self) -> [f64; 3] {
        self.min
    }

    /// The maximum corner.
    #[inline]
    pub fn max(&self) -> [f64; 3] {
        self.max
    }

    /// Whether the point lies inside the box, faces included.
    #[inline]
    pub fn contains(&self, p: &[f64; 3]) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_unordered_corners() {
        assert!(AxisAlignedBoundingBox::new([0.0; 3], [0.0; 3]).is_ok());
        for axis in 0..3 {
            let mut min = [0.0; 3];
            min[axis] = 1.0;
            let res = AxisAlignedBoundingBox::new(min, [0.5; 3]);
            assert!(matches!(res, Err(FilterError::InvalidBounds { .. })));
        }
        assert!(AxisAlignedBoundingBox::new([f64::NAN, 0.0, 0.0], [1.0; 3]).is_err());
    }

    #[test]
    fn test_contains_inclusive() -> Result<(), FilterError> {
        let bbox = AxisAlignedBoundingBox::new([-1.0; 3], [1.0; 3])?;
        assert!(bbox.contains(&[1.0, -1.0, 0.0]));
        assert!(bbox.contains(&[0.0, 0.0, 0.0]));
        assert!(!bbox.contains(&[1.0 + 1e-9, 0.0, 0.0]));
        assert!(!bbox.contains(&[0.0, 0.0, f64::NAN]));
        Ok(())
    }

    #[test]
    fn test_from_pointcloud() {
        let pointcloud = PointCloud::from_points(vec![[1.0, 2.0, 3.0], [-1.0, 4.0, 0.0]]);
        let bbox = AxisAlignedBoundingBox::from_pointcloud(&pointcloud);
        assert_eq!(
            bbox.map(|b| (b.min(), b.max())),
            Some(([-1.0, 2.0, 0.0], [1.0, 4.0, 3.0]))
        );
        assert!(AxisAlignedBoundingBox::from_pointcloud(&PointCloud::default()).is_none());
    }
}
