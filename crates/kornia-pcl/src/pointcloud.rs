use glam::DVec3;

use crate::error::FilterError;

/// A point cloud with points, colors, and normals.
///
/// Colors and normals are optional, but when present they hold exactly one entry per point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
    // The colors of the points.
    colors: Option<Vec<[u8; 3]>>,
    // The normals of the points.
    normals: Option<Vec<[f64; 3]>>,
}

impl PointCloud {
    /// Create a new point cloud from points, colors (optional), and normals (optional).
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::AttributeLengthMismatch`] if an attribute does not have
    /// the same length as `points`.
    pub fn new(
        points: Vec<[f64; 3]>,
        colors: Option<Vec<[u8; 3]>>,
        normals: Option<Vec<[f64; 3]>>,
    ) -> Result<Self, FilterError> {
        if let Some(colors) = &colors {
            check_attribute_len("colors", points.len(), colors.len())?;
        }
        if let Some(normals) = &normals {
            check_attribute_len("normals", points.len(), normals.len())?;
        }
        Ok(Self {
            points,
            colors,
            normals,
        })
    }

    /// Create a point cloud holding only coordinates.
    pub fn from_points(points: Vec<[f64; 3]>) -> Self {
        Self {
            points,
            colors: None,
            normals: None,
        }
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get as reference the colors of the points in the point cloud.
    pub fn colors(&self) -> Option<&[[u8; 3]]> {
        self.colors.as_deref()
    }

    /// Get as reference the normals of the points in the point cloud.
    pub fn normals(&self) -> Option<&[[f64; 3]]> {
        self.normals.as_deref()
    }

    /// Consume the point cloud and return its points.
    pub fn into_points(self) -> Vec<[f64; 3]> {
        self.points
    }

    /// Build a new point cloud from the points at `indices`, in the given order.
    ///
    /// Attributes follow their points.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            points: indices.iter().map(|&i| self.points[i]).collect(),
            colors: self
                .colors
                .as_ref()
                .map(|colors| indices.iter().map(|&i| colors[i]).collect()),
            normals: self
                .normals
                .as_ref()
                .map(|normals| indices.iter().map(|&i| normals[i]).collect()),
        }
    }

    /// Get the minimum bound of the point cloud.
    ///
    /// Returns the zero vector for an empty point cloud.
    pub fn min_bound(&self) -> DVec3 {
        if self.points.is_empty() {
            return DVec3::ZERO;
        }
        self.points
            .iter()
            .map(|p| DVec3::from_array(*p))
            .fold(DVec3::splat(f64::INFINITY), |a, b| a.min(b))
    }

    /// Get the maximum bound of the point cloud.
    ///
    /// Returns the zero vector for an empty point cloud.
    pub fn max_bound(&self) -> DVec3 {
        if self.points.is_empty() {
            return DVec3::ZERO;
        }
        self.points
            .iter()
            .map(|p| DVec3::from_array(*p))
            .fold(DVec3::splat(f64::NEG_INFINITY), |a, b| a.max(b))
    }
}

fn check_attribute_len(
    attribute: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), FilterError> {
    if expected != actual {
        return Err(FilterError::AttributeLengthMismatch {
            attribute,
            expected,
            actual,
        });
    }
    Ok(())
}
