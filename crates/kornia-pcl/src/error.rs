/// An error type for the point cloud filtering operations.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum FilterError {
    /// The bounding box corners are not ordered on every axis.
    #[error("Invalid bounding box: min {min:?} must be <= max {max:?} on every axis")]
    InvalidBounds {
        /// The requested minimum corner.
        min: [f64; 3],
        /// The requested maximum corner.
        max: [f64; 3],
    },

    /// A stage parameter is out of its valid range.
    #[error("Invalid parameter `{name}`: {value} (must be a finite positive number)")]
    InvalidParameter {
        /// The name of the parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A per-point attribute does not have one entry per point.
    #[error("Attribute `{attribute}` has {actual} entries, expected {expected}")]
    AttributeLengthMismatch {
        /// The name of the attribute.
        attribute: &'static str,
        /// The number of points in the cloud.
        expected: usize,
        /// The number of attribute entries.
        actual: usize,
    },

    /// The pipeline configuration could not be parsed.
    #[error("Failed to parse pipeline configuration")]
    Config(#[from] serde_json::Error),
}

/// Check that a length-like parameter is finite and strictly positive.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<(), FilterError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FilterError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_positive() {
        assert!(ensure_positive("radius", 0.5).is_ok());
        assert!(matches!(
            ensure_positive("radius", 0.0),
            Err(FilterError::InvalidParameter { name: "radius", .. })
        ));
        assert!(ensure_positive("radius", -1.0).is_err());
        assert!(ensure_positive("radius", f64::NAN).is_err());
        assert!(ensure_positive("radius", f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = FilterError::InvalidParameter {
            name: "voxel_size",
            value: -1.0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid parameter `voxel_size`: -1 (must be a finite positive number)"
        );
    }
}
