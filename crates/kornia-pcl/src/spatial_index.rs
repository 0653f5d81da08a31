use std::{collections::HashMap, ops::ControlFlow, ops::Range};

use rayon::slice::ParallelSliceMut;

use crate::{
    error::{ensure_positive, FilterError},
    ops::{is_finite_point, squared_distance},
};

/// Integer coordinates of a cell in the uniform grid.
pub type CellIndex = (i64, i64, i64);

/// Relative amount by which [`SpatialIndex::for_radius`] grows the cell edge past the radius.
const CELL_MARGIN: f64 = 1e-6;

/// A uniform grid over a fixed set of points answering exact radius queries.
///
/// Point indices are stored sorted by cell in one contiguous array, and each occupied
/// cell maps to its range in that array. The index borrows the points it was built
/// from, so they cannot change while it is alive.
///
/// Points with non-finite coordinates are not indexed.
///
/// # Example
///
/// ```
/// use kornia_pcl::spatial_index::SpatialIndex;
///
/// let points = vec![[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [3.0, 0.0, 0.0]];
/// let index = SpatialIndex::new(&points, 1.0).unwrap();
/// assert_eq!(index.radius_search(&[0.0, 0.0, 0.0], 1.0), vec![0, 1]);
/// ```
#[derive(Debug)]
pub struct SpatialIndex<'a> {
    points: &'a [[f64; 3]],
    cell_size: f64,
    // point indices grouped by cell, ascending within a cell
    sorted_indices: Vec<usize>,
    cells: HashMap<CellIndex, Range<usize>>,
}

impl<'a> SpatialIndex<'a> {
    /// Build the index over `points` with cubic cells of edge `cell_size`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidParameter`] if `cell_size` is not a finite positive number.
    pub fn new(points: &'a [[f64; 3]], cell_size: f64) -> Result<Self, FilterError> {
        ensure_positive("cell_size", cell_size)?;

        let cell_of = |p: &[f64; 3]| cell_index_of(p, cell_size);

        let mut keyed = points
            .iter()
            .enumerate()
            .filter(|(_, p)| is_finite_point(p))
            .map(|(i, p)| (cell_of(p), i))
            .collect::<Vec<_>>();
        keyed.par_sort_unstable();

        let mut cells = HashMap::new();
        let mut start = 0;
        while start < keyed.len() {
            let cell = keyed[start].0;
            let end = start + keyed[start..].iter().take_while(|(c, _)| *c == cell).count();
            cells.insert(cell, start..end);
            start = end;
        }

        let sorted_indices = keyed.into_iter().map(|(_, i)| i).collect::<Vec<_>>();

        log::debug!(
            "spatial index: {} points in {} cells of size {}",
            sorted_indices.len(),
            cells.len(),
            cell_size
        );

        Ok(Self {
            points,
            cell_size,
            sorted_indices,
            cells,
        })
    }

    /// Build an index whose cells are just larger than `radius`.
    ///
    /// Every point within `radius` of a query then lies in the 3x3x3 block of cells
    /// around the query's cell.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidParameter`] if `radius` is not a finite positive number.
    pub fn for_radius(points: &'a [[f64; 3]], radius: f64) -> Result<Self, FilterError> {
        ensure_positive("radius", radius)?;
        Self::new(points, radius * (1.0 + CELL_MARGIN))
    }

    /// The number of indexed points.
    pub fn len(&self) -> usize {
        self.sorted_indices.len()
    }

    /// Whether no point is indexed.
    pub fn is_empty(&self) -> bool {
        self.sorted_indices.is_empty()
    }

    /// The edge length of the cells.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// The number of occupied cells.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// The cell containing a point.
    pub fn cell_index(&self, point: &[f64; 3]) -> CellIndex {
        cell_index_of(point, self.cell_size)
    }

    /// The indices of the points inside a cell, in ascending order.
    pub fn points_in_cell(&self, cell: CellIndex) -> &[usize] {
        match self.cells.get(&cell) {
            Some(range) => &self.sorted_indices[range.clone()],
            None => &[],
        }
    }

    /// Find all points within `radius` of `query`, boundary included.
    ///
    /// # Returns
    ///
    /// The indices of the matching points in ascending order. Empty if `radius` is
    /// negative or NaN, or the query is not finite.
    pub fn radius_search(&self, query: &[f64; 3], radius: f64) -> Vec<usize> {
        let mut found = Vec::new();
        self.visit_within_radius(query, radius, |i| {
            found.push(i);
            ControlFlow::Continue(())
        });
        found.sort_unstable();
        found
    }

    /// Count the points within `radius` of `query`, boundary included.
    ///
    /// The point at index `exclude`, if any, is not counted. Counting stops as soon as
    /// `limit` is reached, so the result is at most `limit`.
    pub fn count_within_radius(
        &self,
        query: &[f64; 3],
        radius: f64,
        exclude: Option<usize>,
        limit: usize,
    ) -> usize {
        let mut count = 0;
        if limit == 0 {
            return count;
        }
        self.visit_within_radius(query, radius, |i| {
            if Some(i) != exclude {
                count += 1;
                if count >= limit {
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        });
        count
    }

    fn visit_within_radius(
        &self,
        query: &[f64; 3],
        radius: f64,
        mut visit: impl FnMut(usize) -> ControlFlow<()>,
    ) {
        // also rejects NaN
        if !(radius >= 0.0) || !is_finite_point(query) || self.is_empty() {
            return;
        }
        let radius_sq = radius * radius;

        let mut check_cell = |range: &Range<usize>| -> ControlFlow<()> {
            for &i in &self.sorted_indices[range.clone()] {
                if squared_distance(query, &self.points[i]) <= radius_sq && visit(i).is_break() {
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        };

        // cells reached per direction; radius < cell_size gives the 3x3x3 block
        let span = (radius / self.cell_size).floor() + 1.0;
        let block_cells = (2.0 * span + 1.0).powi(3);

        if block_cells >= self.cells.len() as f64 {
            // the block covers more cells than are occupied, scan the occupied ones instead
            for range in self.cells.values() {
                if check_cell(range).is_break() {
                    return;
                }
            }
            return;
        }

        let span = span as i64;
        let (cx, cy, cz) = self.cell_index(query);
        for dx in -span..=span {
            for dy in -span..=span {
                for dz in -span..=span {
                    let cell = (
                        cx.saturating_add(dx),
                        cy.saturating_add(dy),
                        cz.saturating_add(dz),
                    );
                    if let Some(range) = self.cells.get(&cell) {
                        if check_cell(range).is_break() {
                            return;
                        }
                    }
                }
            }
        }
    }
}

fn cell_index_of(p: &[f64; 3], cell_size: f64) -> CellIndex {
    (
        (p[0] / cell_size).floor() as i64,
        (p[1] / cell_size).floor() as i64,
        (p[2] / cell_size).floor() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn brute_force_radius_search(points: &[[f64; 3]], query: &[f64; 3], radius: f64) -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| squared_distance(query, p) <= radius * radius)
            .map(|(i, _)| i)
            .collect()
    }

    fn random_points(n: usize, extent: f64) -> Vec<[f64; 3]> {
        let mut rng = rand::rng();
        (0..n)
            .map(|_| {
                [
                    rng.random_range(-extent..extent),
                    rng.random_range(-extent..extent),
                    rng.random_range(-extent..extent),
                ]
            })
            .collect()
    }

    #[test]
    fn test_invalid_cell_size() {
        let points = vec![[0.0; 3]];
        assert!(SpatialIndex::new(&points, 0.0).is_err());
        assert!(SpatialIndex::new(&points, -2.0).is_err());
        assert!(SpatialIndex::for_radius(&points, f64::NAN).is_err());
    }

    #[test]
    fn test_points_in_cell() -> Result<(), FilterError> {
        let points = vec![
            [0.1, 0.1, 0.1],
            [1.5, 0.2, 0.3],
            [0.9, 0.9, 0.9],
            [-0.1, 0.0, 0.0],
        ];
        let index = SpatialIndex::new(&points, 1.0)?;
        assert_eq!(index.len(), 4);
        assert_eq!(index.num_cells(), 3);
        assert_eq!(index.cell_index(&points[3]), (-1, 0, 0));
        assert_eq!(index.points_in_cell((0, 0, 0)), &[0, 2]);
        assert_eq!(index.points_in_cell((1, 0, 0)), &[1]);
        assert_eq!(index.points_in_cell((-1, 0, 0)), &[3]);
        assert!(index.points_in_cell((5, 5, 5)).is_empty());
        Ok(())
    }

    #[test]
    fn test_radius_search_inclusive_boundary() -> Result<(), FilterError> {
        let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let index = SpatialIndex::for_radius(&points, 1.0)?;
        assert_eq!(index.radius_search(&points[0], 1.0), vec![0, 1]);
        assert_eq!(index.radius_search(&points[2], 1.0), vec![2]);
        assert!(index.radius_search(&points[0], -1.0).is_empty());
        Ok(())
    }

    #[test]
    fn test_radius_search_matches_brute_force() -> Result<(), FilterError> {
        let points = random_points(2000, 5.0);
        let index = SpatialIndex::for_radius(&points, 0.4)?;
        let queries = random_points(100, 5.5);

        for query in queries.iter().chain(points.iter().take(100)) {
            // radii below, at and above the cell size
            for radius in [0.1, 0.4, 1.3] {
                assert_eq!(
                    index.radius_search(query, radius),
                    brute_force_radius_search(&points, query, radius)
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_count_within_radius() -> Result<(), FilterError> {
        let points = vec![
            [0.0, 0.0, 0.0],
            [0.1, 0.0, 0.0],
            [0.0, 0.1, 0.0],
            [0.0, 0.0, 0.1],
            [5.0, 5.0, 5.0],
        ];
        let index = SpatialIndex::for_radius(&points, 0.2)?;
        assert_eq!(index.count_within_radius(&points[0], 0.2, None, usize::MAX), 4);
        assert_eq!(index.count_within_radius(&points[0], 0.2, Some(0), usize::MAX), 3);
        assert_eq!(index.count_within_radius(&points[0], 0.2, Some(0), 2), 2);
        assert_eq!(index.count_within_radius(&points[0], 0.2, Some(0), 0), 0);
        assert_eq!(index.count_within_radius(&points[4], 0.2, Some(4), usize::MAX), 0);
        Ok(())
    }

    #[test]
    fn test_non_finite_points_are_not_indexed() -> Result<(), FilterError> {
        let points = vec![[0.0, 0.0, 0.0], [f64::NAN, 0.0, 0.0], [0.0, f64::INFINITY, 0.0]];
        let index = SpatialIndex::new(&points, 1.0)?;
        assert_eq!(index.len(), 1);
        assert_eq!(index.radius_search(&[0.0, 0.0, 0.0], 10.0), vec![0]);
        assert!(index.radius_search(&points[1], 10.0).is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_index() -> Result<(), FilterError> {
        let points: Vec<[f64; 3]> = vec![];
        let index = SpatialIndex::new(&points, 1.0)?;
        assert!(index.is_empty());
        assert!(index.radius_search(&[0.0; 3], 1.0).is_empty());
        Ok(())
    }
}
