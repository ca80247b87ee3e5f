//! Spatial index adapter for radius and nearest-neighbor queries.
//!
//! Thin wrapper around a KD-tree keeping the rest of the crate independent
//! of the concrete index implementation. Queries return indices into the
//! cloud the index was built from, sorted ascending so identical inputs
//! always yield identical subsets.

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use nalgebra::Point3;

use crate::cloud::PointCloud;

/// Read-only nearest-neighbor structure over one point cloud.
///
/// Built once per searched cloud before any per-core-point work; safe to
/// share across worker threads.
///
/// # Example
///
/// ```
/// use m3c2::{PointCloud, SpatialIndex};
/// use nalgebra::Point3;
///
/// let cloud = PointCloud::from_positions(&[
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(5.0, 0.0, 0.0),
/// ]);
/// let index = SpatialIndex::build(&cloud);
///
/// let near = index.within(&Point3::new(0.0, 0.0, 0.0), 1.5);
/// assert_eq!(near, vec![0, 1]);
/// ```
#[derive(Debug)]
pub struct SpatialIndex {
    // Bucket size must exceed the largest number of points sharing one axis
    // value; gridded clouds easily exceed kiddo's default of 32.
    tree: KdTree<f64, u64, 3, 257, u32>,
    count: usize,
}

impl SpatialIndex {
    /// Builds an index over the given cloud.
    #[must_use]
    pub fn build(cloud: &PointCloud) -> Self {
        let mut tree: KdTree<f64, u64, 3, 257, u32> = KdTree::new();

        for (i, point) in cloud.points.iter().enumerate() {
            let coords = [point.x, point.y, point.z];
            #[allow(clippy::cast_possible_truncation)]
            let idx = i as u64;
            tree.add(&coords, idx);
        }

        Self {
            tree,
            count: cloud.len(),
        }
    }

    /// Returns the number of indexed points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no points are indexed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the indices of all points within `radius` of `center`,
    /// sorted ascending.
    #[must_use]
    pub fn within(&self, center: &Point3<f64>, radius: f64) -> Vec<usize> {
        if self.count == 0 || radius <= 0.0 {
            return Vec::new();
        }

        let query = [center.x, center.y, center.z];
        let mut indices: Vec<usize> = self
            .tree
            .within_unsorted::<SquaredEuclidean>(&query, radius * radius)
            .into_iter()
            .map(|n| {
                #[allow(clippy::cast_possible_truncation)]
                let idx = n.item as usize;
                idx
            })
            .collect();

        indices.sort_unstable();
        indices
    }

    /// Returns the index of the point closest to `center`, or `None` if the
    /// index is empty.
    #[must_use]
    pub fn nearest(&self, center: &Point3<f64>) -> Option<usize> {
        if self.count == 0 {
            return None;
        }

        let query = [center.x, center.y, center.z];
        let neighbor = self.tree.nearest_one::<SquaredEuclidean>(&query);
        #[allow(clippy::cast_possible_truncation)]
        let idx = neighbor.item as usize;
        Some(idx)
    }
}
