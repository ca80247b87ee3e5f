//! Cylindrical neighborhood sampling.
//!
//! Selects the points of a cloud lying inside a cylinder centered at a core
//! point and aligned to its surface normal. Finite cylinders pre-filter
//! candidates through the spatial index with a bounding sphere; the exact
//! geometric test decides membership either way, so the index is purely a
//! performance optimization.

use nalgebra::{Point3, Vector3};

use crate::cloud::PointCloud;
use crate::index::SpatialIndex;

/// Geometry of the projection cylinder.
///
/// # Example
///
/// ```
/// use m3c2::CylinderSpec;
///
/// let finite = CylinderSpec::new(0.5, 4.0);
/// assert_eq!(finite.half_length(), Some(2.0));
///
/// let unbounded = CylinderSpec::new(0.5, 0.0);
/// assert!(unbounded.is_infinite());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderSpec {
    /// Radius of the cylinder. Must be positive.
    pub radius: f64,
    /// Full length along the axis. Zero means unbounded.
    pub length: f64,
}

impl CylinderSpec {
    /// Creates a cylinder specification.
    #[must_use]
    pub const fn new(radius: f64, length: f64) -> Self {
        Self { radius, length }
    }

    /// Returns true when the cylinder is unbounded along its axis.
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        self.length <= 0.0
    }

    /// Returns half the axial extent, or `None` for an unbounded cylinder.
    #[must_use]
    pub fn half_length(&self) -> Option<f64> {
        if self.is_infinite() {
            None
        } else {
            Some(self.length / 2.0)
        }
    }

    /// Radius of the sphere enclosing the whole cylinder, or `None` when it
    /// is unbounded and no finite sphere exists.
    #[must_use]
    pub fn bounding_radius(&self) -> Option<f64> {
        let half = self.half_length()?;
        Some(self.radius.hypot(half))
    }

    /// Exact membership test for `point` against the cylinder centered at
    /// `core` along the unit `axis`.
    #[must_use]
    pub fn contains(&self, core: &Point3<f64>, axis: &Vector3<f64>, point: &Point3<f64>) -> bool {
        let offset = point - core;
        let axial = offset.dot(axis);

        if let Some(half) = self.half_length() {
            if axial.abs() > half {
                return false;
            }
        }

        let radial_sq = offset.norm_squared() - axial * axial;
        radial_sq <= self.radius * self.radius
    }
}

/// Returns the indices of all points of `cloud` inside the cylinder, sorted
/// ascending.
///
/// An empty result is a valid, non-error outcome. Unbounded cylinders scan
/// the whole cloud since no finite index query can cover them.
#[must_use]
pub fn sample_cylinder(
    cloud: &PointCloud,
    index: &SpatialIndex,
    core: &Point3<f64>,
    axis: &Vector3<f64>,
    spec: &CylinderSpec,
) -> Vec<usize> {
    match spec.bounding_radius() {
        Some(bound) => index
            .within(core, bound)
            .into_iter()
            .filter(|&i| spec.contains(core, axis, &cloud.points[i]))
            .collect(),
        None => (0..cloud.len())
            .filter(|&i| spec.contains(core, axis, &cloud.points[i]))
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_flat_cloud(n: usize) -> PointCloud {
        (0..n)
            .flat_map(|i| {
                (0..n).map(move |j| {
                    let z = (i * n + j) as f64 * 1e-5;
                    Point3::new(i as f64 * 0.1, j as f64 * 0.1, z)
                })
            })
            .collect()
    }

    #[test]
    fn test_contains_finite() {
        let spec = CylinderSpec::new(0.5, 2.0);
        let core = Point3::origin();
        let axis = Vector3::z();

        assert!(spec.contains(&core, &axis, &Point3::new(0.3, 0.0, 0.9)));
        // Outside radially.
        assert!(!spec.contains(&core, &axis, &Point3::new(0.6, 0.0, 0.0)));
        // Outside axially.
        assert!(!spec.contains(&core, &axis, &Point3::new(0.0, 0.0, 1.1)));
    }

    #[test]
    fn test_contains_infinite_ignores_axial_offset() {
        let spec = CylinderSpec::new(0.5, 0.0);
        let core = Point3::origin();
        let axis = Vector3::z();

        assert!(spec.contains(&core, &axis, &Point3::new(0.2, 0.0, 1.0e6)));
        assert!(!spec.contains(&core, &axis, &Point3::new(0.6, 0.0, 1.0e6)));
    }

    #[test]
    fn test_bounding_radius() {
        let spec = CylinderSpec::new(3.0, 8.0);
        assert_relative_eq!(spec.bounding_radius().unwrap(), 5.0);

        assert!(CylinderSpec::new(1.0, 0.0).bounding_radius().is_none());
    }

    #[test]
    fn test_sample_matches_brute_force() {
        let cloud = make_flat_cloud(20);
        let index = SpatialIndex::build(&cloud);
        let core = Point3::new(1.0, 1.0, 0.0);
        let axis = Vector3::z();
        let spec = CylinderSpec::new(0.35, 1.0);

        let expected: Vec<usize> = (0..cloud.len())
            .filter(|&i| spec.contains(&core, &axis, &cloud.points[i]))
            .collect();

        assert_eq!(sample_cylinder(&cloud, &index, &core, &axis, &spec), expected);
    }

    #[test]
    fn test_sample_infinite_includes_distant_axial_points() {
        let mut cloud = make_flat_cloud(10);
        // A point far along the axis but inside the radius.
        cloud.push(Point3::new(0.5, 0.5, 1000.0));
        let far_idx = cloud.len() - 1;
        let index = SpatialIndex::build(&cloud);

        let core = Point3::new(0.5, 0.5, 0.0);
        let axis = Vector3::z();

        let unbounded = sample_cylinder(&cloud, &index, &core, &axis, &CylinderSpec::new(0.3, 0.0));
        assert!(unbounded.contains(&far_idx));

        let bounded = sample_cylinder(&cloud, &index, &core, &axis, &CylinderSpec::new(0.3, 2.0));
        assert!(!bounded.contains(&far_idx));
    }

    #[test]
    fn test_sample_empty_is_ok() {
        let cloud = make_flat_cloud(10);
        let index = SpatialIndex::build(&cloud);
        let core = Point3::new(50.0, 50.0, 0.0);

        let subset = sample_cylinder(
            &cloud,
            &index,
            &core,
            &Vector3::z(),
            &CylinderSpec::new(0.3, 1.0),
        );
        assert!(subset.is_empty());
    }

    #[test]
    fn test_sample_sorted() {
        let cloud = make_flat_cloud(15);
        let index = SpatialIndex::build(&cloud);
        let core = Point3::new(0.7, 0.7, 0.0);

        let subset = sample_cylinder(
            &cloud,
            &index,
            &core,
            &Vector3::z(),
            &CylinderSpec::new(0.4, 0.0),
        );
        assert!(!subset.is_empty());
        assert!(subset.windows(2).all(|w| w[0] < w[1]));
    }
}
