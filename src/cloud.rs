//! Point cloud storage.
//!
//! Input clouds carry positions only. Per-point outputs (normals, distances)
//! live in [`crate::ComparisonResult`], index-aligned with the core cloud.

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};

/// An ordered sequence of 3D points, double precision.
///
/// # Example
///
/// ```
/// use m3c2::PointCloud;
/// use nalgebra::Point3;
///
/// let mut cloud = PointCloud::new();
/// cloud.push_coords(0.0, 0.0, 0.0);
/// cloud.push(Point3::new(1.0, 0.0, 0.0));
///
/// assert_eq!(cloud.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    /// The points in this cloud.
    pub points: Vec<Point3<f64>>,
}

impl PointCloud {
    /// Creates an empty point cloud.
    #[must_use]
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Creates a point cloud with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Creates a point cloud from a slice of positions.
    ///
    /// # Example
    ///
    /// ```
    /// use m3c2::PointCloud;
    /// use nalgebra::Point3;
    ///
    /// let cloud = PointCloud::from_positions(&[
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    /// ]);
    /// assert_eq!(cloud.len(), 2);
    /// ```
    #[must_use]
    pub fn from_positions(positions: &[Point3<f64>]) -> Self {
        Self {
            points: positions.to_vec(),
        }
    }

    /// Returns the number of points in the cloud.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the cloud has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Adds a point to the cloud.
    pub fn push(&mut self, point: Point3<f64>) {
        self.points.push(point);
    }

    /// Adds a point with the given coordinates.
    pub fn push_coords(&mut self, x: f64, y: f64, z: f64) {
        self.points.push(Point3::new(x, y, z));
    }

    /// Returns the axis-aligned bounds of the cloud as `(min, max)`.
    ///
    /// Returns `None` if the cloud is empty.
    #[must_use]
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.points.first()?;
        let mut min = first;
        let mut max = first;

        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Returns the centroid of the cloud, or `None` if it is empty.
    #[must_use]
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.points.is_empty() {
            return None;
        }

        let sum: Vector3<f64> = self.points.iter().map(|p| p.coords).sum();

        #[allow(clippy::cast_precision_loss)]
        let centroid = sum / self.points.len() as f64;

        Some(Point3::from(centroid))
    }

    /// Translates all points by the given offset.
    ///
    /// # Example
    ///
    /// ```
    /// use m3c2::PointCloud;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let mut cloud = PointCloud::from_positions(&[Point3::new(0.0, 0.0, 0.0)]);
    /// cloud.translate(Vector3::new(0.0, 0.0, 2.0));
    /// assert!((cloud.points[0].z - 2.0).abs() < 1e-12);
    /// ```
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for point in &mut self.points {
            *point += offset;
        }
    }

    /// Downsamples the cloud with a voxel grid filter.
    ///
    /// Points are grouped into cubic voxels of the given size and each voxel
    /// is replaced by the centroid of its points. Useful for producing the
    /// reduced clouds that speed up neighbor search. Voxels are visited in a
    /// fixed order, so the output is deterministic.
    ///
    /// Returns a clone when the cloud is empty or `voxel_size` is not
    /// positive.
    #[must_use]
    pub fn downsample(&self, voxel_size: f64) -> Self {
        if self.points.is_empty() || voxel_size <= 0.0 {
            return self.clone();
        }

        let mut voxels: BTreeMap<(i64, i64, i64), (Vector3<f64>, usize)> = BTreeMap::new();

        for point in &self.points {
            #[allow(clippy::cast_possible_truncation)]
            let key = (
                (point.x / voxel_size).floor() as i64,
                (point.y / voxel_size).floor() as i64,
                (point.z / voxel_size).floor() as i64,
            );

            let entry = voxels.entry(key).or_insert((Vector3::zeros(), 0));
            entry.0 += point.coords;
            entry.1 += 1;
        }

        let points = voxels
            .into_values()
            .map(|(sum, count)| {
                #[allow(clippy::cast_precision_loss)]
                let centroid = sum / count as f64;
                Point3::from(centroid)
            })
            .collect();

        Self { points }
    }
}

impl FromIterator<Point3<f64>> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3<f64>>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
