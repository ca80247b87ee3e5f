//! Signed distance and significance computation.
//!
//! Both cylinder subsets are projected onto the normal axis; the signed
//! distance is the difference of the mean projections (cloud 2 relative to
//! cloud 1). The limit of detection combines both clouds' local roughness
//! and sample sizes at 95% confidence, assuming Gaussian roughness and
//! independence between the clouds.

use nalgebra::{Point3, Vector3};

use crate::cloud::PointCloud;

/// 95% confidence multiplier for the limit of detection.
const CONFIDENCE_MULTIPLIER: f64 = 1.96;

/// Projection statistics of one cylinder subset along the normal axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionStats {
    /// Number of projected points.
    pub count: usize,
    /// Mean signed projection, offset from the core point.
    pub mean: f64,
    /// Sample standard deviation of the projections. Zero when only one
    /// point was sampled, since no dispersion estimate is possible.
    pub std_dev: f64,
}

/// Result of measuring one core point against both clouds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Signed distance `mean_2 - mean_1` along the outward normal.
    pub distance: f64,
    /// Limit of detection at 95% confidence.
    pub lod: f64,
    /// True when `|distance|` exceeds the LOD (or the caller's minimum
    /// detectable threshold, whichever is larger).
    pub significant: bool,
    /// Projection statistics for cloud 1.
    pub stats1: ProjectionStats,
    /// Projection statistics for cloud 2.
    pub stats2: ProjectionStats,
}

/// Projects `subset` of `cloud` onto the `axis` through `core` and returns
/// its statistics, or `None` when the subset is empty.
#[must_use]
pub fn project_onto_axis(
    cloud: &PointCloud,
    subset: &[usize],
    core: &Point3<f64>,
    axis: &Vector3<f64>,
) -> Option<ProjectionStats> {
    if subset.is_empty() {
        return None;
    }

    let projections: Vec<f64> = subset
        .iter()
        .map(|&i| (cloud.points[i] - core).dot(axis))
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let n = projections.len() as f64;
    let mean = projections.iter().sum::<f64>() / n;

    let std_dev = if projections.len() > 1 {
        let variance = projections.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    } else {
        0.0
    };

    Some(ProjectionStats {
        count: projections.len(),
        mean,
        std_dev,
    })
}

/// Measures the signed offset between the two clouds at one core point.
///
/// `min_distance` is the caller's minimum detectable threshold; significance
/// degrades to a direct comparison against it when the dispersion estimate
/// is degenerate.
///
/// Returns `None` when either subset is empty; an explicit no-data outcome,
/// never a fabricated zero.
#[must_use]
pub fn measure(
    core: &Point3<f64>,
    axis: &Vector3<f64>,
    cloud1: &PointCloud,
    subset1: &[usize],
    cloud2: &PointCloud,
    subset2: &[usize],
    min_distance: f64,
) -> Option<Measurement> {
    let stats1 = project_onto_axis(cloud1, subset1, core, axis)?;
    let stats2 = project_onto_axis(cloud2, subset2, core, axis)?;

    let distance = stats2.mean - stats1.mean;
    let lod = limit_of_detection(&stats1, &stats2);
    let significant = distance.abs() > lod.max(min_distance);

    Some(Measurement {
        distance,
        lod,
        significant,
        stats1,
        stats2,
    })
}

/// `LOD = 1.96 * sqrt(s1^2/n1 + s2^2/n2)`.
fn limit_of_detection(stats1: &ProjectionStats, stats2: &ProjectionStats) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let pooled = stats1.std_dev.powi(2) / stats1.count as f64
        + stats2.std_dev.powi(2) / stats2.count as f64;
    CONFIDENCE_MULTIPLIER * pooled.sqrt()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cloud_from_z(zs: &[f64]) -> PointCloud {
        zs.iter().map(|&z| Point3::new(0.0, 0.0, z)).collect()
    }

    #[test]
    fn test_projection_stats() {
        let cloud = cloud_from_z(&[1.0, 2.0, 3.0]);
        let subset = [0, 1, 2];
        let stats =
            project_onto_axis(&cloud, &subset, &Point3::origin(), &Vector3::z()).unwrap();

        assert_eq!(stats.count, 3);
        assert_relative_eq!(stats.mean, 2.0);
        assert_relative_eq!(stats.std_dev, 1.0);
    }

    #[test]
    fn test_projection_single_point_zero_std() {
        let cloud = cloud_from_z(&[5.0]);
        let stats = project_onto_axis(&cloud, &[0], &Point3::origin(), &Vector3::z()).unwrap();

        assert_eq!(stats.count, 1);
        assert_relative_eq!(stats.mean, 5.0);
        assert_relative_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_projection_empty_subset() {
        let cloud = cloud_from_z(&[1.0]);
        assert!(project_onto_axis(&cloud, &[], &Point3::origin(), &Vector3::z()).is_none());
    }

    #[test]
    fn test_measure_translation() {
        let cloud1 = cloud_from_z(&[-0.01, 0.0, 0.01]);
        let cloud2 = cloud_from_z(&[0.99, 1.0, 1.01]);
        let subset = [0, 1, 2];

        let m = measure(
            &Point3::origin(),
            &Vector3::z(),
            &cloud1,
            &subset,
            &cloud2,
            &subset,
            0.0,
        )
        .unwrap();

        assert_relative_eq!(m.distance, 1.0, epsilon = 1e-12);
        assert!(m.significant);
        assert!(m.lod < 0.1);
    }

    #[test]
    fn test_measure_swapping_clouds_negates_distance() {
        let cloud1 = cloud_from_z(&[0.0, 0.02, -0.02]);
        let cloud2 = cloud_from_z(&[0.5, 0.52, 0.48]);
        let subset = [0, 1, 2];
        let core = Point3::origin();
        let axis = Vector3::z();

        let forward = measure(&core, &axis, &cloud1, &subset, &cloud2, &subset, 0.0).unwrap();
        let backward = measure(&core, &axis, &cloud2, &subset, &cloud1, &subset, 0.0).unwrap();

        assert_relative_eq!(forward.distance, -backward.distance, epsilon = 1e-12);
        assert_relative_eq!(forward.lod, backward.lod, epsilon = 1e-12);
    }

    #[test]
    fn test_measure_insignificant_when_below_lod() {
        // Rough clouds, tiny offset: must not be flagged significant.
        let zs1: Vec<f64> = (0..20).map(|i| (i as f64 * 0.9).sin() * 0.5).collect();
        let zs2: Vec<f64> = zs1.iter().map(|z| z + 0.01).collect();
        let cloud1 = cloud_from_z(&zs1);
        let cloud2 = cloud_from_z(&zs2);
        let subset: Vec<usize> = (0..20).collect();

        let m = measure(
            &Point3::origin(),
            &Vector3::z(),
            &cloud1,
            &subset,
            &cloud2,
            &subset,
            0.0,
        )
        .unwrap();

        assert!(m.lod > 0.01);
        assert!(!m.significant);
    }

    #[test]
    fn test_measure_empty_subset_is_none() {
        let cloud = cloud_from_z(&[1.0]);
        let m = measure(
            &Point3::origin(),
            &Vector3::z(),
            &cloud,
            &[0],
            &cloud,
            &[],
            0.0,
        );
        assert!(m.is_none());
    }

    #[test]
    fn test_single_sample_degrades_to_min_distance() {
        let cloud1 = cloud_from_z(&[0.0]);
        let cloud2 = cloud_from_z(&[0.05]);

        // Both subsets have one point: LOD is 0 and the min_distance
        // threshold decides significance.
        let m = measure(
            &Point3::origin(),
            &Vector3::z(),
            &cloud1,
            &[0],
            &cloud2,
            &[0],
            0.1,
        )
        .unwrap();
        assert_relative_eq!(m.lod, 0.0);
        assert!(!m.significant);

        let m = measure(
            &Point3::origin(),
            &Vector3::z(),
            &cloud1,
            &[0],
            &cloud2,
            &[0],
            0.01,
        )
        .unwrap();
        assert!(m.significant);
    }
}
