//! Batch orchestration.
//!
//! Validates the configuration once, builds the spatial indices, then runs
//! every core point through the normal estimation / cylinder sampling /
//! distance pipeline. Core points are independent, so the batch is processed
//! in parallel; results land in core-point order regardless of scheduling.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cloud::PointCloud;
use crate::cylinder::{sample_cylinder, CylinderSpec};
use crate::distance::measure;
use crate::error::{M3c2Error, M3c2Result};
use crate::index::SpatialIndex;
use crate::normal::estimate_normal;
use crate::params::{M3c2Params, OrientationPolicy};
use crate::result::{ComparisonResult, CorePointResult};
use crate::solver::{EigenSolver, NalgebraSolver};

/// Runs an M3C2 comparison with the default nalgebra solver.
///
/// `cloud1_reduced` and `cloud2_reduced` are optional subsampled stand-ins
/// used for neighbor search; pass an empty cloud to search the corresponding
/// full cloud directly. `externals` orients normals when the policy is
/// [`OrientationPolicy::NearestExternal`].
///
/// On success the result has exactly one entry per core point, index
/// aligned. Per-point failures are recorded in those entries and never fail
/// the batch.
///
/// # Errors
///
/// Returns an error before any per-point work when the parameters are
/// invalid, a required cloud is empty, or (afterwards) the result export
/// fails. No partial results are produced on error.
pub fn compute(
    cloud1: &PointCloud,
    cloud1_reduced: &PointCloud,
    cloud2: &PointCloud,
    cloud2_reduced: &PointCloud,
    cores: &PointCloud,
    externals: &PointCloud,
    params: &M3c2Params,
) -> M3c2Result<ComparisonResult> {
    compute_with_solver(
        cloud1,
        cloud1_reduced,
        cloud2,
        cloud2_reduced,
        cores,
        externals,
        params,
        &NalgebraSolver,
    )
}

/// Runs an M3C2 comparison with a caller-supplied solver backend.
///
/// The solver is shared across worker threads and must be reentrant or
/// internally serialized.
///
/// # Errors
///
/// Same contract as [`compute`].
#[allow(clippy::too_many_arguments)]
pub fn compute_with_solver<S: EigenSolver>(
    cloud1: &PointCloud,
    cloud1_reduced: &PointCloud,
    cloud2: &PointCloud,
    cloud2_reduced: &PointCloud,
    cores: &PointCloud,
    externals: &PointCloud,
    params: &M3c2Params,
    solver: &S,
) -> M3c2Result<ComparisonResult> {
    params.validate()?;

    if cloud1.is_empty() {
        return Err(M3c2Error::EmptyCloud("first"));
    }
    if cloud2.is_empty() {
        return Err(M3c2Error::EmptyCloud("second"));
    }
    if cores.is_empty() {
        return Err(M3c2Error::EmptyCloud("core"));
    }
    if params.orientation == OrientationPolicy::NearestExternal && externals.is_empty() {
        return Err(M3c2Error::invalid_params(
            "orientation policy NearestExternal requires a non-empty external cloud",
        ));
    }

    // Reduced clouds stand in for the full ones during neighbor search.
    let search1 = if cloud1_reduced.is_empty() {
        cloud1
    } else {
        cloud1_reduced
    };
    let search2 = if cloud2_reduced.is_empty() {
        cloud2
    } else {
        cloud2_reduced
    };

    info!(
        cores = cores.len(),
        cloud1 = search1.len(),
        cloud2 = search2.len(),
        scales = params.scales.len(),
        cylinder_radius = params.cylinder_radius,
        "starting M3C2 comparison"
    );

    let index1 = SpatialIndex::build(search1);
    let index2 = SpatialIndex::build(search2);
    let ext_index = match params.orientation {
        OrientationPolicy::NearestExternal => Some(SpatialIndex::build(externals)),
        OrientationPolicy::Fixed(_) => None,
    };
    debug!("spatial indices built");

    let spec = params.cylinder_spec();

    let results: Vec<CorePointResult> = cores
        .points
        .par_iter()
        .map(|core| {
            process_core_point(
                core,
                search1,
                &index1,
                search2,
                &index2,
                externals,
                ext_index.as_ref(),
                params,
                &spec,
                solver,
            )
        })
        .collect();

    let result = ComparisonResult { results };

    let undefined = result.len() - result.measured_count();
    if undefined == 0 {
        info!(
            measured = result.measured_count(),
            significant = result.significant_count(),
            "comparison complete"
        );
    } else {
        warn!(
            measured = result.measured_count(),
            normal_failures = result.normal_failed_count(),
            sample_failures = result.measure_failed_count(),
            "comparison complete with undefined entries"
        );
    }

    if let Some(path) = &params.result_path {
        crate::io::save_result(&result, path)?;
    }

    Ok(result)
}

/// Processes one core point. Pure given read-only inputs; invoked
/// concurrently from worker threads.
#[allow(clippy::too_many_arguments)]
fn process_core_point<S: EigenSolver>(
    core: &Point3<f64>,
    search1: &PointCloud,
    index1: &SpatialIndex,
    search2: &PointCloud,
    index2: &SpatialIndex,
    externals: &PointCloud,
    ext_index: Option<&SpatialIndex>,
    params: &M3c2Params,
    spec: &CylinderSpec,
    solver: &S,
) -> CorePointResult {
    let hint = orientation_hint(core, &params.orientation, externals, ext_index);

    let Some(estimate) = estimate_normal(
        core,
        search1,
        index1,
        &params.scales,
        params.min_neighbors,
        &hint,
        solver,
    ) else {
        return CorePointResult::normal_failed(*core);
    };

    let subset1 = sample_cylinder(search1, index1, core, &estimate.normal, spec);
    let subset2 = sample_cylinder(search2, index2, core, &estimate.normal, spec);

    match measure(
        core,
        &estimate.normal,
        search1,
        &subset1,
        search2,
        &subset2,
        params.min_distance,
    ) {
        Some(measurement) => CorePointResult::measured(*core, &estimate, &measurement),
        None => CorePointResult::measure_failed(*core, &estimate),
    }
}

/// Direction the normal should agree with at `core`.
///
/// For the nearest-external policy this is the direction from the closest
/// external point toward the core point, so normals point away from the
/// reference. The vector is not normalized; only its sign matters.
fn orientation_hint(
    core: &Point3<f64>,
    policy: &OrientationPolicy,
    externals: &PointCloud,
    ext_index: Option<&SpatialIndex>,
) -> Vector3<f64> {
    match policy {
        OrientationPolicy::Fixed(direction) => *direction,
        OrientationPolicy::NearestExternal => ext_index
            .and_then(|index| index.nearest(core))
            .map_or_else(Vector3::zeros, |i| core - externals.points[i]),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use crate::result::CorePointStatus;
    use crate::solver::Eigen3;
    use nalgebra::{DMatrix, DVector, Matrix3};

    fn make_flat_cloud(n: usize, z0: f64) -> PointCloud {
        (0..n)
            .flat_map(|i| {
                (0..n).map(move |j| {
                    let jitter = (i * n + j) as f64 * 1e-5;
                    Point3::new(i as f64 * 0.1, j as f64 * 0.1, z0 + jitter)
                })
            })
            .collect()
    }

    fn test_params() -> M3c2Params {
        M3c2Params::default()
            .with_scales(vec![0.5, 1.0])
            .with_cylinder_radius(0.3)
    }

    #[test]
    fn test_compute_rejects_empty_inputs() {
        let cloud = make_flat_cloud(10, 0.0);
        let empty = PointCloud::new();
        let externals = PointCloud::from_positions(&[Point3::new(0.0, 0.0, -10.0)]);
        let params = test_params();

        assert!(compute(&empty, &empty, &cloud, &empty, &cloud, &externals, &params).is_err());
        assert!(compute(&cloud, &empty, &empty, &empty, &cloud, &externals, &params).is_err());
        assert!(compute(&cloud, &empty, &cloud, &empty, &empty, &externals, &params).is_err());
        // NearestExternal orientation needs external points.
        assert!(compute(&cloud, &empty, &cloud, &empty, &cloud, &empty, &params).is_err());
    }

    #[test]
    fn test_compute_rejects_bad_params() {
        let cloud = make_flat_cloud(10, 0.0);
        let empty = PointCloud::new();
        let externals = PointCloud::from_positions(&[Point3::new(0.0, 0.0, -10.0)]);
        let params = test_params().with_scales(Vec::new());

        let result = compute(&cloud, &empty, &cloud, &empty, &cloud, &externals, &params);
        assert!(matches!(result, Err(M3c2Error::InvalidParams(_))));
    }

    #[test]
    fn test_fixed_orientation_needs_no_externals() {
        let cloud = make_flat_cloud(10, 0.0);
        let empty = PointCloud::new();
        let cores = PointCloud::from_positions(&[Point3::new(0.4, 0.4, 0.0)]);
        let params = test_params().with_orientation(OrientationPolicy::Fixed(Vector3::z()));

        let result =
            compute(&cloud, &empty, &cloud, &empty, &cores, &empty, &params).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.results[0].normal.unwrap().z > 0.99);
    }

    #[test]
    fn test_reduced_cloud_used_for_search() {
        let cloud = make_flat_cloud(20, 0.0);
        let reduced = cloud.downsample(0.15);
        let empty = PointCloud::new();
        let cores = PointCloud::from_positions(&[Point3::new(1.0, 1.0, 0.0)]);
        let externals = PointCloud::from_positions(&[Point3::new(1.0, 1.0, -10.0)]);
        let params = test_params();

        let result = compute(
            &cloud, &reduced, &cloud, &reduced, &cores, &externals, &params,
        )
        .unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.results[0].is_measured());
    }

    #[test]
    fn test_diverging_solver_marks_points_not_batch() {
        struct DivergingSolver;

        impl EigenSolver for DivergingSolver {
            fn eigen3(&self, _matrix: &Matrix3<f64>) -> Option<Eigen3> {
                None
            }

            fn least_squares(&self, _a: &DMatrix<f64>, _b: &DVector<f64>) -> Option<DVector<f64>> {
                None
            }
        }

        let cloud = make_flat_cloud(10, 0.0);
        let empty = PointCloud::new();
        let cores = PointCloud::from_positions(&[
            Point3::new(0.4, 0.4, 0.0),
            Point3::new(0.5, 0.5, 0.0),
        ]);
        let externals = PointCloud::from_positions(&[Point3::new(0.4, 0.4, -10.0)]);

        // Solver failures degrade individual entries; the batch still succeeds.
        let result = compute_with_solver(
            &cloud,
            &empty,
            &cloud,
            &empty,
            &cores,
            &externals,
            &test_params(),
            &DivergingSolver,
        )
        .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.normal_failed_count(), 2);
        for entry in &result.results {
            assert_eq!(entry.status, CorePointStatus::NormalFailed);
            assert!(entry.normal.is_none());
            assert!(entry.distance.is_none());
        }
    }

    #[test]
    fn test_orientation_hint_nearest_external() {
        let externals = PointCloud::from_positions(&[
            Point3::new(0.0, 0.0, -5.0),
            Point3::new(100.0, 0.0, 5.0),
        ]);
        let index = SpatialIndex::build(&externals);
        let core = Point3::new(0.0, 0.0, 0.0);

        let hint = orientation_hint(
            &core,
            &OrientationPolicy::NearestExternal,
            &externals,
            Some(&index),
        );
        // Nearest external point is below, so the hint points up.
        assert!(hint.z > 0.0);
    }
}
