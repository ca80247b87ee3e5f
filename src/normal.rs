//! Multiscale surface normal estimation.
//!
//! For each candidate radius the neighbors of the core point are gathered
//! and the eigenvector of the smallest eigenvalue of their centered
//! covariance matrix is taken as the normal candidate. Planarity is scored
//! as `1 - lambda_min / lambda_max`; the scale with the best score wins.
//! Auto-selecting the scale instead of fixing it is the defining feature of
//! the M3C2 algorithm.

use nalgebra::{Matrix3, Point3, Vector3};
use tracing::trace;

use crate::cloud::PointCloud;
use crate::index::SpatialIndex;
use crate::solver::EigenSolver;

/// A normal estimated at the best of several candidate scales.
#[derive(Debug, Clone)]
pub struct NormalEstimate {
    /// Unit normal, oriented by the caller's orientation hint.
    pub normal: Vector3<f64>,
    /// The radius that produced the best planarity.
    pub scale: f64,
    /// Planarity score in `[0, 1]`; higher means flatter neighborhood.
    pub planarity: f64,
    /// Neighbor count at the chosen scale.
    pub neighbors: usize,
}

/// Estimates a surface normal at `core` by testing each radius in `scales`.
///
/// Scales with fewer than `min_neighbors` support points are skipped, as are
/// scales where the eigendecomposition fails to converge. A degenerate but
/// supported neighborhood (for example near-colinear points) still yields a
/// normal, just with a low planarity score.
///
/// The sign is resolved against `orientation_hint`: the returned normal
/// satisfies `normal . hint >= 0`. Only the direction of the hint matters;
/// it does not need to be normalized.
///
/// Returns `None` when no scale has sufficient support.
pub fn estimate_normal<S: EigenSolver + ?Sized>(
    core: &Point3<f64>,
    cloud: &PointCloud,
    index: &SpatialIndex,
    scales: &[f64],
    min_neighbors: usize,
    orientation_hint: &Vector3<f64>,
    solver: &S,
) -> Option<NormalEstimate> {
    let mut best: Option<NormalEstimate> = None;

    for &scale in scales {
        let neighbors = index.within(core, scale);
        if neighbors.len() < min_neighbors {
            trace!(scale, count = neighbors.len(), "scale skipped, too few neighbors");
            continue;
        }

        let Some((normal, planarity)) = fit_plane_normal(cloud, &neighbors, solver) else {
            trace!(scale, "scale skipped, eigendecomposition failed");
            continue;
        };

        let better = best.as_ref().map_or(true, |b| planarity > b.planarity);
        if better {
            best = Some(NormalEstimate {
                normal,
                scale,
                planarity,
                neighbors: neighbors.len(),
            });
        }
    }

    let mut estimate = best?;
    if estimate.normal.dot(orientation_hint) < 0.0 {
        estimate.normal = -estimate.normal;
    }
    Some(estimate)
}

/// Computes the unit normal and planarity of one neighborhood.
///
/// Returns `None` when the eigendecomposition does not converge or the
/// covariance has no spatial extent at all (all neighbors coincident).
fn fit_plane_normal<S: EigenSolver + ?Sized>(
    cloud: &PointCloud,
    neighbors: &[usize],
    solver: &S,
) -> Option<(Vector3<f64>, f64)> {
    let centroid: Vector3<f64> = neighbors
        .iter()
        .map(|&i| cloud.points[i].coords)
        .sum::<Vector3<f64>>();
    #[allow(clippy::cast_precision_loss)]
    let centroid = centroid / neighbors.len() as f64;

    let mut covariance = Matrix3::zeros();
    for &i in neighbors {
        let diff = cloud.points[i].coords - centroid;
        covariance += diff * diff.transpose();
    }

    let eigen = solver.eigen3(&covariance)?;

    let lambda_max = eigen.values[eigen.largest_index()];
    if lambda_max <= f64::EPSILON {
        return None;
    }

    let normal = eigen.smallest_eigenvector();
    let norm = normal.norm();
    if norm < 1e-12 {
        return None;
    }

    // Tiny negative eigenvalues occur numerically; clamp the score to [0, 1].
    let planarity = (1.0 - eigen.values[eigen.smallest_index()] / lambda_max).clamp(0.0, 1.0);

    Some((normal / norm, planarity))
}
