//! Multiscale Model-to-Model Cloud Comparison (M3C2) for 3D point clouds.
//!
//! This crate measures the signed distance between two co-registered point
//! clouds at a set of "core" points. For each core point it:
//!
//! 1. Estimates a robust local surface normal by testing several neighborhood
//!    radii (scales) and keeping the one with the best planarity.
//! 2. Samples both clouds inside a cylinder aligned to that normal.
//! 3. Projects the sampled points onto the normal axis and reports the signed
//!    offset between the two clouds, together with a 95% limit of detection
//!    (LOD) that accounts for local surface roughness and sample size.
//!
//! Core points are independent of each other, so the whole batch runs in
//! parallel. Failed points (too few neighbors, empty cylinder) are recorded
//! as explicitly undefined entries and never abort the computation.
//!
//! # Example
//!
//! ```
//! use m3c2::{compute, M3c2Params, PointCloud};
//! use nalgebra::Point3;
//!
//! // A flat 20x20 grid and a copy lifted by 0.5 along z.
//! let positions: Vec<_> = (0..20)
//!     .flat_map(|i| (0..20).map(move |j| {
//!         let z = (i * 20 + j) as f64 * 1e-4;
//!         Point3::new(i as f64 * 0.1, j as f64 * 0.1, z)
//!     }))
//!     .collect();
//! let cloud1 = PointCloud::from_positions(&positions);
//! let mut cloud2 = cloud1.clone();
//! cloud2.translate(nalgebra::Vector3::new(0.0, 0.0, 0.5));
//!
//! let cores = PointCloud::from_positions(&[Point3::new(1.0, 1.0, 0.0)]);
//! // A point below the surface; normals are oriented away from it.
//! let externals = PointCloud::from_positions(&[Point3::new(1.0, 1.0, -10.0)]);
//!
//! let params = M3c2Params::default()
//!     .with_scales(vec![0.5, 1.0])
//!     .with_cylinder_radius(0.3);
//!
//! let empty = PointCloud::new();
//! let result = compute(&cloud1, &empty, &cloud2, &empty, &cores, &externals, &params).unwrap();
//!
//! let distance = result.results[0].distance.unwrap();
//! assert!((distance - 0.5).abs() < 0.01);
//! ```
//!
//! # Inputs
//!
//! [`compute`] takes six clouds: the two full clouds being compared, an
//! optional reduced (subsampled) version of each used to speed neighbor
//! search, the core points where measurements are taken, and an external
//! cloud used only to orient normals consistently (for example scanner
//! positions). Pass an empty cloud to search the full cloud directly.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod cloud;
mod cylinder;
mod distance;
mod driver;
mod error;
mod index;
mod normal;
mod params;
mod result;
mod solver;

pub mod io;

pub use cloud::PointCloud;
pub use cylinder::{sample_cylinder, CylinderSpec};
pub use distance::{measure, Measurement, ProjectionStats};
pub use driver::{compute, compute_with_solver};
pub use error::{M3c2Error, M3c2Result};
pub use index::SpatialIndex;
pub use normal::{estimate_normal, NormalEstimate};
pub use params::{M3c2Params, OrientationPolicy, MIN_NEIGHBOR_FLOOR};
pub use result::{ComparisonResult, CorePointResult, CorePointStatus};
pub use solver::{Eigen3, EigenSolver, NalgebraSolver};
