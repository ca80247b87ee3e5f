//! Parameters for an M3C2 computation.

use std::path::PathBuf;

use nalgebra::Vector3;

use crate::cylinder::CylinderSpec;
use crate::error::{M3c2Error, M3c2Result};

/// Hard lower bound on the neighbor count needed for a covariance estimate.
pub const MIN_NEIGHBOR_FLOOR: usize = 3;

/// How the sign ambiguity of estimated normals is resolved.
///
/// Eigenvectors come with an arbitrary sign; a normal is flipped whenever it
/// points toward the orientation reference instead of away from it.
#[derive(Debug, Clone, PartialEq)]
pub enum OrientationPolicy {
    /// Orient each normal away from the nearest point of the external cloud
    /// (typically scanner positions or a reference surface).
    NearestExternal,

    /// Orient every normal into the half-space of a fixed global direction.
    /// The external cloud is ignored.
    Fixed(Vector3<f64>),
}

/// Parameters for [`crate::compute`], validated once before any per-point
/// work begins.
///
/// # Example
///
/// ```
/// use m3c2::M3c2Params;
///
/// let params = M3c2Params::default()
///     .with_scales(vec![0.5, 1.0, 2.0])
///     .with_cylinder_radius(0.5)
///     .with_cylinder_length(4.0);
///
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct M3c2Params {
    /// Candidate neighborhood radii for normal estimation, strictly
    /// ascending and positive.
    pub scales: Vec<f64>,

    /// Radius of the projection cylinder. Must be positive.
    pub cylinder_radius: f64,

    /// Full length of the projection cylinder along the normal axis.
    /// Zero means unbounded.
    pub cylinder_length: f64,

    /// Minimum neighbor count for a scale to produce a normal candidate.
    /// Must be at least [`MIN_NEIGHBOR_FLOOR`]; 6 or more is recommended.
    pub min_neighbors: usize,

    /// How normal signs are resolved.
    pub orientation: OrientationPolicy,

    /// Minimum detectable distance. When the per-cloud dispersion estimate
    /// degenerates (single-sample subsets), significance falls back to a
    /// direct comparison against this threshold.
    pub min_distance: f64,

    /// Destination for the exported result cloud. `None` disables export.
    pub result_path: Option<PathBuf>,
}

impl Default for M3c2Params {
    fn default() -> Self {
        Self {
            scales: vec![0.5, 1.0, 2.0],
            cylinder_radius: 0.5,
            cylinder_length: 0.0,
            min_neighbors: 6,
            orientation: OrientationPolicy::NearestExternal,
            min_distance: 0.0,
            result_path: None,
        }
    }
}

impl M3c2Params {
    /// Sets the candidate scales.
    #[must_use]
    pub fn with_scales(mut self, scales: Vec<f64>) -> Self {
        self.scales = scales;
        self
    }

    /// Sets the cylinder radius.
    #[must_use]
    pub const fn with_cylinder_radius(mut self, radius: f64) -> Self {
        self.cylinder_radius = radius;
        self
    }

    /// Sets the cylinder length (0 = unbounded).
    #[must_use]
    pub const fn with_cylinder_length(mut self, length: f64) -> Self {
        self.cylinder_length = length;
        self
    }

    /// Sets the minimum neighbor count for normal estimation.
    #[must_use]
    pub const fn with_min_neighbors(mut self, count: usize) -> Self {
        self.min_neighbors = count;
        self
    }

    /// Sets the normal orientation policy.
    #[must_use]
    pub fn with_orientation(mut self, policy: OrientationPolicy) -> Self {
        self.orientation = policy;
        self
    }

    /// Sets the minimum detectable distance.
    #[must_use]
    pub const fn with_min_distance(mut self, distance: f64) -> Self {
        self.min_distance = distance;
        self
    }

    /// Sets the result export destination.
    #[must_use]
    pub fn with_result_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.result_path = Some(path.into());
        self
    }

    /// Returns the cylinder specification described by these parameters.
    #[must_use]
    pub const fn cylinder_spec(&self) -> CylinderSpec {
        CylinderSpec::new(self.cylinder_radius, self.cylinder_length)
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`M3c2Error::InvalidParams`] when the scale set is empty, not
    /// strictly ascending or not positive, the cylinder radius is not
    /// positive, the cylinder length is negative, or the neighbor count is
    /// below [`MIN_NEIGHBOR_FLOOR`].
    pub fn validate(&self) -> M3c2Result<()> {
        if self.scales.is_empty() {
            return Err(M3c2Error::invalid_params("scale set is empty"));
        }
        for pair in self.scales.windows(2) {
            if pair[1] <= pair[0] {
                return Err(M3c2Error::invalid_params(
                    "scales must be strictly ascending",
                ));
            }
        }
        if self.scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(M3c2Error::invalid_params(
                "scales must be positive and finite",
            ));
        }
        if !self.cylinder_radius.is_finite() || self.cylinder_radius <= 0.0 {
            return Err(M3c2Error::invalid_params(format!(
                "cylinder radius must be positive, got {}",
                self.cylinder_radius
            )));
        }
        if !self.cylinder_length.is_finite() || self.cylinder_length < 0.0 {
            return Err(M3c2Error::invalid_params(format!(
                "cylinder length must be non-negative, got {}",
                self.cylinder_length
            )));
        }
        if self.min_neighbors < MIN_NEIGHBOR_FLOOR {
            return Err(M3c2Error::invalid_params(format!(
                "min_neighbors must be at least {MIN_NEIGHBOR_FLOOR}, got {}",
                self.min_neighbors
            )));
        }
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err(M3c2Error::invalid_params(
                "min_distance must be non-negative",
            ));
        }
        Ok(())
    }
}
