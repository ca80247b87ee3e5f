//! Result types for a comparison batch.

use nalgebra::{Point3, Vector3};

use crate::distance::Measurement;
use crate::normal::NormalEstimate;

/// Outcome of processing one core point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorePointStatus {
    /// Normal and distance were both computed.
    Measured,
    /// No scale had enough neighbors for a normal; nothing was measured.
    NormalFailed,
    /// A normal was found but a cylinder subset was empty on at least one
    /// cloud.
    MeasureFailed,
}

/// Per-core-point measurement record.
///
/// Undefined fields are explicit `None`s, never silently-defaulted zeros.
#[derive(Debug, Clone)]
pub struct CorePointResult {
    /// Position of the core point.
    pub position: Point3<f64>,
    /// Oriented unit normal, when estimation succeeded.
    pub normal: Option<Vector3<f64>>,
    /// The scale that won the planarity selection.
    pub scale: Option<f64>,
    /// Planarity score of the chosen scale, in `[0, 1]`.
    pub planarity: Option<f64>,
    /// Signed distance along the normal, when measured.
    pub distance: Option<f64>,
    /// Limit of detection at 95% confidence, when measured.
    pub lod: Option<f64>,
    /// True when the distance exceeds the detection threshold.
    pub significant: bool,
    /// What happened at this core point.
    pub status: CorePointStatus,
}

impl CorePointResult {
    /// Record for a core point where no normal could be estimated.
    #[must_use]
    pub const fn normal_failed(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: None,
            scale: None,
            planarity: None,
            distance: None,
            lod: None,
            significant: false,
            status: CorePointStatus::NormalFailed,
        }
    }

    /// Record for a core point whose cylinder sample was empty on at least
    /// one cloud.
    #[must_use]
    pub fn measure_failed(position: Point3<f64>, estimate: &NormalEstimate) -> Self {
        Self {
            position,
            normal: Some(estimate.normal),
            scale: Some(estimate.scale),
            planarity: Some(estimate.planarity),
            distance: None,
            lod: None,
            significant: false,
            status: CorePointStatus::MeasureFailed,
        }
    }

    /// Record for a fully measured core point.
    #[must_use]
    pub fn measured(
        position: Point3<f64>,
        estimate: &NormalEstimate,
        measurement: &Measurement,
    ) -> Self {
        Self {
            position,
            normal: Some(estimate.normal),
            scale: Some(estimate.scale),
            planarity: Some(estimate.planarity),
            distance: Some(measurement.distance),
            lod: Some(measurement.lod),
            significant: measurement.significant,
            status: CorePointStatus::Measured,
        }
    }

    /// True when this entry carries a distance.
    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.status == CorePointStatus::Measured
    }
}

/// Result of one comparison batch, index-aligned with the core point cloud.
///
/// Entry `i` corresponds to core point `i` regardless of the processing
/// order or parallel scheduling.
#[derive(Debug, Clone, Default)]
pub struct ComparisonResult {
    /// One record per core point.
    pub results: Vec<CorePointResult>,
}

impl ComparisonResult {
    /// Returns the number of core point records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of fully measured core points.
    #[must_use]
    pub fn measured_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_measured()).count()
    }

    /// Number of core points without a normal.
    #[must_use]
    pub fn normal_failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == CorePointStatus::NormalFailed)
            .count()
    }

    /// Number of core points with a normal but no measurable distance.
    #[must_use]
    pub fn measure_failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == CorePointStatus::MeasureFailed)
            .count()
    }

    /// Number of measured core points flagged as significant change.
    #[must_use]
    pub fn significant_count(&self) -> usize {
        self.results.iter().filter(|r| r.significant).count()
    }

    /// Percentage of core points with a defined distance.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_percent(&self) -> f64 {
        if self.results.is_empty() {
            0.0
        } else {
            100.0 * self.measured_count() as f64 / self.results.len() as f64
        }
    }

    /// Per-core-point distances, index-aligned with the core cloud.
    #[must_use]
    pub fn distances(&self) -> Vec<Option<f64>> {
        self.results.iter().map(|r| r.distance).collect()
    }

    /// Per-core-point normals, index-aligned with the core cloud.
    #[must_use]
    pub fn normals(&self) -> Vec<Option<Vector3<f64>>> {
        self.results.iter().map(|r| r.normal).collect()
    }
}

impl std::fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "M3C2 comparison:")?;
        writeln!(f, "  Core points:     {}", self.len())?;
        writeln!(f, "  Measured:        {}", self.measured_count())?;
        writeln!(f, "  Normal failures: {}", self.normal_failed_count())?;
        writeln!(f, "  Sample failures: {}", self.measure_failed_count())?;
        writeln!(f, "  Significant:     {}", self.significant_count())?;
        writeln!(f, "  Coverage:        {:.1}%", self.coverage_percent())?;
        Ok(())
    }
}
