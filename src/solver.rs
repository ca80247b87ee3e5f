//! Numerical solver seam.
//!
//! The core logic only needs two capabilities from a linear algebra backend:
//! eigendecomposition of a small symmetric matrix and a dense least-squares
//! solve. Both sit behind [`EigenSolver`] so the rest of the crate stays
//! independent of the concrete library. Non-convergence is reported as
//! `None` and treated as a per-point failure by the caller, never as a
//! batch-level error.

use nalgebra::{DMatrix, DVector, Matrix3, SymmetricEigen, Vector3};

/// Eigendecomposition of a symmetric 3x3 matrix.
///
/// Column `i` of `vectors` is the eigenvector for `values[i]`. Neither is
/// sorted; use [`Eigen3::smallest_index`] and [`Eigen3::largest_index`].
#[derive(Debug, Clone)]
pub struct Eigen3 {
    /// The three eigenvalues.
    pub values: Vector3<f64>,
    /// Eigenvectors as matrix columns, aligned with `values`.
    pub vectors: Matrix3<f64>,
}

impl Eigen3 {
    /// Returns the index of the smallest eigenvalue.
    #[must_use]
    pub fn smallest_index(&self) -> usize {
        if self.values[0] <= self.values[1] && self.values[0] <= self.values[2] {
            0
        } else if self.values[1] <= self.values[2] {
            1
        } else {
            2
        }
    }

    /// Returns the index of the largest eigenvalue.
    #[must_use]
    pub fn largest_index(&self) -> usize {
        if self.values[0] >= self.values[1] && self.values[0] >= self.values[2] {
            0
        } else if self.values[1] >= self.values[2] {
            1
        } else {
            2
        }
    }

    /// Returns the eigenvector for the smallest eigenvalue.
    #[must_use]
    pub fn smallest_eigenvector(&self) -> Vector3<f64> {
        self.vectors.column(self.smallest_index()).into_owned()
    }
}

/// Narrow capability interface over a numerical backend.
///
/// Implementations must be reentrant (or internally serialized); the driver
/// calls them concurrently from worker threads.
pub trait EigenSolver: Sync {
    /// Eigendecomposes a symmetric 3x3 matrix.
    ///
    /// Returns `None` when the decomposition does not converge.
    fn eigen3(&self, matrix: &Matrix3<f64>) -> Option<Eigen3>;

    /// Solves the least-squares problem `min ||Ax - b||`.
    ///
    /// Not used by the distance computation itself, but available to callers
    /// needing plane-fit refinements. Returns `None` when the system is
    /// unsolvable at the backend's tolerance.
    fn least_squares(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>>;
}

/// Default solver backed by nalgebra.
#[derive(Debug, Clone, Copy, Default)]
pub struct NalgebraSolver;

impl EigenSolver for NalgebraSolver {
    fn eigen3(&self, matrix: &Matrix3<f64>) -> Option<Eigen3> {
        SymmetricEigen::try_new(*matrix, 1.0e-12, 200).map(|eigen| Eigen3 {
            values: eigen.eigenvalues,
            vectors: eigen.eigenvectors,
        })
    }

    fn least_squares(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
        a.clone().svd(true, true).solve(b, 1.0e-12).ok()
    }
}
