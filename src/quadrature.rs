//! Seam for numerical-integration collaborators.
//!
//! The mesh does not generate quadrature rules. A rule supplies points on the
//! reference cell `[-1, 1]^dim` and the mesh maps them into its cells, see
//! [`CartesianMesh::get_gauss_points`](crate::CartesianMesh::get_gauss_points).

use ndarray::{Array1, Array2};

pub trait QuadratureRule {
    /// Reference points, one row of length `dim` per point.
    fn reference_points(&self, dim: usize) -> Array2<f64>;

    /// Weights matching the rows of [`QuadratureRule::reference_points`].
    fn weights(&self, dim: usize) -> Array1<f64>;
}
