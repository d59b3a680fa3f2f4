//! Tensor-product Cartesian meshes over parametric domains of any dimension.
//!
//! A [`CartesianMesh`] is spanned by one [`KnotVector`] per axis. Its cells are
//! axis-aligned boxes with one `[lo, hi]` row per axis. The mesh can be refined
//! dyadically and queried for the cells lying inside a box.
//!
//! ```
//! use cartesian_mesh::CartesianMesh;
//! use ndarray::arr2;
//!
//! let mesh = CartesianMesh::new(vec![vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]], 2).unwrap();
//! let fine = mesh.refine().unwrap();
//! assert_eq!(fine.nelems(), 16);
//! let inside = fine.get_sub_elements(&arr2(&[[0.0, 1.0], [0.0, 1.0]]).view()).unwrap();
//! assert_eq!(inside, vec![0, 1, 4, 5]);
//! ```

pub mod cell;
pub mod error;
pub mod knots;
pub mod mesh;
pub mod quadrature;

pub use cell::Cell;
pub use error::{InvalidMeshError, InvalidQueryError, Result};
pub use knots::KnotVector;
pub use mesh::{CartesianMesh, Mesh};
pub use quadrature::QuadratureRule;
