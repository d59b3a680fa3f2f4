use thiserror::Error;

/// Rejected knot input. A mesh is never partially built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidMeshError {
    #[error("mesh dimension must be positive")]
    ZeroDimension,

    #[error("expected knot vectors for {expected} axes, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("axis {axis} has {distinct} distinct knots, at least 2 are required")]
    DegenerateAxis { axis: usize, distinct: usize },

    #[error("axis {axis} contains non-finite knot {value}")]
    NonFiniteKnot { axis: usize, value: f64 },

    /// The interval is too narrow to hold a distinct midpoint.
    #[error("interval [{lo}, {hi}] on axis {axis} cannot be split")]
    UnsplittableInterval { axis: usize, lo: f64, hi: f64 },
}

/// Rejected query against an existing mesh.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidQueryError {
    #[error("query has {found} axes, mesh has {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Boxes are `(dim, 2)` arrays of `[lo, hi]` rows.
    #[error("query box has shape {shape:?}, expected (dim, 2)")]
    MalformedBox { shape: Vec<usize> },

    #[error("cell index {index} out of range for mesh with {nelems} cells")]
    CellOutOfRange { index: usize, nelems: usize },

    #[error("interval index {index} out of range on axis {axis} ({count} intervals)")]
    IntervalOutOfRange { axis: usize, index: usize, count: usize },
}

pub type Result<T, E = InvalidMeshError> = std::result::Result<T, E>;
