use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::InvalidQueryError;

/// Axis-aligned bounding box, one `[lo, hi]` row per axis.
///
/// The same `(dim, 2)` layout is used for cells of every dimension and for
/// query boxes. Column 0 is the min corner, column 1 the max corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    bounds: Array2<f64>,
}

impl Cell {
    /// Builds a box from `(lo, hi)` pairs. Bounds are taken as given.
    pub fn from_intervals<I>(intervals: I) -> Cell
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let pairs: Vec<(f64, f64)> = intervals.into_iter().collect();
        let bounds = Array2::from_shape_fn((pairs.len(), 2), |(axis, side)| {
            if side == 0 { pairs[axis].0 } else { pairs[axis].1 }
        });
        return Cell { bounds };
    }

    /// Wraps a `(dim, 2)` array.
    pub fn from_bounds(bounds: Array2<f64>) -> Result<Cell, InvalidQueryError> {
        if bounds.ncols() != 2 {
            return Err(InvalidQueryError::MalformedBox { shape: bounds.shape().to_vec() });
        }
        return Ok(Cell { bounds });
    }

    pub fn dim(&self) -> usize {
        self.bounds.nrows()
    }

    pub fn lower(&self, axis: usize) -> f64 {
        self.bounds[[axis, 0]]
    }

    pub fn upper(&self, axis: usize) -> f64 {
        self.bounds[[axis, 1]]
    }

    pub fn extent(&self, axis: usize) -> f64 {
        self.upper(axis) - self.lower(axis)
    }

    pub fn bounds(&self) -> ArrayView2<'_, f64> {
        self.bounds.view()
    }

    pub fn min_corner(&self) -> ArrayView1<'_, f64> {
        self.bounds.index_axis(Axis(1), 0)
    }

    pub fn max_corner(&self) -> ArrayView1<'_, f64> {
        self.bounds.index_axis(Axis(1), 1)
    }

    pub fn volume(&self) -> f64 {
        (0..self.dim()).map(|axis| self.extent(axis)).product()
    }

    pub fn center(&self) -> Array1<f64> {
        return (&self.min_corner() + &self.max_corner()) / 2.0;
    }

    /// Closed containment: every axis satisfies `lo >= box.lo` and `hi <= box.hi`.
    ///
    /// A `bbox` with a different number of axes never contains the cell.
    pub fn is_inside(&self, bbox: &ArrayView2<'_, f64>) -> bool {
        if bbox.nrows() != self.dim() || bbox.ncols() != 2 {
            return false;
        }
        self.bounds
            .outer_iter()
            .zip(bbox.outer_iter())
            .all(|(cell, bbox)| cell[0] >= bbox[0] && cell[1] <= bbox[1])
    }

    pub fn contains_point(&self, x: &ArrayView1<'_, f64>) -> bool {
        if x.len() != self.dim() {
            return false;
        }
        self.bounds
            .outer_iter()
            .zip(x.iter())
            .all(|(cell, &x)| cell[0] <= x && x <= cell[1])
    }

    /// Affine map from the reference cell `[-1, 1]^dim` into this cell.
    pub fn map_reference(&self, xi: &ArrayView1<'_, f64>) -> Array1<f64> {
        let mut result = Array1::zeros(self.dim());
        for axis in 0..self.dim() {
            let (lo, hi) = (self.lower(axis), self.upper(axis));
            result[axis] = lo + (xi[axis] + 1.0) * (hi - lo) / 2.0;
        }
        return result;
    }

    /// Diagonal of the Jacobian of [`Cell::map_reference`]; constant over the cell.
    pub fn jacobian(&self) -> Array1<f64> {
        return Array1::from_shape_fn(self.dim(), |axis| self.extent(axis) / 2.0);
    }

    pub fn jacobian_det(&self) -> f64 {
        self.jacobian().iter().product()
    }
}
