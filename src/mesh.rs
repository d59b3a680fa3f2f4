use ndarray::{Array3, ArrayView2};

use crate::cell::Cell;
use crate::error::{InvalidMeshError, InvalidQueryError, Result};
use crate::knots::KnotVector;
use crate::quadrature::QuadratureRule;

/// Interface consumed by hierarchical mesh code.
pub trait Mesh: Sized {
    fn dim(&self) -> usize;
    fn cells(&self) -> &[Cell];

    fn nelems(&self) -> usize {
        self.cells().len()
    }

    /// New mesh with every cell subdivided. `self` is left untouched.
    fn refine(&self) -> Result<Self>;

    /// Indices of the cells lying inside `bbox`, in cell order.
    fn get_sub_elements(&self, bbox: &ArrayView2<'_, f64>) -> Result<Vec<usize>, InvalidQueryError>;
}

/// Tensor-product mesh spanned by one knot vector per axis.
///
/// Cells are enumerated with the first axis varying fastest: cell `i` has
/// interval indices `(i_0, i_1, ...)` with `i = i_0 + n_0 * (i_1 + n_1 * (...))`,
/// where `n_k` is the number of intervals on axis `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct CartesianMesh {
    dim: usize,
    knots: Vec<KnotVector>,
    cells: Vec<Cell>,
    cell_area: f64,
}

impl CartesianMesh {
    /// Builds the mesh from raw knot values. Each axis is sorted and deduplicated.
    pub fn new<K, I>(knots: K, dim: usize) -> Result<CartesianMesh>
    where
        K: IntoIterator<Item = I>,
        I: IntoIterator<Item = f64>,
    {
        if dim == 0 {
            return Err(InvalidMeshError::ZeroDimension);
        }
        let raw: Vec<I> = knots.into_iter().collect();
        if raw.len() != dim {
            return Err(InvalidMeshError::DimensionMismatch { expected: dim, found: raw.len() });
        }
        let knots = raw
            .into_iter()
            .enumerate()
            .map(|(axis, values)| KnotVector::new(values, axis))
            .collect::<Result<Vec<_>>>()?;
        return CartesianMesh::from_knot_vectors(knots);
    }

    pub fn from_knot_vectors(knots: Vec<KnotVector>) -> Result<CartesianMesh> {
        if knots.is_empty() {
            return Err(InvalidMeshError::ZeroDimension);
        }
        let mesh = CartesianMesh::assemble(knots);
        log::debug!("Built {}-D cartesian mesh with {} cells.", mesh.dim, mesh.nelems());
        if !mesh.is_uniform() {
            log::debug!("Knots are not uniformly spaced, cell_area only describes cell 0.");
        }
        return Ok(mesh);
    }

    // `knots` must be non-empty.
    fn assemble(knots: Vec<KnotVector>) -> CartesianMesh {
        let dim = knots.len();
        let cells = compute_cells(&knots);
        let cell_area = cells[0].volume();
        return CartesianMesh { dim, knots, cells, cell_area };
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn knots(&self) -> &[KnotVector] {
        &self.knots
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn nelems(&self) -> usize {
        self.cells.len()
    }

    /// Volume of the first cell.
    ///
    /// This is the volume of every cell only if [`CartesianMesh::is_uniform`]
    /// holds; use [`CartesianMesh::cell_volumes`] otherwise.
    pub fn cell_area(&self) -> f64 {
        self.cell_area
    }

    pub fn cell_volumes(&self) -> Vec<f64> {
        self.cells.iter().map(Cell::volume).collect()
    }

    pub fn is_uniform(&self) -> bool {
        self.knots.iter().all(KnotVector::is_uniform)
    }

    /// Interval count per axis.
    pub fn shape(&self) -> Vec<usize> {
        self.knots.iter().map(KnotVector::num_intervals).collect()
    }

    /// Dense `(nelems, dim, 2)` copy of all cell bounds.
    pub fn cells_array(&self) -> Array3<f64> {
        return Array3::from_shape_fn((self.nelems(), self.dim, 2), |(i, axis, side)| {
            self.cells[i].bounds()[[axis, side]]
        });
    }

    /// Per-axis interval indices of cell `index`.
    pub fn multi_index(&self, index: usize) -> Result<Vec<usize>, InvalidQueryError> {
        if index >= self.nelems() {
            return Err(InvalidQueryError::CellOutOfRange { index, nelems: self.nelems() });
        }
        let mut rest = index;
        let mut result = Vec::with_capacity(self.dim);
        for knots in &self.knots {
            result.push(rest % knots.num_intervals());
            rest /= knots.num_intervals();
        }
        return Ok(result);
    }

    /// Inverse of [`CartesianMesh::multi_index`].
    pub fn flat_index(&self, multi: &[usize]) -> Result<usize, InvalidQueryError> {
        if multi.len() != self.dim {
            return Err(InvalidQueryError::DimensionMismatch { expected: self.dim, found: multi.len() });
        }
        let mut index = 0;
        for (axis, (&i, knots)) in multi.iter().zip(&self.knots).enumerate().rev() {
            let count = knots.num_intervals();
            if i >= count {
                return Err(InvalidQueryError::IntervalOutOfRange { axis, index: i, count });
            }
            index = index * count + i;
        }
        return Ok(index);
    }

    /// Dyadic refinement: midpoints are inserted on every axis.
    ///
    /// Fails with [`InvalidMeshError::UnsplittableInterval`] when an interval
    /// is too narrow for its midpoint to be representable.
    pub fn refine(&self) -> Result<CartesianMesh> {
        let knots = self
            .knots
            .iter()
            .enumerate()
            .map(|(axis, knots)| knots.refine(axis))
            .collect::<Result<Vec<_>>>()?;
        let refined = CartesianMesh::assemble(knots);
        log::debug!("Refined mesh from {} to {} cells.", self.nelems(), refined.nelems());
        return Ok(refined);
    }

    /// Indices of all cells inside `bbox` (closed intervals), in cell order.
    ///
    /// `bbox` holds one `[lo, hi]` row per axis. Cells that only partially
    /// overlap the box are left out.
    pub fn get_sub_elements(&self, bbox: &ArrayView2<'_, f64>) -> Result<Vec<usize>, InvalidQueryError> {
        if bbox.ncols() != 2 {
            return Err(InvalidQueryError::MalformedBox { shape: bbox.shape().to_vec() });
        }
        if bbox.nrows() != self.dim {
            return Err(InvalidQueryError::DimensionMismatch { expected: self.dim, found: bbox.nrows() });
        }
        let indices: Vec<usize> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_inside(bbox))
            .map(|(i, _)| i)
            .collect();
        log::trace!("Box query selected {} of {} cells.", indices.len(), self.nelems());
        return Ok(indices);
    }

    pub fn get_sub_elements_in_cell(&self, bbox: &Cell) -> Result<Vec<usize>, InvalidQueryError> {
        self.get_sub_elements(&bbox.bounds())
    }

    /// Maps the reference points of `rule` into each listed cell.
    ///
    /// Returns an array of shape `(cell_indices.len(), npoints, dim)`.
    pub fn get_gauss_points<Q: QuadratureRule + ?Sized>(
        &self,
        cell_indices: &[usize],
        rule: &Q,
    ) -> Result<Array3<f64>, InvalidQueryError> {
        let reference = rule.reference_points(self.dim);
        if reference.ncols() != self.dim {
            return Err(InvalidQueryError::DimensionMismatch { expected: self.dim, found: reference.ncols() });
        }
        let mut result = Array3::zeros((cell_indices.len(), reference.nrows(), self.dim));
        for (row, &index) in cell_indices.iter().enumerate() {
            let cell = self
                .cells
                .get(index)
                .ok_or_else(|| InvalidQueryError::CellOutOfRange { index, nelems: self.nelems() })?;
            for (p, xi) in reference.outer_iter().enumerate() {
                let x = cell.map_reference(&xi);
                for axis in 0..self.dim {
                    result[[row, p, axis]] = x[axis];
                }
            }
        }
        return Ok(result);
    }
}

impl Mesh for CartesianMesh {
    fn dim(&self) -> usize {
        CartesianMesh::dim(self)
    }

    fn cells(&self) -> &[Cell] {
        CartesianMesh::cells(self)
    }

    fn refine(&self) -> Result<Self> {
        CartesianMesh::refine(self)
    }

    fn get_sub_elements(&self, bbox: &ArrayView2<'_, f64>) -> Result<Vec<usize>, InvalidQueryError> {
        CartesianMesh::get_sub_elements(self, bbox)
    }
}

/// Tensor product of the per-axis intervals, first axis fastest.
fn compute_cells(knots: &[KnotVector]) -> Vec<Cell> {
    let shape: Vec<usize> = knots.iter().map(KnotVector::num_intervals).collect();
    let nelems: usize = shape.iter().product();

    let mut cells = Vec::with_capacity(nelems);
    let mut multi = vec![0usize; knots.len()];
    for _ in 0..nelems {
        cells.push(Cell::from_intervals(
            knots.iter().zip(&multi).map(|(k, &i)| k.interval(i)),
        ));
        for (i, &count) in multi.iter_mut().zip(&shape) {
            *i += 1;
            if *i < count {
                break;
            }
            *i = 0;
        }
    }
    return cells;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadrature::rules::TensorGauss4;
    use approx::assert_relative_eq;
    use ndarray::{arr2, s, Array2};

    fn square() -> CartesianMesh {
        CartesianMesh::new(vec![vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]], 2).unwrap()
    }

    fn whole_domain(mesh: &CartesianMesh) -> Array2<f64> {
        Array2::from_shape_fn((mesh.dim(), 2), |(axis, side)| {
            if side == 0 { mesh.knots()[axis].first() } else { mesh.knots()[axis].last() }
        })
    }

    #[test]
    fn test_square_cells() {
        let mesh = square();
        assert_eq!(mesh.dim(), 2);
        assert_eq!(mesh.nelems(), 4);
        assert_eq!(mesh.cell_area(), 1.0);

        let expected = [
            [[0.0, 1.0], [0.0, 1.0]],
            [[1.0, 2.0], [0.0, 1.0]],
            [[0.0, 1.0], [1.0, 2.0]],
            [[1.0, 2.0], [1.0, 2.0]],
        ];
        for (cell, bounds) in mesh.cells().iter().zip(expected.iter()) {
            assert_eq!(cell.bounds(), arr2(bounds));
        }
        assert_eq!(mesh.cells_array().slice(s![3, .., ..]), arr2(&expected[3]));
    }

    #[test]
    fn test_nelems_product() {
        let mesh = CartesianMesh::new(
            vec![vec![0.0, 0.3, 1.0], vec![0.0, 1.0, 2.0, 2.5], vec![-1.0, 1.0]],
            3,
        )
        .unwrap();
        assert_eq!(mesh.shape(), vec![2, 3, 1]);
        assert_eq!(mesh.nelems(), 6);
        assert_eq!(mesh.cells_array().shape(), &[6, 3, 2]);
        assert!(mesh.cells().iter().all(|c| (0..3).all(|axis| c.extent(axis) > 0.0)));
    }

    #[test]
    fn test_first_axis_fastest() {
        let mesh = CartesianMesh::new(
            vec![vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 10.0, 20.0], vec![0.0, 5.0, 7.0]],
            3,
        )
        .unwrap();
        for (index, cell) in mesh.cells().iter().enumerate() {
            let multi = mesh.multi_index(index).unwrap();
            assert_eq!(multi, vec![index % 3, (index / 3) % 2, index / 6]);
            for axis in 0..3 {
                assert_eq!((cell.lower(axis), cell.upper(axis)), mesh.knots()[axis].interval(multi[axis]));
            }
            assert_eq!(mesh.flat_index(&multi), Ok(index));
        }
        assert_eq!(
            mesh.multi_index(12),
            Err(InvalidQueryError::CellOutOfRange { index: 12, nelems: 12 })
        );
        assert_eq!(
            mesh.flat_index(&[0, 2, 0]),
            Err(InvalidQueryError::IntervalOutOfRange { axis: 1, index: 2, count: 2 })
        );
        assert!(mesh.flat_index(&[0, 0]).is_err());
    }

    #[test]
    fn test_univariate() {
        let mesh = CartesianMesh::new(vec![vec![0.0, 0.5, 2.0]], 1).unwrap();
        assert_eq!(mesh.nelems(), 2);
        assert_eq!(mesh.cells()[0].bounds(), arr2(&[[0.0, 0.5]]));
        assert_eq!(mesh.cells()[1].bounds(), arr2(&[[0.5, 2.0]]));
        assert_eq!(mesh.cell_area(), 0.5);
        assert_eq!(mesh.cell_volumes(), vec![0.5, 1.5]);
        assert!(!mesh.is_uniform());
        assert_eq!(mesh.get_sub_elements(&arr2(&[[0.5, 2.0]]).view()), Ok(vec![1]));
    }

    #[test]
    fn test_dedup_input() {
        let a = CartesianMesh::new(vec![vec![0.0, 1.0, 1.0, 2.0], vec![2.0, 0.0, 1.0]], 2).unwrap();
        assert_eq!(a, square());
    }

    #[test]
    fn test_invalid_mesh() {
        assert_eq!(
            CartesianMesh::new(vec![vec![0.0, 1.0], vec![3.0, 3.0]], 2),
            Err(InvalidMeshError::DegenerateAxis { axis: 1, distinct: 1 })
        );
        assert_eq!(
            CartesianMesh::new(vec![vec![0.0, 1.0]], 2),
            Err(InvalidMeshError::DimensionMismatch { expected: 2, found: 1 })
        );
        assert_eq!(CartesianMesh::new(Vec::<Vec<f64>>::new(), 0), Err(InvalidMeshError::ZeroDimension));
        assert_eq!(CartesianMesh::from_knot_vectors(Vec::new()), Err(InvalidMeshError::ZeroDimension));
    }

    #[test]
    fn test_refine() {
        let mesh = square();
        let refined = mesh.refine().unwrap();
        for knots in refined.knots() {
            assert_eq!(knots.as_slice(), &[0.0, 0.5, 1.0, 1.5, 2.0]);
        }
        assert_eq!(refined.nelems(), 16);
        assert_eq!(refined.cell_area(), 0.25);

        // source is untouched
        assert_eq!(mesh, square());

        let twice = refined.refine().unwrap();
        assert_eq!(twice.nelems(), 64);
        assert_ne!(twice, refined);
        assert_eq!(Mesh::refine(&twice).unwrap().nelems(), 256);

        let cube = CartesianMesh::new(vec![vec![0.0, 1.0]; 3], 3).unwrap();
        assert_eq!(cube.refine().unwrap().nelems(), 8);
    }

    #[test]
    fn test_refine_keeps_cells_valid() {
        let huge = CartesianMesh::new(vec![vec![0.75 * f64::MAX, f64::MAX]], 1).unwrap();
        let refined = huge.refine().unwrap();
        assert_eq!(refined.nelems(), 2);
        assert!(refined.knots()[0].as_slice().iter().all(|k| k.is_finite()));
        assert!(refined.cell_volumes().iter().all(|&v| v > 0.0));

        let narrow = CartesianMesh::new(vec![vec![0.0, 1.0], vec![1.0, 1.0 + f64::EPSILON]], 2).unwrap();
        assert_eq!(
            narrow.refine(),
            Err(InvalidMeshError::UnsplittableInterval { axis: 1, lo: 1.0, hi: 1.0 + f64::EPSILON })
        );
        assert_eq!(narrow.nelems(), 1);
    }

    #[test]
    fn test_refine_matches_construction() {
        let refined = square().refine().unwrap();
        let direct = CartesianMesh::new(vec![vec![0.0, 0.5, 1.0, 1.5, 2.0]; 2], 2).unwrap();
        assert_eq!(refined, direct);
    }

    #[test]
    fn test_sub_elements_whole_domain() {
        let mesh = square().refine().unwrap();
        let bbox = whole_domain(&mesh);
        let all: Vec<usize> = (0..mesh.nelems()).collect();
        assert_eq!(mesh.get_sub_elements(&bbox.view()), Ok(all));
    }

    #[test]
    fn test_sub_elements_single_cell() {
        let mesh = square().refine().unwrap();
        for (index, cell) in mesh.cells().iter().enumerate() {
            assert_eq!(mesh.get_sub_elements_in_cell(cell), Ok(vec![index]));
        }
    }

    #[test]
    fn test_sub_elements_partial() {
        let mesh = square().refine().unwrap();
        // lower-left quarter of the domain
        let bbox = arr2(&[[0.0, 1.0], [0.0, 1.0]]);
        assert_eq!(mesh.get_sub_elements(&bbox.view()), Ok(vec![0, 1, 4, 5]));

        // cuts through cells, only the fully covered ones are returned
        let bbox = arr2(&[[0.25, 1.5], [0.0, 0.75]]);
        assert_eq!(mesh.get_sub_elements(&bbox.view()), Ok(vec![1, 2]));

        let bbox = arr2(&[[5.0, 6.0], [5.0, 6.0]]);
        assert_eq!(mesh.get_sub_elements(&bbox.view()), Ok(vec![]));
    }

    #[test]
    fn test_invalid_query() {
        let mesh = square();
        assert_eq!(
            mesh.get_sub_elements(&arr2(&[[0.0, 2.0]]).view()),
            Err(InvalidQueryError::DimensionMismatch { expected: 2, found: 1 })
        );
        assert_eq!(
            mesh.get_sub_elements(&arr2(&[[0.0, 1.0, 2.0], [0.0, 1.0, 2.0]]).view()),
            Err(InvalidQueryError::MalformedBox { shape: vec![2, 3] })
        );
    }

    #[test]
    fn test_non_uniform_volumes() {
        let mesh = CartesianMesh::new(vec![vec![0.0, 1.0, 3.0], vec![0.0, 1.0]], 2).unwrap();
        assert!(!mesh.is_uniform());
        assert_eq!(mesh.cell_area(), 1.0);
        assert_eq!(mesh.cell_volumes(), vec![1.0, 2.0]);
        assert!(square().is_uniform());
    }

    #[test]
    fn test_gauss_points() {
        let mesh = CartesianMesh::new(vec![vec![0.0, 1.0, 3.0], vec![0.0, 0.5, 2.0]], 2).unwrap();
        let rule = TensorGauss4;
        let indices: Vec<usize> = (0..mesh.nelems()).collect();
        let points = mesh.get_gauss_points(&indices, &rule).unwrap();
        assert_eq!(points.shape(), &[4, 16, 2]);

        for (cell, cell_points) in mesh.cells().iter().zip(points.outer_iter()) {
            assert!(cell_points.outer_iter().all(|x| cell.contains_point(&x)));
        }

        // integrate f(x, y) = x * y over [0, 3] x [0, 2]
        let weights = rule.weights(2);
        let mut integral = 0.0;
        for (cell, cell_points) in mesh.cells().iter().zip(points.outer_iter()) {
            for (x, w) in cell_points.outer_iter().zip(weights.iter()) {
                integral += w * x[0] * x[1] * cell.jacobian_det();
            }
        }
        assert_relative_eq!(integral, 9.0, epsilon = 1e-12);

        assert_eq!(
            mesh.get_gauss_points(&[4], &rule),
            Err(InvalidQueryError::CellOutOfRange { index: 4, nelems: 4 })
        );
    }

    #[test]
    fn test_shared_between_threads() {
        let mesh = std::sync::Arc::new(square());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mesh = mesh.clone();
                std::thread::spawn(move || mesh.refine().unwrap().nelems())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 16);
        }
        assert_eq!(mesh.nelems(), 4);
    }
}
