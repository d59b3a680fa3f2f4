use ndarray::{s, Array1, ArrayView1};

use crate::error::{InvalidMeshError, Result};

/// Relative spacing tolerance used by [`KnotVector::is_uniform`].
pub const UNIFORM_TOLERANCE: f64 = 1e-12;

/// Strictly increasing breakpoints along one parametric axis.
///
/// Always holds at least two finite knots, so at least one interval.
#[derive(Debug, Clone, PartialEq)]
pub struct KnotVector {
    knots: Array1<f64>,
}

impl KnotVector {
    /// Sorts and deduplicates `values`. `axis` is only used to label errors.
    pub fn new<I>(values: I, axis: usize) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut knots: Vec<f64> = values.into_iter().collect();
        if let Some(&value) = knots.iter().find(|k| !k.is_finite()) {
            return Err(InvalidMeshError::NonFiniteKnot { axis, value });
        }
        knots.sort_by(|a, b| a.total_cmp(b));
        knots.dedup();
        if knots.len() < 2 {
            return Err(InvalidMeshError::DegenerateAxis { axis, distinct: knots.len() });
        }
        return Ok(KnotVector { knots: Array1::from(knots) });
    }

    pub fn len(&self) -> usize {
        self.knots.len()
    }

    pub fn num_intervals(&self) -> usize {
        self.knots.len() - 1
    }

    pub fn as_slice(&self) -> &[f64] {
        // Built from a Vec, always contiguous.
        self.knots.as_slice().unwrap_or(&[])
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.knots.view()
    }

    pub fn first(&self) -> f64 {
        self.knots[0]
    }

    pub fn last(&self) -> f64 {
        self.knots[self.knots.len() - 1]
    }

    /// Lower bounds of the elementary intervals.
    pub fn lefts(&self) -> ArrayView1<'_, f64> {
        self.knots.slice(s![..-1])
    }

    /// Upper bounds of the elementary intervals.
    pub fn rights(&self) -> ArrayView1<'_, f64> {
        self.knots.slice(s![1..])
    }

    pub fn interval(&self, index: usize) -> (f64, f64) {
        (self.knots[index], self.knots[index + 1])
    }

    pub fn intervals(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.lefts().into_iter().copied().zip(self.rights().into_iter().copied())
    }

    pub fn midpoints(&self) -> Array1<f64> {
        self.intervals().map(|(lo, hi)| midpoint(lo, hi)).collect()
    }

    /// Dyadic refinement: every interval is split at its midpoint.
    ///
    /// Fails when a midpoint rounds onto one of its endpoints. `axis` is only
    /// used to label errors.
    pub fn refine(&self, axis: usize) -> Result<KnotVector> {
        let mut knots = Vec::with_capacity(2 * self.len() - 1);
        for (lo, hi) in self.intervals() {
            let mid = midpoint(lo, hi);
            if !(lo < mid && mid < hi) {
                return Err(InvalidMeshError::UnsplittableInterval { axis, lo, hi });
            }
            knots.push(lo);
            knots.push(mid);
        }
        knots.push(self.last());
        return Ok(KnotVector { knots: Array1::from(knots) });
    }

    /// True when all intervals have the same width up to [`UNIFORM_TOLERANCE`].
    pub fn is_uniform(&self) -> bool {
        let h = (self.last() - self.first()) / self.num_intervals() as f64;
        let tol = UNIFORM_TOLERANCE * h.abs().max(1.0);
        return self.intervals().all(|(lo, hi)| ((hi - lo) - h).abs() <= tol);
    }
}

// Halves first, so knots near f64::MAX do not overflow.
fn midpoint(lo: f64, hi: f64) -> f64 {
    lo / 2.0 + hi / 2.0
}
