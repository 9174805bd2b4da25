//! Evaluation of spline coefficient arrays at real-valued coordinates.
//!
//! ```rust
//! use elastic_deform::spline::{spline_filter, ExtendMode, SplineSampler};
//!
//! // Samples on a 3x4 grid, C-ordered
//! let dims = [3, 4];
//! let mut coeffs: Vec<f64> = (0..12).map(|i| i as f64).collect();
//!
//! // Convert to cubic spline coefficients in place
//! spline_filter(&mut coeffs, &dims, 3).unwrap();
//!
//! // The spline passes through the samples...
//! let sampler: SplineSampler<'_, 2> =
//!     SplineSampler::new(&dims, &coeffs, 3, ExtendMode::default()).unwrap();
//! assert!((sampler.interp_one(&[1.0, 2.0]) - 6.0).abs() < 1e-12);
//!
//! // ...and can be evaluated anywhere between them
//! let _v = sampler.interp_one(&[1.5, 2.25]);
//! ```
use super::{mirror_index, support, MAX_SUPPORT, SPLINE_WEIGHTS};
use crate::error::{check_order, DeformError, Result};

/// What to return for a coordinate outside the array.
///
/// This only decides where a coordinate lands; the coefficients of a
/// support window that crosses the array edge are always read from the
/// mirror-extended array, consistent with the prefilter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExtendMode {
    /// Coordinates outside `[0, n - 1]` on any axis evaluate to the given value.
    Constant(f64),
    /// Coordinates are clamped to `[0, n - 1]`, infinite ones included.
    Nearest,
    /// Coordinates are reflected about the first and last samples.
    Mirror,
}

impl Default for ExtendMode {
    fn default() -> Self {
        ExtendMode::Constant(0.0)
    }
}

impl ExtendMode {
    /// Map a coordinate on an axis of `n` samples into `[0, n - 1]`,
    /// or `None` if it resolves to the border value.
    ///
    /// NaN never maps into the array. Infinite coordinates clamp to the
    /// nearest edge in `Nearest` mode and have no position in `Mirror` mode.
    #[inline]
    pub fn map_coordinate(&self, x: f64, n: usize) -> Option<f64> {
        if x.is_nan() {
            return None;
        }
        let last = (n - 1) as f64;
        match self {
            ExtendMode::Constant(_) => (0.0..=last).contains(&x).then_some(x),
            ExtendMode::Nearest => Some(x.clamp(0.0, last)),
            ExtendMode::Mirror => {
                if !x.is_finite() {
                    return None;
                }
                if n == 1 {
                    return Some(0.0);
                }
                let period = 2.0 * last;
                let y = x.rem_euclid(period);
                Some(if y > last { period - y } else { y })
            }
        }
    }

    /// Value for coordinates that do not map into the array: the constant
    /// in `Constant` mode, and 0 for the coordinates the other modes reject.
    #[inline]
    fn border(&self) -> f64 {
        match self {
            ExtendMode::Constant(cval) => *cval,
            _ => 0.0,
        }
    }
}

/// An N-dimensional B-spline evaluator over a C-ordered coefficient array.
///
/// The coefficients must already be prefiltered for `order`
/// (see [`spline_filter`](super::spline_filter)); for orders 0 and 1 the
/// samples themselves are the coefficients.
///
/// Operation Complexity
/// * O((order + 1)^ndims) per evaluation.
///
/// Memory Complexity
/// * Peak stack usage is O(MAXDIMS). Evaluation recurses over the axes,
///   with a max depth of ndims.
///
/// Determinism
/// * The weighted sum over the support window is accumulated in a fixed
///   order, so each evaluation is bit-reproducible.
#[derive(Clone, Copy, Debug)]
pub struct SplineSampler<'a, const MAXDIMS: usize> {
    /// Number of dimensions
    ndims: usize,

    /// Size of each dimension
    dims: [usize; MAXDIMS],

    /// Distance between consecutive entries along each dimension
    strides: [usize; MAXDIMS],

    /// Spline order
    order: usize,

    /// Handling of coordinates outside the array
    mode: ExtendMode,

    /// Coefficients, size prod(dims)
    coeffs: &'a [f64],
}

impl<'a, const MAXDIMS: usize> SplineSampler<'a, MAXDIMS> {
    /// Build a new sampler, using O(MAXDIMS) calculations and storage.
    ///
    /// # Errors
    /// * If `order` is not supported
    /// * If there are no dimensions, or more than `MAXDIMS`
    /// * If any dimension has size zero
    /// * If the number of coefficients does not match `dims`
    pub fn new(dims: &[usize], coeffs: &'a [f64], order: usize, mode: ExtendMode) -> Result<Self> {
        check_order(order)?;

        let ndims = dims.len();
        if ndims == 0 || ndims > MAXDIMS {
            return Err(DeformError::shape_mismatch(format!(
                "{ndims} dimensions given; between 1 and {MAXDIMS} are supported"
            )));
        }
        if dims.iter().any(|&n| n == 0) {
            return Err(DeformError::shape_mismatch(format!(
                "all extents must be positive, got {dims:?}"
            )));
        }
        let nvals: usize = dims.iter().product();
        if coeffs.len() != nvals {
            return Err(DeformError::shape_mismatch(format!(
                "{} coefficients given for shape {dims:?}",
                coeffs.len()
            )));
        }

        let mut dims_local = [0_usize; MAXDIMS];
        dims_local[..ndims].copy_from_slice(dims);
        let mut strides = [0_usize; MAXDIMS];
        strides[..ndims].copy_from_slice(&crate::strides(dims));

        Ok(Self {
            ndims,
            dims: dims_local,
            strides,
            order,
            mode,
            coeffs,
        })
    }

    /// Number of dimensions
    pub fn ndims(&self) -> usize {
        self.ndims
    }

    /// Spline order
    pub fn order(&self) -> usize {
        self.order
    }

    /// Evaluate at a contiguous list of points, given as one slice of
    /// coordinates per dimension.
    ///
    /// # Errors
    ///   * If the number of coordinate slices does not match the dimensionality
    ///   * If the size of any coordinate slice does not match the output
    pub fn interp(&self, x: &[&[f64]], out: &mut [f64]) -> Result<()> {
        if x.len() != self.ndims {
            return Err(DeformError::shape_mismatch(format!(
                "{} coordinate arrays given for {} dimensions",
                x.len(),
                self.ndims
            )));
        }
        if !x.iter().all(|xx| xx.len() == out.len()) {
            return Err(DeformError::shape_mismatch(
                "coordinate arrays and output differ in length",
            ));
        }

        let tmp = &mut [0.0; MAXDIMS][..self.ndims];
        for i in 0..out.len() {
            (0..self.ndims).for_each(|j| tmp[j] = x[j][i]);
            out[i] = self.interp_one(tmp);
        }

        Ok(())
    }

    /// Evaluate the spline at a point, using fixed-size intermediate storage
    /// of O(MAXDIMS) and no allocation.
    ///
    /// Coordinates outside the array resolve through the extension mode;
    /// they are never an error.
    ///
    /// # Panics
    /// If `x` has fewer entries than the sampler has dimensions.
    #[inline]
    pub fn interp_one(&self, x: &[f64]) -> f64 {
        let weights = &mut [[0.0; MAX_SUPPORT]; MAXDIMS][..self.ndims];
        let offsets = &mut [[0_usize; MAX_SUPPORT]; MAXDIMS][..self.ndims];

        if !self.window(x, weights, offsets) {
            return self.mode.border();
        }
        self.accumulate(self.coeffs, 0, 0, weights, offsets)
    }

    /// Evaluate a stack of coefficient arrays at a point, one output each.
    ///
    /// Every array in the stack has this sampler's shape, and array `k`
    /// occupies `stack[k * len..(k + 1) * len]`. The support window and
    /// weights are computed once and shared by the whole stack.
    ///
    /// # Panics
    /// * If `x` has fewer entries than the sampler has dimensions
    /// * If `stack` holds fewer than `out.len()` arrays
    #[inline]
    pub fn interp_one_stacked(&self, x: &[f64], stack: &[f64], out: &mut [f64]) {
        let weights = &mut [[0.0; MAX_SUPPORT]; MAXDIMS][..self.ndims];
        let offsets = &mut [[0_usize; MAX_SUPPORT]; MAXDIMS][..self.ndims];

        if !self.window(x, weights, offsets) {
            out.fill(self.mode.border());
            return;
        }
        let len = self.coeffs.len();
        for (k, o) in out.iter_mut().enumerate() {
            *o = self.accumulate(stack, k * len, 0, weights, offsets);
        }
    }

    /// Fill the per-axis window weights, and the flat offsets of the window
    /// samples along each axis after folding them into the array.
    /// Returns `false` if the point resolves to the border value.
    #[inline]
    fn window(
        &self,
        x: &[f64],
        weights: &mut [[f64; MAX_SUPPORT]],
        offsets: &mut [[usize; MAX_SUPPORT]],
    ) -> bool {
        let order = self.order;
        for i in 0..self.ndims {
            let n = self.dims[i];
            let Some(v) = self.mode.map_coordinate(x[i], n) else {
                return false;
            };

            let (start, t) = support(v, order);
            SPLINE_WEIGHTS[order](t, &mut weights[i]);
            for k in 0..=order {
                offsets[i][k] = mirror_index(start + k as isize, n) * self.strides[i];
            }
        }
        true
    }

    /// Weighted sum over the support window, one axis per level of recursion.
    #[inline]
    fn accumulate(
        &self,
        coeffs: &[f64],
        base: usize,
        dim: usize,
        weights: &[[f64; MAX_SUPPORT]],
        offsets: &[[usize; MAX_SUPPORT]],
    ) -> f64 {
        if dim == self.ndims {
            return coeffs[base];
        }

        let mut acc = 0.0;
        for k in 0..=self.order {
            let w = weights[dim][k];
            if w != 0.0 {
                let offset = base + offsets[dim][k];
                acc += w * self.accumulate(coeffs, offset, dim + 1, weights, offsets);
            }
        }
        acc
    }
}
