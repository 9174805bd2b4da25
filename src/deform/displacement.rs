//! Coarse displacement grids, and their upsampling to per-sample displacements.
//!
//! A displacement grid for a `D`-dimensional array has shape
//! `[D, P_1, ..., P_D]`: the leading axis selects the spatial axis a
//! displacement applies to, and the remaining axes are the control-point
//! grid. The first and last control points along each axis sit exactly on
//! the first and last samples of the full (uncropped) array, with the rest
//! spread evenly between them.
//!
//! Displacements between control points are always interpolated with a
//! cubic spline, independent of the order used to resample the arrays.
use super::Region;
use crate::error::{DeformError, Result};
use crate::spline::{spline_filter1d, ExtendMode, SplineSampler, CUBIC};

/// A validated view of a displacement grid, C-ordered with shape `[D, P_1, ..., P_D]`.
#[derive(Clone, Copy, Debug)]
pub struct Displacement<'a> {
    /// Shape, including the leading component axis
    shape: &'a [usize],

    /// Values, size prod(shape)
    vals: &'a [f64],
}

impl<'a> Displacement<'a> {
    /// Wrap a displacement grid.
    ///
    /// # Errors
    /// * If the leading extent does not equal the number of control axes
    /// * If any control axis has no points
    /// * If the number of values does not match the shape
    pub fn new(shape: &'a [usize], vals: &'a [f64]) -> Result<Self> {
        if shape.len() < 2 || shape[0] != shape.len() - 1 {
            return Err(DeformError::shape_mismatch(format!(
                "displacement shape must be [D, P_1, ..., P_D], got {shape:?}"
            )));
        }
        if shape.iter().any(|&n| n == 0) {
            return Err(DeformError::shape_mismatch(format!(
                "displacement extents must be positive, got {shape:?}"
            )));
        }
        let nvals: usize = shape.iter().product();
        if vals.len() != nvals {
            return Err(DeformError::shape_mismatch(format!(
                "{} displacement values given for shape {shape:?}",
                vals.len()
            )));
        }

        Ok(Self { shape, vals })
    }

    /// Number of spatial dimensions
    pub fn ndims(&self) -> usize {
        self.shape[0]
    }

    /// Number of control points along each spatial axis
    pub fn points(&self) -> &[usize] {
        &self.shape[1..]
    }

    /// Full shape, including the leading component axis
    pub fn shape(&self) -> &[usize] {
        self.shape
    }

    /// Raw values
    pub fn vals(&self) -> &[f64] {
        self.vals
    }
}

/// A displacement grid converted to cubic spline coefficients along its
/// control axes. The component axis is left untouched.
#[derive(Clone, Debug)]
pub struct DisplacementField {
    /// Shape, including the leading component axis
    shape: Vec<usize>,

    /// Coefficients, size prod(shape)
    coeffs: Vec<f64>,
}

impl DisplacementField {
    /// Prefilter a displacement grid at cubic order, working on a copy.
    pub fn new(displacement: &Displacement<'_>) -> Result<Self> {
        let shape = displacement.shape().to_vec();
        let mut coeffs = displacement.vals().to_vec();
        for axis in 1..shape.len() {
            spline_filter1d(&mut coeffs, &shape, axis, CUBIC)?;
        }

        Ok(Self { shape, coeffs })
    }

    /// Number of spatial dimensions
    pub fn ndims(&self) -> usize {
        self.shape[0]
    }

    /// Number of control points along each spatial axis
    pub fn points(&self) -> &[usize] {
        &self.shape[1..]
    }

    /// Coefficients of the displacements along one spatial axis
    pub fn component(&self, axis: usize) -> &[f64] {
        let n: usize = self.points().iter().product();
        &self.coeffs[axis * n..(axis + 1) * n]
    }

    /// Build an evaluator of the displacement at control-point coordinates.
    ///
    /// # Errors
    /// * If the field has more than `MAXDIMS` dimensions
    pub fn upsampler<const MAXDIMS: usize>(&self) -> Result<DisplacementUpsampler<'_, MAXDIMS>> {
        // All components share one control grid, so one sampler locates the
        // support window for the whole stack
        let sampler = SplineSampler::new(
            self.points(),
            self.component(0),
            CUBIC,
            ExtendMode::default(),
        )?;

        Ok(DisplacementUpsampler {
            points: self.points(),
            sampler,
            coeffs: &self.coeffs,
        })
    }
}

/// Evaluates cubic-interpolated displacement vectors between control points.
#[derive(Clone, Copy, Debug)]
pub struct DisplacementUpsampler<'a, const MAXDIMS: usize> {
    /// Number of control points along each spatial axis
    points: &'a [usize],

    /// Sampler over the control grid
    sampler: SplineSampler<'a, MAXDIMS>,

    /// Coefficients of every component, stacked along the leading axis
    coeffs: &'a [f64],
}

impl<const MAXDIMS: usize> DisplacementUpsampler<'_, MAXDIMS> {
    /// Number of spatial dimensions
    pub fn ndims(&self) -> usize {
        self.points.len()
    }

    /// Number of control points along each spatial axis
    pub fn points(&self) -> &[usize] {
        self.points
    }

    /// Map an index in the full array frame to control-point coordinates.
    ///
    /// `index` must already include any crop offset, and `region` supplies
    /// the full extents the control grid spans.
    #[inline]
    pub fn control_coordinates(&self, index: &[usize], region: &Region, xi: &mut [f64]) {
        let full = region.full_dims();
        for d in 0..self.points.len() {
            xi[d] = control_point_coordinate(index[d], self.points[d], full[d]);
        }
    }

    /// Displacement vector at a point in control-point coordinates,
    /// one component per spatial axis.
    #[inline]
    pub fn displacement_at(&self, xi: &[f64], out: &mut [f64]) {
        let ndims = self.ndims();
        self.sampler.interp_one_stacked(xi, self.coeffs, &mut out[..ndims]);
    }
}

/// Control-point coordinate of sample `index` on an axis of `extent`
/// samples spanned by `points` control points.
///
/// The rescaling places sample 0 on control point 0 and the last sample on
/// the last control point. Axes with a single sample or a single control
/// point map everything to control point 0.
#[inline]
pub fn control_point_coordinate(index: usize, points: usize, extent: usize) -> f64 {
    if extent < 2 || points < 2 {
        return 0.0;
    }
    // Multiplying first keeps the last sample exactly on the last point
    (index * (points - 1)) as f64 / (extent - 1) as f64
}
