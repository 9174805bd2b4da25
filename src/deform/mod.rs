//! Deformation of batches of N-dimensional arrays.
//!
//! ```rust
//! use elastic_deform::{Crop, Deformer, Displacement, ExtendMode};
//!
//! // An image and its label mask, sharing a 12x9 shape
//! let dims = [12, 9];
//! let image: Vec<f32> = (0..108).map(|i| (i as f32).sin()).collect();
//! let labels: Vec<f32> = (0..108).map(|i| (i % 3) as f32).collect();
//!
//! // A 3x3 control grid with a gentle warp in the middle
//! let mut grid = vec![0.0; 2 * 9];
//! grid[4] = 1.5;
//! grid[9 + 4] = -0.5;
//! let displacement = Displacement::new(&[2, 3, 3], &grid).unwrap();
//!
//! // Cubic resampling, reading edge samples where the warp leaves the array
//! let deformer = Deformer::new(3).unwrap().with_mode(ExtendMode::Nearest);
//! let crop = [Crop::from(2..10), Crop::Full];
//! let out = deformer
//!     .deform(&[&image[..], &labels[..]], &dims, &displacement, Some(&crop))
//!     .unwrap();
//!
//! assert_eq!(out.len(), 2);
//! assert_eq!(out[1].len(), 8 * 9);
//! ```
use itertools::Itertools;
use rayon::prelude::*;
use tracing::debug;

use crate::element::Element;
use crate::error::{check_order, DeformError, Result};
use crate::spline::{spline_filter, ExtendMode, SplineSampler, CUBIC};
use crate::MAXDIMS;

pub mod coordinates;
pub mod crop;
pub mod displacement;

pub use coordinates::CoordinateField;
pub use crop::{Crop, Region};
pub use displacement::{Displacement, DisplacementField, DisplacementUpsampler};

/// Settings for deforming arrays.
///
/// The main order and extension mode apply to resampling the input arrays
/// only. The displacement grid is always upsampled at cubic order with the
/// default constant extension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Deformer {
    /// Spline order for resampling the inputs
    order: usize,

    /// Handling of source coordinates outside the inputs
    mode: ExtendMode,

    /// Whether inputs are raw samples that still need conversion to
    /// spline coefficients
    prefilter: bool,
}

impl Default for Deformer {
    fn default() -> Self {
        Self {
            order: CUBIC,
            mode: ExtendMode::default(),
            prefilter: true,
        }
    }
}

impl Deformer {
    /// Deformer with the given resampling order and default settings.
    ///
    /// # Errors
    /// * If `order` is not supported
    pub fn new(order: usize) -> Result<Self> {
        check_order(order)?;
        Ok(Self {
            order,
            ..Self::default()
        })
    }

    /// Set how source coordinates outside the inputs are handled.
    pub fn with_mode(self, mode: ExtendMode) -> Self {
        Self { mode, ..self }
    }

    /// Set whether inputs are prefiltered.
    ///
    /// With `false`, inputs must already be spline coefficients of this
    /// deformer's order, e.g. from [`crate::spline::spline_filter`].
    pub fn with_prefilter(self, prefilter: bool) -> Self {
        Self { prefilter, ..self }
    }

    /// Spline order for resampling the inputs
    pub fn order(&self) -> usize {
        self.order
    }

    /// Handling of source coordinates outside the inputs
    pub fn mode(&self) -> ExtendMode {
        self.mode
    }

    /// Whether inputs are prefiltered
    pub fn prefilter(&self) -> bool {
        self.prefilter
    }

    /// Deform a batch of arrays, allocating the outputs.
    ///
    /// See [`Deformer::deform_into`].
    pub fn deform<T: Element>(
        &self,
        inputs: &[&[T]],
        dims: &[usize],
        displacement: &Displacement<'_>,
        crop: Option<&[Crop]>,
    ) -> Result<Vec<Vec<T>>> {
        let region = Region::new(dims, crop)?;
        let mut outputs: Vec<Vec<T>> = inputs
            .iter()
            .map(|_| vec![T::from_sample(0.0); region.len()])
            .collect();
        let mut views: Vec<&mut [T]> = outputs.iter_mut().map(|o| &mut o[..]).collect();
        self.deform_into(inputs, dims, displacement, crop, &mut views)?;
        Ok(outputs)
    }

    /// Deform a batch of arrays sharing one shape, writing one output per
    /// input.
    ///
    /// Every input is warped by the same displacement. Outputs have the
    /// shape of the crop, or of the inputs if there is no crop, and samples
    /// are addressed in the frame of the uncropped inputs.
    ///
    /// All checks run before any work, so outputs are untouched on error.
    ///
    /// # Errors
    /// * If there are no inputs, or inputs and outputs differ in number
    /// * If `dims` has no dimensions, too many, or an empty axis
    /// * If any input does not match `dims`, or any output the crop
    /// * If the displacement does not have one component per dimension
    /// * If the crop is out of bounds
    pub fn deform_into<T: Element>(
        &self,
        inputs: &[&[T]],
        dims: &[usize],
        displacement: &Displacement<'_>,
        crop: Option<&[Crop]>,
        outputs: &mut [&mut [T]],
    ) -> Result<()> {
        // Check dimensionality
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
        if displacement.ndims() != ndims {
            return Err(DeformError::shape_mismatch(format!(
                "displacement has {} components for {ndims} dimensions",
                displacement.ndims()
            )));
        }

        // Check inputs
        if inputs.is_empty() {
            return Err(DeformError::shape_mismatch("no input arrays given"));
        }
        let nvals: usize = dims.iter().product();
        if !inputs.iter().map(|x| x.len()).all_equal() {
            return Err(DeformError::shape_mismatch(
                "input arrays in a batch differ in size",
            ));
        }
        if inputs[0].len() != nvals {
            return Err(DeformError::shape_mismatch(format!(
                "{} values given for shape {dims:?}",
                inputs[0].len()
            )));
        }

        // Check outputs
        let region = Region::new(dims, crop)?;
        if outputs.len() != inputs.len() {
            return Err(DeformError::shape_mismatch(format!(
                "{} outputs given for {} inputs",
                outputs.len(),
                inputs.len()
            )));
        }
        if outputs.iter().any(|o| o.len() != region.len()) {
            return Err(DeformError::shape_mismatch(format!(
                "outputs must have {} values for shape {:?}",
                region.len(),
                region.dims()
            )));
        }

        debug!(
            order = self.order,
            ndims,
            batch = inputs.len(),
            points = ?displacement.points(),
            output = ?region.dims(),
            offset = ?region.offset(),
            "deforming"
        );

        // Shared geometry
        let field = DisplacementField::new(displacement)?;
        let upsampler = field.upsampler::<MAXDIMS>()?;
        let coords = CoordinateField::compose(&region, &upsampler)?;

        outputs
            .par_iter_mut()
            .zip(inputs.par_iter())
            .try_for_each(|(out, input)| self.resample(input, dims, &coords, out))
    }

    /// Resample one input at every point of a coordinate field.
    fn resample<T: Element>(
        &self,
        input: &[T],
        dims: &[usize],
        coords: &CoordinateField,
        out: &mut [T],
    ) -> Result<()> {
        // Work on a copy; inputs are never modified
        let mut coeffs: Vec<f64> = input.iter().map(|&v| v.to_sample()).collect();
        if self.prefilter && self.order >= 2 {
            spline_filter(&mut coeffs, dims, self.order)?;
        }

        let sampler: SplineSampler<'_, MAXDIMS> =
            SplineSampler::new(dims, &coeffs, self.order, self.mode)?;
        out.par_iter_mut()
            .enumerate()
            .for_each(|(i, o)| *o = T::from_sample(sampler.interp_one(coords.point(i))));

        Ok(())
    }
}

/// Deform a batch of arrays sharing one shape with the default settings
/// at the given order.
///
/// `inputs` are C-ordered arrays of shape `dims`, and `displacement` has
/// shape `[D, P_1, ..., P_D]` for `D = dims.len()`. Returns one output per
/// input, shaped like the crop if one is given.
///
/// # Errors
/// See [`Deformer::deform_into`].
pub fn deform<T: Element>(
    inputs: &[&[T]],
    dims: &[usize],
    displacement: &Displacement<'_>,
    order: usize,
    crop: Option<&[Crop]>,
) -> Result<Vec<Vec<T>>> {
    Deformer::new(order)?.deform(inputs, dims, displacement, crop)
}
