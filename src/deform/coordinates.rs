//! Source coordinates of every output sample.
use rayon::prelude::*;

use super::{displacement::DisplacementUpsampler, Region};
use crate::error::{DeformError, Result};
use crate::unravel_index;

/// Continuous source coordinates for every sample of an output region.
///
/// Stored point-major: the `ndims` coordinates of output sample `i` are
/// contiguous. The field depends only on geometry, so one field serves
/// every array in a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateField {
    /// Number of dimensions
    ndims: usize,

    /// Shape of the output the field covers
    dims: Vec<usize>,

    /// Coordinates, size prod(dims) * ndims
    points: Vec<f64>,
}

impl CoordinateField {
    /// Compose the identity coordinates of a region with the upsampled
    /// displacement.
    ///
    /// Each output sample's local index is first shifted into the full
    /// frame. That full-frame index is both the identity coordinate and the
    /// position at which the displacement is evaluated, so a cropped field
    /// holds exactly the values of the matching part of an uncropped one.
    ///
    /// # Errors
    /// * If the region and displacement differ in dimensionality
    /// * If the region has more than `MAXDIMS` dimensions
    pub fn compose<const MAXDIMS: usize>(
        region: &Region,
        upsampler: &DisplacementUpsampler<'_, MAXDIMS>,
    ) -> Result<Self> {
        let ndims = region.ndims();
        if upsampler.ndims() != ndims {
            return Err(DeformError::shape_mismatch(format!(
                "displacement has {} dimensions, output has {ndims}",
                upsampler.ndims()
            )));
        }
        if ndims == 0 || ndims > MAXDIMS {
            return Err(DeformError::shape_mismatch(format!(
                "{ndims} dimensions given; between 1 and {MAXDIMS} are supported"
            )));
        }

        let dims = region.dims().to_vec();
        let mut points = vec![0.0; region.len() * ndims];
        points
            .par_chunks_mut(ndims)
            .enumerate()
            .for_each(|(i, point)| {
                let loc = &mut [0_usize; MAXDIMS][..ndims];
                let xi = &mut [0.0; MAXDIMS][..ndims];

                unravel_index(i, &dims, loc);
                region.to_full_index(loc);
                upsampler.control_coordinates(loc, region, xi);
                upsampler.displacement_at(xi, point);
                for d in 0..ndims {
                    point[d] += loc[d] as f64;
                }
            });

        Ok(Self {
            ndims,
            dims,
            points,
        })
    }

    /// Number of dimensions
    pub fn ndims(&self) -> usize {
        self.ndims
    }

    /// Shape of the output the field covers
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of output samples
    pub fn len(&self) -> usize {
        self.points.len() / self.ndims
    }

    /// Whether the field covers no samples
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Source coordinates of output sample `i`
    #[inline]
    pub fn point(&self, i: usize) -> &[f64] {
        &self.points[i * self.ndims..(i + 1) * self.ndims]
    }

    /// Source coordinates along one axis, for every output sample in order
    pub fn axis(&self, d: usize) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().skip(d).step_by(self.ndims).copied()
    }
}
