//! Elastic deformation of N-dimensional arrays, driven by a coarse grid of
//! displacement vectors and evaluated with B-spline interpolation.
//!
//! A small random displacement at a handful of control points becomes a
//! smooth, locally varying warp over a much larger image, volume, or label
//! mask. The same warp can be applied to a batch of arrays sharing a shape,
//! for example an image and its segmentation.
//!
//! # Pipeline
//! 1. Each input array is converted to B-spline coefficients of the requested
//!    order by a separable recursive prefilter ([`spline::spline_filter`]).
//! 2. The displacement grid is prefiltered at cubic order along its control
//!    axes, whatever the requested main order ([`DisplacementField`]).
//! 3. For every output sample, the identity coordinate (shifted by the crop
//!    offset, if any) is added to the cubic-interpolated displacement, giving
//!    one shared [`CoordinateField`].
//! 4. Each input's coefficients are evaluated at those coordinates
//!    ([`spline::SplineSampler`]).
//!
//! # Performance Scalings
//! Each output sample reads `(order + 1)^ndims` coefficients of every input,
//! plus `4^ndims` control-point coefficients per axis to build its coordinate.
//!
//! | Step                 | RAM                    | Cost                               |
//! |----------------------|------------------------|------------------------------------|
//! | prefilter, per input | O(input size)          | O(input size * ndims * poles)      |
//! | coordinate field     | O(output size * ndims) | O(output size * ndims * 4^ndims)   |
//! | sampling, per input  | O(MAXDIMS) per sample  | O(output size * (order + 1)^ndims) |
//!
//! All three steps run in parallel over independent lines or samples.
//!
//! # Example: Shift a 2D image by a uniform displacement
//! ```rust
//! use elastic_deform::{deform, Crop, Displacement};
//!
//! // A 10x8 image, C-ordered
//! let dims = [10, 8];
//! let image: Vec<f64> = (0..80).map(|i| i as f64).collect();
//!
//! // A 3x3 control grid, displacing every point by 2 rows and 0 columns
//! let mut grid = vec![2.0; 9];
//! grid.extend([0.0; 9]);
//! let displacement = Displacement::new(&[2, 3, 3], &grid).unwrap();
//!
//! // Deform with linear interpolation, keeping only rows 2 through 5
//! let crop = [Crop::from(2..6), Crop::Full];
//! let out = deform(&[&image[..]], &dims, &displacement, 1, Some(&crop)).unwrap();
//!
//! assert_eq!(out[0].len(), 4 * 8);
//! assert!((out[0][0] - image[4 * 8]).abs() < 1e-9);
//! ```
// These "needless" range loops are a significant speedup
#![allow(clippy::needless_range_loop)]

pub mod deform;
pub use deform::{
    deform, CoordinateField, Crop, Deformer, Displacement, DisplacementField, Region,
};

pub mod element;
pub use element::Element;

pub mod error;
pub use error::{DeformError, Result};

pub mod spline;
pub use spline::{ExtendMode, SplineSampler};

pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

/// Maximum number of dimensions for the convenience deformation methods
pub const MAXDIMS: usize = 8;

/// Distance in the flat array between consecutive entries along each
/// dimension of a C-ordered array.
pub fn strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1_usize; dims.len()];
    let mut acc = 1;
    for i in (0..dims.len()).rev() {
        strides[i] = acc;
        acc *= dims[i];
    }
    strides
}

/// Convert a flat index into a C-ordered array to one index per dimension.
#[inline]
pub fn unravel_index(mut i: usize, dims: &[usize], loc: &mut [usize]) {
    for j in (0..dims.len()).rev() {
        loc[j] = i % dims[j];
        i /= dims[j];
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_strides() {
        assert_eq!(strides(&[4, 3, 2]), [6, 2, 1]);
        assert_eq!(strides(&[5]), [1]);
    }

    #[test]
    fn test_unravel_index() {
        let dims = [4, 3, 2];
        let st = strides(&dims);
        let mut loc = [0; 3];
        for i in 0..24 {
            unravel_index(i, &dims, &mut loc);
            assert_eq!(loc.iter().zip(&st).map(|(l, s)| l * s).sum::<usize>(), i);
            assert!(loc.iter().zip(&dims).all(|(l, n)| l < n));
        }
    }
}
