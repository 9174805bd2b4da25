//! Conversion of samples to B-spline coefficients.
//!
//! For each pole of the requested order, a causal recursion runs forward
//! along the line and an anticausal recursion runs back, each initialized
//! from the mirror-extended signal so that no explicit padding is needed.
//! Multidimensional arrays are filtered separably, one axis at a time.
//!
//! The filter always works in `f64`, whatever the element type of the
//! array the coefficients came from.
use rayon::prelude::*;
use tracing::trace;

use super::SPLINE_POLES;
use crate::error::{check_order, DeformError, Result};

/// Convert samples to spline coefficients along every axis of a C-ordered array.
///
/// Orders 0 and 1 are the identity. Axes of extent 1 pass through unchanged.
///
/// # Errors
/// * If `order` is not supported
/// * If the length of `data` does not match `dims`
pub fn spline_filter(data: &mut [f64], dims: &[usize], order: usize) -> Result<()> {
    check_order(order)?;
    for axis in 0..dims.len() {
        spline_filter1d(data, dims, axis, order)?;
    }
    Ok(())
}

/// Convert samples to spline coefficients along a single axis of a C-ordered array.
///
/// Every line parallel to `axis` is filtered independently; blocks of lines
/// sharing the same outer index are processed in parallel.
///
/// # Errors
/// * If `order` is not supported
/// * If `axis` is not an axis of `dims`
/// * If the length of `data` does not match `dims`
pub fn spline_filter1d(data: &mut [f64], dims: &[usize], axis: usize, order: usize) -> Result<()> {
    check_order(order)?;
    if axis >= dims.len() {
        return Err(DeformError::shape_mismatch(format!(
            "axis {axis} out of range for {} dimensions",
            dims.len()
        )));
    }
    let nvals: usize = dims.iter().product();
    if data.len() != nvals {
        return Err(DeformError::shape_mismatch(format!(
            "{} values given for shape {dims:?}",
            data.len()
        )));
    }

    let poles = SPLINE_POLES[order];
    let n = dims[axis];
    if poles.is_empty() || n < 2 || nvals == 0 {
        return Ok(());
    }

    // Distance between consecutive samples of a line, and the size of the
    // contiguous block holding all lines that share an outer index
    let stride: usize = dims[axis + 1..].iter().product();
    let block = n * stride;
    trace!(axis, order, lines = nvals / n, "spline prefilter");

    data.par_chunks_mut(block).for_each(|block| {
        let mut line = vec![0.0; n];
        for j in 0..stride {
            for i in 0..n {
                line[i] = block[i * stride + j];
            }
            filter_line(&mut line, poles);
            for i in 0..n {
                block[i * stride + j] = line[i];
            }
        }
    });

    Ok(())
}

/// Filter one line in place, with mirror boundary conditions.
fn filter_line(c: &mut [f64], poles: &[f64]) {
    let n = c.len();
    if n < 2 {
        return;
    }

    let gain: f64 = poles.iter().map(|&z| (1.0 - z) * (1.0 - 1.0 / z)).product();
    c.iter_mut().for_each(|x| *x *= gain);

    for &z in poles {
        c[0] = causal_init(c, z);
        for i in 1..n {
            c[i] += z * c[i - 1];
        }

        c[n - 1] = anticausal_init(c, z);
        for i in (0..n - 1).rev() {
            c[i] = z * (c[i + 1] - c[i]);
        }
    }
}

/// First value of the causal recursion, summed exactly over one period
/// of the mirror-extended line.
#[inline]
fn causal_init(c: &[f64], z: f64) -> f64 {
    let n = c.len();
    let z_n1 = z.powi((n - 1) as i32);

    let mut z_i = z;
    let mut acc = c[0] + z_n1 * c[n - 1];
    for i in 1..n - 1 {
        acc += z_i * (c[i] + z_n1 * c[n - 1 - i]);
        z_i *= z;
    }

    acc / (1.0 - z_n1 * z_n1)
}

/// Last value of the anticausal recursion, from the last two causal outputs.
#[inline]
fn anticausal_init(c: &[f64], z: f64) -> f64 {
    let n = c.len();
    (z * c[n - 2] + c[n - 1]) * z / (z * z - 1.0)
}
