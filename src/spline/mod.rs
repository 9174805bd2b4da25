//! Separable B-spline interpolation of orders 0 through 5.
//!
//! Interpolating with a B-spline of order `n` is a two-step process:
//! the samples are first converted to spline coefficients by a recursive
//! prefilter (see [`filter`]), and the coefficients are then evaluated at
//! arbitrary real-valued coordinates as a weighted sum over a support window
//! of `n + 1` samples per axis (see [`sampler`]).
//!
//! Orders 0 and 1 need no prefilter, since nearest-neighbor and linear
//! interpolation already pass through the samples.
//!
//! Both steps extend the data past the array edges by whole-sample mirroring
//! (`... c2 c1 | c0 c1 ... cn-1 | cn-2 cn-3 ...`), so that the spline
//! reproduces the samples exactly at every integer coordinate, including the
//! first and last. What the sampler returns for a *coordinate* outside the
//! array is a separate choice, made by [`ExtendMode`].
//!
//! References
//! * M. Unser, "Splines: a perfect fit for signal and image processing",
//!   IEEE Signal Processing Magazine, 1999
//! * P. Thévenaz, T. Blu, M. Unser, "Interpolation revisited",
//!   IEEE Transactions on Medical Imaging, 2000
pub mod filter;
pub mod sampler;

pub use filter::{spline_filter, spline_filter1d};
pub use sampler::{ExtendMode, SplineSampler};

/// Highest supported spline order.
pub const MAX_ORDER: usize = 5;

/// Order used for upsampling displacement fields.
pub const CUBIC: usize = 3;

/// Largest support window, in samples per axis.
pub const MAX_SUPPORT: usize = MAX_ORDER + 1;

/// Fills the support-window weights for a fractional offset.
type WeightFn = fn(f64, &mut [f64; MAX_SUPPORT]);

/// Basis function weights, indexed by order.
///
/// Each entry takes the offset `t` of the coordinate from its anchor sample
/// (see [`support`]) and writes `order + 1` weights, one per window sample
/// in increasing index order. The last weight is always taken as one minus
/// the others so that every window sums to exactly one.
pub(crate) const SPLINE_WEIGHTS: [WeightFn; MAX_ORDER + 1] = [
    weights_order0,
    weights_order1,
    weights_order2,
    weights_order3,
    weights_order4,
    weights_order5,
];

/// Poles of the recursive prefilter, indexed by order.
pub(crate) const SPLINE_POLES: [&[f64]; MAX_ORDER + 1] = [
    &[],
    &[],
    &[-0.171_572_875_253_809_9],
    &[-0.267_949_192_431_122_7],
    &[-0.361_341_225_900_220_2, -0.013_725_429_297_339_12],
    &[-0.430_575_347_099_973_8, -0.043_096_288_203_264_65],
];

/// Locate the support window of a coordinate.
///
/// Returns the index of the first sample in the window and the offset of
/// the coordinate from the anchor sample. Odd orders anchor on `floor(x)`,
/// with `t` in `[0, 1)`; even orders anchor on the nearest sample, with
/// `t` in `[-1/2, 1/2)`.
#[inline]
pub(crate) fn support(x: f64, order: usize) -> (isize, f64) {
    let anchor = if order & 1 == 1 {
        x.floor()
    } else {
        (x + 0.5).floor()
    };
    (anchor as isize - (order / 2) as isize, x - anchor)
}

/// Fold an index into `[0, n)` by whole-sample mirroring about the
/// first and last samples.
#[inline]
pub(crate) fn mirror_index(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let j = i.rem_euclid(period);
    if j >= n as isize {
        (period - j) as usize
    } else {
        j as usize
    }
}

#[inline]
fn close_weights(order: usize, w: &mut [f64; MAX_SUPPORT]) {
    w[order] = 1.0 - w[..order].iter().sum::<f64>();
}

fn weights_order0(_t: f64, w: &mut [f64; MAX_SUPPORT]) {
    w[0] = 1.0;
}

fn weights_order1(t: f64, w: &mut [f64; MAX_SUPPORT]) {
    w[0] = 1.0 - t;
    close_weights(1, w);
}

fn weights_order2(t: f64, w: &mut [f64; MAX_SUPPORT]) {
    let y = 0.5 - t;
    w[0] = 0.5 * y * y;
    w[1] = 0.75 - t * t;
    close_weights(2, w);
}

fn weights_order3(t: f64, w: &mut [f64; MAX_SUPPORT]) {
    let z = 1.0 - t;
    w[0] = z * z * z / 6.0;
    w[1] = (t * t * (t - 2.0) * 3.0 + 4.0) / 6.0;
    w[2] = (z * z * (z - 2.0) * 3.0 + 4.0) / 6.0;
    close_weights(3, w);
}

fn weights_order4(t: f64, w: &mut [f64; MAX_SUPPORT]) {
    // Outer pair of the middle five, at distance 1 +/- t
    let outer = |y: f64| y * (y * (y * (5.0 - y) / 6.0 - 1.25) + 5.0 / 24.0) + 55.0 / 96.0;

    let y = 0.5 - t;
    let y2 = y * y;
    w[0] = y2 * y2 / 24.0;
    w[1] = outer(1.0 + t);
    let t2 = t * t;
    w[2] = t2 * (t2 * 0.25 - 0.625) + 115.0 / 192.0;
    w[3] = outer(1.0 - t);
    close_weights(4, w);
}

fn weights_order5(t: f64, w: &mut [f64; MAX_SUPPORT]) {
    // Distance in [0, 1] and [1, 2] from the coordinate
    let inner = |y: f64| {
        let y2 = y * y;
        y2 * (y2 * (0.25 - y / 12.0) - 0.5) + 0.55
    };
    let outer =
        |y: f64| y * (y * (y * (y * (y / 24.0 - 0.375) + 1.25) - 1.75) + 0.625) + 0.425;

    let z = 1.0 - t;
    let z2 = z * z;
    w[0] = z2 * z2 * z / 120.0;
    w[1] = outer(1.0 + t);
    w[2] = inner(t);
    w[3] = inner(z);
    w[4] = outer(1.0 + z);
    close_weights(5, w);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::linspace;
    use approx::assert_abs_diff_eq;

    /// Centered B-spline basis of degree `n`, by the Cox-de Boor recursion
    fn bspline(n: usize, u: f64) -> f64 {
        if n == 0 {
            return if (-0.5..0.5).contains(&u) { 1.0 } else { 0.0 };
        }
        let nf = n as f64;
        let a = (u + (nf + 1.0) / 2.0) / nf;
        let b = ((nf + 1.0) / 2.0 - u) / nf;
        a * bspline(n - 1, u + 0.5) + b * bspline(n - 1, u - 0.5)
    }

    /// Each weight table entry must match the basis function evaluated
    /// at the distance between the coordinate and the window sample.
    #[test]
    fn test_weights_match_basis() {
        for order in 0..=MAX_ORDER {
            for x in linspace(-3.3, 4.7, 57) {
                let (start, t) = support(x, order);
                let mut w = [0.0; MAX_SUPPORT];
                SPLINE_WEIGHTS[order](t, &mut w);

                for k in 0..=order {
                    let expected = bspline(order, x - (start + k as isize) as f64);
                    assert_abs_diff_eq!(w[k], expected, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_weights_partition_of_unity() {
        for order in 0..=MAX_ORDER {
            for t in linspace(-0.5, 0.99, 31) {
                let mut w = [0.0; MAX_SUPPORT];
                SPLINE_WEIGHTS[order](t, &mut w);
                assert_abs_diff_eq!(w[..=order].iter().sum::<f64>(), 1.0, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_support() {
        assert_eq!(support(2.3, 0), (2, 2.3 - 2.0));
        assert_eq!(support(2.7, 0).0, 3);
        assert_eq!(support(2.7, 1).0, 2);
        assert_eq!(support(2.7, 2).0, 2);
        assert_eq!(support(2.3, 3).0, 1);
        assert_eq!(support(2.7, 4).0, 1);
        assert_eq!(support(2.3, 5).0, 0);
        assert_eq!(support(-0.2, 1).0, -1);
    }

    #[test]
    fn test_mirror_index() {
        let folded: Vec<usize> = (-5..10).map(|i| mirror_index(i, 4)).collect();
        assert_eq!(folded, [1, 2, 3, 2, 1, 0, 1, 2, 3, 2, 1, 0, 1, 2, 3]);
        assert!((-3..3).all(|i| mirror_index(i, 1) == 0));
    }

    /// Poles must be the roots inside the unit circle of each sampled kernel
    #[test]
    fn test_poles_are_roots() {
        // Characteristic polynomials of the sampled B-spline kernels,
        // scaled to integer coefficients
        let kernels: [&[f64]; MAX_ORDER + 1] = [
            &[],
            &[],
            &[1.0, 6.0, 1.0],
            &[1.0, 4.0, 1.0],
            &[1.0, 76.0, 230.0, 76.0, 1.0],
            &[1.0, 26.0, 66.0, 26.0, 1.0],
        ];
        for order in 2..=MAX_ORDER {
            for &z in SPLINE_POLES[order] {
                let p = kernels[order]
                    .iter()
                    .fold(0.0, |acc: f64, &c| acc * z + c);
                assert_abs_diff_eq!(p, 0.0, epsilon = 1e-10);
            }
        }
    }
}
