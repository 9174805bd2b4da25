//! Convenience methods for constructing grids in a way that echoes,
//! but does not exactly match, methods common in scripting languages.
//!
//! ```rust
//! use elastic_deform::utils::{linspace, meshgrid};
//!
//! // Sample a smooth image on a 4x3 grid, C-ordered, ready to deform
//! let rows = linspace(0.0, 1.0, 4);
//! let cols = linspace(0.0, 2.0, 3);
//! let image: Vec<f64> = meshgrid(vec![&rows, &cols])
//!     .iter()
//!     .map(|p| p[0] * p[1])
//!     .collect();
//!
//! assert_eq!(image.len(), 12);
//! assert!((image[11] - 2.0).abs() < 1e-12);
//! ```
use itertools::Itertools;
use num_traits::Float;

/// Generates evenly spaced values from start to stop,
/// including the endpoint.
///
/// A single value is placed at `start`.
pub fn linspace<T>(start: T, stop: T, n: usize) -> Vec<T>
where
    T: Float,
{
    if n < 2 {
        return vec![start; n];
    }
    let dx: T = (stop - start) / T::from(n - 1).unwrap_or_else(T::one);
    (0..n)
        .map(|i| start + T::from(i).unwrap_or_else(T::zero) * dx)
        .collect()
}

/// Generates a meshgrid in C ordering (x0, y0, z0, x0, y0, z1, ..., x0, yn, zn)
pub fn meshgrid<T>(x: Vec<&Vec<T>>) -> Vec<Vec<T>>
where
    T: Float,
{
    x.into_iter()
        .multi_cartesian_product()
        .map(|xx| xx.iter().map(|y| **y).collect())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 2.0, 5), [0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(linspace(3.0, 7.0, 1), [3.0]);
        assert!(linspace(3.0_f32, 7.0, 0).is_empty());
    }

    #[test]
    fn test_meshgrid() {
        let x = vec![0.0, 1.0];
        let y = vec![5.0, 6.0, 7.0];
        let grid = meshgrid(vec![&x, &y]);
        assert_eq!(grid.len(), 6);
        assert_eq!(grid[1], [0.0, 6.0]);
        assert_eq!(grid[3], [1.0, 5.0]);
    }
}
