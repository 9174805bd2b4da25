use rand::distr::StandardUniform;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

/// Fixed random seed to support repeatable testing
const SEED: [u8; 32] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6,
    5, 4, 3, 2, 1,
];

/// Get a random number generator with a const seed for repeatable testing
pub fn rng_fixed_seed() -> StdRng {
    StdRng::from_seed(SEED)
}

/// Generate `n` random numbers using provided generator
pub fn randn<T>(rng: &mut StdRng, n: usize) -> Vec<T>
where
    StandardUniform: rand::distr::Distribution<T>,
{
    std::iter::repeat_with(|| rng.random::<T>())
        .take(n)
        .collect()
}

/// Generate a displacement grid of shape `[points.len(), points...]`,
/// uniformly distributed in `[-sigma, sigma)`.
pub fn random_displacement(
    rng: &mut StdRng,
    points: &[usize],
    sigma: f64,
) -> (Vec<usize>, Vec<f64>) {
    let mut shape = vec![points.len()];
    shape.extend_from_slice(points);
    let n: usize = shape.iter().product();
    let vals = randn::<f64>(rng, n)
        .into_iter()
        .map(|v| sigma * (2.0 * v - 1.0))
        .collect();
    (shape, vals)
}
