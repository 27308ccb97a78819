use rand::{distributions::Distribution, Rng};
use statrs::distribution::Laplace;

/// Scale of the Laplace noise giving `epsilon`-DP to a query of the given sensitivity
pub fn laplace_scale(epsilon: f64, sensitivity: f64) -> f64 {
    // it can be inf so we clamp the results between 0 and f64::MAX
    (sensitivity / epsilon).clamp(0., f64::MAX)
}

/// Draw a Laplace noise of the given scale, a zero scale draws no noise
pub fn laplace_noise<R: Rng>(rng: &mut R, scale: f64) -> f64 {
    match Laplace::new(0., scale) {
        Ok(dist) if scale > 0. => dist.sample(rng),
        _ => 0.,
    }
}
