//! Sampling helpers shared by the behavior policies.
//!
//! # Distributions Used
//!
//! - **Forecast error**: folded normal (magnitude), fair coin (sign)
//! - **Delays / stage durations**: uniform over a validated `(min, max)` span
//!
//! Pure math, no side effects beyond advancing the caller's RNG.

use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Uniform sample in `[lo, hi]`; returns `lo` for a degenerate span.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.random_range(lo..=hi)
    } else {
        lo
    }
}

/// Absolute value of a normal draw (folded normal).
///
/// A zero standard deviation degenerates to `|mean|`.
pub fn folded_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std: f64) -> f64 {
    if std <= 0.0 {
        return mean.abs();
    }
    match Normal::new(mean, std) {
        Ok(dist) => dist.sample(rng).abs(),
        Err(_) => mean.abs(),
    }
}

/// Bernoulli trial with a probability clamped into `[0, 1]`.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    if !probability.is_finite() || probability <= 0.0 {
        return false;
    }
    rng.random_bool(probability.min(1.0))
}

/// Random sign, +1.0 or -1.0 with equal probability.
pub fn sign<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    if rng.random_bool(0.5) { 1.0 } else { -1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_uniform_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = uniform(&mut rng, 2.0, 5.0);
            assert!((2.0..=5.0).contains(&v));
        }
        assert_eq!(uniform(&mut rng, 3.0, 3.0), 3.0);
    }

    #[test]
    fn test_folded_normal_non_negative() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            assert!(folded_normal(&mut rng, 0.05, 0.2) >= 0.0);
        }
        assert_eq!(folded_normal(&mut rng, -0.3, 0.0), 0.3);
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(!chance(&mut rng, 0.0));
        assert!(!chance(&mut rng, f64::NAN));
        assert!(chance(&mut rng, 1.5));
    }
}
