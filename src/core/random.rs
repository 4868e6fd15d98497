use crate::core::vectors::ThreeVector;
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::PI;

/// Source of all randomness for one simulated event.
///
/// Every event owns exactly one `RandomSource`; nothing in the crate draws
/// from anywhere else. A fixed seed reproduces the draw sequence bit for bit,
/// which makes whole-event replays deterministic. Cloning snapshots the
/// current state, so a clone replays the remaining sequence.
#[derive(Debug, Clone)]
pub struct RandomSource {
    engine: StdRng,
}

impl RandomSource {
    /// Deterministic source for reproducible runs.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            engine: SeedableRng::seed_from_u64(seed),
        }
    }

    /// Nondeterministic source, seeded from the thread-local generator.
    pub fn from_entropy() -> Self {
        Self {
            engine: SeedableRng::seed_from_u64(rng().random()),
        }
    }

    /// Re-seed in place, e.g. to replay a later segment of an event.
    pub fn reseed(&mut self, seed: u64) {
        self.engine = SeedableRng::seed_from_u64(seed);
    }

    /// Uniform draw on [min, max).
    #[inline]
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        self.engine.random_range(min..max)
    }

    /// Uniform draw on [0, 1).
    #[inline]
    pub fn canonical(&mut self) -> f64 {
        self.engine.random()
    }

    /// Normal deviate via the Box-Muller transform.
    pub fn normal(&mut self, mean: f64, sigma: f64) -> f64 {
        let u1 = self.canonical().max(1e-300); // keep ln away from zero
        let u2 = self.canonical();
        mean + sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Exponential deviate with unit rate.
    pub fn exponential(&mut self) -> f64 {
        // 1 - u lies in (0, 1], so the logarithm stays finite.
        -(1.0 - self.canonical()).ln()
    }

    /// Unit vector with isotropic direction: uniform cos(theta) and phi.
    pub fn isotropic(&mut self) -> ThreeVector {
        let cos_theta = self.uniform(-1.0, 1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = self.uniform(0.0, 2.0 * PI);
        ThreeVector::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
    }
}
