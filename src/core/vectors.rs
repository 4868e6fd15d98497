use std::ops::{Add, Mul, Neg, Sub};

/// Squared magnitudes below this are treated as zero.
pub(crate) const EPS: f64 = 1e-30;

/// Spatial 3-vector (x, y, z).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThreeVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ThreeVector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean norm.
    #[inline]
    pub fn sqr(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Euclidean norm.
    #[inline]
    pub fn abs(&self) -> f64 {
        self.sqr().sqrt()
    }

    /// Scalar product with `other`.
    #[inline]
    pub fn dot(&self, other: &ThreeVector) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Vector product with `other`.
    pub fn cross(&self, other: &ThreeVector) -> ThreeVector {
        ThreeVector {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// True when every component is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for ThreeVector {
    type Output = ThreeVector;
    fn add(self, rhs: ThreeVector) -> ThreeVector {
        ThreeVector::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for ThreeVector {
    type Output = ThreeVector;
    fn sub(self, rhs: ThreeVector) -> ThreeVector {
        ThreeVector::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for ThreeVector {
    type Output = ThreeVector;
    fn neg(self) -> ThreeVector {
        ThreeVector::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for ThreeVector {
    type Output = ThreeVector;
    fn mul(self, rhs: f64) -> ThreeVector {
        ThreeVector::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Minkowski four-vector (x0, x1, x2, x3) with metric (+, -, -, -).
///
/// Serves both as a four-momentum (E, px, py, pz) in GeV and as a spacetime
/// position (t, x, y, z) in fm.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FourVector {
    pub x0: f64,
    pub x1: f64,
    pub x2: f64,
    pub x3: f64,
}

impl FourVector {
    pub fn new(x0: f64, x1: f64, x2: f64, x3: f64) -> Self {
        Self { x0, x1, x2, x3 }
    }

    /// Assemble from a time-like component and a spatial part.
    pub fn from_parts(x0: f64, spatial: ThreeVector) -> Self {
        Self {
            x0,
            x1: spatial.x,
            x2: spatial.y,
            x3: spatial.z,
        }
    }

    /// The spatial part.
    #[inline]
    pub fn threevec(&self) -> ThreeVector {
        ThreeVector::new(self.x1, self.x2, self.x3)
    }

    /// Minkowski square x0^2 - |x|^2. Negative for space-like vectors.
    #[inline]
    pub fn sqr(&self) -> f64 {
        self.x0 * self.x0 - self.threevec().sqr()
    }

    /// Invariant norm sqrt(max(sqr, 0)). The clamp absorbs the cancellation
    /// noise of on-shell momenta whose square lands a hair below zero.
    #[inline]
    pub fn abs(&self) -> f64 {
        self.sqr().max(0.0).sqrt()
    }

    /// Velocity of a four-momentum: spatial part over energy.
    #[inline]
    pub fn velocity(&self) -> ThreeVector {
        self.threevec() * (1.0 / self.x0)
    }

    /// True when every component is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.threevec().is_finite()
    }

    /// Lorentz boost into the frame moving with velocity `beta`.
    ///
    /// Boosting a four-momentum by its own velocity yields the rest frame;
    /// `boosted(-beta)` undoes the transformation. The spatial update uses
    /// (gamma - 1) / beta^2 = gamma^2 / (gamma + 1), which stays accurate
    /// for small boosts where the direct form cancels catastrophically.
    pub fn boosted(&self, beta: ThreeVector) -> FourVector {
        let beta_sqr = beta.sqr();
        if beta_sqr < EPS {
            return *self;
        }
        let gamma = 1.0 / (1.0 - beta_sqr).sqrt();
        let projection = beta.dot(&self.threevec());
        let k = gamma * gamma / (gamma + 1.0);
        let spatial = self.threevec() + beta * (k * projection - gamma * self.x0);
        FourVector::from_parts(gamma * (self.x0 - projection), spatial)
    }
}

impl Add for FourVector {
    type Output = FourVector;
    fn add(self, rhs: FourVector) -> FourVector {
        FourVector::new(
            self.x0 + rhs.x0,
            self.x1 + rhs.x1,
            self.x2 + rhs.x2,
            self.x3 + rhs.x3,
        )
    }
}

impl Sub for FourVector {
    type Output = FourVector;
    fn sub(self, rhs: FourVector) -> FourVector {
        FourVector::new(
            self.x0 - rhs.x0,
            self.x1 - rhs.x1,
            self.x2 - rhs.x2,
            self.x3 - rhs.x3,
        )
    }
}

impl Mul<f64> for FourVector {
    type Output = FourVector;
    fn mul(self, rhs: f64) -> FourVector {
        FourVector::new(self.x0 * rhs, self.x1 * rhs, self.x2 * rhs, self.x3 * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minkowski_square_uses_mostly_minus_metric() {
        let p = FourVector::new(5.0, 3.0, 0.0, 4.0);
        assert!((p.sqr() - 0.0).abs() < 1e-12);
        let q = FourVector::new(2.0, 1.0, 0.0, 0.0);
        assert!((q.sqr() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn boost_to_rest_frame_leaves_only_the_mass() {
        // E = 5, p = 4 along z, m = 3.
        let p = FourVector::new(5.0, 0.0, 0.0, 4.0);
        let rest = p.boosted(p.velocity());
        assert!(
            (rest.x0 - 3.0).abs() < 1e-12,
            "rest-frame energy should be the mass, got {}",
            rest.x0
        );
        assert!(
            rest.threevec().abs() < 1e-12,
            "rest-frame momentum should vanish, got {:?}",
            rest.threevec()
        );
    }

    #[test]
    fn boost_round_trip_is_identity() {
        let p = FourVector::new(2.5, 0.4, -1.1, 0.7);
        let beta = ThreeVector::new(0.2, -0.35, 0.1);
        let back = p.boosted(beta).boosted(-beta);
        let tol = 1e-12;
        assert!((back.x0 - p.x0).abs() < tol);
        assert!((back.x1 - p.x1).abs() < tol);
        assert!((back.x2 - p.x2).abs() < tol);
        assert!((back.x3 - p.x3).abs() < tol);
    }

    #[test]
    fn cross_product_is_orthogonal() {
        let a = ThreeVector::new(1.0, 2.0, 3.0);
        let b = ThreeVector::new(-2.0, 0.5, 1.0);
        let c = a.cross(&b);
        assert!(c.dot(&a).abs() < 1e-12);
        assert!(c.dot(&b).abs() < 1e-12);
    }

    #[test]
    fn zero_boost_is_identity() {
        let p = FourVector::new(1.0, 0.1, 0.2, 0.3);
        let same = p.boosted(ThreeVector::default());
        assert_eq!(p, same);
    }
}
