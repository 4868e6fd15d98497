use crate::core::particle::ParticleType;
use crate::core::random::RandomSource;
use crate::core::vectors::ThreeVector;
use crate::error::{Error, Result};

/// Kaellen triangle function lambda(a, b, c).
#[inline]
pub fn kaellen(a: f64, b: f64, c: f64) -> f64 {
    a * a + b * b + c * c - 2.0 * (a * b + b * c + c * a)
}

/// Momentum of either particle in the center-of-momentum frame of a two-body
/// system with total energy `sqrts` and masses `m1`, `m2`.
///
/// `None` below threshold; exactly at threshold the momentum is zero.
pub fn pcm(sqrts: f64, m1: f64, m2: f64) -> Option<f64> {
    if sqrts < m1 + m2 {
        return None;
    }
    let s = sqrts * sqrts;
    let lambda = kaellen(s, m1 * m1, m2 * m2);
    if lambda < 0.0 {
        // Roundoff right at threshold.
        return None;
    }
    Some(lambda.sqrt() / (2.0 * sqrts))
}

/// Sample the mass of an outgoing particle, bounded above by `upper_limit`
/// (the energy left over for this particle).
///
/// Stable species always take their pole mass; the feasibility of the full
/// final state is checked downstream where all masses are known. Unstable
/// species draw from a Breit-Wigner (Cauchy) shape truncated to
/// [min_mass, upper_limit] via the inverse CDF, so a single uniform draw
/// decides the mass.
///
/// Errors:
/// - `Error::InfeasibleKinematics` when the truncation window is empty.
pub fn sample_final_mass(
    ptype: ParticleType,
    upper_limit: f64,
    rng: &mut RandomSource,
) -> Result<f64> {
    if ptype.is_stable() {
        return Ok(ptype.mass);
    }
    let lower_limit = ptype.min_mass();
    if !(upper_limit > lower_limit) {
        return Err(Error::InfeasibleKinematics(format!(
            "mass window for pdg {} is empty: upper limit {upper_limit} <= minimum {lower_limit}",
            ptype.pdg
        )));
    }
    // Inverse CDF of the Cauchy shape: map the window edges through
    // atan((m - m0) / (Gamma / 2)), draw uniformly between the images and
    // map back with tan.
    let half_width = 0.5 * ptype.width;
    let to_angle = |m: f64| ((m - ptype.mass) / half_width).atan();
    let lo = to_angle(lower_limit);
    let hi = to_angle(upper_limit);
    if hi <= lo {
        // Far in a tail the two images can round to the same f64, and
        // rng.uniform needs a non-empty range.
        return Ok(lower_limit);
    }
    let angle = rng.uniform(lo, hi);
    Ok(ptype.mass + half_width * angle.tan())
}

/// Two unit vectors completing `n` to a right-handed orthonormal basis.
/// `n` must itself be normalized.
pub fn orthonormal_basis(n: ThreeVector) -> (ThreeVector, ThreeVector) {
    // Cross with the coordinate axis least aligned with n.
    let helper = if n.x.abs() < 0.5 {
        ThreeVector::new(1.0, 0.0, 0.0)
    } else {
        ThreeVector::new(0.0, 1.0, 0.0)
    };
    let raw = n.cross(&helper);
    let e1 = raw * (1.0 / raw.abs());
    let e2 = n.cross(&e1);
    (e1, e2)
}
