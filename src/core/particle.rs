use crate::core::vectors::{FourVector, ThreeVector};
use crate::error::{Error, Result};

/// Species-level constants shared by every particle of one type.
///
/// Fields:
/// - `pdg`: PDG-style species code (the sign encodes the antiparticle)
/// - `mass`: pole mass in GeV
/// - `width`: total decay width in GeV; zero marks a stable species
/// - `charge`: electric charge in elementary units
/// - `spin_two`: twice the spin, so half-integer spins stay integral
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleType {
    /// PDG-style species code.
    pub pdg: i32,
    /// Pole mass (GeV).
    pub mass: f64,
    /// Total decay width (GeV); zero for stable species.
    pub width: f64,
    /// Electric charge in elementary units.
    pub charge: i32,
    /// Twice the spin.
    pub spin_two: u32,
    min_mass: f64,
}

impl ParticleType {
    /// Create a species after validating invariants.
    ///
    /// The lower edge of the mass distribution defaults to two half-widths
    /// below the pole for unstable species (clamped at zero) and to the pole
    /// mass for stable ones; `with_min_mass` overrides it.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `mass` or `width` is negative or not finite.
    pub fn new(pdg: i32, mass: f64, width: f64, charge: i32, spin_two: u32) -> Result<Self> {
        if !mass.is_finite() || mass < 0.0 {
            return Err(Error::InvalidParam("mass must be finite and >= 0".into()));
        }
        if !width.is_finite() || width < 0.0 {
            return Err(Error::InvalidParam("width must be finite and >= 0".into()));
        }
        let min_mass = if width > 0.0 {
            (mass - 2.0 * width).max(0.0)
        } else {
            mass
        };
        Ok(Self {
            pdg,
            mass,
            width,
            charge,
            spin_two,
            min_mass,
        })
    }

    /// Override the lower edge of the mass distribution,
    /// e.g. with the lightest decay threshold from a particle table.
    pub fn with_min_mass(mut self, min_mass: f64) -> Result<Self> {
        if !min_mass.is_finite() || min_mass < 0.0 {
            return Err(Error::InvalidParam(
                "min_mass must be finite and >= 0".into(),
            ));
        }
        self.min_mass = min_mass;
        Ok(self)
    }

    /// Lower edge of the mass distribution (GeV).
    #[inline]
    pub fn min_mass(&self) -> f64 {
        self.min_mass
    }

    /// A species with zero width never decays.
    #[inline]
    pub fn is_stable(&self) -> bool {
        self.width == 0.0
    }

    /// Half-integer spin, i.e. subject to Pauli blocking.
    #[inline]
    pub fn is_fermion(&self) -> bool {
        self.spin_two % 2 == 1
    }
}

/// Snapshot of one particle: species constants, kinematics and provenance.
///
/// The identity fields are managed by the collection and the action that
/// produces the particle: `id` stays `None` until a `Particles` collection
/// assigns one, and `id_process` names the reaction that created the particle
/// (zero for primordial particles).
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleData {
    id: Option<u64>,
    id_process: u64,
    /// Species constants.
    pub ptype: ParticleType,
    /// Four-momentum (E, px, py, pz) in GeV.
    pub momentum: FourVector,
    /// Spacetime position (t, x, y, z) in fm.
    pub position: FourVector,
    /// Time from which the particle interacts with its full cross section
    /// (fm/c).
    pub formation_time: f64,
    /// Cross-section suppression while the particle is still forming.
    pub xsec_scaling_factor: f64,
}

impl ParticleData {
    /// A particle of the given species at the origin with zero momentum.
    pub fn new(ptype: ParticleType) -> Self {
        Self {
            id: None,
            id_process: 0,
            ptype,
            momentum: FourVector::default(),
            position: FourVector::default(),
            formation_time: 0.0,
            xsec_scaling_factor: 1.0,
        }
    }

    /// Builder: replace the four-momentum (validated as finite).
    pub fn with_momentum(mut self, momentum: FourVector) -> Result<Self> {
        if !momentum.is_finite() {
            return Err(Error::InvalidParam("momentum must be finite".into()));
        }
        self.momentum = momentum;
        Ok(self)
    }

    /// Builder: replace the position (validated as finite).
    pub fn with_position(mut self, position: FourVector) -> Result<Self> {
        if !position.is_finite() {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        self.position = position;
        Ok(self)
    }

    /// Put the particle on shell at `mass` with spatial momentum `p`.
    pub fn set_momentum(&mut self, mass: f64, p: ThreeVector) {
        self.momentum = FourVector::from_parts((mass * mass + p.sqr()).sqrt(), p);
    }

    /// Collection id, if the particle has been inserted into one.
    #[inline]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Id of the reaction that produced this particle; zero for primordial
    /// particles.
    #[inline]
    pub fn id_process(&self) -> u64 {
        self.id_process
    }

    /// Actual (possibly off-shell) mass: the invariant norm of the momentum.
    #[inline]
    pub fn effective_mass(&self) -> f64 {
        self.momentum.abs()
    }

    /// Velocity in the computational frame.
    #[inline]
    pub fn velocity(&self) -> ThreeVector {
        self.momentum.velocity()
    }

    pub(crate) fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    pub(crate) fn set_id_process(&mut self, id_process: u64) {
        self.id_process = id_process;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_validation() {
        let err = ParticleType::new(211, f64::NAN, 0.0, 1, 0).unwrap_err();
        assert!(err.to_string().contains("mass"));
        let err = ParticleType::new(211, 0.138, -0.1, 1, 0).unwrap_err();
        assert!(err.to_string().contains("width"));
    }

    #[test]
    fn min_mass_defaults() -> Result<()> {
        let pion = ParticleType::new(211, 0.138, 0.0, 1, 0)?;
        assert_eq!(pion.min_mass(), 0.138);
        assert!(pion.is_stable());

        let rho = ParticleType::new(113, 0.776, 0.149, 0, 2)?;
        assert!((rho.min_mass() - (0.776 - 2.0 * 0.149)).abs() < 1e-12);
        assert!(!rho.is_stable());

        let wide = ParticleType::new(9000221, 0.5, 0.4, 0, 0)?;
        assert_eq!(wide.min_mass(), 0.0, "min mass clamps at zero");

        let rho = rho.with_min_mass(2.0 * 0.138)?;
        assert_eq!(rho.min_mass(), 0.276);
        Ok(())
    }

    #[test]
    fn fermions_have_odd_spin_two() -> Result<()> {
        let proton = ParticleType::new(2212, 0.938, 0.0, 1, 1)?;
        let pion = ParticleType::new(211, 0.138, 0.0, 1, 0)?;
        assert!(proton.is_fermion());
        assert!(!pion.is_fermion());
        Ok(())
    }

    #[test]
    fn on_shell_momentum_and_effective_mass() -> Result<()> {
        let pion = ParticleType::new(211, 0.138, 0.0, 1, 0)?;
        let mut p = ParticleData::new(pion);
        assert_eq!(p.id(), None);
        assert_eq!(p.id_process(), 0);
        assert_eq!(p.xsec_scaling_factor, 1.0);

        p.set_momentum(0.138, ThreeVector::new(0.3, 0.0, -0.4));
        let expected_e = (0.138_f64 * 0.138 + 0.25).sqrt();
        assert!((p.momentum.x0 - expected_e).abs() < 1e-12);
        assert!((p.effective_mass() - 0.138).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn builders_reject_non_finite_input() -> Result<()> {
        let pion = ParticleType::new(211, 0.138, 0.0, 1, 0)?;
        let bad = FourVector::new(f64::INFINITY, 0.0, 0.0, 0.0);
        assert!(ParticleData::new(pion).with_momentum(bad).is_err());
        assert!(ParticleData::new(pion).with_position(bad).is_err());
        Ok(())
    }
}
