use crate::core::particle::ParticleType;
use crate::error::{Error, Result};

/// What kind of reaction a channel describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessKind {
    /// 1 -> 2 or 1 -> 3 resonance decay.
    Decay,
    /// 2 -> 2 scattering that keeps both incoming species.
    Elastic,
    /// 2 -> 1 resonance formation.
    Resonance,
    /// 2 -> 2 inelastic scattering.
    TwoToTwo,
    /// 2 -> n continuum excitation handled by string fragmentation.
    StringExcitation,
}

/// Branch weights at or below this threshold are dropped on insertion.
///
/// Far below any physical width or cross section in GeV-based units, far
/// above f64 denormal noise. Tune here if the unit system ever changes.
pub const WEIGHT_FLOOR: f64 = 1e-12;

/// One candidate final-state channel of an action: the species produced, the
/// partial weight (a decay width or a cross section) and the reaction kind.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessBranch {
    final_state_types: Vec<ParticleType>,
    weight: f64,
    kind: ProcessKind,
}

impl ProcessBranch {
    /// Create a branch after validating the weight and the final-state arity.
    ///
    /// Arity per kind: decay 2 or 3, elastic and 2 -> 2 exactly 2, resonance
    /// formation exactly 1, string excitation none (the fragmentation backend
    /// decides the multiplicity).
    ///
    /// Errors:
    /// - `Error::InvalidParam` on a negative or non-finite weight, or an
    ///   arity that does not fit the kind.
    pub fn new(
        final_state_types: Vec<ParticleType>,
        weight: f64,
        kind: ProcessKind,
    ) -> Result<Self> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidParam(format!(
                "branch weight must be finite and >= 0, got {weight}"
            )));
        }
        let n = final_state_types.len();
        let arity_ok = match kind {
            ProcessKind::Decay => n == 2 || n == 3,
            ProcessKind::Elastic | ProcessKind::TwoToTwo => n == 2,
            ProcessKind::Resonance => n == 1,
            ProcessKind::StringExcitation => n == 0,
        };
        if !arity_ok {
            return Err(Error::InvalidParam(format!(
                "{n} final-state species do not fit a {kind:?} branch"
            )));
        }
        Ok(Self {
            final_state_types,
            weight,
            kind,
        })
    }

    /// Partial weight of this channel (GeV for widths, mb for cross
    /// sections; the engine only ever compares weights of one action).
    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Reaction kind of this channel.
    #[inline]
    pub fn kind(&self) -> ProcessKind {
        self.kind
    }

    /// Number of final-state particles this channel produces.
    #[inline]
    pub fn particle_number(&self) -> usize {
        self.final_state_types.len()
    }

    /// Final-state species in channel order.
    #[inline]
    pub fn final_state_types(&self) -> &[ParticleType] {
        &self.final_state_types
    }
}
