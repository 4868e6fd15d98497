use crate::core::action::{Action, ActionVariant};
use crate::core::kinematics::{pcm, sample_final_mass};
use crate::core::particle::ParticleData;
use crate::core::process::{ProcessBranch, ProcessKind};
use crate::core::random::RandomSource;
use crate::core::vectors::EPS;
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Default proper-time delay before a string fragment interacts with its
/// full cross section (fm/c).
const DEFAULT_STRING_FORMATION_TIME: f64 = 1.0;

/// Cross-section provider: the partial cross sections of every channel a
/// pair of particles can reach at a given collision energy. The formulas
/// live outside the engine; the engine only consumes weights.
pub trait CrossSections {
    /// Elastic channel, if open.
    fn elastic(&self, a: &ParticleData, b: &ParticleData, sqrt_s: f64) -> Option<ProcessBranch>;

    /// 2 -> 1 resonance-formation channels.
    fn resonance_formation(
        &self,
        a: &ParticleData,
        b: &ParticleData,
        sqrt_s: f64,
    ) -> Vec<ProcessBranch>;

    /// 2 -> 2 inelastic channels.
    fn two_to_two(&self, a: &ParticleData, b: &ParticleData, sqrt_s: f64) -> Vec<ProcessBranch>;

    /// Continuum string-excitation channel, if open.
    fn string_excitation(
        &self,
        a: &ParticleData,
        b: &ParticleData,
        sqrt_s: f64,
    ) -> Option<ProcessBranch>;
}

/// External hadronization backend for string-excitation channels.
///
/// Implementations return the fragment list in the two-body
/// center-of-momentum frame; the action boosts, orders and stamps it.
pub trait StringFragmentation {
    fn fragment(
        &self,
        a: &ParticleData,
        b: &ParticleData,
        sqrt_s: f64,
        rng: &mut RandomSource,
    ) -> Result<Vec<ParticleData>>;
}

impl Action {
    /// Propose a two-body scattering of `a` and `b` at `time_of_execution`.
    pub fn scatter(a: ParticleData, b: ParticleData, time_of_execution: f64) -> Result<Self> {
        Action::with_incoming(
            vec![a, b],
            time_of_execution,
            ActionVariant::Scatter {
                fragmentation: None,
                string_formation_time: DEFAULT_STRING_FORMATION_TIME,
            },
        )
    }

    /// Attach a hadronization backend for string-excitation channels and set
    /// the fragment formation delay (fm/c).
    pub fn set_string_fragmentation(
        &mut self,
        backend: Arc<dyn StringFragmentation>,
        formation_time: f64,
    ) -> Result<()> {
        if !formation_time.is_finite() || formation_time < 0.0 {
            return Err(Error::InvalidParam(
                "string formation time must be finite and >= 0".into(),
            ));
        }
        match &mut self.variant {
            ActionVariant::Scatter {
                fragmentation,
                string_formation_time,
            } => {
                *fragmentation = Some(backend);
                *string_formation_time = formation_time;
                Ok(())
            }
            ActionVariant::Decay => Err(Error::InvalidState(
                "string fragmentation applies to scatter actions",
            )),
        }
    }

    /// Add one collision channel; sugar over `add_process`.
    pub fn add_collision(&mut self, branch: ProcessBranch) -> Result<()> {
        self.add_process(branch)
    }

    /// Add several collision channels at once.
    pub fn add_collisions(&mut self, branches: Vec<ProcessBranch>) -> Result<()> {
        self.add_processes(branches)
    }

    /// Query a cross-section provider for every channel this pair can reach
    /// and add the open ones.
    pub fn add_collisions_from(&mut self, xs: &dyn CrossSections) -> Result<()> {
        if matches!(self.variant, ActionVariant::Decay) {
            return Err(Error::InvalidState(
                "cross sections apply to scatter actions",
            ));
        }
        let a = self.incoming[0].clone();
        let b = self.incoming[1].clone();
        let sqrts = self.sqrt_s();
        if let Some(branch) = xs.elastic(&a, &b, sqrts) {
            self.add_collision(branch)?;
        }
        self.add_collisions(xs.resonance_formation(&a, &b, sqrts))?;
        self.add_collisions(xs.two_to_two(&a, &b, sqrts))?;
        if let Some(branch) = xs.string_excitation(&a, &b, sqrts) {
            self.add_collision(branch)?;
        }
        Ok(())
    }

    pub(crate) fn sample_scatter(&mut self, kind: ProcessKind, rng: &mut RandomSource) -> Result<()> {
        let sqrts = self.sqrt_s();
        match kind {
            ProcessKind::Elastic | ProcessKind::TwoToTwo => self.two_body_momenta(sqrts, rng),
            ProcessKind::Resonance => self.resonance_formation(sqrts),
            ProcessKind::StringExcitation => self.string_excitation(sqrts, rng),
            ProcessKind::Decay => Err(Error::InvalidState("decay channel on a scatter action")),
        }
    }

    /// Elastic and generic 2 -> 2: energies from the exact two-body
    /// formulas, isotropic direction in the center-of-momentum frame.
    ///
    /// Elastic keeps the actual incoming masses, so the momentum magnitude
    /// is preserved by construction; inelastic channels sample the outgoing
    /// masses, with Breit-Wigner tails for unstable products.
    fn two_body_momenta(&mut self, sqrts: f64, rng: &mut RandomSource) -> Result<()> {
        let elastic = self.process_kind == Some(ProcessKind::Elastic);
        let (m1, m2) = if elastic {
            // Pair the outgoing slots with the incoming species so each
            // keeps its own (possibly off-shell) mass.
            if self.outgoing[0].ptype.pdg != self.incoming[0].ptype.pdg {
                self.outgoing.swap(0, 1);
            }
            (
                self.incoming[0].effective_mass(),
                self.incoming[1].effective_mass(),
            )
        } else {
            let t1 = self.outgoing[0].ptype;
            let t2 = self.outgoing[1].ptype;
            let m1 = sample_final_mass(t1, sqrts - t2.min_mass(), rng)?;
            let m2 = sample_final_mass(t2, sqrts - m1, rng)?;
            (m1, m2)
        };
        let momentum = pcm(sqrts, m1, m2).ok_or_else(|| {
            Error::InfeasibleKinematics(format!(
                "final-state masses {m1} + {m2} do not fit into sqrt(s) = {sqrts}"
            ))
        })?;
        debug!(sqrts, m1, m2, momentum, "two-body final state sampled");

        let direction = rng.isotropic();
        self.outgoing[0].set_momentum(m1, direction * momentum);
        self.outgoing[1].set_momentum(m2, direction * (-momentum));
        self.boost_outgoing_to_lab();
        Ok(())
    }

    /// 2 -> 1: the resonance takes the exact summed four-momentum, so its
    /// mass is sqrt(s) by construction.
    fn resonance_formation(&mut self, sqrts: f64) -> Result<()> {
        let ptype = self.outgoing[0].ptype;
        if sqrts < ptype.min_mass() {
            return Err(Error::InfeasibleKinematics(format!(
                "sqrt(s) = {sqrts} below the minimum mass {} of pdg {}",
                ptype.min_mass(),
                ptype.pdg
            )));
        }
        self.outgoing[0].momentum = self.incoming_momentum();
        debug!(sqrts, pdg = ptype.pdg, "resonance formed");
        Ok(())
    }

    /// 2 -> n continuum: delegate to the hadronization backend, boost its
    /// center-of-momentum fragments to the computational frame, order them
    /// along the longitudinal axis, and stamp the delayed formation time.
    fn string_excitation(&mut self, sqrts: f64, rng: &mut RandomSource) -> Result<()> {
        let (backend, formation_delay) = match &self.variant {
            ActionVariant::Scatter {
                fragmentation: Some(backend),
                string_formation_time,
            } => (Arc::clone(backend), *string_formation_time),
            ActionVariant::Scatter {
                fragmentation: None,
                ..
            } => return Err(Error::HadronizationUnavailable),
            ActionVariant::Decay => {
                return Err(Error::InvalidState("string excitation on a decay action"))
            }
        };
        let fragments = backend.fragment(&self.incoming[0], &self.incoming[1], sqrts, rng)?;
        if fragments.is_empty() {
            return Err(Error::InfeasibleKinematics(format!(
                "fragmentation produced no hadrons at sqrt(s) = {sqrts}"
            )));
        }

        let point = self.interaction_point();
        let formed_at = self.time_of_execution() + formation_delay;
        self.outgoing = fragments;
        self.boost_outgoing_to_lab();
        self.outgoing.sort_by(|lhs, rhs| {
            lhs.momentum
                .x3
                .partial_cmp(&rhs.momentum.x3)
                .unwrap_or(Ordering::Equal)
        });
        for out in &mut self.outgoing {
            out.position = point;
            out.formation_time = formed_at;
            out.xsec_scaling_factor = 0.0;
        }
        debug!(sqrts, fragments = self.outgoing.len(), "string fragmented");
        Ok(())
    }
}

/// Time of closest approach of two particles in the computational frame
/// (fm/c), following the UrQMD convention. Negative when the pair is not
/// approaching.
pub fn collision_time(a: &ParticleData, b: &ParticleData) -> f64 {
    // t = -(dr . dv) / dv^2 with dv = p1/E1 - p2/E2, rewritten over the
    // common denominator E1 E2 so the momenta are never divided first.
    let dv_times_e1e2 =
        a.momentum.threevec() * b.momentum.x0 - b.momentum.threevec() * a.momentum.x0;
    let dv_sqr = dv_times_e1e2.sqr();
    if dv_sqr < EPS {
        return -1.0;
    }
    let dr = a.position.threevec() - b.position.threevec();
    -dr.dot(&dv_times_e1e2) * (a.momentum.x0 * b.momentum.x0 / dv_sqr)
}

/// Squared transverse distance of the pair in its center-of-momentum frame
/// (fm^2): d^2 = r^2 - (r . p)^2 / p^2 with r and p the relative position
/// and momentum in that frame.
pub fn transverse_distance_sqr(a: &ParticleData, b: &ParticleData) -> f64 {
    let beta = (a.momentum + b.momentum).velocity();
    let dr = (a.position.boosted(beta) - b.position.boosted(beta)).threevec();
    let dp = (a.momentum.boosted(beta) - b.momentum.boosted(beta)).threevec();
    let dp_sqr = dp.sqr();
    if dp_sqr < EPS {
        return dr.sqr();
    }
    let projection = dr.dot(&dp);
    (dr.sqr() - projection * projection / dp_sqr).max(0.0)
}
