use crate::core::action::{Action, ActionVariant};
use crate::core::kinematics::{orthonormal_basis, pcm, sample_final_mass};
use crate::core::particle::ParticleData;
use crate::core::process::ProcessBranch;
use crate::core::random::RandomSource;
use crate::error::{Error, Result};
use std::f64::consts::PI;
use tracing::debug;

/// Upper bound on Dalitz rejection attempts before a three-body channel is
/// declared infeasible at this energy.
const MAX_DALITZ_TRIES: usize = 10_000;

impl Action {
    /// Propose a decay of `particle` at `time_of_execution`.
    pub fn decay(particle: ParticleData, time_of_execution: f64) -> Result<Self> {
        Action::with_incoming(vec![particle], time_of_execution, ActionVariant::Decay)
    }

    /// Add decay channels; sugar over `add_processes` for decay actions.
    pub fn add_decays(&mut self, branches: Vec<ProcessBranch>) -> Result<()> {
        self.add_processes(branches)
    }

    /// Total decay width of the accumulated channels (GeV).
    #[inline]
    pub fn total_width(&self) -> f64 {
        self.total_weight()
    }

    pub(crate) fn sample_decay(&mut self, rng: &mut RandomSource) -> Result<()> {
        let sqrts = self.sqrt_s();
        match self.outgoing.len() {
            2 => self.one_to_two(sqrts, rng),
            3 => self.one_to_three(sqrts, rng),
            _ => Err(Error::InvalidState(
                "decay channels produce two or three particles",
            )),
        }
    }

    /// 1 -> 2: sample the daughter masses, put the daughters back to back at
    /// the two-body momentum with an isotropic direction in the parent rest
    /// frame, then boost.
    fn one_to_two(&mut self, sqrts: f64, rng: &mut RandomSource) -> Result<()> {
        let t1 = self.outgoing[0].ptype;
        let t2 = self.outgoing[1].ptype;
        let m1 = sample_final_mass(t1, sqrts - t2.min_mass(), rng)?;
        let m2 = sample_final_mass(t2, sqrts - m1, rng)?;
        let momentum = pcm(sqrts, m1, m2).ok_or_else(|| {
            Error::InfeasibleKinematics(format!(
                "decay into masses {m1} + {m2} does not fit into sqrt(s) = {sqrts}"
            ))
        })?;
        debug!(sqrts, m1, m2, momentum, "two-body decay sampled");

        let direction = rng.isotropic();
        self.outgoing[0].set_momentum(m1, direction * momentum);
        self.outgoing[1].set_momentum(m2, direction * (-momentum));
        self.boost_outgoing_to_lab();
        Ok(())
    }

    /// 1 -> 3: sample the Dalitz invariants by rejection inside their
    /// kinematic boundary, reconstruct the momenta in the parent rest frame
    /// with exact three-momentum closure, orient the decay plane uniformly,
    /// then boost.
    fn one_to_three(&mut self, sqrts: f64, rng: &mut RandomSource) -> Result<()> {
        let t1 = self.outgoing[0].ptype;
        let t2 = self.outgoing[1].ptype;
        let t3 = self.outgoing[2].ptype;
        let m1 = sample_final_mass(t1, sqrts - t2.min_mass() - t3.min_mass(), rng)?;
        let m2 = sample_final_mass(t2, sqrts - m1 - t3.min_mass(), rng)?;
        let m3 = sample_final_mass(t3, sqrts - m1 - m2, rng)?;
        if m1 + m2 + m3 >= sqrts {
            return Err(Error::InfeasibleKinematics(format!(
                "decay into masses {m1} + {m2} + {m3} does not fit into sqrt(s) = {sqrts}"
            )));
        }

        let s = sqrts * sqrts;
        // Dalitz variables s12 = (p1 + p2)^2 and s23 = (p2 + p3)^2, drawn
        // uniformly over the enclosing rectangle and accepted inside the
        // physical region.
        let s12_min = (m1 + m2) * (m1 + m2);
        let s12_max = (sqrts - m3) * (sqrts - m3);
        let s23_min = (m2 + m3) * (m2 + m3);
        let s23_max = (sqrts - m1) * (sqrts - m1);

        let mut tries = 0usize;
        let (s12, s23) = loop {
            if tries >= MAX_DALITZ_TRIES {
                return Err(Error::InfeasibleKinematics(format!(
                    "no dalitz point accepted after {MAX_DALITZ_TRIES} tries at sqrt(s) = {sqrts}"
                )));
            }
            tries += 1;
            let s12 = rng.uniform(s12_min, s12_max);
            let s23 = rng.uniform(s23_min, s23_max);
            if dalitz_accept(s, s12, s23, m1, m2, m3) {
                break (s12, s23);
            }
        };

        // Rest-frame energies from the invariants; E2 closes the energy sum.
        let e1 = (s + m1 * m1 - s23) / (2.0 * sqrts);
        let e3 = (s + m3 * m3 - s12) / (2.0 * sqrts);
        let e2 = sqrts - e1 - e3;
        let p1_abs = (e1 * e1 - m1 * m1).max(0.0).sqrt();
        let p2_abs = (e2 * e2 - m2 * m2).max(0.0).sqrt();
        let cos12 = if p1_abs * p2_abs > 0.0 {
            ((e1 * e2 - 0.5 * (s12 - m1 * m1 - m2 * m2)) / (p1_abs * p2_abs)).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let sin12 = (1.0 - cos12 * cos12).max(0.0).sqrt();

        // Uniform orientation: p1 along a random axis, p2 in a random plane
        // through it, p3 closing the triangle exactly.
        let axis = rng.isotropic();
        let (e_a, e_b) = orthonormal_basis(axis);
        let psi = rng.uniform(0.0, 2.0 * PI);
        let in_plane = e_a * psi.cos() + e_b * psi.sin();

        let p1 = axis * p1_abs;
        let p2 = (axis * cos12 + in_plane * sin12) * p2_abs;
        let p3 = -(p1 + p2);
        debug!(sqrts, m1, m2, m3, "three-body decay sampled");

        self.outgoing[0].set_momentum(m1, p1);
        self.outgoing[1].set_momentum(m2, p2);
        self.outgoing[2].set_momentum(m3, p3);
        self.boost_outgoing_to_lab();
        Ok(())
    }
}

/// Whether (s12, s23) lies inside the physical Dalitz region of a three-body
/// decay with total invariant mass squared `s`.
fn dalitz_accept(s: f64, s12: f64, s23: f64, m1: f64, m2: f64, m3: f64) -> bool {
    // In the (1,2) rest frame the allowed s23 band follows from the energies
    // of particle 2 and particle 3 there.
    let m12 = s12.sqrt();
    let e2 = (s12 - m1 * m1 + m2 * m2) / (2.0 * m12);
    let e3 = (s - s12 - m3 * m3) / (2.0 * m12);
    let p2 = (e2 * e2 - m2 * m2).max(0.0).sqrt();
    let p3 = (e3 * e3 - m3 * m3).max(0.0).sqrt();
    let sum = e2 + e3;
    let lo = sum * sum - (p2 + p3) * (p2 + p3);
    let hi = sum * sum - (p2 - p3) * (p2 - p3);
    s23 >= lo && s23 <= hi
}
