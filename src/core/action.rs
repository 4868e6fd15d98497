use crate::core::particle::ParticleData;
use crate::core::particles::Particles;
use crate::core::process::{ProcessBranch, ProcessKind, WEIGHT_FLOOR};
use crate::core::random::RandomSource;
use crate::core::scatter::StringFragmentation;
use crate::core::vectors::FourVector;
use crate::error::{Error, Result};
use ordered_float::NotNan;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Phase-space occupation oracle used for Pauli blocking.
pub trait PauliBlocker {
    /// Occupation f in [0, 1] of the single-particle phase-space cell the
    /// given particle would be produced into.
    fn occupation(&self, particle: &ParticleData) -> f64;
}

/// Lifecycle of an action.
///
/// A `Proposed` action accumulates channels; a successful final-state
/// generation moves it to `FinalStateGenerated`; a successful perform is
/// terminal. A failed generation drops back to `Proposed` with the outgoing
/// state cleared, so the caller may retry the draw or discard the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Proposed,
    FinalStateGenerated,
    Performed,
}

/// Payload distinguishing the two concrete reaction families.
#[derive(Clone)]
pub(crate) enum ActionVariant {
    Decay,
    Scatter {
        fragmentation: Option<Arc<dyn StringFragmentation>>,
        string_formation_time: f64,
    },
}

impl fmt::Debug for ActionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionVariant::Decay => write!(f, "Decay"),
            ActionVariant::Scatter {
                fragmentation,
                string_formation_time,
            } => f
                .debug_struct("Scatter")
                .field("fragmentation", &fragmentation.is_some())
                .field("string_formation_time", string_formation_time)
                .finish(),
        }
    }
}

/// A proposed reaction: a snapshot of the incoming particles, the time it
/// should run, and the candidate final-state channels with their weights.
///
/// Built with [`Action::decay`] or [`Action::scatter`], filled with
/// `add_process`/`add_processes` (or the kind-specific sugar), decided with
/// `generate_final_state`, admission-checked with `is_valid` and
/// `is_pauli_blocked`, and applied to the world with `perform`.
#[derive(Debug, Clone)]
pub struct Action {
    pub(crate) incoming: Vec<ParticleData>,
    pub(crate) time_of_execution: NotNan<f64>,
    pub(crate) subprocesses: Vec<ProcessBranch>,
    pub(crate) total_weight: f64,
    pub(crate) outgoing: Vec<ParticleData>,
    pub(crate) process_kind: Option<ProcessKind>,
    pub(crate) partial_weight: f64,
    pub(crate) state: ActionState,
    pub(crate) variant: ActionVariant,
}

/// Plain summary of one reaction for event writers and logs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionRecord {
    /// Time at which the reaction runs (fm/c).
    pub time: f64,
    /// Kind of the selected channel; `None` before a channel was selected.
    pub kind: Option<ProcessKind>,
    /// Number of incoming particles.
    pub incoming_count: usize,
    /// Number of outgoing particles.
    pub outgoing_count: usize,
    /// Sum of all channel weights.
    pub total_weight: f64,
    /// Weight of the selected channel.
    pub partial_weight: f64,
    /// Total energy in the center-of-momentum frame (GeV).
    pub sqrt_s: f64,
}

impl Action {
    pub(crate) fn with_incoming(
        incoming: Vec<ParticleData>,
        time_of_execution: f64,
        variant: ActionVariant,
    ) -> Result<Self> {
        if !time_of_execution.is_finite() {
            return Err(Error::InvalidParam(
                "time of execution must be finite".into(),
            ));
        }
        let time_of_execution = NotNan::new(time_of_execution)
            .map_err(|_| Error::InvalidParam("time of execution cannot be NaN".into()))?;
        Ok(Self {
            incoming,
            time_of_execution,
            subprocesses: Vec::new(),
            total_weight: 0.0,
            outgoing: Vec::new(),
            process_kind: None,
            partial_weight: 0.0,
            state: ActionState::Proposed,
            variant,
        })
    }

    /// Add one candidate channel.
    ///
    /// Branches with weight at or below [`WEIGHT_FLOOR`] are dropped
    /// silently; everything else appends to the channel list and accumulates
    /// the total weight. The branch kind must fit the action: decay kinds on
    /// decay actions, scatter kinds on scatter actions, and elastic branches
    /// must reproduce the incoming species pair.
    pub fn add_process(&mut self, branch: ProcessBranch) -> Result<()> {
        if self.state != ActionState::Proposed {
            return Err(Error::InvalidState(
                "channels can only be added before final-state generation",
            ));
        }
        self.check_branch_fits(&branch)?;
        if branch.weight() <= WEIGHT_FLOOR {
            return Ok(());
        }
        self.total_weight += branch.weight();
        self.subprocesses.push(branch);
        Ok(())
    }

    /// Add several channels at once.
    pub fn add_processes(&mut self, branches: Vec<ProcessBranch>) -> Result<()> {
        for branch in branches {
            self.add_process(branch)?;
        }
        Ok(())
    }

    fn check_branch_fits(&self, branch: &ProcessBranch) -> Result<()> {
        match (&self.variant, branch.kind()) {
            (ActionVariant::Decay, ProcessKind::Decay) => Ok(()),
            (ActionVariant::Decay, kind) => Err(Error::InvalidParam(format!(
                "{kind:?} branch on a decay action"
            ))),
            (ActionVariant::Scatter { .. }, ProcessKind::Decay) => Err(Error::InvalidParam(
                "decay branch on a scatter action".into(),
            )),
            (ActionVariant::Scatter { .. }, ProcessKind::Elastic) => {
                let (a, b) = (self.incoming[0].ptype.pdg, self.incoming[1].ptype.pdg);
                let out = branch.final_state_types();
                let (x, y) = (out[0].pdg, out[1].pdg);
                if (a, b) == (x, y) || (a, b) == (y, x) {
                    Ok(())
                } else {
                    Err(Error::InvalidParam(format!(
                        "elastic branch must keep the incoming species pair ({a}, {b}), got ({x}, {y})"
                    )))
                }
            }
            (ActionVariant::Scatter { .. }, _) => Ok(()),
        }
    }

    /// Draw one channel index proportionally to the branch weights.
    ///
    /// Walks the list in insertion order accumulating the same running sum
    /// `add_process` built, so for any draw strictly below the total the
    /// walk terminates within the list.
    pub(crate) fn choose_channel(&self, rng: &mut RandomSource) -> Result<usize> {
        if self.subprocesses.is_empty() || self.total_weight <= 0.0 {
            return Err(Error::NoChannels);
        }
        let drawn = rng.uniform(0.0, self.total_weight);
        let mut running = 0.0;
        for (index, branch) in self.subprocesses.iter().enumerate() {
            running += branch.weight();
            if running >= drawn {
                return Ok(index);
            }
        }
        error!(
            drawn,
            total_weight = self.total_weight,
            "channel walk ran past the last branch"
        );
        Err(Error::SelectionFailed {
            drawn,
            total_weight: self.total_weight,
        })
    }

    /// Decide the final state: draw one channel, then sample masses and
    /// momenta for it.
    ///
    /// On success the action is `FinalStateGenerated` and the outgoing
    /// particles are ready for `perform`. On failure the action reverts to
    /// `Proposed` with no outgoing state; recoverable errors
    /// (`Error::is_recoverable`) leave it safe to retry with a fresh draw.
    pub fn generate_final_state(&mut self, rng: &mut RandomSource) -> Result<()> {
        if self.state != ActionState::Proposed {
            return Err(Error::InvalidState("final state already generated"));
        }
        let index = self.choose_channel(rng)?;
        let branch = self.subprocesses[index].clone();
        self.process_kind = Some(branch.kind());
        self.partial_weight = branch.weight();
        self.prepare_outgoing(&branch);
        let sampled = match branch.kind() {
            ProcessKind::Decay => self.sample_decay(rng),
            kind => self.sample_scatter(kind, rng),
        };
        match sampled {
            Ok(()) => {
                self.state = ActionState::FinalStateGenerated;
                Ok(())
            }
            Err(e) => {
                self.outgoing.clear();
                self.process_kind = None;
                self.partial_weight = 0.0;
                Err(e)
            }
        }
    }

    /// Seed the outgoing list with particles of the channel's species placed
    /// at the interaction point; the samplers fill in the momenta.
    fn prepare_outgoing(&mut self, branch: &ProcessBranch) {
        let point = self.interaction_point();
        let time = self.time_of_execution.into_inner();
        self.outgoing = branch
            .final_state_types()
            .iter()
            .map(|&ptype| {
                let mut particle = ParticleData::new(ptype);
                particle.position = point;
                particle.formation_time = time;
                particle
            })
            .collect();
    }

    /// Where the reaction happens: the decaying particle's position, or the
    /// midpoint between the two scattering partners, with the time component
    /// pinned to the execution time.
    pub fn interaction_point(&self) -> FourVector {
        let mut point = match self.incoming.len() {
            1 => self.incoming[0].position,
            _ => (self.incoming[0].position + self.incoming[1].position) * 0.5,
        };
        point.x0 = self.time_of_execution.into_inner();
        point
    }

    /// Check whether the action still applies: every incoming particle must
    /// still exist in the collection. A competing reaction that consumed one
    /// of them makes this action stale, which is expected control flow, not
    /// an error.
    pub fn is_valid(&self, particles: &Particles) -> bool {
        self.incoming
            .iter()
            .all(|p| p.id().is_some_and(|id| particles.contains(id)))
    }

    /// Decide whether Pauli blocking suppresses this final state.
    ///
    /// The combined blocking probability over the outgoing fermions is
    /// 1 - prod(1 - f_i); a single uniform draw decides. Final states
    /// without fermions are never blocked and consume no randomness.
    ///
    /// Errors:
    /// - `Error::InvalidState` before a final state was generated.
    pub fn is_pauli_blocked(
        &self,
        blocker: &dyn PauliBlocker,
        rng: &mut RandomSource,
    ) -> Result<bool> {
        if self.state != ActionState::FinalStateGenerated {
            return Err(Error::InvalidState(
                "pauli blocking needs a generated final state",
            ));
        }
        let mut pass_probability = 1.0;
        let mut fermions = 0usize;
        for particle in self.outgoing.iter().filter(|p| p.ptype.is_fermion()) {
            fermions += 1;
            let raw = blocker.occupation(particle);
            if !(0.0..=1.0).contains(&raw) {
                warn!(
                    occupation = raw,
                    pdg = particle.ptype.pdg,
                    "occupation outside [0, 1], clamping"
                );
            }
            pass_probability *= 1.0 - raw.clamp(0.0, 1.0);
        }
        if fermions == 0 {
            return Ok(false);
        }
        let block_probability = 1.0 - pass_probability;
        let blocked = rng.canonical() < block_probability;
        if blocked {
            debug!(block_probability, fermions, "final state pauli-blocked");
        }
        Ok(blocked)
    }

    /// Apply the reaction to the world: remove the incoming particles,
    /// insert the outgoing ones stamped with a fresh process id, and verify
    /// the conservation laws.
    ///
    /// The removal is all-or-nothing. Every incoming particle is checked for
    /// presence before the first one is taken out, so a stale action (which
    /// the caller should have filtered with `is_valid`) leaves the
    /// collection untouched. A performed action is terminal.
    ///
    /// Errors:
    /// - `Error::InvalidState` without a generated final state, on a second
    ///   perform, or when an incoming particle has left the collection.
    /// - `Error::ConservationViolation` if the sampled final state does not
    ///   balance; the world has been mutated at that point and the run
    ///   should abort.
    pub fn perform(&mut self, particles: &mut Particles, id_process: &mut u64) -> Result<()> {
        match self.state {
            ActionState::FinalStateGenerated => {}
            ActionState::Performed => {
                return Err(Error::InvalidState("action was already performed"))
            }
            ActionState::Proposed => {
                return Err(Error::InvalidState("perform needs a generated final state"))
            }
        }

        let mut incoming_ids = Vec::with_capacity(self.incoming.len());
        for particle in &self.incoming {
            let id = particle.id().ok_or(Error::InvalidState(
                "incoming particle was never inserted into a collection",
            ))?;
            if !particles.contains(id) {
                return Err(Error::InvalidState(
                    "incoming particle has left the collection",
                ));
            }
            incoming_ids.push(id);
        }
        for id in incoming_ids {
            particles.remove(id);
        }

        *id_process += 1;
        for out in &mut self.outgoing {
            out.set_id_process(*id_process);
            let id = particles.insert(out.clone());
            out.set_id(id);
        }

        debug!(
            id_process = *id_process,
            kind = ?self.process_kind,
            outgoing = self.outgoing.len(),
            "reaction performed"
        );
        self.state = ActionState::Performed;
        self.check_conservation(*id_process)
    }

    /// Verify four-momentum (within a scaled tolerance) and electric charge
    /// (exactly) between the incoming and outgoing sides.
    ///
    /// A violation means a sampler bug rather than a physics outcome; the
    /// error carries the full particle content of both sides.
    pub fn check_conservation(&self, id_process: u64) -> Result<()> {
        let p_in = self.incoming_momentum();
        let p_out = self
            .outgoing
            .iter()
            .fold(FourVector::default(), |acc, p| acc + p.momentum);
        let diff = p_in - p_out;
        let tol = 1e-6 * p_in.x0.abs().max(1.0) + 1e-9;
        let momentum_ok = diff.x0.abs() <= tol
            && diff.x1.abs() <= tol
            && diff.x2.abs() <= tol
            && diff.x3.abs() <= tol;

        let charge_in: i32 = self.incoming.iter().map(|p| p.ptype.charge).sum();
        let charge_out: i32 = self.outgoing.iter().map(|p| p.ptype.charge).sum();

        if momentum_ok && charge_in == charge_out {
            return Ok(());
        }
        let details = format!(
            "four-momentum difference {diff:?} (tolerance {tol}), \
             charge {charge_in} -> {charge_out}, \
             incoming {:?}, outgoing {:?}",
            self.incoming, self.outgoing
        );
        error!(id_process, %details, "conservation violated");
        Err(Error::ConservationViolation {
            id_process,
            details,
        })
    }

    /// Summed four-momentum of the incoming particles.
    pub(crate) fn incoming_momentum(&self) -> FourVector {
        self.incoming
            .iter()
            .fold(FourVector::default(), |acc, p| acc + p.momentum)
    }

    /// Boost freshly sampled rest/CM-frame momenta into the computational
    /// frame of the incoming particles.
    pub(crate) fn boost_outgoing_to_lab(&mut self) {
        let beta = self.incoming_momentum().velocity();
        for out in &mut self.outgoing {
            out.momentum = out.momentum.boosted(-beta);
        }
    }

    /// Total energy in the center-of-momentum frame: the invariant mass of
    /// the summed incoming four-momenta.
    pub fn sqrt_s(&self) -> f64 {
        self.incoming_momentum().abs()
    }

    /// Summary record of this action for the output layer.
    pub fn record(&self) -> InteractionRecord {
        InteractionRecord {
            time: self.time_of_execution.into_inner(),
            kind: self.process_kind,
            incoming_count: self.incoming.len(),
            outgoing_count: self.outgoing.len(),
            total_weight: self.total_weight,
            partial_weight: self.partial_weight,
            sqrt_s: self.sqrt_s(),
        }
    }

    /// The incoming snapshots, in construction order.
    #[inline]
    pub fn incoming_particles(&self) -> &[ParticleData] {
        &self.incoming
    }

    /// The outgoing particles; empty until a final state was generated.
    #[inline]
    pub fn outgoing_particles(&self) -> &[ParticleData] {
        &self.outgoing
    }

    /// Kind of the selected channel, once one was selected.
    #[inline]
    pub fn process_kind(&self) -> Option<ProcessKind> {
        self.process_kind
    }

    /// Sum of all channel weights.
    #[inline]
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Weight of the selected channel; zero before selection.
    #[inline]
    pub fn partial_weight(&self) -> f64 {
        self.partial_weight
    }

    /// Time at which the action is supposed to run (fm/c).
    #[inline]
    pub fn time_of_execution(&self) -> f64 {
        self.time_of_execution.into_inner()
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> ActionState {
        self.state
    }
}

/// Actions order by execution time alone; everything at the same time
/// compares equal, which is all a time-ordered queue needs.
impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.time_of_execution == other.time_of_execution
    }
}

impl Eq for Action {}

impl Ord for Action {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time_of_execution.cmp(&other.time_of_execution)
    }
}

impl PartialOrd for Action {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
