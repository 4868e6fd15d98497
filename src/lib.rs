//! Reaction engine for a discrete-event hadronic transport simulation.
//!
//! The crate decides what happens when particles meet. An [`Action`] holds a
//! snapshot of one proposed reaction (a resonance decay or a two-body
//! collision) together with all candidate final-state channels and their
//! weights. One channel is drawn proportionally to its decay width or cross
//! section, the outgoing kinematics are sampled in the proper frame, and the
//! result is applied to the [`Particles`] collection transactionally, so a
//! proposal whose premises went stale can never corrupt the world.
//!
//! The outer simulation owns time stepping and proposal generation. Cross
//! section formulas, Pauli-blocking occupations and string fragmentation are
//! supplied through the [`CrossSections`], [`PauliBlocker`] and
//! [`StringFragmentation`] traits; event writers consume
//! [`InteractionRecord`] values and the particle accessors instead of
//! formatting anything here.

pub mod core;
pub mod error;

pub use crate::core::{
    collision_time, transverse_distance_sqr, Action, ActionState, CrossSections, FourVector,
    InteractionRecord, ParticleData, ParticleType, Particles, PauliBlocker, ProcessBranch,
    ProcessKind, RandomSource, StringFragmentation, ThreeVector, WEIGHT_FLOOR,
};
pub use crate::error::{Error, Result};
