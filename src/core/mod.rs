//! Core reaction-engine types: vectors and kinematics, particles and their
//! collection, reaction channels, and the action state machine that decides
//! and applies reactions.

pub mod action;
pub mod decay;
pub mod kinematics;
pub mod particle;
pub mod particles;
pub mod process;
pub mod random;
pub mod scatter;
pub mod vectors;

pub use action::{Action, ActionState, InteractionRecord, PauliBlocker};
pub use particle::{ParticleData, ParticleType};
pub use particles::Particles;
pub use process::{ProcessBranch, ProcessKind, WEIGHT_FLOOR};
pub use random::RandomSource;
pub use scatter::{collision_time, transverse_distance_sqr, CrossSections, StringFragmentation};
pub use vectors::{FourVector, ThreeVector};
