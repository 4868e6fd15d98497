use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the reaction engine.
///
/// Faults come in two classes. Recoverable ones mean a single proposed
/// reaction cannot happen as sampled; the caller may retry the draw or drop
/// the action and the simulation stays healthy. Fatal ones indicate a logic
/// or configuration problem upstream and should abort the run.
/// `is_recoverable` tells them apart.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// The selected channel cannot be realized at the available energy:
    /// below threshold, an empty mass window, or an exhausted rejection loop.
    #[error("infeasible kinematics: {0}")]
    InfeasibleKinematics(String),

    /// No subprocess channel with positive weight to choose from.
    #[error("no subprocess channels with positive weight")]
    NoChannels,

    /// The weighted channel walk ran past the last branch. The running sum
    /// is accumulated in the same order the total was, so this only happens
    /// if the branch list or the total was corrupted after insertion.
    #[error("channel selection failed: drew {drawn} of total weight {total_weight}")]
    SelectionFailed { drawn: f64, total_weight: f64 },

    /// Conserved quantities differ between the incoming and outgoing sides
    /// of a performed reaction.
    #[error("conservation violated in process {id_process}: {details}")]
    ConservationViolation { id_process: u64, details: String },

    /// A string-excitation channel was selected but no fragmentation backend
    /// is configured.
    #[error("hadronization requested but no fragmentation backend is configured")]
    HadronizationUnavailable,

    /// Action lifecycle misuse, e.g. performing twice or querying the final
    /// state before it was generated.
    #[error("invalid action state: {0}")]
    InvalidState(&'static str),
}

impl Error {
    /// True for faults that reject one proposed reaction without poisoning
    /// the simulation; the caller may discard the action or retry it.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NoChannels | Error::InfeasibleKinematics(_)
        )
    }
}
