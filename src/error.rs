/// Errors produced while building or driving a posterior model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the configuration cannot produce an ensemble.
    ///
    /// Covers a zero particle count or dimension, non-positive noise or prior
    /// width, an empty Hedge portfolio, and unknown kind names.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Returned when the hyperparameter sampler cannot deliver the requested
    /// particles, or delivers invalid ones.
    #[error("sampling error: {0}")]
    Sampling(String),

    /// Returned when a surrogate fails numerically (e.g. a covariance matrix
    /// that is not positive definite).
    #[error("model fit error: {0}")]
    ModelFit(String),

    /// Returned when particles disagree on whether their criteria rotation
    /// wrapped around. Indicates a bug in a criteria implementation.
    #[error(
        "rotation inconsistency: particle {particle} reported rotated = {got}, expected {expected}"
    )]
    RotationInconsistency {
        /// Index of the first disagreeing particle.
        particle: usize,
        /// Outcome reported by particle 0.
        expected: bool,
        /// Outcome reported by the disagreeing particle.
        got: bool,
    },

    /// Returned when the criteria rotation is advanced before it was started.
    #[error("criteria rotation has not been started")]
    RotationNotStarted,

    /// Returned when the best criterion is requested before every criterion
    /// in the rotation has reported its proposal.
    #[error("missing proposals: expected {expected}, recorded {recorded}")]
    MissingProposals {
        /// Number of criteria in the rotation.
        expected: usize,
        /// Number of proposals recorded so far.
        recorded: usize,
    },

    /// Returned when a surrogate is queried before it has been fitted.
    #[error("surrogate model has not been fitted")]
    NotFitted,

    /// Returned when a point does not have the expected number of coordinates.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// The expected number of coordinates.
        expected: usize,
        /// The actual number of coordinates.
        got: usize,
    },

    /// Returned when an observation contains NaN or infinite values.
    #[error("observation contains non-finite values")]
    NonFiniteObservation,

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;
