//! Criteria evaluators: acquisition functions plus the rotation state used by
//! portfolio strategies.
//!
//! Every evaluator runs the same small state machine:
//!
//! ```text
//! Uninitialized --initialize_rotation--> Active(0)
//! Active(k)     --rotate-------------->  Active((k + 1) mod L), rotated = (k + 1 == L)
//! ```
//!
//! `L` is the [`cycle_length`](Criteria::cycle_length). A single criterion has
//! `L = 1`, so every rotation wraps.

mod functions;
mod hedge;
mod single;

pub use functions::Criterion;
pub use hedge::HedgeCriteria;
pub use single::SingleCriteria;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::surrogate::SurrogateModel;
use crate::types::CriteriaKind;

/// Winner of a criteria rotation: the point it proposed and its name.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BestCriterion {
    /// Best query point proposed by the winning criterion.
    pub point: Vec<f64>,
    /// Name of the winning criterion.
    pub name: String,
}

/// Position of an evaluator in its criteria rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RotationState {
    /// The rotation has not been started.
    #[default]
    Uninitialized,
    /// The rotation points at the criterion with this index.
    Active(usize),
}

impl RotationState {
    /// Current criterion index. An uninitialized rotation evaluates with the
    /// first criterion.
    #[must_use]
    pub fn cursor(self) -> usize {
        match self {
            Self::Uninitialized => 0,
            Self::Active(k) => k,
        }
    }

    pub(crate) fn start(&mut self) {
        *self = Self::Active(0);
    }

    pub(crate) fn advance(&mut self, cycle_length: usize) -> Result<bool> {
        match *self {
            Self::Uninitialized => Err(Error::RotationNotStarted),
            Self::Active(k) => {
                let next = (k + 1) % cycle_length.max(1);
                *self = Self::Active(next);
                Ok(next == 0)
            }
        }
    }
}

/// Acquisition evaluator bound to one particle's surrogate.
///
/// The surrogate and the dataset are passed in on every call rather than
/// stored, so an evaluator never outlives or aliases the model it scores.
/// The trait requires `Send + Sync` so particles can be evaluated on a worker
/// pool.
pub trait Criteria: Send + Sync {
    /// Name of the criterion currently selected by the rotation.
    fn name(&self) -> String;

    /// Acquisition value at `query`. Lower is better.
    ///
    /// # Errors
    ///
    /// Propagates prediction errors from `model`.
    fn evaluate(&self, model: &dyn SurrogateModel, data: &Dataset, query: &[f64])
    -> Result<f64>;

    /// Inform the evaluator that `query` was chosen this round.
    fn update(&mut self, query: &[f64]);

    /// Whether candidates proposed by different criteria must be compared
    /// before the next query point is chosen.
    fn requires_comparison(&self) -> bool;

    /// Number of rotation steps before the cursor wraps around.
    fn cycle_length(&self) -> usize;

    /// Current rotation state.
    fn rotation(&self) -> RotationState;

    /// Reset the rotation to its first criterion.
    fn initialize_rotation(&mut self);

    /// Record the best point found with the currently selected criterion.
    fn push_result(&mut self, result: &[f64]);

    /// Advance the rotation. Returns `true` when it wrapped back to the start.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RotationNotStarted`] before
    /// [`initialize_rotation`](Self::initialize_rotation).
    fn rotate(&mut self) -> Result<bool>;

    /// Pick the winning criterion among the recorded proposals.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingProposals`] if a criterion has not reported a
    /// result, and propagates prediction errors from `model`.
    fn best_criteria(&mut self, model: &dyn SurrogateModel, data: &Dataset)
    -> Result<BestCriterion>;
}

/// Build the criteria evaluator selected by `kind`.
///
/// Portfolio evaluators draw their own seed from `rng`.
#[must_use]
pub fn from_kind(kind: &CriteriaKind, dimension: usize, rng: &mut fastrand::Rng) -> Box<dyn Criteria> {
    match kind {
        CriteriaKind::Single(k) => Box::new(SingleCriteria::new(Criterion::new(*k, dimension))),
        CriteriaKind::Hedge(portfolio) => Box::new(HedgeCriteria::with_seed(
            portfolio.iter().map(|k| Criterion::new(*k, dimension)).collect(),
            rng.u64(..),
        )),
    }
}
