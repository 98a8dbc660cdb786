//! Hedge portfolio over several acquisition functions.
//!
//! Each round the optimizer rotates through the portfolio, maximizing one
//! criterion at a time and pushing the point it found. Once every criterion
//! has proposed a point, [`best_criteria`](Criteria::best_criteria) scores the
//! proposals by the surrogate's predicted mean, picks a winner at random with
//! probabilities given by a softmax over the accumulated gains, and then
//! charges every criterion the loss of its proposal.

use super::{BestCriterion, Criteria, Criterion, RotationState};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::surrogate::SurrogateModel;

/// Upper bound on the Hedge learning rate.
const MAX_ETA: f64 = 10.0;

/// Portfolio criteria evaluator using the Hedge bandit strategy.
#[derive(Clone, Debug)]
pub struct HedgeCriteria {
    portfolio: Vec<Criterion>,
    rotation: RotationState,
    proposals: Vec<Option<Vec<f64>>>,
    gains: Vec<f64>,
    rng: fastrand::Rng,
}

impl HedgeCriteria {
    /// Creates a Hedge evaluator over `portfolio` whose winner draws use
    /// `seed`.
    #[must_use]
    pub fn with_seed(portfolio: Vec<Criterion>, seed: u64) -> Self {
        let n = portfolio.len();
        Self {
            portfolio,
            rotation: RotationState::Uninitialized,
            proposals: vec![None; n],
            gains: vec![0.0; n],
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Criteria in rotation order.
    #[must_use]
    pub fn portfolio(&self) -> &[Criterion] {
        &self.portfolio
    }

    fn current(&self) -> Option<&Criterion> {
        self.portfolio.get(self.rotation.cursor())
    }
}

impl Criteria for HedgeCriteria {
    fn name(&self) -> String {
        self.current().map(ToString::to_string).unwrap_or_default()
    }

    fn evaluate(
        &self,
        model: &dyn SurrogateModel,
        data: &Dataset,
        query: &[f64],
    ) -> Result<f64> {
        self.current()
            .ok_or(Error::Internal("hedge portfolio is empty"))?
            .evaluate(model, data, query)
    }

    fn update(&mut self, query: &[f64]) {
        for criterion in &mut self.portfolio {
            criterion.observe(query);
        }
    }

    fn requires_comparison(&self) -> bool {
        true
    }

    fn cycle_length(&self) -> usize {
        self.portfolio.len()
    }

    fn rotation(&self) -> RotationState {
        self.rotation
    }

    fn initialize_rotation(&mut self) {
        self.rotation.start();
        self.proposals.iter_mut().for_each(|p| *p = None);
    }

    fn push_result(&mut self, result: &[f64]) {
        if let Some(slot) = self.proposals.get_mut(self.rotation.cursor()) {
            *slot = Some(result.to_vec());
        }
    }

    fn rotate(&mut self) -> Result<bool> {
        self.rotation.advance(self.portfolio.len())
    }

    fn best_criteria(
        &mut self,
        model: &dyn SurrogateModel,
        _data: &Dataset,
    ) -> Result<BestCriterion> {
        let recorded = self.proposals.iter().filter(|p| p.is_some()).count();
        if recorded < self.portfolio.len() || recorded == 0 {
            return Err(Error::MissingProposals {
                expected: self.portfolio.len(),
                recorded,
            });
        }

        let losses = self
            .proposals
            .iter()
            .flatten()
            .map(|point| model.predict(point).map(|p| p.mean()))
            .collect::<Result<Vec<f64>>>()?;

        let winner = hedge_step(&mut self.gains, &losses, &mut self.rng);
        let point = self.proposals[winner]
            .clone()
            .ok_or(Error::Internal("hedge winner has no proposal"))?;
        let name = self.portfolio[winner].to_string();
        trace_debug!(winner = %name, ?losses, "hedge picked criterion");

        Ok(BestCriterion { point, name })
    }
}

/// One Hedge round: draw an arm from the softmax of `gains`, then charge
/// every arm its loss. Returns the drawn index.
///
/// Gains are re-centered on their mean before the softmax. The learning rate
/// is `min(10, sqrt(2 ln L / max gain))`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn hedge_step(gains: &mut [f64], losses: &[f64], rng: &mut fastrand::Rng) -> usize {
    let n = gains.len();
    let mean_gain = gains.iter().sum::<f64>() / n as f64;
    for g in gains.iter_mut() {
        *g -= mean_gain;
    }

    let max_gain = gains.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let eta = if max_gain > 0.0 {
        (2.0 * (n as f64).ln() / max_gain).sqrt().min(MAX_ETA)
    } else {
        MAX_ETA
    };

    let weights: Vec<f64> = gains.iter().map(|g| (eta * (g - max_gain)).exp()).collect();
    let total: f64 = weights.iter().sum();

    let u = rng.f64() * total;
    let mut cumulative = 0.0;
    let mut chosen = n - 1;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if u < cumulative {
            chosen = i;
            break;
        }
    }

    // Losses are shifted so the best proposal costs nothing.
    let min_loss = losses.iter().copied().fold(f64::INFINITY, f64::min);
    for (g, l) in gains.iter_mut().zip(losses) {
        *g -= l - min_loss;
    }

    chosen
}
