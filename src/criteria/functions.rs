//! Single acquisition functions. Lower values are better for every criterion.

use core::fmt;

use crate::dataset::Dataset;
use crate::distribution::{Prediction, STD_EPSILON, norm_cdf, norm_pdf};
use crate::error::Result;
use crate::surrogate::SurrogateModel;
use crate::types::CriterionKind;

/// One acquisition function plus the little state it carries between rounds.
#[derive(Clone, Debug)]
pub struct Criterion {
    kind: CriterionKind,
    dimension: usize,
    /// Number of query points chosen so far.
    steps: usize,
}

impl Criterion {
    /// Creates a criterion for a `dimension`-dimensional input space.
    #[must_use]
    pub fn new(kind: CriterionKind, dimension: usize) -> Self {
        Self {
            kind,
            dimension,
            steps: 0,
        }
    }

    /// Number of query points observed through [`observe`](Self::observe).
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Record that a query point was chosen.
    pub fn observe(&mut self, _query: &[f64]) {
        self.steps += 1;
    }

    /// Evaluate the criterion at `query` under `model`.
    ///
    /// # Errors
    ///
    /// Propagates prediction errors from the surrogate.
    pub fn evaluate(
        &self,
        model: &dyn SurrogateModel,
        data: &Dataset,
        query: &[f64],
    ) -> Result<f64> {
        let prediction = model.predict(query)?;
        let incumbent = data.best().map_or(prediction.mean(), |(_, y)| y);
        Ok(self.value(&prediction, incumbent))
    }

    /// Criterion value for a predictive distribution and the best observed
    /// target so far.
    #[must_use]
    pub fn value(&self, prediction: &Prediction, incumbent: f64) -> f64 {
        let (mean, std) = (prediction.mean(), prediction.std());
        match self.kind {
            CriterionKind::ExpectedImprovement => -expected_improvement(mean, std, incumbent),
            CriterionKind::LowerConfidenceBound { beta } => mean - beta * std,
            CriterionKind::ProbabilityOfImprovement { epsilon } => {
                -probability_of_improvement(mean, std, incumbent - epsilon)
            }
            CriterionKind::AnnealedLowerConfidenceBound => mean - self.annealed_beta() * std,
            CriterionKind::Mean => mean,
        }
    }

    /// Exploration weight of the annealed lower confidence bound.
    ///
    /// `β_t = sqrt(2 ln(t²) (d + 1) + 5 d ln d)` with `t` the number of
    /// chosen points plus one.
    #[allow(clippy::cast_precision_loss)]
    fn annealed_beta(&self) -> f64 {
        let t = (self.steps + 1) as f64;
        let d = self.dimension.max(1) as f64;
        (2.0 * (t * t).ln() * (d + 1.0) + 5.0 * d * d.ln()).sqrt()
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

/// `EI(x) = (f_best - mean) Φ(z) + std φ(z)` with `z = (f_best - mean) / std`.
fn expected_improvement(mean: f64, std: f64, f_best: f64) -> f64 {
    if std < STD_EPSILON {
        return (f_best - mean).max(0.0);
    }
    let z = (f_best - mean) / std;
    let improvement = (f_best - mean) * norm_cdf(z) + std * norm_pdf(z);
    improvement.max(0.0)
}

/// `P(Y < target)` under the predictive distribution.
fn probability_of_improvement(mean: f64, std: f64, target: f64) -> f64 {
    if std < STD_EPSILON {
        return if mean < target { 1.0 } else { 0.0 };
    }
    norm_cdf((target - mean) / std)
}
