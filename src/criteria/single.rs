use super::{BestCriterion, Criteria, Criterion, RotationState};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::surrogate::SurrogateModel;

/// Criteria evaluator wrapping one fixed criterion.
///
/// Never needs a comparison between candidates. The rotation has cycle
/// length 1, and the best criterion is always the wrapped one, proposing the
/// last pushed result.
#[derive(Clone, Debug)]
pub struct SingleCriteria {
    criterion: Criterion,
    rotation: RotationState,
    last_result: Option<Vec<f64>>,
}

impl SingleCriteria {
    /// Wraps `criterion`.
    #[must_use]
    pub fn new(criterion: Criterion) -> Self {
        Self {
            criterion,
            rotation: RotationState::Uninitialized,
            last_result: None,
        }
    }
}

impl Criteria for SingleCriteria {
    fn name(&self) -> String {
        self.criterion.to_string()
    }

    fn evaluate(
        &self,
        model: &dyn SurrogateModel,
        data: &Dataset,
        query: &[f64],
    ) -> Result<f64> {
        self.criterion.evaluate(model, data, query)
    }

    fn update(&mut self, query: &[f64]) {
        self.criterion.observe(query);
    }

    fn requires_comparison(&self) -> bool {
        false
    }

    fn cycle_length(&self) -> usize {
        1
    }

    fn rotation(&self) -> RotationState {
        self.rotation
    }

    fn initialize_rotation(&mut self) {
        self.rotation.start();
    }

    fn push_result(&mut self, result: &[f64]) {
        self.last_result = Some(result.to_vec());
    }

    fn rotate(&mut self) -> Result<bool> {
        self.rotation.advance(1)
    }

    fn best_criteria(
        &mut self,
        _model: &dyn SurrogateModel,
        _data: &Dataset,
    ) -> Result<BestCriterion> {
        let point = self.last_result.clone().ok_or(Error::MissingProposals {
            expected: 1,
            recorded: 0,
        })?;
        Ok(BestCriterion {
            point,
            name: self.name(),
        })
    }
}
