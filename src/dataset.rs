//! Observation set shared (by borrow) with every particle.

use crate::error::{Error, Result};

/// Observed inputs and targets of the objective function.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dataset {
    dimension: usize,
    inputs: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl Dataset {
    /// Creates an empty dataset over `dimension` input coordinates.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            inputs: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Appends one observation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `x` has the wrong length and
    /// [`Error::NonFiniteObservation`] if any value is NaN or infinite.
    pub fn add_sample(&mut self, x: &[f64], y: f64) -> Result<()> {
        if x.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                got: x.len(),
            });
        }
        if !y.is_finite() || x.iter().any(|v| !v.is_finite()) {
            return Err(Error::NonFiniteObservation);
        }
        self.inputs.push(x.to_vec());
        self.targets.push(y);
        Ok(())
    }

    /// Number of input coordinates.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns `true` if nothing has been observed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Observed inputs, in insertion order.
    #[must_use]
    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    /// Observed targets, in insertion order.
    #[must_use]
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// The most recent observation.
    #[must_use]
    pub fn last(&self) -> Option<(&[f64], f64)> {
        let x = self.inputs.last()?;
        let y = *self.targets.last()?;
        Some((x, y))
    }

    /// The observation with the lowest target.
    #[must_use]
    pub fn best(&self) -> Option<(&[f64], f64)> {
        self.targets
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, &y)| (self.inputs[i].as_slice(), y))
    }
}
