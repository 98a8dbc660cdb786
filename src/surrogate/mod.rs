//! Surrogate model trait and the bundled Gaussian process.

mod gp;
mod kernel;

pub use gp::GpSurrogate;

use crate::dataset::Dataset;
use crate::distribution::Prediction;
use crate::error::Result;

/// Probabilistic regression model owned by one particle.
///
/// A surrogate is created unconfigured, receives its particle's
/// hyperparameters once through [`configure`](Self::configure), and is then
/// fitted and updated as observations arrive. Observations are owned by the
/// posterior model and lent to the surrogate on every call. The trait
/// requires `Send + Sync` so particles can be fitted on a worker pool.
///
/// # Implementing a custom surrogate
///
/// ```
/// use mcmc_posterior::{Dataset, Error, Prediction, Result, SurrogateModel};
///
/// /// Predicts the mean of the observations everywhere.
/// struct ConstantModel {
///     hyperparameters: Vec<f64>,
///     mean: Option<f64>,
/// }
///
/// impl SurrogateModel for ConstantModel {
///     fn name(&self) -> &'static str {
///         "constant"
///     }
///     fn hyperparameters(&self) -> &[f64] {
///         &self.hyperparameters
///     }
///     fn configure(&mut self, hyperparameters: &[f64]) -> Result<()> {
///         self.hyperparameters = hyperparameters.to_vec();
///         Ok(())
///     }
///     fn fit(&mut self, data: &Dataset) -> Result<()> {
///         let n = data.len() as f64;
///         self.mean = Some(data.targets().iter().sum::<f64>() / n);
///         Ok(())
///     }
///     fn update(&mut self, data: &Dataset) -> Result<()> {
///         self.fit(data)
///     }
///     fn predict(&self, _query: &[f64]) -> Result<Prediction> {
///         self.mean.map(|m| Prediction::new(m, 1.0)).ok_or(Error::NotFitted)
///     }
///     fn log_likelihood(&self) -> Result<f64> {
///         Ok(0.0)
///     }
/// }
/// ```
pub trait SurrogateModel: Send + Sync {
    /// Short name of the model family, for diagnostics.
    fn name(&self) -> &'static str;

    /// Hyperparameters set by the last [`configure`](Self::configure) call.
    fn hyperparameters(&self) -> &[f64];

    /// Set the model's hyperparameters. Invalidates any previous fit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if the
    /// vector has the wrong length or contains non-finite values.
    fn configure(&mut self, hyperparameters: &[f64]) -> Result<()>;

    /// Full refit on every observation in `data`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelFit`](crate::Error::ModelFit) on numerical failure.
    fn fit(&mut self, data: &Dataset) -> Result<()>;

    /// Incorporate the most recent observation of `data`, without a full
    /// refit where the model supports it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelFit`](crate::Error::ModelFit) on numerical failure.
    fn update(&mut self, data: &Dataset) -> Result<()>;

    /// Posterior predictive distribution at `query`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`](crate::Error::NotFitted) before the first
    /// fit and [`Error::DimensionMismatch`](crate::Error::DimensionMismatch)
    /// for a query of the wrong length.
    fn predict(&self, query: &[f64]) -> Result<Prediction>;

    /// Log marginal likelihood of the fitted observations under the current
    /// hyperparameters. Used as the MCMC target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`](crate::Error::NotFitted) before the first fit.
    fn log_likelihood(&self) -> Result<f64>;
}
