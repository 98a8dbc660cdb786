//! Construction-time configuration of a posterior model.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{CriteriaKind, SurrogateKind};

/// Default number of MCMC particles.
pub const DEFAULT_PARTICLE_COUNT: usize = 10;
/// Default observation noise variance.
pub const DEFAULT_NOISE_VARIANCE: f64 = 1e-6;
/// Default prior mean of every log-lengthscale (`ln 0.3`).
pub const DEFAULT_PRIOR_MEAN: f64 = -1.203_972_804_325_936;
/// Default prior standard deviation of every log-lengthscale.
pub const DEFAULT_PRIOR_STD: f64 = 1.0;

/// Independent normal prior over the log-lengthscales of the surrogate.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HyperPrior {
    /// Prior mean of each log-lengthscale.
    pub mean: f64,
    /// Prior standard deviation of each log-lengthscale.
    pub std: f64,
}

impl Default for HyperPrior {
    fn default() -> Self {
        Self {
            mean: DEFAULT_PRIOR_MEAN,
            std: DEFAULT_PRIOR_STD,
        }
    }
}

impl HyperPrior {
    /// Log density (up to a constant) of a hyperparameter vector.
    #[must_use]
    pub fn log_density(&self, theta: &[f64]) -> f64 {
        theta
            .iter()
            .map(|&t| {
                let z = (t - self.mean) / self.std;
                -0.5 * z * z
            })
            .sum()
    }
}

/// Configuration consumed when building an ensemble.
///
/// Inputs are assumed to live in the unit hypercube; the default lengthscale
/// prior is tuned for that scale.
///
/// # Examples
///
/// ```
/// use mcmc_posterior::{CriteriaKind, PosteriorConfig};
///
/// let config = PosteriorConfig::builder()
///     .particle_count(5)
///     .criteria("hedge(ei,lcb,poi)".parse::<CriteriaKind>().unwrap())
///     .noise_variance(1e-4)
///     .build()
///     .unwrap();
/// assert_eq!(config.particle_count, 5);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PosteriorConfig {
    /// Number of particles drawn from the hyperparameter posterior.
    pub particle_count: usize,
    /// Surrogate family built for every particle.
    pub surrogate: SurrogateKind,
    /// Criteria evaluator built for every particle.
    pub criteria: CriteriaKind,
    /// Observation noise variance added to the kernel diagonal.
    pub noise_variance: f64,
    /// One lengthscale per input dimension when `true`, a single shared one
    /// otherwise.
    pub ard: bool,
    /// Prior over log-lengthscales.
    pub prior: HyperPrior,
}

impl Default for PosteriorConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            surrogate: SurrogateKind::default(),
            criteria: CriteriaKind::default(),
            noise_variance: DEFAULT_NOISE_VARIANCE,
            ard: true,
            prior: HyperPrior::default(),
        }
    }
}

impl PosteriorConfig {
    /// Creates a builder starting from the defaults.
    #[must_use]
    pub fn builder() -> PosteriorConfigBuilder {
        PosteriorConfigBuilder::default()
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] on a zero particle count, a
    /// non-positive noise variance or prior width, or an invalid criteria
    /// kind.
    pub fn validate(&self) -> Result<()> {
        if self.particle_count == 0 {
            return Err(Error::Configuration(
                "particle count must be at least 1".into(),
            ));
        }
        if !(self.noise_variance.is_finite() && self.noise_variance > 0.0) {
            return Err(Error::Configuration(format!(
                "noise variance must be positive, got {}",
                self.noise_variance
            )));
        }
        if !self.prior.mean.is_finite() {
            return Err(Error::Configuration("prior mean must be finite".into()));
        }
        if !(self.prior.std.is_finite() && self.prior.std > 0.0) {
            return Err(Error::Configuration(format!(
                "prior std must be positive, got {}",
                self.prior.std
            )));
        }
        self.criteria.validate()
    }

    /// Number of hyperparameters per particle for the given input dimension.
    #[must_use]
    pub fn n_hyperparameters(&self, dimension: usize) -> usize {
        match self.surrogate {
            SurrogateKind::GaussianProcess(_) => {
                if self.ard {
                    dimension
                } else {
                    1
                }
            }
        }
    }

    /// Prior mode, used as the starting point of the MCMC chain.
    #[must_use]
    pub fn initial_hyperparameters(&self, dimension: usize) -> Vec<f64> {
        vec![self.prior.mean; self.n_hyperparameters(dimension)]
    }
}

/// Builder for [`PosteriorConfig`].
#[derive(Debug, Clone, Default)]
pub struct PosteriorConfigBuilder {
    config: PosteriorConfig,
}

impl PosteriorConfigBuilder {
    /// Sets the number of particles. Default: 10.
    #[must_use]
    pub fn particle_count(mut self, n: usize) -> Self {
        self.config.particle_count = n;
        self
    }

    /// Sets the surrogate family.
    #[must_use]
    pub fn surrogate(mut self, kind: SurrogateKind) -> Self {
        self.config.surrogate = kind;
        self
    }

    /// Sets the criteria evaluator kind.
    #[must_use]
    pub fn criteria(mut self, kind: CriteriaKind) -> Self {
        self.config.criteria = kind;
        self
    }

    /// Sets the observation noise variance. Default: 1e-6.
    #[must_use]
    pub fn noise_variance(mut self, v: f64) -> Self {
        self.config.noise_variance = v;
        self
    }

    /// Enables or disables per-dimension lengthscales. Default: enabled.
    #[must_use]
    pub fn ard(mut self, ard: bool) -> Self {
        self.config.ard = ard;
        self
    }

    /// Sets the log-lengthscale prior.
    #[must_use]
    pub fn prior(mut self, prior: HyperPrior) -> Self {
        self.config.prior = prior;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if [`PosteriorConfig::validate`] fails.
    pub fn build(self) -> Result<PosteriorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
