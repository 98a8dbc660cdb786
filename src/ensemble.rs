//! Particles and the fixed-size ensemble that owns them.
//!
//! A [`Particle`] binds one sampled hyperparameter vector to the surrogate
//! configured with it and to the criteria evaluator that scores that
//! surrogate. The [`Ensemble`] owns its particles in a single vector, so the
//! surrogate and the criteria of a particle can never drift out of alignment.
//!
//! Access is split on purpose:
//!
//! - [`Ensemble::canonical`] / [`Ensemble::canonical_mut`] reach the one
//!   particle whose state defines the singular decisions (prediction,
//!   criteria selection);
//! - [`Ensemble::particles`] / [`Ensemble::particles_mut`] reach every
//!   particle for broadcast and averaging.

use crate::config::PosteriorConfig;
use crate::criteria::{self, Criteria};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::sampler::ParticleSampler;
use crate::surrogate::{GpSurrogate, SurrogateModel};
use crate::types::SurrogateKind;

/// Builds the per-particle collaborators of an ensemble.
///
/// The default [`KindFactory`] selects implementations from the kind tags of
/// the configuration. Custom factories plug in other model families.
pub trait ParticleFactory: Send + Sync {
    /// Create an unconfigured surrogate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unsupported surrogate kind.
    fn surrogate(
        &self,
        dimension: usize,
        config: &PosteriorConfig,
    ) -> Result<Box<dyn SurrogateModel>>;

    /// Create a criteria evaluator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unsupported criteria kind.
    fn criteria(
        &self,
        dimension: usize,
        config: &PosteriorConfig,
        rng: &mut fastrand::Rng,
    ) -> Result<Box<dyn Criteria>>;

    /// Number of hyperparameters each surrogate expects.
    fn n_hyperparameters(&self, dimension: usize, config: &PosteriorConfig) -> usize {
        config.n_hyperparameters(dimension)
    }
}

/// Factory selecting the bundled implementations by kind tag.
#[derive(Clone, Copy, Debug, Default)]
pub struct KindFactory;

impl ParticleFactory for KindFactory {
    fn surrogate(
        &self,
        dimension: usize,
        config: &PosteriorConfig,
    ) -> Result<Box<dyn SurrogateModel>> {
        match config.surrogate {
            SurrogateKind::GaussianProcess(_) => {
                Ok(Box::new(GpSurrogate::from_config(dimension, config)))
            }
        }
    }

    fn criteria(
        &self,
        dimension: usize,
        config: &PosteriorConfig,
        rng: &mut fastrand::Rng,
    ) -> Result<Box<dyn Criteria>> {
        config.criteria.validate()?;
        Ok(criteria::from_kind(&config.criteria, dimension, rng))
    }
}

/// One hyperparameter sample with its surrogate and criteria evaluator.
pub struct Particle {
    hyperparameters: Vec<f64>,
    surrogate: Box<dyn SurrogateModel>,
    criteria: Box<dyn Criteria>,
}

impl Particle {
    /// Build a particle: an unconfigured surrogate configured with
    /// `hyperparameters`, plus a fresh criteria evaluator.
    ///
    /// # Errors
    ///
    /// Propagates factory and configuration errors.
    pub fn new(
        hyperparameters: Vec<f64>,
        dimension: usize,
        config: &PosteriorConfig,
        factory: &dyn ParticleFactory,
        rng: &mut fastrand::Rng,
    ) -> Result<Self> {
        let mut surrogate = factory.surrogate(dimension, config)?;
        surrogate.configure(&hyperparameters)?;
        let criteria = factory.criteria(dimension, config, rng)?;
        Ok(Self {
            hyperparameters,
            surrogate,
            criteria,
        })
    }

    /// The sampled hyperparameters this particle was built from.
    #[must_use]
    pub fn hyperparameters(&self) -> &[f64] {
        &self.hyperparameters
    }

    /// The particle's surrogate model.
    #[must_use]
    pub fn surrogate(&self) -> &dyn SurrogateModel {
        self.surrogate.as_ref()
    }

    /// The particle's criteria evaluator.
    #[must_use]
    pub fn criteria(&self) -> &dyn Criteria {
        self.criteria.as_ref()
    }

    /// Full refit of the surrogate.
    ///
    /// # Errors
    ///
    /// Propagates surrogate errors.
    pub fn fit(&mut self, data: &Dataset) -> Result<()> {
        self.surrogate.fit(data)
    }

    /// Incremental update of the surrogate with the newest observation.
    ///
    /// # Errors
    ///
    /// Propagates surrogate errors.
    pub fn update(&mut self, data: &Dataset) -> Result<()> {
        self.surrogate.update(data)
    }

    /// Criteria value at `query`, scored against this particle's surrogate.
    ///
    /// # Errors
    ///
    /// Propagates criteria and surrogate errors.
    pub fn evaluate(&self, data: &Dataset, query: &[f64]) -> Result<f64> {
        self.criteria.evaluate(self.surrogate.as_ref(), data, query)
    }

    pub(crate) fn criteria_mut(&mut self) -> &mut dyn Criteria {
        self.criteria.as_mut()
    }

    /// Criteria and surrogate borrowed together, for calls that need both.
    pub(crate) fn split_mut(&mut self) -> (&mut dyn Criteria, &dyn SurrogateModel) {
        (self.criteria.as_mut(), self.surrogate.as_ref())
    }
}

/// Fixed-size, non-empty collection of particles.
pub struct Ensemble {
    particles: Vec<Particle>,
}

impl Ensemble {
    /// Draw `config.particle_count` hyperparameter samples and build one
    /// particle per sample, in sampled order.
    ///
    /// The sampler targets the hyperparameter log-posterior: the prior of
    /// `config` plus, when `data` is not empty, the log marginal likelihood
    /// of a scratch surrogate fitted to `data`.
    ///
    /// The build is atomic: on any error the particles built so far are
    /// dropped and no ensemble is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] for a zero dimension or an invalid config.
    /// - [`Error::Sampling`] if the sampler fails, returns the wrong number of
    ///   samples, or returns samples of the wrong length or with non-finite
    ///   values.
    /// - Any factory or configuration error while building a particle.
    pub fn build(
        dimension: usize,
        config: &PosteriorConfig,
        sampler: &dyn ParticleSampler,
        factory: &dyn ParticleFactory,
        data: &Dataset,
        rng: &mut fastrand::Rng,
    ) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::Configuration("dimension must be at least 1".into()));
        }
        config.validate()?;

        let requested = config.particle_count;
        let n_hyper = factory.n_hyperparameters(dimension, config);
        let initial = vec![config.prior.mean; n_hyper];
        let target = |theta: &[f64]| log_posterior(theta, dimension, config, factory, data);

        let samples = sampler.draw_particles(requested, &initial, &target, rng)?;
        if samples.len() != requested {
            return Err(Error::Sampling(format!(
                "requested {requested} particles, sampler returned {}",
                samples.len()
            )));
        }
        for (i, sample) in samples.iter().enumerate() {
            if sample.len() != n_hyper {
                return Err(Error::Sampling(format!(
                    "particle {i} has {} hyperparameters, expected {n_hyper}",
                    sample.len()
                )));
            }
            if sample.iter().any(|v| !v.is_finite()) {
                return Err(Error::Sampling(format!(
                    "particle {i} has non-finite hyperparameters"
                )));
            }
        }

        let particles = samples
            .into_iter()
            .map(|sample| Particle::new(sample, dimension, config, factory, rng))
            .collect::<Result<Vec<_>>>()?;

        trace_info!(particles = particles.len(), dimension, "ensemble built");
        Ok(Self { particles })
    }

    /// Number of particles. Always at least 1.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// The canonical particle (index 0), whose state alone defines the
    /// ensemble's singular decisions.
    #[must_use]
    pub fn canonical(&self) -> &Particle {
        &self.particles[0]
    }

    /// Mutable access to the canonical particle.
    pub fn canonical_mut(&mut self) -> &mut Particle {
        &mut self.particles[0]
    }

    /// Every particle, canonical first.
    pub fn particles(&self) -> impl ExactSizeIterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Every particle, mutably, canonical first.
    pub fn particles_mut(&mut self) -> impl ExactSizeIterator<Item = &mut Particle> {
        self.particles.iter_mut()
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}

/// Hyperparameter log-posterior used as the MCMC target.
///
/// Candidates the scratch surrogate cannot be configured with or fitted
/// under have zero density.
fn log_posterior(
    theta: &[f64],
    dimension: usize,
    config: &PosteriorConfig,
    factory: &dyn ParticleFactory,
    data: &Dataset,
) -> f64 {
    if theta.iter().any(|v| !v.is_finite()) {
        return f64::NEG_INFINITY;
    }
    let log_prior = config.prior.log_density(theta);
    if data.is_empty() {
        return log_prior;
    }
    let log_likelihood = factory.surrogate(dimension, config).and_then(|mut model| {
        model.configure(theta)?;
        model.fit(data)?;
        model.log_likelihood()
    });
    match log_likelihood {
        Ok(ll) if ll.is_finite() => log_prior + ll,
        _ => f64::NEG_INFINITY,
    }
}
