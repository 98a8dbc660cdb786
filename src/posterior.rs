//! Ensemble coordinator: the posterior model an optimizer talks to.
//!
//! [`McmcPosterior`] looks like a single surrogate-plus-criteria model from
//! the outside. Inside it holds an [`Ensemble`] of particles drawn from the
//! hyperparameter posterior and forwards every call in one of three ways:
//!
//! | Operation | Dispatch |
//! |-----------|----------|
//! | [`fit_surrogate_model`](McmcPosterior::fit_surrogate_model), [`update_surrogate_model`](McmcPosterior::update_surrogate_model) | every particle, fail fast |
//! | [`evaluate_criteria`](McmcPosterior::evaluate_criteria) | every particle, averaged |
//! | [`update_criteria`](McmcPosterior::update_criteria), [`set_first_criterion`](McmcPosterior::set_first_criterion) | every particle |
//! | [`set_next_criterion`](McmcPosterior::set_next_criterion) | proposal to particle 0, advance on every particle |
//! | [`criteria_requires_comparison`](McmcPosterior::criteria_requires_comparison), [`best_criteria`](McmcPosterior::best_criteria), [`prediction`](McmcPosterior::prediction) | particle 0 only |
//!
//! # Examples
//!
//! ```
//! use mcmc_posterior::{McmcPosterior, PosteriorConfig};
//!
//! let config = PosteriorConfig::builder().particle_count(3).build().unwrap();
//! let mut rng = fastrand::Rng::with_seed(7);
//! let mut model = McmcPosterior::new(1, config, &mut rng).unwrap();
//!
//! for &x in &[0.1, 0.5, 0.9] {
//!     model.add_sample(&[x], (x - 0.4) * (x - 0.4)).unwrap();
//! }
//! model.update_hyperparameters(&mut rng).unwrap();
//!
//! let score = model.evaluate_criteria(&[0.4]).unwrap();
//! assert!(score.is_finite());
//! let p = model.prediction(&[0.4]).unwrap();
//! assert!(p.mean() < 0.2);
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::PosteriorConfig;
use crate::criteria::{BestCriterion, RotationState};
use crate::dataset::Dataset;
use crate::distribution::Prediction;
use crate::ensemble::{Ensemble, KindFactory, ParticleFactory};
use crate::error::{Error, Result};
use crate::sampler::{FixedSampler, ParticleSampler, SliceSampler};

/// Posterior model averaging surrogates and criteria over MCMC particles.
pub struct McmcPosterior {
    dimension: usize,
    config: PosteriorConfig,
    sampler: Box<dyn ParticleSampler>,
    factory: Box<dyn ParticleFactory>,
    data: Dataset,
    ensemble: Ensemble,
    /// Set when the observations were replaced; the next update refits.
    refit_pending: bool,
}

impl McmcPosterior {
    /// Creates a posterior with a [`SliceSampler`] and the default
    /// [`KindFactory`].
    ///
    /// With no data yet the particles are drawn from the prior.
    ///
    /// # Errors
    ///
    /// See [`Ensemble::build`].
    pub fn new(dimension: usize, config: PosteriorConfig, rng: &mut fastrand::Rng) -> Result<Self> {
        Self::with_components(
            dimension,
            config,
            Box::new(SliceSampler::new()),
            Box::new(KindFactory),
            rng,
        )
    }

    /// Creates a point-estimate posterior: a single particle at the prior
    /// mode. `config.particle_count` is ignored.
    ///
    /// # Errors
    ///
    /// See [`Ensemble::build`].
    pub fn fixed(
        dimension: usize,
        mut config: PosteriorConfig,
        rng: &mut fastrand::Rng,
    ) -> Result<Self> {
        config.particle_count = 1;
        Self::with_components(
            dimension,
            config,
            Box::new(FixedSampler),
            Box::new(KindFactory),
            rng,
        )
    }

    /// Creates a posterior with a custom sampler and particle factory.
    ///
    /// # Errors
    ///
    /// See [`Ensemble::build`]. No posterior exists after a failed build.
    pub fn with_components(
        dimension: usize,
        config: PosteriorConfig,
        sampler: Box<dyn ParticleSampler>,
        factory: Box<dyn ParticleFactory>,
        rng: &mut fastrand::Rng,
    ) -> Result<Self> {
        let data = Dataset::new(dimension);
        let ensemble = Ensemble::build(
            dimension,
            &config,
            sampler.as_ref(),
            factory.as_ref(),
            &data,
            rng,
        )?;
        Ok(Self {
            dimension,
            config,
            sampler,
            factory,
            data,
            ensemble,
            refit_pending: false,
        })
    }

    /// Appends one observation. Surrogates see it on the next
    /// [`update_surrogate_model`](Self::update_surrogate_model) or
    /// [`fit_surrogate_model`](Self::fit_surrogate_model).
    ///
    /// # Errors
    ///
    /// See [`Dataset::add_sample`].
    pub fn add_sample(&mut self, x: &[f64], y: f64) -> Result<()> {
        self.data.add_sample(x, y)
    }

    /// Replaces all observations. On error the previous observations are kept.
    ///
    /// Existing fits describe the old observations, so the next
    /// [`update_surrogate_model`](Self::update_surrogate_model) does a full
    /// refit instead of an incremental update.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `xs` and `ys` differ in length
    /// or a point has the wrong dimension, and [`Error::NonFiniteObservation`]
    /// for NaN or infinite values.
    pub fn set_samples(&mut self, xs: &[Vec<f64>], ys: &[f64]) -> Result<()> {
        if xs.len() != ys.len() {
            return Err(Error::DimensionMismatch {
                expected: xs.len(),
                got: ys.len(),
            });
        }
        let mut data = Dataset::new(self.dimension);
        for (x, &y) in xs.iter().zip(ys) {
            data.add_sample(x, y)?;
        }
        self.data = data;
        self.refit_pending = true;
        Ok(())
    }

    /// Observations seen so far.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    /// Re-runs MCMC against the current observations and replaces the whole
    /// ensemble with the new particles.
    ///
    /// The new surrogates are fitted before the swap when data exist, and
    /// their criteria rotations start uninitialized. On any error the current
    /// ensemble stays in place.
    ///
    /// Criteria evaluators are rebuilt with the particles. Whatever they
    /// learned is dropped: [`update_criteria`](Self::update_criteria) history,
    /// portfolio gains of a `hedge(...)` evaluator, and its rotation all
    /// restart from scratch on every refresh.
    ///
    /// # Errors
    ///
    /// See [`Ensemble::build`]; also propagates fit errors of the new
    /// surrogates.
    pub fn update_hyperparameters(&mut self, rng: &mut fastrand::Rng) -> Result<()> {
        let mut ensemble = Ensemble::build(
            self.dimension,
            &self.config,
            self.sampler.as_ref(),
            self.factory.as_ref(),
            &self.data,
            rng,
        )?;
        if !self.data.is_empty() {
            fit_all(&mut ensemble, &self.data)?;
        }
        self.ensemble = ensemble;
        self.refit_pending = false;
        trace_info!(
            particles = self.ensemble.particle_count(),
            observations = self.data.len(),
            "hyperparameters refreshed"
        );
        Ok(())
    }

    /// Full refit of every surrogate on the current observations.
    ///
    /// Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Propagates the first surrogate error.
    pub fn fit_surrogate_model(&mut self) -> Result<()> {
        fit_all(&mut self.ensemble, &self.data)?;
        self.refit_pending = false;
        trace_debug!(observations = self.data.len(), "surrogates fitted");
        Ok(())
    }

    /// Incremental update of every surrogate with the newest observation.
    ///
    /// After [`set_samples`](Self::set_samples) this is a full refit.
    /// Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Propagates the first surrogate error.
    pub fn update_surrogate_model(&mut self) -> Result<()> {
        if self.refit_pending {
            return self.fit_surrogate_model();
        }
        let data = &self.data;
        #[cfg(feature = "parallel")]
        let result = self
            .ensemble
            .as_mut_slice()
            .par_iter_mut()
            .try_for_each(|particle| particle.update(data));
        #[cfg(not(feature = "parallel"))]
        let result = self
            .ensemble
            .particles_mut()
            .try_for_each(|particle| particle.update(data));
        result?;
        trace_debug!(observations = self.data.len(), "surrogates updated");
        Ok(())
    }

    /// Mean criteria value over all particles at `query`. Lower is better.
    ///
    /// # Errors
    ///
    /// Propagates the first criteria or prediction error.
    #[allow(clippy::cast_precision_loss)]
    pub fn evaluate_criteria(&self, query: &[f64]) -> Result<f64> {
        #[cfg(feature = "parallel")]
        let values = self
            .ensemble
            .as_slice()
            .par_iter()
            .map(|particle| particle.evaluate(&self.data, query))
            .collect::<Result<Vec<f64>>>()?;
        #[cfg(not(feature = "parallel"))]
        let values = self
            .ensemble
            .particles()
            .map(|particle| particle.evaluate(&self.data, query))
            .collect::<Result<Vec<f64>>>()?;

        let sum: f64 = values.iter().sum();
        Ok(sum / values.len() as f64)
    }

    /// Tells every particle's criteria that `query` was chosen.
    pub fn update_criteria(&mut self, query: &[f64]) {
        for particle in self.ensemble.particles_mut() {
            particle.criteria_mut().update(query);
        }
    }

    /// Whether the criteria need a comparison step between candidates,
    /// as answered by particle 0.
    #[must_use]
    pub fn criteria_requires_comparison(&self) -> bool {
        self.ensemble.canonical().criteria().requires_comparison()
    }

    /// Starts the criteria rotation on every particle.
    pub fn set_first_criterion(&mut self) {
        for particle in self.ensemble.particles_mut() {
            particle.criteria_mut().initialize_rotation();
        }
    }

    /// Records `previous_result` as the proposal of the current criterion and
    /// advances the rotation. Returns `true` when every criterion has proposed
    /// a point.
    ///
    /// The proposal goes to particle 0 only. Every particle's rotation
    /// advances, and all of them must agree on whether it wrapped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RotationNotStarted`] before
    /// [`set_first_criterion`](Self::set_first_criterion), leaving every
    /// particle untouched, and [`Error::RotationInconsistency`] if the
    /// particles disagree.
    pub fn set_next_criterion(&mut self, previous_result: &[f64]) -> Result<bool> {
        if self
            .ensemble
            .particles()
            .any(|particle| particle.criteria().rotation() == RotationState::Uninitialized)
        {
            return Err(Error::RotationNotStarted);
        }

        self.ensemble
            .canonical_mut()
            .criteria_mut()
            .push_result(previous_result);

        let outcomes = self
            .ensemble
            .particles_mut()
            .map(|particle| particle.criteria_mut().rotate())
            .collect::<Result<Vec<bool>>>()?;

        let expected = outcomes[0];
        if let Some((particle, &got)) = outcomes
            .iter()
            .enumerate()
            .find(|&(_, &got)| got != expected)
        {
            return Err(Error::RotationInconsistency {
                particle,
                expected,
                got,
            });
        }
        trace_debug!(
            rotated = expected,
            criterion = %self.ensemble.canonical().criteria().name(),
            "criteria rotation advanced"
        );
        Ok(expected)
    }

    /// The winning criterion of particle 0 and its proposed point.
    ///
    /// # Errors
    ///
    /// Propagates errors of particle 0's criteria, e.g.
    /// [`Error::MissingProposals`].
    pub fn best_criteria(&mut self) -> Result<BestCriterion> {
        let (criteria, surrogate) = self.ensemble.canonical_mut().split_mut();
        let best = criteria.best_criteria(surrogate, &self.data)?;
        trace_info!(criterion = %best.name, "best criterion selected");
        Ok(best)
    }

    /// Predictive distribution of particle 0's surrogate at `query`.
    ///
    /// # Errors
    ///
    /// Propagates surrogate errors such as [`Error::NotFitted`].
    pub fn prediction(&self, query: &[f64]) -> Result<Prediction> {
        self.ensemble.canonical().surrogate().predict(query)
    }

    /// The current particles.
    #[must_use]
    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Number of particles.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.ensemble.particle_count()
    }

    /// Input dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Configuration the ensemble was built from.
    #[must_use]
    pub fn config(&self) -> &PosteriorConfig {
        &self.config
    }
}

fn fit_all(ensemble: &mut Ensemble, data: &Dataset) -> Result<()> {
    #[cfg(feature = "parallel")]
    let result = ensemble
        .as_mut_slice()
        .par_iter_mut()
        .try_for_each(|particle| particle.fit(data));
    #[cfg(not(feature = "parallel"))]
    let result = ensemble
        .particles_mut()
        .try_for_each(|particle| particle.fit(data));
    result
}
