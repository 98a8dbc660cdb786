//! Hyperparameter samplers that produce the particles of an ensemble.

mod slice;

pub use slice::{SliceSampler, SliceSamplerBuilder};

use crate::error::Result;

/// Unnormalized log density over hyperparameter vectors.
///
/// Returns `f64::NEG_INFINITY` outside the support.
pub type LogDensity<'a> = dyn Fn(&[f64]) -> f64 + 'a;

/// Trait for pluggable hyperparameter samplers.
///
/// A sampler draws `count` hyperparameter vectors approximately distributed
/// according to `target`, starting its chain at `initial` unless it has a
/// better starting point of its own. The trait requires `Send + Sync`, like
/// the other collaborators of the posterior model.
///
/// # Implementing a custom sampler
///
/// ```
/// use mcmc_posterior::Result;
/// use mcmc_posterior::sampler::{LogDensity, ParticleSampler};
///
/// /// Jitters the initial point without looking at the target.
/// struct Jitter;
///
/// impl ParticleSampler for Jitter {
///     fn draw_particles(
///         &self,
///         count: usize,
///         initial: &[f64],
///         _target: &LogDensity<'_>,
///         rng: &mut fastrand::Rng,
///     ) -> Result<Vec<Vec<f64>>> {
///         Ok((0..count)
///             .map(|_| initial.iter().map(|v| v + rng.f64() - 0.5).collect())
///             .collect())
///     }
/// }
/// ```
pub trait ParticleSampler: Send + Sync {
    /// Draw `count` hyperparameter vectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sampling`](crate::Error::Sampling) if the chain cannot
    /// be started or a valid sample cannot be produced.
    fn draw_particles(
        &self,
        count: usize,
        initial: &[f64],
        target: &LogDensity<'_>,
        rng: &mut fastrand::Rng,
    ) -> Result<Vec<Vec<f64>>>;
}

/// Sampler that returns `count` copies of the initial point.
///
/// With the prior mode as initial point this turns the ensemble into a
/// fixed-hyperparameter (point estimate) posterior.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedSampler;

impl ParticleSampler for FixedSampler {
    fn draw_particles(
        &self,
        count: usize,
        initial: &[f64],
        _target: &LogDensity<'_>,
        _rng: &mut fastrand::Rng,
    ) -> Result<Vec<Vec<f64>>> {
        Ok(vec![initial.to_vec(); count])
    }
}
