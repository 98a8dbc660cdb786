#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! MCMC posterior model for Bayesian optimization.
//!
//! Instead of fitting one set of surrogate hyperparameters, the model draws
//! an ensemble of hyperparameter samples (particles) from their posterior,
//! keeps one surrogate and one acquisition-criteria evaluator per particle,
//! and presents the ensemble to the optimizer as a single model. Criteria
//! values are averaged over the particles. Decisions that cannot be averaged
//! (which criterion to use next, which candidate wins a portfolio round, what
//! the model predicts) are taken by the canonical particle, index 0.
//!
//! # Getting Started
//!
//! ```
//! use mcmc_posterior::prelude::*;
//!
//! let config = PosteriorConfig::builder().particle_count(4).build().unwrap();
//! let mut rng = fastrand::Rng::with_seed(1);
//! let mut model = McmcPosterior::new(1, config, &mut rng).unwrap();
//!
//! for &x in &[0.0, 0.5, 1.0] {
//!     model.add_sample(&[x], (x - 0.3).powi(2)).unwrap();
//! }
//! model.update_hyperparameters(&mut rng).unwrap();
//!
//! // Pick the grid point with the lowest averaged criterion.
//! let best = (0..=20)
//!     .map(|i| f64::from(i) / 20.0)
//!     .min_by(|a, b| {
//!         let fa = model.evaluate_criteria(&[*a]).unwrap();
//!         let fb = model.evaluate_criteria(&[*b]).unwrap();
//!         fa.total_cmp(&fb)
//!     })
//!     .unwrap();
//! model.update_criteria(&[best]);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`McmcPosterior`] | Coordinator the optimizer talks to: fit, evaluate, rotate, predict. |
//! | [`Ensemble`] | Fixed-size set of [`Particle`]s; particle 0 is canonical. |
//! | [`SurrogateModel`] | Per-particle regression model, e.g. [`GpSurrogate`]. |
//! | [`Criteria`](criteria::Criteria) | Per-particle acquisition evaluator with a rotation cursor. |
//! | [`ParticleSampler`](sampler::ParticleSampler) | Draws hyperparameter particles, e.g. [`SliceSampler`](sampler::SliceSampler). |
//! | [`PosteriorConfig`] | Particle count, surrogate and criteria kinds, noise, prior. |
//!
//! # Criteria Portfolios
//!
//! A [`CriteriaKind::Hedge`] portfolio rotates through several criteria. The
//! optimizer calls [`set_first_criterion`](McmcPosterior::set_first_criterion),
//! maximizes the current criterion, reports the result with
//! [`set_next_criterion`](McmcPosterior::set_next_criterion), and repeats
//! until that returns `true`. [`best_criteria`](McmcPosterior::best_criteria)
//! then picks the winning proposal.
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on configuration, kind, and result types | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) on builds, refreshes, and rotations | off |
//! | `parallel` | Fit, update, and evaluate particles on the [`rayon`](https://docs.rs/rayon) pool | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

mod config;
pub mod criteria;
mod dataset;
mod distribution;
mod ensemble;
mod error;
mod posterior;
mod rng_util;
pub mod sampler;
pub mod surrogate;
mod types;

pub use config::{
    DEFAULT_NOISE_VARIANCE, DEFAULT_PARTICLE_COUNT, DEFAULT_PRIOR_MEAN, DEFAULT_PRIOR_STD,
    HyperPrior, PosteriorConfig, PosteriorConfigBuilder,
};
pub use criteria::{BestCriterion, RotationState};
pub use dataset::Dataset;
pub use distribution::Prediction;
pub use ensemble::{Ensemble, KindFactory, Particle, ParticleFactory};
pub use error::{Error, Result};
pub use posterior::McmcPosterior;
pub use surrogate::{GpSurrogate, SurrogateModel};
pub use types::{
    CriteriaKind, CriterionKind, DEFAULT_LCB_BETA, DEFAULT_POI_EPSILON, KernelKind, SurrogateKind,
};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use mcmc_posterior::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{HyperPrior, PosteriorConfig};
    pub use crate::criteria::{BestCriterion, Criteria};
    pub use crate::dataset::Dataset;
    pub use crate::distribution::Prediction;
    pub use crate::error::{Error, Result};
    pub use crate::posterior::McmcPosterior;
    pub use crate::sampler::{FixedSampler, ParticleSampler, SliceSampler};
    pub use crate::surrogate::{GpSurrogate, SurrogateModel};
    pub use crate::types::{CriteriaKind, CriterionKind, KernelKind, SurrogateKind};
}
