//! Stub collaborators whose outputs identify the particle that produced them.
//!
//! - `StubSurrogate` predicts its first hyperparameter (the particle's tag) as
//!   the mean. Live instances are counted, so tests can check that a failed
//!   build leaves nothing behind.
//! - `StubCriteria` evaluates to the surrogate's predicted mean and records
//!   observations and rotations in a shared log. Every particle except the
//!   canonical one is poisoned: asking it for the best criterion fails.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mcmc_posterior::criteria::Criteria;
use mcmc_posterior::sampler::{LogDensity, ParticleSampler};
use mcmc_posterior::{
    BestCriterion, Dataset, Error, McmcPosterior, ParticleFactory, PosteriorConfig, Prediction,
    Result, RotationState, SurrogateModel,
};
use parking_lot::Mutex;

/// Surrogates tagged at or above this value fail to fit.
pub const POISON_TAG: f64 = 100.0;

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Fit(f64),
    Update(f64),
    Observe(usize, Vec<f64>),
    Rotate(usize),
}

pub type Log = Arc<Mutex<Vec<Event>>>;

pub struct StubSurrogate {
    tag: Vec<f64>,
    live: Arc<AtomicUsize>,
    log: Log,
}

impl Drop for StubSurrogate {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StubSurrogate {
    fn tag(&self) -> f64 {
        self.tag.first().copied().unwrap_or(f64::NAN)
    }
}

impl SurrogateModel for StubSurrogate {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn hyperparameters(&self) -> &[f64] {
        &self.tag
    }

    fn configure(&mut self, hyperparameters: &[f64]) -> Result<()> {
        if hyperparameters.iter().any(|v| *v < 0.0) {
            return Err(Error::Configuration("negative tag".into()));
        }
        self.tag = hyperparameters.to_vec();
        Ok(())
    }

    fn fit(&mut self, _data: &Dataset) -> Result<()> {
        self.log.lock().push(Event::Fit(self.tag()));
        if self.tag() >= POISON_TAG {
            return Err(Error::ModelFit(format!("tag {}", self.tag())));
        }
        Ok(())
    }

    fn update(&mut self, _data: &Dataset) -> Result<()> {
        self.log.lock().push(Event::Update(self.tag()));
        if self.tag() >= POISON_TAG {
            return Err(Error::ModelFit(format!("tag {}", self.tag())));
        }
        Ok(())
    }

    fn predict(&self, _query: &[f64]) -> Result<Prediction> {
        Ok(Prediction::new(self.tag(), 1.0))
    }

    fn log_likelihood(&self) -> Result<f64> {
        Ok(0.0)
    }
}

pub struct StubCriteria {
    index: usize,
    cycle: usize,
    cursor: Option<usize>,
    proposals: Vec<Vec<f64>>,
    requires_comparison: bool,
    poisoned: bool,
    log: Log,
}

impl Criteria for StubCriteria {
    fn name(&self) -> String {
        format!("stub{}", self.index)
    }

    fn evaluate(&self, model: &dyn SurrogateModel, _data: &Dataset, query: &[f64]) -> Result<f64> {
        Ok(model.predict(query)?.mean())
    }

    fn update(&mut self, query: &[f64]) {
        self.log.lock().push(Event::Observe(self.index, query.to_vec()));
    }

    fn requires_comparison(&self) -> bool {
        self.requires_comparison
    }

    fn cycle_length(&self) -> usize {
        self.cycle
    }

    fn rotation(&self) -> RotationState {
        self.cursor
            .map_or(RotationState::Uninitialized, RotationState::Active)
    }

    fn initialize_rotation(&mut self) {
        self.cursor = Some(0);
        self.proposals.clear();
    }

    fn push_result(&mut self, result: &[f64]) {
        self.proposals.push(result.to_vec());
    }

    fn rotate(&mut self) -> Result<bool> {
        let k = self.cursor.ok_or(Error::RotationNotStarted)?;
        let next = (k + 1) % self.cycle;
        self.cursor = Some(next);
        self.log.lock().push(Event::Rotate(self.index));
        Ok(next == 0)
    }

    fn best_criteria(&mut self, _model: &dyn SurrogateModel, _data: &Dataset) -> Result<BestCriterion> {
        if self.poisoned {
            return Err(Error::Internal("non-canonical particle consulted"));
        }
        let point = self.proposals.last().cloned().ok_or(Error::MissingProposals {
            expected: self.cycle,
            recorded: 0,
        })?;
        Ok(BestCriterion {
            point,
            name: self.name(),
        })
    }
}

/// Factory building stub particles. Criteria are numbered in build order
/// modulo the particle count, so the number equals the particle index.
#[derive(Default)]
pub struct StubFactory {
    pub live: Arc<AtomicUsize>,
    pub log: Log,
    pub built: AtomicUsize,
    /// Cycle length per particle index. The last entry applies to the rest;
    /// empty means 1.
    pub cycles: Vec<usize>,
    /// What the canonical particle answers to `requires_comparison`. Every
    /// other particle answers the opposite.
    pub canonical_comparison: bool,
}

impl StubFactory {
    pub fn with_cycles(cycles: Vec<usize>) -> Self {
        Self {
            cycles,
            ..Self::default()
        }
    }
}

impl ParticleFactory for StubFactory {
    fn surrogate(&self, _dimension: usize, _config: &PosteriorConfig) -> Result<Box<dyn SurrogateModel>> {
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubSurrogate {
            tag: Vec::new(),
            live: Arc::clone(&self.live),
            log: Arc::clone(&self.log),
        }))
    }

    fn criteria(
        &self,
        _dimension: usize,
        config: &PosteriorConfig,
        _rng: &mut fastrand::Rng,
    ) -> Result<Box<dyn Criteria>> {
        let index = self.built.fetch_add(1, Ordering::SeqCst) % config.particle_count;
        let cycle = self
            .cycles
            .get(index)
            .or(self.cycles.last())
            .copied()
            .unwrap_or(1);
        Ok(Box::new(StubCriteria {
            index,
            cycle,
            cursor: None,
            proposals: Vec::new(),
            requires_comparison: (index == 0) == self.canonical_comparison,
            poisoned: index != 0,
            log: Arc::clone(&self.log),
        }))
    }

    fn n_hyperparameters(&self, _dimension: usize, _config: &PosteriorConfig) -> usize {
        1
    }
}

/// Sampler returning a fixed list of particles regardless of the count asked for.
pub struct ListSampler(pub Vec<Vec<f64>>);

impl ParticleSampler for ListSampler {
    fn draw_particles(
        &self,
        _count: usize,
        _initial: &[f64],
        _target: &LogDensity<'_>,
        _rng: &mut fastrand::Rng,
    ) -> Result<Vec<Vec<f64>>> {
        Ok(self.0.clone())
    }
}

/// Sampler returning one scripted list per call, then failing.
pub struct SequenceSampler(Mutex<VecDeque<Vec<Vec<f64>>>>);

impl SequenceSampler {
    pub fn new(draws: Vec<Vec<Vec<f64>>>) -> Self {
        Self(Mutex::new(draws.into()))
    }
}

impl ParticleSampler for SequenceSampler {
    fn draw_particles(
        &self,
        _count: usize,
        _initial: &[f64],
        _target: &LogDensity<'_>,
        _rng: &mut fastrand::Rng,
    ) -> Result<Vec<Vec<f64>>> {
        self.0
            .lock()
            .pop_front()
            .ok_or_else(|| Error::Sampling("script exhausted".into()))
    }
}

pub fn config(particle_count: usize) -> PosteriorConfig {
    PosteriorConfig {
        particle_count,
        ..PosteriorConfig::default()
    }
}

/// A one-dimensional posterior whose particle `i` is tagged `tags[i]`.
pub fn tagged_posterior(tags: &[f64], factory: StubFactory) -> Result<McmcPosterior> {
    let mut rng = fastrand::Rng::with_seed(0);
    McmcPosterior::with_components(
        1,
        config(tags.len()),
        Box::new(ListSampler(tags.iter().map(|&t| vec![t]).collect())),
        Box::new(factory),
        &mut rng,
    )
}
