//! Coordinate-wise slice sampler.
//!
//! Each sweep updates one coordinate at a time: draw a height under the
//! current density, step out an interval of width `width` until both ends
//! leave the slice, then shrink the interval around the current point until a
//! uniformly drawn candidate lands inside the slice.
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `burn_in` | 50 | Sweeps discarded before the first particle |
//! | `thinning` | 3 | Sweeps between consecutive particles |
//! | `width` | 1.0 | Initial slice interval width |
//! | `max_steps_out` | 10 | Step-out limit on each side |
//!
//! The sampler remembers where its chain stopped and resumes from there on the
//! next draw if that point still has positive density under the new target.
//!
//! # Examples
//!
//! ```
//! use mcmc_posterior::sampler::{ParticleSampler, SliceSampler};
//!
//! let sampler = SliceSampler::builder().burn_in(20).thinning(2).build();
//! let standard_normal = |x: &[f64]| -0.5 * x[0] * x[0];
//! let mut rng = fastrand::Rng::with_seed(42);
//!
//! let particles = sampler
//!     .draw_particles(5, &[0.0], &standard_normal, &mut rng)
//!     .unwrap();
//! assert_eq!(particles.len(), 5);
//! ```

use parking_lot::Mutex;

use super::{LogDensity, ParticleSampler};
use crate::error::{Error, Result};
use crate::rng_util;

/// Default number of burn-in sweeps.
const DEFAULT_BURN_IN: usize = 50;
/// Default number of sweeps between particles.
const DEFAULT_THINNING: usize = 3;
/// Default slice interval width.
const DEFAULT_WIDTH: f64 = 1.0;
/// Default step-out limit on each side.
const DEFAULT_MAX_STEPS_OUT: usize = 10;
/// Shrinkage attempts before a coordinate update is declared failed.
const MAX_SHRINK: usize = 200;

/// Slice sampler over hyperparameter vectors.
pub struct SliceSampler {
    burn_in: usize,
    thinning: usize,
    width: f64,
    max_steps_out: usize,
    /// Last position of the chain, used to warm-start the next draw.
    last_position: Mutex<Option<Vec<f64>>>,
}

impl SliceSampler {
    /// Creates a slice sampler with default settings.
    #[must_use]
    pub fn new() -> Self {
        SliceSamplerBuilder::new().build()
    }

    /// Creates a builder for configuring a `SliceSampler`.
    #[must_use]
    pub fn builder() -> SliceSamplerBuilder {
        SliceSamplerBuilder::new()
    }

    /// Where the chain stopped after the last successful draw.
    #[must_use]
    pub fn last_position(&self) -> Option<Vec<f64>> {
        self.last_position.lock().clone()
    }

    /// Pick the chain's starting point and its log density.
    fn start(&self, initial: &[f64], target: &LogDensity<'_>) -> Result<(Vec<f64>, f64)> {
        let remembered = self
            .last_position
            .lock()
            .clone()
            .filter(|p| p.len() == initial.len());
        if let Some(position) = remembered {
            let log_p = target(position.as_slice());
            if log_p.is_finite() {
                return Ok((position, log_p));
            }
        }

        let log_p = target(initial);
        if log_p.is_finite() {
            Ok((initial.to_vec(), log_p))
        } else {
            Err(Error::Sampling(
                "initial hyperparameters have zero posterior density".into(),
            ))
        }
    }

    /// One full sweep over every coordinate.
    fn sweep(
        &self,
        x: &mut [f64],
        log_p: &mut f64,
        target: &LogDensity<'_>,
        rng: &mut fastrand::Rng,
    ) -> Result<()> {
        for j in 0..x.len() {
            *log_p = self.update_coordinate(x, j, *log_p, target, rng)?;
        }
        Ok(())
    }

    /// Slice-sample coordinate `j`, returning the new log density.
    fn update_coordinate(
        &self,
        x: &mut [f64],
        j: usize,
        log_p: f64,
        target: &LogDensity<'_>,
        rng: &mut fastrand::Rng,
    ) -> Result<f64> {
        let origin = x[j];
        let log_height = log_p + rng_util::f64_open_zero(rng).ln();

        let density_at = |value: f64, x: &mut [f64]| {
            x[j] = value;
            target(&*x)
        };

        // Step out
        let mut lo = origin - self.width * rng.f64();
        let mut hi = lo + self.width;
        for _ in 0..self.max_steps_out {
            if density_at(lo, x) <= log_height {
                break;
            }
            lo -= self.width;
        }
        for _ in 0..self.max_steps_out {
            if density_at(hi, x) <= log_height {
                break;
            }
            hi += self.width;
        }

        // Shrink
        for _ in 0..MAX_SHRINK {
            let candidate = rng_util::f64_range(rng, lo, hi);
            let log_candidate = density_at(candidate, x);
            if log_candidate > log_height && log_candidate.is_finite() {
                return Ok(log_candidate);
            }
            if candidate < origin {
                lo = candidate;
            } else {
                hi = candidate;
            }
        }

        x[j] = origin;
        Err(Error::Sampling(format!(
            "slice shrinkage did not converge on coordinate {j}"
        )))
    }
}

impl Default for SliceSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleSampler for SliceSampler {
    fn draw_particles(
        &self,
        count: usize,
        initial: &[f64],
        target: &LogDensity<'_>,
        rng: &mut fastrand::Rng,
    ) -> Result<Vec<Vec<f64>>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let (mut x, mut log_p) = self.start(initial, target)?;

        for _ in 0..self.burn_in {
            self.sweep(&mut x, &mut log_p, target, rng)?;
        }

        let mut particles = Vec::with_capacity(count);
        for _ in 0..count {
            for _ in 0..self.thinning.max(1) {
                self.sweep(&mut x, &mut log_p, target, rng)?;
            }
            particles.push(x.clone());
        }

        trace_debug!(count, log_p, "slice sampler finished");
        *self.last_position.lock() = Some(x);
        Ok(particles)
    }
}

/// Builder for configuring a [`SliceSampler`].
///
/// All options have sensible defaults:
/// - `burn_in`: 50
/// - `thinning`: 3
/// - `width`: 1.0
/// - `max_steps_out`: 10
#[derive(Debug, Clone, Default)]
pub struct SliceSamplerBuilder {
    burn_in: Option<usize>,
    thinning: Option<usize>,
    width: Option<f64>,
    max_steps_out: Option<usize>,
}

impl SliceSamplerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of sweeps discarded before the first particle.
    #[must_use]
    pub fn burn_in(mut self, n: usize) -> Self {
        self.burn_in = Some(n);
        self
    }

    /// Sets the number of sweeps between consecutive particles. Values below
    /// 1 are treated as 1.
    #[must_use]
    pub fn thinning(mut self, n: usize) -> Self {
        self.thinning = Some(n);
        self
    }

    /// Sets the initial slice interval width. Non-positive values fall back
    /// to the default.
    #[must_use]
    pub fn width(mut self, w: f64) -> Self {
        self.width = Some(w);
        self
    }

    /// Sets the step-out limit on each side of the slice.
    #[must_use]
    pub fn max_steps_out(mut self, n: usize) -> Self {
        self.max_steps_out = Some(n);
        self
    }

    /// Builds the configured [`SliceSampler`].
    #[must_use]
    pub fn build(self) -> SliceSampler {
        SliceSampler {
            burn_in: self.burn_in.unwrap_or(DEFAULT_BURN_IN),
            thinning: self.thinning.unwrap_or(DEFAULT_THINNING),
            width: self
                .width
                .filter(|w| w.is_finite() && *w > 0.0)
                .unwrap_or(DEFAULT_WIDTH),
            max_steps_out: self.max_steps_out.unwrap_or(DEFAULT_MAX_STEPS_OUT),
            last_position: Mutex::new(None),
        }
    }
}
