//! Gaussian process surrogate.
//!
//! A zero-mean GP over standardized targets with a Matérn 5/2 or squared
//! exponential kernel and unit signal variance. The hyperparameters are the
//! log-lengthscales: one per input dimension with ARD, or a single shared one.
//!
//! # Fitting
//!
//! 1. **Standardize**: targets are shifted to zero mean and scaled to unit
//!    variance. A single observation is only shifted.
//! 2. **Factorize**: the Cholesky factor `L` of `K + σ²I` is computed; a
//!    matrix that is not positive definite is reported as
//!    [`Error::ModelFit`].
//! 3. **Solve**: `α = (K + σ²I)^{-1} y` is cached for predictions.
//!
//! [`update`](SurrogateModel::update) extends `L` by one column when exactly
//! one observation arrived since the last fit. The standardization constants
//! stay frozen until the next full [`fit`](SurrogateModel::fit).
//!
//! # Examples
//!
//! ```
//! use mcmc_posterior::{Dataset, GpSurrogate, KernelKind, SurrogateModel};
//!
//! let mut data = Dataset::new(1);
//! for &x in &[0.1, 0.4, 0.8] {
//!     data.add_sample(&[x], (x * 6.0_f64).sin()).unwrap();
//! }
//!
//! let mut gp = GpSurrogate::new(1, KernelKind::Matern52, 1e-6, true);
//! gp.configure(&[0.3_f64.ln()]).unwrap();
//! gp.fit(&data).unwrap();
//!
//! let p = gp.predict(&[0.4]).unwrap();
//! assert!((p.mean() - (2.4_f64).sin()).abs() < 1e-2);
//! ```

use core::f64::consts::TAU;

use nalgebra::linalg::Cholesky;
use nalgebra::{DVector, Dyn};

use super::{SurrogateModel, kernel};
use crate::config::PosteriorConfig;
use crate::dataset::Dataset;
use crate::distribution::Prediction;
use crate::error::{Error, Result};
use crate::types::{KernelKind, SurrogateKind};

/// Gaussian process regression model for one particle.
pub struct GpSurrogate {
    dimension: usize,
    kernel: KernelKind,
    noise_variance: f64,
    ard: bool,
    log_lengthscales: Vec<f64>,
    fitted: Option<FittedGp>,
}

/// A fitted GP ready for predictions.
struct FittedGp {
    /// Cholesky factor L of K + σ²I.
    cholesky: Cholesky<f64, Dyn>,
    /// α = (K + σ²I)^{-1} y.
    alpha: DVector<f64>,
    /// Training inputs, one row per observation.
    x_train: Vec<Vec<f64>>,
    /// Standardized training targets.
    y_train: Vec<f64>,
    /// Mean of the original targets at the last full fit.
    y_mean: f64,
    /// Std dev of the original targets at the last full fit.
    y_std: f64,
}

impl GpSurrogate {
    /// Creates an unconfigured GP.
    ///
    /// `noise_variance` is added to the kernel diagonal. With `ard` the model
    /// expects `dimension` hyperparameters, otherwise one.
    #[must_use]
    pub fn new(dimension: usize, kernel: KernelKind, noise_variance: f64, ard: bool) -> Self {
        Self {
            dimension,
            kernel,
            noise_variance,
            ard,
            log_lengthscales: Vec::new(),
            fitted: None,
        }
    }

    /// Creates an unconfigured GP from a posterior configuration.
    #[must_use]
    pub fn from_config(dimension: usize, config: &PosteriorConfig) -> Self {
        let SurrogateKind::GaussianProcess(kernel) = config.surrogate;
        Self::new(dimension, kernel, config.noise_variance, config.ard)
    }

    /// Lengthscales (the exponentiated hyperparameters).
    #[must_use]
    pub fn lengthscales(&self) -> Vec<f64> {
        self.log_lengthscales.iter().map(|l| l.exp()).collect()
    }

    fn expected_hyperparameters(&self) -> usize {
        if self.ard { self.dimension } else { 1 }
    }

    fn check_dimension(&self, got: usize) -> Result<()> {
        if got == self.dimension {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.dimension,
                got,
            })
        }
    }

    /// Extend a fit by the newest observation of `data`.
    ///
    /// Returns `None` if the extended factor is not positive definite.
    fn extend(&self, fitted: &FittedGp, data: &Dataset) -> Option<FittedGp> {
        let (x_new, y_new) = data.last()?;
        let lengthscales = self.lengthscales();
        let n = fitted.x_train.len();

        let k_new = kernel::vector(self.kernel, x_new, &fitted.x_train, &lengthscales);
        let col = DVector::from_fn(n + 1, |i, _| {
            if i < n {
                k_new[i]
            } else {
                kernel::eval(self.kernel, x_new, x_new, &lengthscales) + self.noise_variance
            }
        });
        let cholesky = fitted.cholesky.insert_column(n, col);
        if !has_positive_pivots(&cholesky) {
            return None;
        }

        let mut x_train = fitted.x_train.clone();
        x_train.push(x_new.to_vec());
        let mut y_train = fitted.y_train.clone();
        y_train.push((y_new - fitted.y_mean) / fitted.y_std);

        let alpha = cholesky.solve(&DVector::from_column_slice(&y_train));
        Some(FittedGp {
            cholesky,
            alpha,
            x_train,
            y_train,
            y_mean: fitted.y_mean,
            y_std: fitted.y_std,
        })
    }
}

/// A zero pivot slips through the factorization but makes every solve blow up.
fn has_positive_pivots(cholesky: &Cholesky<f64, Dyn>) -> bool {
    cholesky
        .l_dirty()
        .diagonal()
        .iter()
        .all(|d| d.is_finite() && *d > 0.0)
}

impl SurrogateModel for GpSurrogate {
    fn name(&self) -> &'static str {
        match self.kernel {
            KernelKind::Matern52 => "gp_matern52",
            KernelKind::SquaredExponential => "gp_se",
        }
    }

    fn hyperparameters(&self) -> &[f64] {
        &self.log_lengthscales
    }

    fn configure(&mut self, hyperparameters: &[f64]) -> Result<()> {
        let expected = self.expected_hyperparameters();
        if hyperparameters.len() != expected {
            return Err(Error::Configuration(format!(
                "gaussian process expects {expected} hyperparameters, got {}",
                hyperparameters.len()
            )));
        }
        if hyperparameters.iter().any(|h| !h.is_finite()) {
            return Err(Error::Configuration(
                "hyperparameters must be finite".into(),
            ));
        }
        self.log_lengthscales = hyperparameters.to_vec();
        self.fitted = None;
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn fit(&mut self, data: &Dataset) -> Result<()> {
        self.check_dimension(data.dimension())?;
        if self.log_lengthscales.is_empty() {
            return Err(Error::Configuration(
                "gaussian process has not been configured".into(),
            ));
        }
        let y = data.targets();
        let n = y.len();
        if n == 0 {
            return Err(Error::ModelFit("no observations to fit".into()));
        }

        // Standardize y
        let y_mean = y.iter().sum::<f64>() / n as f64;
        let y_var = if n > 1 {
            y.iter().map(|&v| (v - y_mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            1.0
        };
        let y_std = y_var.sqrt().max(1e-10);
        let y_train: Vec<f64> = y.iter().map(|&v| (v - y_mean) / y_std).collect();

        let lengthscales = self.lengthscales();
        let k = kernel::matrix(self.kernel, data.inputs(), &lengthscales, self.noise_variance);
        let cholesky = Cholesky::new(k)
            .filter(has_positive_pivots)
            .ok_or_else(|| Error::ModelFit("covariance matrix is not positive definite".into()))?;
        let alpha = cholesky.solve(&DVector::from_column_slice(&y_train));

        self.fitted = Some(FittedGp {
            cholesky,
            alpha,
            x_train: data.inputs().to_vec(),
            y_train,
            y_mean,
            y_std,
        });
        Ok(())
    }

    fn update(&mut self, data: &Dataset) -> Result<()> {
        self.check_dimension(data.dimension())?;
        let extended = match &self.fitted {
            Some(fitted)
                if data.len() == fitted.x_train.len() + 1
                    && data.inputs().starts_with(&fitted.x_train) =>
            {
                self.extend(fitted, data)
            }
            _ => None,
        };
        match extended {
            Some(fitted) => {
                self.fitted = Some(fitted);
                Ok(())
            }
            None => self.fit(data),
        }
    }

    fn predict(&self, query: &[f64]) -> Result<Prediction> {
        let fitted = self.fitted.as_ref().ok_or(Error::NotFitted)?;
        self.check_dimension(query.len())?;

        let lengthscales = self.lengthscales();
        let k_star = kernel::vector(self.kernel, query, &fitted.x_train, &lengthscales);

        // Mean: k*^T α
        let mean = k_star.dot(&fitted.alpha);

        // Variance: k(x*, x*) - k*^T (K + σ²I)^{-1} k*
        let k_self = kernel::eval(self.kernel, query, query, &lengthscales);
        let v = fitted.cholesky.solve(&k_star);
        let var = (k_self - k_star.dot(&v)).max(0.0);

        Ok(Prediction::new(
            fitted.y_mean + fitted.y_std * mean,
            fitted.y_std * var.sqrt(),
        ))
    }

    #[allow(clippy::cast_precision_loss)]
    fn log_likelihood(&self) -> Result<f64> {
        let fitted = self.fitted.as_ref().ok_or(Error::NotFitted)?;
        let y = DVector::from_column_slice(&fitted.y_train);
        let n = fitted.y_train.len();
        let l = fitted.cholesky.l_dirty();
        let log_det_half: f64 = (0..n).map(|i| l[(i, i)].ln()).sum();
        Ok(-0.5 * y.dot(&fitted.alpha) - log_det_half - 0.5 * n as f64 * TAU.ln())
    }
}
