//! Gaussian predictive distribution returned by surrogate models.

/// Predictive distribution of a surrogate at a single query point.
///
/// Every bundled surrogate produces a Gaussian posterior predictive, so the
/// distribution is described by its mean and standard deviation in the units
/// of the observed targets.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prediction {
    mean: f64,
    std: f64,
}

impl Prediction {
    /// Creates a Gaussian prediction. Negative standard deviations are
    /// clamped to zero.
    #[must_use]
    pub fn new(mean: f64, std: f64) -> Self {
        Self {
            mean,
            std: std.max(0.0),
        }
    }

    /// Posterior mean.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Posterior standard deviation.
    #[must_use]
    pub fn std(&self) -> f64 {
        self.std
    }

}

/// Standard deviations below this are treated as a point mass.
pub(crate) const STD_EPSILON: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Normal distribution helpers (Abramowitz-Stegun approximation)
// ---------------------------------------------------------------------------

/// Standard normal PDF.
pub(crate) fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF (Hart / Abramowitz-Stegun rational approximation).
pub(crate) fn norm_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    let abs_x = x.abs();
    let t = 1.0 / (1.0 + 0.231_641_9 * abs_x);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let poly = 0.319_381_530 * t - 0.356_563_782 * t2 + 1.781_477_937 * t3 - 1.821_255_978 * t4
        + 1.330_274_429 * t5;
    let cdf = 1.0 - norm_pdf(abs_x) * poly;

    if x >= 0.0 { cdf } else { 1.0 - cdf }
}
