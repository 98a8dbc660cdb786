// ---------------------------------------------------------------------------
// Stationary kernels with per-dimension lengthscales
// ---------------------------------------------------------------------------

use nalgebra::{DMatrix, DVector};

use crate::types::KernelKind;

/// Precomputed √5 constant.
const SQRT_5: f64 = 2.236_067_977_499_79;

/// Scaled squared distance `Σ ((x1_i - x2_i) / l_i)²`.
///
/// A single lengthscale is broadcast over every dimension.
fn scaled_sq_dist(x1: &[f64], x2: &[f64], lengthscales: &[f64]) -> f64 {
    let mut r_sq = 0.0;
    for i in 0..x1.len() {
        let l = if lengthscales.len() == 1 {
            lengthscales[0]
        } else {
            lengthscales[i]
        };
        let diff = (x1[i] - x2[i]) / l;
        r_sq += diff * diff;
    }
    r_sq
}

/// Evaluate `k(x1, x2)` for the given kernel and unit signal variance.
///
/// - Matérn 5/2: `(1 + √5 r + 5/3 r²) exp(-√5 r)`
/// - Squared exponential: `exp(-r² / 2)`
pub(super) fn eval(kind: KernelKind, x1: &[f64], x2: &[f64], lengthscales: &[f64]) -> f64 {
    let r_sq = scaled_sq_dist(x1, x2, lengthscales);
    match kind {
        KernelKind::Matern52 => {
            let sqrt5_r = SQRT_5 * r_sq.sqrt();
            (1.0 + sqrt5_r + 5.0 / 3.0 * r_sq) * (-sqrt5_r).exp()
        }
        KernelKind::SquaredExponential => (-0.5 * r_sq).exp(),
    }
}

/// Build the kernel matrix `K + σ²I`.
pub(super) fn matrix(
    kind: KernelKind,
    x: &[Vec<f64>],
    lengthscales: &[f64],
    noise_var: f64,
) -> DMatrix<f64> {
    let n = x.len();
    DMatrix::from_fn(n, n, |i, j| {
        let k = eval(kind, &x[i], &x[j], lengthscales);
        if i == j { k + noise_var } else { k }
    })
}

/// Compute the kernel vector `k(x*, X)` for a test point.
pub(super) fn vector(
    kind: KernelKind,
    x_star: &[f64],
    x_train: &[Vec<f64>],
    lengthscales: &[f64],
) -> DVector<f64> {
    DVector::from_fn(x_train.len(), |i, _| {
        eval(kind, x_star, &x_train[i], lengthscales)
    })
}
