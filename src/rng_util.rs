/// Generate a random `f64` in the range `[low, high)`.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Generate a random `f64` in `(0, 1]`, safe to pass to `ln`.
#[inline]
pub(crate) fn f64_open_zero(rng: &mut fastrand::Rng) -> f64 {
    1.0 - rng.f64()
}
