//! Cross-chain summary statistics
//!
//! Reductions are plain sequential left folds in slice order, so equal inputs
//! give bit-identical outputs on every platform and thread count.

/// Arithmetic mean. `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    Some(sum / values.len() as f64)
}

/// Sample standard deviation (Bessel-corrected, divides by `k - 1`).
///
/// A single value, or any constant slice, yields exactly `Some(0.0)`. `None`
/// for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    // Constant input: the rounded mean may sit an ulp off the values
    if values.windows(2).all(|w| w[0] == w[1]) {
        return Some(0.0);
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mu) * (v - mu)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}
