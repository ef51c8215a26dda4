//! Per-sample importance weights for the surrogate-model fit.

use crate::error::ExplainError;
use crate::metrics::{euclidean_distance, exponential_smoothing_kernel, feature_distance};
use crate::model::Feature;

/// Weights for samples living in the encoded (interpretable) space.
///
/// The target instance is the all-ones vector, meaning every original feature
/// is "present"; each encoded sample is weighted by its kernel-smoothed
/// euclidean distance to that vector.
pub fn weights_on_encoded_space(
    target_features: &[Feature],
    encoded_samples: &[Vec<f64>],
    kernel_width: f64,
) -> Result<Vec<f64>, ExplainError> {
    let target = vec![1.0; target_features.len()];
    let mut weights = Vec::with_capacity(encoded_samples.len());
    for sample in encoded_samples {
        let distance = euclidean_distance(&target, sample)?;
        weights.push(exponential_smoothing_kernel(distance, kernel_width));
    }
    Ok(check_non_zero(weights))
}

/// Weights for perturbed samples living in the original feature space.
///
/// Each perturbed instance is weighted by its kernel-smoothed type-directed
/// distance (euclidean, hamming or gower) to the original instance.
pub fn weights_on_original_space(
    original_features: &[Feature],
    perturbed: &[Vec<Feature>],
    kernel_width: f64,
) -> Result<Vec<f64>, ExplainError> {
    let mut weights = Vec::with_capacity(perturbed.len());
    for features in perturbed {
        let distance = feature_distance(features, original_features)?;
        weights.push(exponential_smoothing_kernel(distance, kernel_width));
    }
    Ok(check_non_zero(weights))
}

/// Uniform-weight fallback for degenerate kernel collapse.
///
/// If every weight is exactly zero the downstream weighted regression would
/// be singular, so the whole vector is replaced with ones. Anything else is
/// returned untouched.
pub fn check_non_zero(weights: Vec<f64>) -> Vec<f64> {
    if !weights.is_empty() && weights.iter().all(|w| *w == 0.0) {
        vec![1.0; weights.len()]
    } else {
        weights
    }
}
