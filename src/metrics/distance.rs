//! Distance metrics over numeric vectors and mixed-type feature lists.

use crate::error::ExplainError;
use crate::model::{Feature, Type, Value};

/// L2 distance between two equal-length vectors.
pub fn euclidean_distance(x: &[f64], y: &[f64]) -> Result<f64, ExplainError> {
    if x.len() != y.len() {
        return Err(ExplainError::dimension_mismatch(format!(
            "euclidean distance requires equal lengths, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    Ok(x.iter()
        .zip(y)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt())
}

/// Character-level mismatch count between two strings.
///
/// Characters are compared position by position; any length difference counts
/// as additional mismatches.
pub fn hamming_distance(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mismatches = a.iter().zip(&b).filter(|(x, y)| x != y).count();
    let tail = a.len().abs_diff(b.len());
    (mismatches + tail) as f64
}

/// Gower distance between two mixed-type feature lists.
///
/// Numeric slots contribute the absolute difference scaled by `range_weight`;
/// every other slot contributes a 0/1 mismatch. The result is the mean over
/// all slots.
pub fn gower_distance(
    f1: &[Feature],
    f2: &[Feature],
    range_weight: f64,
) -> Result<f64, ExplainError> {
    if f1.len() != f2.len() {
        return Err(ExplainError::dimension_mismatch(format!(
            "gower distance requires equal lengths, got {} and {}",
            f1.len(),
            f2.len()
        )));
    }
    if f1.is_empty() {
        return Ok(0.0);
    }
    let mut acc = 0.0;
    for (a, b) in f1.iter().zip(f2) {
        acc += match (&a.value, &b.value) {
            (Value::Number(x), Value::Number(y)) => (x - y).abs() * range_weight,
            (x, y) if x == y => 0.0,
            _ => 1.0,
        };
    }
    Ok(acc / f1.len() as f64)
}

/// The Gower blend weight used when falling back to mixed-type comparison.
const MIXED_TYPE_RANGE_WEIGHT: f64 = 0.5;

/// Type-directed distance between two feature lists.
///
/// Entirely numeric lists use euclidean distance, entirely textual lists use
/// hamming distance on the space-joined strings, and any mix of types falls
/// back to [`gower_distance`].
pub fn feature_distance(f1: &[Feature], f2: &[Feature]) -> Result<f64, ExplainError> {
    if f1.len() != f2.len() {
        return Err(ExplainError::dimension_mismatch(format!(
            "feature distance requires equal lengths, got {} and {}",
            f1.len(),
            f2.len()
        )));
    }
    let all_of = |fs: &[Feature], t: Type| fs.iter().all(|f| f.dtype == t);

    if all_of(f1, Type::Number) && all_of(f2, Type::Number) {
        let x: Vec<f64> = f1
            .iter()
            .map(|f| f.value.as_number().unwrap_or(f64::NAN))
            .collect();
        let y: Vec<f64> = f2
            .iter()
            .map(|f| f.value.as_number().unwrap_or(f64::NAN))
            .collect();
        euclidean_distance(&x, &y)
    } else if all_of(f1, Type::Text) && all_of(f2, Type::Text) {
        let joined = |fs: &[Feature]| {
            fs.iter()
                .map(|f| f.value.as_text())
                .collect::<Vec<_>>()
                .join(" ")
        };
        Ok(hamming_distance(&joined(f1), &joined(f2)))
    } else {
        gower_distance(f1, f2, MIXED_TYPE_RANGE_WEIGHT)
    }
}
