//! Proximity kernels turning distances into bounded weights.

/// Exponential smoothing kernel.
///
/// Maps a distance into a proximity in `(0, 1]`: 1 at distance 0, decaying
/// towards 0 as the distance grows. `width` controls the decay rate.
pub fn exponential_smoothing_kernel(distance: f64, width: f64) -> f64 {
    (-(distance * distance) / (2.0 * width * width)).exp()
}
