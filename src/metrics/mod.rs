//! Distance metrics and proximity kernels.

pub mod distance;
pub mod kernel;

pub use distance::{euclidean_distance, feature_distance, gower_distance, hamming_distance};
pub use kernel::exponential_smoothing_kernel;
