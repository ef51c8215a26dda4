//! Local surrogate-model support (LIME-style).
//!
//! The perturbation sampling and the weighted linear fit live outside this
//! crate; what lives here is the piece in between, deciding how much each
//! perturbed sample should influence the surrogate fit.

pub mod weighting;

pub use weighting::{check_non_zero, weights_on_encoded_space, weights_on_original_space};
