//! Configuration types for the explicar crate.
//!
//! These are plain serde structs so a host application can embed them in its
//! own configuration tree.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for the explanation core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplainConfig {
    /// Prediction contract configuration (bounded wait on the model call).
    #[serde(default)]
    pub prediction: PredictionConfig,
    /// Surrogate sample-weighting configuration.
    #[serde(default)]
    pub weighting: WeightingConfig,
}

/// Time unit for the prediction timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
}

/// Bounded-wait configuration for calls into the opaque model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Timeout magnitude, interpreted in `unit`.
    #[serde(default = "default_prediction_timeout")]
    pub timeout: u64,
    /// Timeout unit.
    #[serde(default = "default_prediction_unit")]
    pub unit: TimeUnit,
}

impl PredictionConfig {
    /// The configured timeout as a [`Duration`].
    pub fn as_duration(&self) -> Duration {
        match self.unit {
            TimeUnit::Milliseconds => Duration::from_millis(self.timeout),
            TimeUnit::Seconds => Duration::from_secs(self.timeout),
            TimeUnit::Minutes => Duration::from_secs(self.timeout * 60),
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            timeout: default_prediction_timeout(),
            unit: default_prediction_unit(),
        }
    }
}

fn default_prediction_timeout() -> u64 {
    10
}

fn default_prediction_unit() -> TimeUnit {
    TimeUnit::Seconds
}

/// Configuration for the surrogate sample-weighting module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightingConfig {
    /// Width of the proximity kernel used to turn distances into weights.
    #[serde(default = "default_kernel_width")]
    pub kernel_width: f64,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            kernel_width: default_kernel_width(),
        }
    }
}

fn default_kernel_width() -> f64 {
    0.75
}
