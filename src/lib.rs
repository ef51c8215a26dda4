//! # explicar — Black-box Model Explanations
//!
//! This crate explains predictions of an opaque model, reachable only through
//! input→output calls, without inspecting its internals. It covers two
//! pieces:
//!
//! 1. **Surrogate sample weighting** ([`lime`]) — deciding how much each
//!    perturbed/neighboring sample should influence a locally-fit
//!    interpretable model.
//! 2. **Counterfactual scoring** ([`counterfactual`]) — a lexicographic
//!    multi-level objective scoring a candidate alternative input against the
//!    target outcome, per-feature mutability constraints, and closeness to
//!    the original input.
//!
//! Both share the [`model`] data types and the [`metrics`] mixed-type
//! distance library. The metaheuristic search loop, the HTTP surface and the
//! storage layer are external collaborators: the search loop only needs
//! [`counterfactual::ScoreCalculator::calculate_score`] and the entity
//! abstraction, and the model only needs to implement
//! [`model::PredictionProvider`].

pub mod config;
pub mod counterfactual;
pub mod error;
pub mod lime;
pub mod metrics;
pub mod model;
pub mod utils;

pub use config::ExplainConfig;
pub use counterfactual::{
    CounterfactualEntity, CounterfactualSolution, DefaultGoalCriteria, GoalCriteria, GoalScore,
    LexicographicScore, ScoreCalculator,
};
pub use error::ExplainError;
pub use model::{
    Feature, Output, PredictionInput, PredictionOutput, PredictionProvider, Type, Value,
};
