//! Counterfactual search support: entities, goal criteria and scoring.
//!
//! The metaheuristic search loop itself lives outside this crate. It holds a
//! population of candidate solutions, mutates their entities and calls
//! [`score::ScoreCalculator::calculate_score`] to rank them; everything it
//! needs from this crate is that contract plus the entity abstraction.

pub mod entities;
pub mod goal;
pub mod score;

pub use entities::CounterfactualEntity;
pub use goal::{DefaultGoalCriteria, GoalCriteria, GoalScore};
pub use score::{CounterfactualSolution, LexicographicScore, ScoreCalculator};
