//! Goal criteria: how far a set of outputs is from the desired outcome.

use crate::error::ExplainError;
use crate::model::{Output, Type};
use serde::{Deserialize, Serialize};

/// Distance to the desired outcome plus the score threshold outputs should
/// reach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalScore {
    pub distance: f64,
    pub score: f64,
}

impl GoalScore {
    /// Distance charged for a categorical mismatch or an unanswerable
    /// comparison.
    pub const DEFAULT_DISTANCE: f64 = 1.0;

    pub fn new(distance: f64, score: f64) -> Self {
        Self { distance, score }
    }

    /// The prediction matches the goal exactly.
    pub fn exact_match() -> Self {
        Self::new(0.0, 1.0)
    }

    /// The prediction misses the goal by the default distance.
    pub fn standard_mismatch() -> Self {
        Self::new(Self::DEFAULT_DISTANCE, 1.0)
    }
}

/// The externally supplied definition of a successful outcome.
///
/// Implementations must be pure with respect to one search: two calls with
/// the same outputs return the same score, and no state is carried across
/// calls, since many candidates are scored concurrently.
pub trait GoalCriteria: Send + Sync {
    fn apply(&self, outputs: &[Output]) -> Result<GoalScore, ExplainError>;
}

impl<F> GoalCriteria for F
where
    F: Fn(&[Output]) -> Result<GoalScore, ExplainError> + Send + Sync,
{
    fn apply(&self, outputs: &[Output]) -> Result<GoalScore, ExplainError> {
        self(outputs)
    }
}

/// Goal criteria comparing predictions against a list of desired outputs.
///
/// Predictions are matched to goals by output name, never by position; a
/// provider is allowed to reorder its output channels. Numeric comparisons
/// use the relative change between prediction and goal, zeroed below the
/// configured threshold; every other type is an exact-match comparison.
#[derive(Debug, Clone)]
pub struct DefaultGoalCriteria {
    goals: Vec<Output>,
    threshold: f64,
}

impl DefaultGoalCriteria {
    pub fn new(goals: Vec<Output>) -> Self {
        Self::with_threshold(goals, 0.0)
    }

    pub fn with_threshold(goals: Vec<Output>, threshold: f64) -> Self {
        Self { goals, threshold }
    }

    fn numeric_distance(&self, prediction: f64, goal: f64) -> f64 {
        let difference = (prediction - goal).abs();
        // With a zero on either side the change rate is undefined, so the
        // raw difference is used instead.
        let distance = if prediction == 0.0 || goal == 0.0 {
            difference
        } else {
            difference / prediction.max(goal)
        };
        if distance < self.threshold { 0.0 } else { distance }
    }
}

impl GoalCriteria for DefaultGoalCriteria {
    fn apply(&self, outputs: &[Output]) -> Result<GoalScore, ExplainError> {
        let mut distance = 0.0;
        let mut score = 1.0_f64;

        for goal in &self.goals {
            score = score.min(goal.score);

            let Some(prediction) = outputs.iter().find(|o| o.name == goal.name) else {
                distance += GoalScore::DEFAULT_DISTANCE;
                continue;
            };

            if prediction.dtype != goal.dtype && goal.dtype != Type::Categorical {
                // A null prediction with a differing type is tolerated; some
                // providers predict a missing value through a foreign channel
                // type.
                if prediction.value.is_null() {
                    distance += GoalScore::DEFAULT_DISTANCE;
                    continue;
                }
                return Err(ExplainError::goal(format!(
                    "output '{}' has type {:?} but the goal wants {:?}",
                    prediction.name, prediction.dtype, goal.dtype
                )));
            }

            if prediction.dtype == Type::Number {
                let (Some(predicted), Some(wanted)) =
                    (prediction.value.as_number(), goal.value.as_number())
                else {
                    distance += GoalScore::DEFAULT_DISTANCE;
                    continue;
                };
                if predicted.is_nan() || wanted.is_nan() {
                    return Err(ExplainError::goal(format!(
                        "unsupported NaN for numeric output '{}'",
                        prediction.name
                    )));
                }
                distance += self.numeric_distance(predicted, wanted);
            } else if prediction.value == goal.value {
                distance += 0.0;
            } else {
                distance += GoalScore::DEFAULT_DISTANCE;
            }
        }

        Ok(GoalScore::new(distance, score))
    }
}
