//! Counterfactual score calculator.
//!
//! The score is a lexicographic tuple with three hard levels and two soft
//! levels. The primary hard level penalizes candidates that miss the required
//! outcome, the secondary hard level penalizes moves of constrained entities,
//! and the tertiary hard level penalizes individual outputs falling short of
//! the goal's score threshold. The soft levels break ties by proximity to the
//! original input and by the number of changed features.

use crate::counterfactual::entities::CounterfactualEntity;
use crate::counterfactual::goal::GoalCriteria;
use crate::error::ExplainError;
use crate::model::{Feature, PredictionInput, PredictionOutput, PredictionProvider};
use crate::utils::composite::{flatten_entities, unflatten_features};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A multi-level score compared level by level; earlier levels dominate
/// later ones entirely.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LexicographicScore {
    /// Must-satisfy levels: validity, constraint, per-output shortfall.
    pub hard: [f64; 3],
    /// Tie-breaking levels: proximity, sparsity.
    pub soft: [f64; 2],
}

impl LexicographicScore {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn of(hard: [f64; 3], soft: [f64; 2]) -> Self {
        Self { hard, soft }
    }

    /// Level-wise sum of two scores.
    pub fn add(self, other: Self) -> Self {
        Self {
            hard: [
                self.hard[0] + other.hard[0],
                self.hard[1] + other.hard[1],
                self.hard[2] + other.hard[2],
            ],
            soft: [self.soft[0] + other.soft[0], self.soft[1] + other.soft[1]],
        }
    }

    /// Distance-to-goal penalty. 0 when the goal is met exactly.
    pub fn validity(&self) -> f64 {
        self.hard[0]
    }

    /// Constraint-violation penalty: -1 per moved frozen feature.
    pub fn constraint(&self) -> f64 {
        self.hard[1]
    }

    /// Per-output shortfall penalty: -1 per output below the goal's score.
    pub fn goal_shortfall(&self) -> f64 {
        self.hard[2]
    }

    /// Aggregate input-distance penalty, 0 only for a value-identical
    /// candidate.
    pub fn proximity(&self) -> f64 {
        self.soft[0]
    }

    /// Change-count penalty: -1 per changed feature.
    pub fn sparsity(&self) -> f64 {
        self.soft[1]
    }

    /// Whether no hard level carries a penalty.
    pub fn is_feasible(&self) -> bool {
        self.hard.iter().all(|level| *level >= 0.0)
    }
}

impl PartialEq for LexicographicScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LexicographicScore {}

impl Ord for LexicographicScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hard[0]
            .total_cmp(&other.hard[0])
            .then_with(|| self.hard[1].total_cmp(&other.hard[1]))
            .then_with(|| self.hard[2].total_cmp(&other.hard[2]))
            .then_with(|| self.soft[0].total_cmp(&other.soft[0]))
            .then_with(|| self.soft[1].total_cmp(&other.soft[1]))
    }
}

impl PartialOrd for LexicographicScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One candidate counterfactual under evaluation.
///
/// Bundles the entity list the search loop mutates, the untouched original
/// input, and the goal criteria. `predictions` holds the model outputs of the
/// last successful scoring call, so the search loop can extract the winning
/// candidate's outcome without a second model call.
#[derive(Clone)]
pub struct CounterfactualSolution {
    pub entities: Vec<CounterfactualEntity>,
    pub original_features: Vec<Feature>,
    pub goals: Arc<dyn GoalCriteria>,
    pub predictions: Vec<PredictionOutput>,
}

impl CounterfactualSolution {
    pub fn new(
        entities: Vec<CounterfactualEntity>,
        original_features: Vec<Feature>,
        goals: Arc<dyn GoalCriteria>,
    ) -> Self {
        Self {
            entities,
            original_features,
            goals,
            predictions: Vec::new(),
        }
    }
}

impl fmt::Debug for CounterfactualSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterfactualSolution")
            .field("entities", &self.entities)
            .field("original_features", &self.original_features)
            .field("predictions", &self.predictions)
            .finish_non_exhaustive()
    }
}

/// Scores candidate solutions for the external search loop.
///
/// The calculator holds no per-call state; one instance may score many
/// candidates concurrently.
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    timeout: Duration,
}

impl ScoreCalculator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &crate::config::ExplainConfig) -> Self {
        Self::new(config.prediction.as_duration())
    }

    /// Input-side score: proximity, sparsity and constraint violations,
    /// computed without calling the model.
    fn input_score(&self, solution: &CounterfactualSolution) -> LexicographicScore {
        let mut sparsity = 0.0;
        let mut constraint = 0.0;

        let count = solution.entities.len();
        let mut mean_similarity = if count == 0 { 1.0 } else { 0.0 };
        for entity in &solution.entities {
            mean_similarity += entity.similarity() / count as f64;

            if entity.is_changed() {
                sparsity -= 1.0;
                if entity.is_constrained() {
                    constraint -= 1.0;
                }
            }
        }

        // Gower-like aggregate distance from the similarities.
        let proximity = -(1.0 - mean_similarity).abs().sqrt();

        LexicographicScore::of([0.0, constraint, 0.0], [proximity, sparsity])
    }

    /// Output-side score: goal distance and per-output shortfalls over the
    /// model's predictions.
    fn output_score(
        &self,
        solution: &CounterfactualSolution,
    ) -> Result<LexicographicScore, ExplainError> {
        let mut output_distance = 0.0;
        let mut validity = 0.0;
        let mut shortfall = 0.0;

        for prediction in &solution.predictions {
            let goal_score = solution.goals.apply(&prediction.outputs)?;
            output_distance += goal_score.distance * goal_score.distance;

            for output in &prediction.outputs {
                if output.score < goal_score.score {
                    shortfall -= 1.0;
                }
            }
            validity -= output_distance.sqrt();
        }

        Ok(LexicographicScore::of([validity, 0.0, shortfall], [0.0, 0.0]))
    }

    /// Scores one candidate solution.
    ///
    /// The input-side levels are always computed. The output-side levels
    /// require one bounded model call; when that call errors out or exceeds
    /// the configured timeout the condition is logged and the input-side
    /// score is returned as-is, so a model hiccup neither crashes the search
    /// loop nor rewards the candidate.
    pub async fn calculate_score(
        &self,
        solution: &mut CounterfactualSolution,
        model: &dyn PredictionProvider,
    ) -> LexicographicScore {
        let mut current = self.input_score(solution);

        let candidate =
            match unflatten_features(&flatten_entities(&solution.entities), &solution.original_features) {
                Ok(features) => features,
                Err(error) => {
                    tracing::error!(error = %error, "Failed to rebuild candidate input");
                    return current;
                }
            };
        let inputs = vec![PredictionInput::new(candidate)];

        match tokio::time::timeout(self.timeout, model.predict(inputs)).await {
            Ok(Ok(predictions)) => {
                solution.predictions = predictions;
                match self.output_score(solution) {
                    Ok(output) => current = current.add(output),
                    Err(error) => {
                        tracing::error!(error = %error, "Goal criteria rejected the prediction")
                    }
                }
            }
            Ok(Err(error)) => {
                tracing::error!(error = %error, "Prediction returned an error");
            }
            Err(_) => {
                tracing::error!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Timed out while waiting for prediction"
                );
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counterfactual::goal::{DefaultGoalCriteria, GoalScore};
    use crate::model::{Output, Type, Value};

    fn unchanged_solution() -> CounterfactualSolution {
        let features = vec![
            Feature::number("age", 40.0),
            Feature::categorical("gender", "M"),
        ];
        let entities = features
            .iter()
            .map(|f| CounterfactualEntity::from_feature(f, false).unwrap())
            .collect();
        CounterfactualSolution::new(
            entities,
            features,
            Arc::new(|_: &[Output]| -> Result<GoalScore, ExplainError> {
                Ok(GoalScore::exact_match())
            }),
        )
    }

    #[test]
    fn test_lexicographic_comparison_orders_by_earliest_level() {
        let better = LexicographicScore::of([0.0, 0.0, 0.0], [-5.0, -3.0]);
        let worse = LexicographicScore::of([-0.1, 0.0, 0.0], [0.0, 0.0]);
        assert!(better > worse);

        let tie_break = LexicographicScore::of([0.0, 0.0, 0.0], [-5.0, -2.0]);
        assert!(tie_break > better);
    }

    #[test]
    fn test_score_addition_is_level_wise() {
        let a = LexicographicScore::of([-1.0, 0.0, -2.0], [-0.5, 0.0]);
        let b = LexicographicScore::of([0.0, -1.0, 0.0], [0.0, -3.0]);
        let sum = a.add(b);
        assert_eq!(sum.hard, [-1.0, -1.0, -2.0]);
        assert_eq!(sum.soft, [-0.5, -3.0]);
    }

    #[test]
    fn test_feasibility_requires_clean_hard_levels() {
        assert!(LexicographicScore::of([0.0, 0.0, 0.0], [-9.0, -9.0]).is_feasible());
        assert!(!LexicographicScore::of([0.0, -1.0, 0.0], [0.0, 0.0]).is_feasible());
    }

    #[test]
    fn test_unchanged_solution_has_zero_input_score() {
        let calculator = ScoreCalculator::new(Duration::from_secs(1));
        let score = calculator.input_score(&unchanged_solution());
        assert_eq!(score.constraint(), 0.0);
        assert_eq!(score.proximity(), 0.0);
        assert_eq!(score.sparsity(), 0.0);
    }

    #[test]
    fn test_changed_constrained_entity_violates_hard_constraint() {
        let mut solution = unchanged_solution();
        // freeze "gender", then force a proposed value into it
        solution.entities[1] =
            CounterfactualEntity::fixed(&Feature::categorical("gender", "M"));
        solution.entities[1]
            .set_proposed(Value::Categorical("F".to_string()))
            .unwrap();

        let calculator = ScoreCalculator::new(Duration::from_secs(1));
        let score = calculator.input_score(&solution);
        assert_eq!(score.constraint(), -1.0);
        assert_eq!(score.sparsity(), -1.0);
        // the fixed entity still reports similarity 1, so proximity is clean
        assert_eq!(score.proximity(), 0.0);
    }

    #[test]
    fn test_proximity_follows_mean_similarity() {
        let age = Feature::number("age", 40.0);
        let mut solution = unchanged_solution();
        solution.entities[0] = CounterfactualEntity::Double(
            crate::counterfactual::entities::DoubleEntity::with_range(&age, 0.0, 100.0).unwrap(),
        );
        solution.entities[0].set_proposed(Value::Number(42.0)).unwrap();

        let calculator = ScoreCalculator::new(Duration::from_secs(1));
        let score = calculator.input_score(&solution);

        let similarity = solution.entities[0].similarity();
        let expected = -(1.0 - (similarity + 1.0) / 2.0).abs().sqrt();
        assert!((score.proximity() - expected).abs() < 1e-12);
        assert_eq!(score.sparsity(), -1.0);
        assert_eq!(score.constraint(), 0.0);
    }

    #[test]
    fn test_output_score_on_exact_goal_match() {
        let mut solution = unchanged_solution();
        solution.goals = Arc::new(DefaultGoalCriteria::new(vec![Output::new(
            "approved",
            Type::Boolean,
            Value::Boolean(true),
            1.0,
        )]));
        solution.predictions = vec![PredictionOutput::new(vec![Output::new(
            "approved",
            Type::Boolean,
            Value::Boolean(true),
            1.0,
        )])];

        let calculator = ScoreCalculator::new(Duration::from_secs(1));
        let score = calculator.output_score(&solution).unwrap();
        assert_eq!(score.validity(), 0.0);
        assert_eq!(score.goal_shortfall(), 0.0);
    }

    #[test]
    fn test_output_score_accumulates_across_output_lists() {
        let mut solution = unchanged_solution();
        solution.goals = Arc::new(|_: &[Output]| -> Result<GoalScore, ExplainError> {
            Ok(GoalScore::new(1.0, 1.0))
        });
        let miss = PredictionOutput::new(vec![Output::new(
            "approved",
            Type::Boolean,
            Value::Boolean(false),
            1.0,
        )]);
        solution.predictions = vec![miss.clone(), miss];

        let calculator = ScoreCalculator::new(Duration::from_secs(1));
        let score = calculator.output_score(&solution).unwrap();
        // running accumulator: -sqrt(1) - sqrt(2)
        let expected = -1.0 - 2.0_f64.sqrt();
        assert!((score.validity() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_output_shortfall_counts_low_scoring_outputs() {
        let mut solution = unchanged_solution();
        solution.goals = Arc::new(|_: &[Output]| -> Result<GoalScore, ExplainError> {
            Ok(GoalScore::new(0.0, 0.9))
        });
        solution.predictions = vec![PredictionOutput::new(vec![
            Output::new("approved", Type::Boolean, Value::Boolean(true), 0.4),
            Output::new("limit", Type::Number, Value::Number(100.0), 0.95),
        ])];

        let calculator = ScoreCalculator::new(Duration::from_secs(1));
        let score = calculator.output_score(&solution).unwrap();
        assert_eq!(score.goal_shortfall(), -1.0);
    }
}
