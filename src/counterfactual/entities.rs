//! Counterfactual entities: one mutable feature slot per entity.
//!
//! Entities are built once per search from the original instance's features,
//! mutated many times by the external search loop through
//! [`CounterfactualEntity::set_proposed`], and projected back into the domain
//! model with [`CounterfactualEntity::as_feature`]. The variant set is closed:
//! numeric, integer, boolean, categorical and binary slots, plus a fixed
//! counterpart whose distance and similarity are constants no matter what
//! proposed value is injected into it.

use crate::error::ExplainError;
use crate::model::{Feature, Type, Value};
use serde::{Deserialize, Serialize};

/// A searched feature slot in a counterfactual candidate solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CounterfactualEntity {
    Double(DoubleEntity),
    Integer(IntegerEntity),
    Boolean(BooleanEntity),
    Categorical(CategoricalEntity),
    Binary(BinaryEntity),
    Fixed(FixedEntity),
}

impl CounterfactualEntity {
    /// Builds the entity matching the feature's type.
    ///
    /// A constrained feature always becomes a [`FixedEntity`], whatever its
    /// type. Text features are searched as categorical slots (exact-match
    /// distance); richer domains are declared through the per-variant
    /// builders such as [`DoubleEntity::with_range`].
    pub fn from_feature(feature: &Feature, constrained: bool) -> Result<Self, ExplainError> {
        if constrained {
            return Ok(Self::Fixed(FixedEntity::from_feature(feature)));
        }
        match feature.dtype {
            Type::Number => Ok(Self::Double(DoubleEntity::from_feature(feature)?)),
            Type::Boolean => Ok(Self::Boolean(BooleanEntity::from_feature(feature)?)),
            Type::Categorical | Type::Text => {
                Ok(Self::Categorical(CategoricalEntity::from_feature(feature)?))
            }
            Type::Binary => Ok(Self::Binary(BinaryEntity::from_feature(feature)?)),
            Type::Undefined => Err(ExplainError::invalid_input(format!(
                "feature '{}' has no searchable type",
                feature.name
            ))),
        }
    }

    /// Builds the fixed (frozen) counterpart for any feature.
    pub fn fixed(feature: &Feature) -> Self {
        Self::Fixed(FixedEntity::from_feature(feature))
    }

    /// Distance in `[0, 1]` between the proposed and the original value.
    pub fn distance(&self) -> f64 {
        match self {
            Self::Double(e) => e.distance(),
            Self::Integer(e) => e.distance(),
            Self::Boolean(e) => e.distance(),
            Self::Categorical(e) => e.distance(),
            Self::Binary(e) => e.distance(),
            Self::Fixed(_) => 0.0,
        }
    }

    /// Similarity in `[0, 1]` between the proposed and the original value.
    pub fn similarity(&self) -> f64 {
        match self {
            Self::Fixed(_) => 1.0,
            _ => 1.0 - self.distance(),
        }
    }

    /// Whether the proposed value differs from the original value.
    pub fn is_changed(&self) -> bool {
        self.proposed_value() != self.original_value()
    }

    /// Whether this slot is frozen and must not be moved by the search.
    pub fn is_constrained(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    pub fn feature_name(&self) -> &str {
        match self {
            Self::Double(e) => &e.feature_name,
            Self::Integer(e) => &e.feature_name,
            Self::Boolean(e) => &e.feature_name,
            Self::Categorical(e) => &e.feature_name,
            Self::Binary(e) => &e.feature_name,
            Self::Fixed(e) => &e.feature.name,
        }
    }

    /// The value this entity was built from. Never mutated.
    pub fn original_value(&self) -> Value {
        match self {
            Self::Double(e) => Value::Number(e.original),
            Self::Integer(e) => Value::Number(e.original as f64),
            Self::Boolean(e) => Value::Boolean(e.original),
            Self::Categorical(e) => e.typed_value(&e.original),
            Self::Binary(e) => Value::Binary(e.original.clone()),
            Self::Fixed(e) => e.feature.value.clone(),
        }
    }

    /// The value currently proposed by the search loop.
    pub fn proposed_value(&self) -> Value {
        match self {
            Self::Double(e) => Value::Number(e.proposed),
            Self::Integer(e) => Value::Number(e.proposed as f64),
            Self::Boolean(e) => Value::Boolean(e.proposed),
            Self::Categorical(e) => e.typed_value(&e.proposed),
            Self::Binary(e) => Value::Binary(e.proposed.clone()),
            Self::Fixed(e) => e.proposed.clone(),
        }
    }

    /// Mutation seam for the external search loop.
    ///
    /// Numeric slots clamp the proposed value into their declared range; a
    /// value of the wrong type is rejected.
    pub fn set_proposed(&mut self, value: Value) -> Result<(), ExplainError> {
        match (self, value) {
            (Self::Double(e), Value::Number(v)) => {
                e.proposed = e.clamp(v);
                Ok(())
            }
            (Self::Integer(e), Value::Number(v)) => {
                e.proposed = e.clamp(v.round() as i64);
                Ok(())
            }
            (Self::Boolean(e), Value::Boolean(v)) => {
                e.proposed = v;
                Ok(())
            }
            (Self::Categorical(e), Value::Categorical(v)) | (Self::Categorical(e), Value::Text(v)) => {
                e.proposed = v;
                Ok(())
            }
            (Self::Binary(e), Value::Binary(v)) => {
                e.proposed = v;
                Ok(())
            }
            (Self::Fixed(e), v) => {
                // Accepted but ignored by distance/similarity; the score
                // calculator flags the move as a constraint violation.
                e.proposed = v;
                Ok(())
            }
            (entity, v) => Err(ExplainError::invalid_input(format!(
                "cannot assign {:?} value to entity '{}'",
                v.type_of(),
                entity.feature_name()
            ))),
        }
    }

    /// Materializes the current proposed value back into a [`Feature`].
    pub fn as_feature(&self) -> Feature {
        match self {
            Self::Double(e) => Feature::number(&e.feature_name, e.proposed),
            Self::Integer(e) => Feature::number(&e.feature_name, e.proposed as f64),
            Self::Boolean(e) => Feature::boolean(&e.feature_name, e.proposed),
            Self::Categorical(e) => {
                Feature::new(&e.feature_name, e.dtype, e.typed_value(&e.proposed))
            }
            Self::Binary(e) => Feature::binary(&e.feature_name, e.proposed.clone()),
            Self::Fixed(e) => Feature::new(&e.feature.name, e.feature.dtype, e.proposed.clone()),
        }
    }
}

/// A searchable floating-point slot, optionally bounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleEntity {
    pub(crate) feature_name: String,
    pub(crate) original: f64,
    pub(crate) proposed: f64,
    pub(crate) range: Option<(f64, f64)>,
}

impl DoubleEntity {
    pub fn from_feature(feature: &Feature) -> Result<Self, ExplainError> {
        let original = numeric_value(feature)?;
        Ok(Self {
            feature_name: feature.name.clone(),
            original,
            proposed: original,
            range: None,
        })
    }

    /// Declares the `[min, max]` search range, also used to normalize the
    /// distance.
    pub fn with_range(feature: &Feature, min: f64, max: f64) -> Result<Self, ExplainError> {
        if min >= max {
            return Err(ExplainError::invalid_input(format!(
                "invalid range [{min}, {max}] for feature '{}'",
                feature.name
            )));
        }
        let mut entity = Self::from_feature(feature)?;
        entity.range = Some((min, max));
        Ok(entity)
    }

    fn clamp(&self, value: f64) -> f64 {
        match self.range {
            Some((min, max)) => value.clamp(min, max),
            None => value,
        }
    }

    fn distance(&self) -> f64 {
        let delta = (self.proposed - self.original).abs();
        let normalized = match self.range {
            Some((min, max)) => delta / (max - min),
            None => delta,
        };
        normalized.min(1.0)
    }
}

/// A searchable integer slot, optionally bounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegerEntity {
    pub(crate) feature_name: String,
    pub(crate) original: i64,
    pub(crate) proposed: i64,
    pub(crate) range: Option<(i64, i64)>,
}

impl IntegerEntity {
    pub fn from_feature(feature: &Feature) -> Result<Self, ExplainError> {
        let original = numeric_value(feature)?.round() as i64;
        Ok(Self {
            feature_name: feature.name.clone(),
            original,
            proposed: original,
            range: None,
        })
    }

    pub fn with_range(feature: &Feature, min: i64, max: i64) -> Result<Self, ExplainError> {
        if min >= max {
            return Err(ExplainError::invalid_input(format!(
                "invalid range [{min}, {max}] for feature '{}'",
                feature.name
            )));
        }
        let mut entity = Self::from_feature(feature)?;
        entity.range = Some((min, max));
        Ok(entity)
    }

    fn clamp(&self, value: i64) -> i64 {
        match self.range {
            Some((min, max)) => value.clamp(min, max),
            None => value,
        }
    }

    fn distance(&self) -> f64 {
        let delta = (self.proposed - self.original).unsigned_abs() as f64;
        let normalized = match self.range {
            Some((min, max)) => delta / (max - min) as f64,
            None => delta,
        };
        normalized.min(1.0)
    }
}

/// A searchable boolean slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanEntity {
    pub(crate) feature_name: String,
    pub(crate) original: bool,
    pub(crate) proposed: bool,
}

impl BooleanEntity {
    pub fn from_feature(feature: &Feature) -> Result<Self, ExplainError> {
        match feature.value {
            Value::Boolean(original) => Ok(Self {
                feature_name: feature.name.clone(),
                original,
                proposed: original,
            }),
            _ => Err(ExplainError::invalid_input(format!(
                "feature '{}' is not boolean",
                feature.name
            ))),
        }
    }

    fn distance(&self) -> f64 {
        if self.proposed == self.original { 0.0 } else { 1.0 }
    }
}

/// A searchable categorical slot with an optional allowed-category set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEntity {
    pub(crate) feature_name: String,
    pub(crate) dtype: Type,
    pub(crate) original: String,
    pub(crate) proposed: String,
    pub(crate) categories: Vec<String>,
}

impl CategoricalEntity {
    pub fn from_feature(feature: &Feature) -> Result<Self, ExplainError> {
        let original = match &feature.value {
            Value::Categorical(s) | Value::Text(s) => s.clone(),
            _ => {
                return Err(ExplainError::invalid_input(format!(
                    "feature '{}' is not categorical",
                    feature.name
                )));
            }
        };
        Ok(Self {
            feature_name: feature.name.clone(),
            dtype: feature.dtype,
            proposed: original.clone(),
            original,
            categories: Vec::new(),
        })
    }

    /// Declares the category set the search loop may draw proposals from.
    pub fn with_categories(
        feature: &Feature,
        categories: Vec<String>,
    ) -> Result<Self, ExplainError> {
        let mut entity = Self::from_feature(feature)?;
        entity.categories = categories;
        Ok(entity)
    }

    /// Allowed categories, as declared at construction.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    fn typed_value(&self, raw: &str) -> Value {
        match self.dtype {
            Type::Text => Value::Text(raw.to_string()),
            _ => Value::Categorical(raw.to_string()),
        }
    }

    fn distance(&self) -> f64 {
        if self.proposed == self.original { 0.0 } else { 1.0 }
    }
}

/// A searchable binary payload slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryEntity {
    pub(crate) feature_name: String,
    pub(crate) original: Vec<u8>,
    pub(crate) proposed: Vec<u8>,
}

impl BinaryEntity {
    pub fn from_feature(feature: &Feature) -> Result<Self, ExplainError> {
        match &feature.value {
            Value::Binary(original) => Ok(Self {
                feature_name: feature.name.clone(),
                original: original.clone(),
                proposed: original.clone(),
            }),
            _ => Err(ExplainError::invalid_input(format!(
                "feature '{}' is not binary",
                feature.name
            ))),
        }
    }

    /// Byte-level mismatch count normalized by the longer payload.
    fn distance(&self) -> f64 {
        let longest = self.original.len().max(self.proposed.len());
        if longest == 0 {
            return 0.0;
        }
        let mismatches = self
            .original
            .iter()
            .zip(&self.proposed)
            .filter(|(a, b)| a != b)
            .count()
            + self.original.len().abs_diff(self.proposed.len());
        mismatches as f64 / longest as f64
    }
}

/// A frozen feature slot.
///
/// Distance is always 0 and similarity always 1, even when a proposed value
/// is forced into it from outside; the score calculator relies on that
/// constant to tell a genuine move apart from a constraint violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedEntity {
    pub(crate) feature: Feature,
    pub(crate) proposed: Value,
}

impl FixedEntity {
    pub fn from_feature(feature: &Feature) -> Self {
        Self {
            feature: feature.clone(),
            proposed: feature.value.clone(),
        }
    }
}

fn numeric_value(feature: &Feature) -> Result<f64, ExplainError> {
    feature.value.as_number().ok_or_else(|| {
        ExplainError::invalid_input(format!("feature '{}' is not numeric", feature.name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_double_entity_bounded_distance() {
        let feature = Feature::number("age", 40.0);
        let mut entity =
            CounterfactualEntity::Double(DoubleEntity::with_range(&feature, 0.0, 100.0).unwrap());
        assert_eq!(entity.distance(), 0.0);
        assert!(!entity.is_changed());

        entity.set_proposed(Value::Number(50.0)).unwrap();
        assert!((entity.distance() - 0.1).abs() < 1e-12);
        assert!((entity.similarity() - 0.9).abs() < 1e-12);
        assert!(entity.is_changed());
        assert!(!entity.is_constrained());
    }

    #[test]
    fn test_double_entity_symmetric_similarity() {
        let feature = Feature::number("x", 500.0);
        let mut entity =
            CounterfactualEntity::Double(DoubleEntity::with_range(&feature, 0.0, 1000.0).unwrap());
        entity.set_proposed(Value::Number(590.0)).unwrap();
        let up = entity.similarity();
        entity.set_proposed(Value::Number(410.0)).unwrap();
        let down = entity.similarity();
        assert_eq!(up, down);
        assert!(up > 0.9);
    }

    #[test]
    fn test_double_entity_clamps_into_range() {
        let feature = Feature::number("x", 5.0);
        let mut entity =
            CounterfactualEntity::Double(DoubleEntity::with_range(&feature, 0.0, 10.0).unwrap());
        entity.set_proposed(Value::Number(50.0)).unwrap();
        assert_eq!(entity.proposed_value(), Value::Number(10.0));
    }

    #[test]
    fn test_integer_entity_distance() {
        let feature = Feature::number("count", 20.0);
        let mut entity =
            CounterfactualEntity::Integer(IntegerEntity::with_range(&feature, 0, 100).unwrap());
        entity.set_proposed(Value::Number(29.0)).unwrap();
        assert!(entity.similarity() > 0.9);
        entity.set_proposed(Value::Number(11.0)).unwrap();
        assert!(entity.similarity() > 0.9);
    }

    #[test]
    fn test_boolean_entity_distance_is_binary() {
        let feature = Feature::boolean("employed", true);
        let mut entity = CounterfactualEntity::from_feature(&feature, false).unwrap();
        entity.set_proposed(Value::Boolean(false)).unwrap();
        assert_eq!(entity.distance(), 1.0);
        assert_eq!(entity.similarity(), 0.0);
        entity.set_proposed(Value::Boolean(true)).unwrap();
        assert_eq!(entity.distance(), 0.0);
        assert_eq!(entity.similarity(), 1.0);
    }

    #[test]
    fn test_categorical_entity_distance_is_binary() {
        let feature = Feature::categorical("color", "red");
        let mut entity = CounterfactualEntity::Categorical(
            CategoricalEntity::with_categories(
                &feature,
                vec!["red".to_string(), "green".to_string(), "blue".to_string()],
            )
            .unwrap(),
        );
        entity.set_proposed(Value::Categorical("green".to_string())).unwrap();
        assert_eq!(entity.distance(), 1.0);
        entity.set_proposed(Value::Categorical("red".to_string())).unwrap();
        assert_eq!(entity.distance(), 0.0);
    }

    #[test]
    fn test_binary_entity_normalized_distance() {
        let feature = Feature::binary("payload", b"foo".to_vec());
        let mut entity = CounterfactualEntity::from_feature(&feature, false).unwrap();
        entity.set_proposed(Value::Binary(b"fxo".to_vec())).unwrap();
        assert!((entity.distance() - 1.0 / 3.0).abs() < 1e-12);
        entity.set_proposed(Value::Binary(b"foo".to_vec())).unwrap();
        assert_eq!(entity.distance(), 0.0);
    }

    #[test]
    fn test_fixed_entity_invariants_survive_forced_values() {
        let feature = Feature::categorical("gender", "M");
        let mut entity = CounterfactualEntity::fixed(&feature);
        assert_eq!(entity.distance(), 0.0);
        assert_eq!(entity.similarity(), 1.0);
        assert!(entity.is_constrained());
        assert!(!entity.is_changed());

        entity.set_proposed(Value::Categorical("F".to_string())).unwrap();
        assert_eq!(entity.distance(), 0.0);
        assert_eq!(entity.similarity(), 1.0);
        assert!(entity.is_constrained());
        assert!(entity.is_changed());
    }

    #[test]
    fn test_constrained_factory_builds_fixed_for_any_type() {
        for feature in [
            Feature::number("n", 1.0),
            Feature::boolean("b", false),
            Feature::binary("raw", vec![0xde, 0xad]),
        ] {
            let entity = CounterfactualEntity::from_feature(&feature, true).unwrap();
            assert!(entity.is_constrained());
            assert_eq!(entity.as_feature(), feature);
        }
    }

    #[test]
    fn test_set_proposed_rejects_wrong_type() {
        let feature = Feature::number("age", 40.0);
        let mut entity = CounterfactualEntity::from_feature(&feature, false).unwrap();
        let err = entity.set_proposed(Value::Boolean(true)).unwrap_err();
        assert!(matches!(err, ExplainError::InvalidInput(_)));
    }

    #[test]
    fn test_as_feature_round_trips_unchanged_entity() {
        let features = vec![
            Feature::number("age", 40.0),
            Feature::categorical("gender", "M"),
            Feature::text("note", "hello"),
            Feature::boolean("employed", true),
        ];
        for feature in &features {
            let entity = CounterfactualEntity::from_feature(feature, false).unwrap();
            assert_eq!(&entity.as_feature(), feature);
        }
    }
}
