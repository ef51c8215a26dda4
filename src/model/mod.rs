//! Core data model shared by the weighting and counterfactual modules.
//!
//! An opaque model is reachable only through the [`PredictionProvider`]
//! contract: it maps a list of [`PredictionInput`]s to a list of
//! [`PredictionOutput`]s, one output list per input list. Outputs inside a
//! single list must always be matched by name, never by position, because a
//! provider is allowed to reorder its output channels.

use crate::error::ExplainError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The type of a feature or output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Number,
    Boolean,
    Categorical,
    Text,
    Binary,
    Undefined,
}

/// A typed immutable scalar. Equality is value-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Number(f64),
    Boolean(bool),
    Categorical(String),
    Text(String),
    Binary(Vec<u8>),
    Null,
}

impl Value {
    /// Numeric view of this value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Textual rendering of this value, used when joining textual features.
    pub fn as_text(&self) -> String {
        match self {
            Value::Number(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Categorical(s) | Value::Text(s) => s.clone(),
            Value::Binary(bytes) => format!("<{} bytes>", bytes.len()),
            Value::Null => String::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The [`Type`] this value naturally carries.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Number(_) => Type::Number,
            Value::Boolean(_) => Type::Boolean,
            Value::Categorical(_) => Type::Categorical,
            Value::Text(_) => Type::Text,
            Value::Binary(_) => Type::Binary,
            Value::Null => Type::Undefined,
        }
    }
}

/// A named, typed input slot. Name is unique within an input; order defines
/// a stable slot for flatten/unflatten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub dtype: Type,
    pub value: Value,
}

impl Feature {
    pub fn new(name: &str, dtype: Type, value: Value) -> Self {
        Self {
            name: name.to_string(),
            dtype,
            value,
        }
    }

    pub fn number(name: &str, value: f64) -> Self {
        Self::new(name, Type::Number, Value::Number(value))
    }

    pub fn boolean(name: &str, value: bool) -> Self {
        Self::new(name, Type::Boolean, Value::Boolean(value))
    }

    pub fn categorical(name: &str, value: &str) -> Self {
        Self::new(name, Type::Categorical, Value::Categorical(value.to_string()))
    }

    pub fn text(name: &str, value: &str) -> Self {
        Self::new(name, Type::Text, Value::Text(value.to_string()))
    }

    pub fn binary(name: &str, value: Vec<u8>) -> Self {
        Self::new(name, Type::Binary, Value::Binary(value))
    }
}

/// A named, scored output channel of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub dtype: Type,
    pub value: Value,
    /// The model's confidence/score for this channel.
    pub score: f64,
}

impl Output {
    pub fn new(name: &str, dtype: Type, value: Value, score: f64) -> Self {
        Self {
            name: name.to_string(),
            dtype,
            value,
            score,
        }
    }
}

/// One full input to the model: an ordered list of features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub features: Vec<Feature>,
}

impl PredictionInput {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }
}

/// One full output of the model: an ordered list of output channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutput {
    pub outputs: Vec<Output>,
}

impl PredictionOutput {
    pub fn new(outputs: Vec<Output>) -> Self {
        Self { outputs }
    }

    /// Look up an output channel by name.
    pub fn by_name(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

/// The opaque model contract.
///
/// Implementations must be cardinality-preserving: the returned list has one
/// [`PredictionOutput`] per submitted [`PredictionInput`], in the same order.
#[async_trait]
pub trait PredictionProvider: Send + Sync {
    async fn predict(
        &self,
        inputs: Vec<PredictionInput>,
    ) -> Result<Vec<PredictionOutput>, ExplainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_equality_is_value_based() {
        assert_eq!(Value::Number(1.0), Value::Number(1.0));
        assert_ne!(Value::Number(1.0), Value::Number(2.0));
        assert_ne!(Value::Categorical("a".to_string()), Value::Text("a".to_string()));
    }

    #[test]
    fn test_value_as_number() {
        assert_eq!(Value::Number(4.5).as_number(), Some(4.5));
        assert_eq!(Value::Boolean(true).as_number(), Some(1.0));
        assert_eq!(Value::Text("x".to_string()).as_number(), None);
    }

    #[test]
    fn test_feature_constructors_set_type() {
        assert_eq!(Feature::number("age", 40.0).dtype, Type::Number);
        assert_eq!(Feature::categorical("gender", "M").dtype, Type::Categorical);
        assert_eq!(Feature::binary("blob", vec![1, 2]).dtype, Type::Binary);
    }

    #[test]
    fn test_output_lookup_by_name() {
        let po = PredictionOutput::new(vec![
            Output::new("approved", Type::Boolean, Value::Boolean(true), 0.9),
            Output::new("limit", Type::Number, Value::Number(1000.0), 0.8),
        ]);
        assert_eq!(po.by_name("limit").unwrap().score, 0.8);
        assert!(po.by_name("missing").is_none());
    }
}
