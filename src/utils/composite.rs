//! Rebuilding a full candidate input from a partial set of entity features.

use crate::counterfactual::entities::CounterfactualEntity;
use crate::error::ExplainError;
use crate::model::Feature;
use std::collections::HashMap;

/// Projects every entity's current proposed value into a feature list.
pub fn flatten_entities(entities: &[CounterfactualEntity]) -> Vec<Feature> {
    entities.iter().map(CounterfactualEntity::as_feature).collect()
}

/// Merges entity features into the original input.
///
/// The result preserves the original feature order and names exactly: a slot
/// whose name matches an entity feature takes the entity's value, every other
/// slot keeps the original value. An entity feature that matches no original
/// slot breaks the strict-inverse contract and is rejected.
pub fn unflatten_features(
    entity_features: &[Feature],
    original_features: &[Feature],
) -> Result<Vec<Feature>, ExplainError> {
    let mut by_name: HashMap<&str, &Feature> = entity_features
        .iter()
        .map(|f| (f.name.as_str(), f))
        .collect();

    let rebuilt = original_features
        .iter()
        .map(|original| match by_name.remove(original.name.as_str()) {
            Some(replacement) => replacement.clone(),
            None => original.clone(),
        })
        .collect();

    if let Some(name) = by_name.into_keys().next() {
        return Err(ExplainError::invalid_input(format!(
            "entity feature '{name}' does not match any original feature"
        )));
    }
    Ok(rebuilt)
}
