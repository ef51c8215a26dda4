//! Shared utilities.

pub mod composite;

pub use composite::{flatten_entities, unflatten_features};
