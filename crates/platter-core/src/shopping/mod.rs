//! Shopping list derivation: name normalization and cross-meal aggregation.

pub mod aggregate;
pub mod normalize;

pub use aggregate::{AggregateOptions, aggregate_with, categorize, shopping_list};
pub use normalize::{llm_canonicalize, rule_normalize};
