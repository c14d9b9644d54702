//! Text understanding pipeline: normalization, tokenization, entity
//! extraction and intent classification.
//!
//! Everything here is pure and deterministic. The classifier is a three-tier
//! cascade (action-verb patterns, an ordered rule table, a TF-IDF similarity
//! fallback); the extractor is a pattern-table scan with a dedicated
//! clock-time pass.

pub mod classifier;
pub mod entity;
pub mod intent;
pub mod normalize;
pub mod rules;
pub mod similarity;
pub mod tokenize;

pub use classifier::IntentClassifier;
pub use entity::{Entity, EntityExtractor, EntityType};
pub use intent::Intent;
pub use normalize::normalize;
pub use rules::{RulePattern, RuleTable};
pub use similarity::SimilarityModel;
pub use tokenize::tokenize;
