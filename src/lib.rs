//! Convert raw map elements into normalized, typed features.
//!
//! Every element arrives as an unordered bag of free-text tags. This crate
//! turns such a bag into the compact representation every downstream consumer
//! (search, rendering, routing) works with: packed type codes from a
//! hierarchical classification tree, a per-language name mapping and
//! structured address fields.

pub mod classificator;
pub mod element;
pub mod features;
pub mod threading;

pub use classificator::draw::{DrawRules, DrawingRules};
pub use classificator::{ClassifError, ClassifTree};
pub use element::{Element, ElementKind, Tag};
pub use features::metadata::{MetadataCollector, NoMetadata};
pub use features::params::FeatureParams;
pub use features::Classifier;
