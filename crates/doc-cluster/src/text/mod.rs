//! Text processing: language resources, normalization and entity extraction

pub mod entities;
pub mod normalizer;
pub mod resources;

pub use entities::{
    EntityAnnotation, EntityExtractor, NullEntityExtractor, RuleBasedEntityExtractor,
    ENTITY_CATEGORIES,
};
pub use normalizer::TextNormalizer;
pub use resources::{LanguageResources, Lemmatizer};
