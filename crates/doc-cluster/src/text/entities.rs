//! Named-entity extraction collaborator.
//!
//! The clustering core treats annotations as opaque; it only carries them from
//! the document processor to the persisted output.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Entity categories reported for every document, even when empty.
pub const ENTITY_CATEGORIES: [&str; 5] = ["PERSON", "ORGANIZATION", "LOCATION", "GPE", "FACILITY"];

lazy_static! {
    static ref CAPITALIZED_SPAN: Regex =
        Regex::new(r"\b[A-Z][A-Za-z&'\-]*(?:[ \t]+[A-Z][A-Za-z&'\-]*)*").unwrap();
    static ref TITLE_BEFORE: Regex =
        Regex::new(r"(?:Mr|Mrs|Ms|Dr|Prof|Sir|President|Senator|Minister|Judge)\.?\s*$").unwrap();
}

const TITLES: &[&str] = &["Mr", "Mrs", "Ms", "Dr", "Prof", "Sir"];

const ORGANIZATION_SUFFIXES: &[&str] = &[
    "Inc", "Corp", "Corporation", "Ltd", "LLC", "Company", "Co", "University", "Institute",
    "Bank", "Agency", "Association", "Group", "Foundation", "Committee", "Council", "Party",
];

const FACILITY_SUFFIXES: &[&str] = &[
    "Airport", "Station", "Bridge", "Stadium", "Hospital", "Tower", "Center", "Centre",
    "Museum", "Hall", "Building", "Library", "Port",
];

const LOCATION_SUFFIXES: &[&str] = &[
    "River", "Mountain", "Mountains", "Lake", "Ocean", "Sea", "Valley", "Island", "Islands",
    "Desert", "Forest", "Bay", "Park", "Street", "Road", "Avenue",
];

const GEOPOLITICAL_NAMES: &[&str] = &[
    "America", "United States", "Canada", "Mexico", "Brazil", "Argentina", "United Kingdom",
    "Britain", "England", "France", "Germany", "Spain", "Italy", "Russia", "China", "Japan",
    "India", "Australia", "Egypt", "Nigeria", "Kenya", "South Africa", "Europe", "Asia",
    "Africa", "London", "Paris", "Berlin", "Madrid", "Rome", "Moscow", "Beijing", "Tokyo",
    "Delhi", "New York", "Washington", "California", "Texas", "Chicago", "Sydney", "Toronto",
];

/// Per-document mapping from entity category to extracted surface strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityAnnotation(BTreeMap<String, Vec<String>>);

impl Default for EntityAnnotation {
    fn default() -> Self {
        Self::empty()
    }
}

impl EntityAnnotation {
    /// Annotation with every category present and no entities.
    pub fn empty() -> Self {
        Self(
            ENTITY_CATEGORIES
                .iter()
                .map(|c| (c.to_string(), Vec::new()))
                .collect(),
        )
    }

    pub fn push(&mut self, category: &str, entity: impl Into<String>) {
        self.0.entry(category.to_string()).or_default().push(entity.into());
    }

    pub fn get(&self, category: &str) -> &[String] {
        self.0.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// External entity extraction seam.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> anyhow::Result<EntityAnnotation>;

    fn name(&self) -> &str;
}

/// Extractor that reports nothing; used when extraction is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEntityExtractor;

impl EntityExtractor for NullEntityExtractor {
    fn extract(&self, _text: &str) -> anyhow::Result<EntityAnnotation> {
        Ok(EntityAnnotation::empty())
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Rule-based tagger over runs of capitalized words.
///
/// Spans are classified by trailing keyword (`... University`, `... Airport`),
/// a small gazetteer of places, or a preceding title for people. Unclassified
/// multi-word spans are treated as person names; single unclassified words are
/// skipped since they are mostly sentence starts.
#[derive(Debug, Clone)]
pub struct RuleBasedEntityExtractor {
    geopolitical: HashSet<&'static str>,
}

impl Default for RuleBasedEntityExtractor {
    fn default() -> Self {
        Self {
            geopolitical: GEOPOLITICAL_NAMES.iter().copied().collect(),
        }
    }
}

impl RuleBasedEntityExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn classify(&self, span: &str, preceding: &str) -> Option<&'static str> {
        let words: Vec<&str> = span.split_whitespace().collect();
        let last = words.last()?.trim_end_matches('.');

        if TITLES.contains(&last) {
            return None;
        }
        if TITLE_BEFORE.is_match(preceding) {
            return Some("PERSON");
        }
        if self.geopolitical.contains(span) {
            return Some("GPE");
        }
        if ORGANIZATION_SUFFIXES.contains(&last) {
            return Some("ORGANIZATION");
        }
        if FACILITY_SUFFIXES.contains(&last) && words.len() > 1 {
            return Some("FACILITY");
        }
        if LOCATION_SUFFIXES.contains(&last) && words.len() > 1 {
            return Some("LOCATION");
        }
        if words.len() == 1 && last.len() >= 2 && last.chars().all(|c| c.is_ascii_uppercase()) {
            return Some("ORGANIZATION");
        }
        if (2..=3).contains(&words.len()) {
            return Some("PERSON");
        }
        None
    }
}

impl EntityExtractor for RuleBasedEntityExtractor {
    fn extract(&self, text: &str) -> anyhow::Result<EntityAnnotation> {
        let mut annotation = EntityAnnotation::empty();

        for found in CAPITALIZED_SPAN.find_iter(text) {
            let span = found.as_str().trim();
            let preceding = &text[..found.start()];
            let tail_start = preceding
                .char_indices()
                .rev()
                .nth(15)
                .map(|(i, _)| i)
                .unwrap_or(0);

            if let Some(category) = self.classify(span, &preceding[tail_start..]) {
                if !annotation.get(category).iter().any(|e| e == span) {
                    annotation.push(category, span);
                }
            }
        }

        Ok(annotation)
    }

    fn name(&self) -> &str {
        "rule-based"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_annotation_has_all_categories() {
        let annotation = EntityAnnotation::empty();
        assert!(annotation.is_empty());
        for category in ENTITY_CATEGORIES {
            assert!(annotation.get(category).is_empty());
        }
        let json = serde_json::to_value(&annotation).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_rule_based_categories() {
        let extractor = RuleBasedEntityExtractor::new();
        let text = "Yesterday Dr. Jane Smith flew from London to Heathrow Airport \
                    before meeting Acme Corp near the Thames River.";
        let annotation = extractor.extract(text).unwrap();

        assert_eq!(annotation.get("PERSON"), &["Jane Smith".to_string()]);
        assert_eq!(annotation.get("GPE"), &["London".to_string()]);
        assert_eq!(annotation.get("FACILITY"), &["Heathrow Airport".to_string()]);
        assert_eq!(annotation.get("ORGANIZATION"), &["Acme Corp".to_string()]);
        assert_eq!(annotation.get("LOCATION"), &["Thames River".to_string()]);
    }

    #[test]
    fn test_duplicates_collapsed() {
        let extractor = RuleBasedEntityExtractor::new();
        let annotation = extractor.extract("Paris is big. Paris is old.").unwrap();
        assert_eq!(annotation.get("GPE").len(), 1);
    }

    #[test]
    fn test_null_extractor() {
        let annotation = NullEntityExtractor.extract("Jane Smith").unwrap();
        assert!(annotation.is_empty());
    }
}
