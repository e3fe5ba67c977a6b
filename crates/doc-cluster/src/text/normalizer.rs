//! Text normalization ahead of feature extraction

use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

use super::resources::LanguageResources;

lazy_static! {
    static ref PUNCTUATION_REGEX: Regex = Regex::new(r"[\p{P}\p{S}]").unwrap();
}

/// Lowercases, splits on punctuation, drops stopwords and lemmatizes.
///
/// The normalizer never fails: characters that are neither word characters nor
/// punctuation are simply dropped by the tokenizer.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    resources: Arc<LanguageResources>,
}

impl TextNormalizer {
    pub fn new(resources: Arc<LanguageResources>) -> Self {
        Self { resources }
    }

    pub fn resources(&self) -> &Arc<LanguageResources> {
        &self.resources
    }

    /// Normalize raw text into space-separated lemmas.
    pub fn normalize(&self, text: &str) -> String {
        self.tokens(text).join(" ")
    }

    /// Same as [`normalize`](Self::normalize) but keeps the tokens apart.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        // Punctuation becomes a boundary so "cat,dog" stays two words.
        let spaced = PUNCTUATION_REGEX.replace_all(&lowered, " ");

        spaced
            .unicode_words()
            .filter(|token| !self.resources.is_stopword(token))
            .map(|token| self.resources.lemmatize(token))
            .filter(|lemma| !lemma.is_empty() && !self.resources.is_stopword(lemma))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const STOPWORDS: &[&str] = &["the", "and", "of", "to", "a", "in", "were", "is"];

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(Arc::new(LanguageResources::from_stopwords(STOPWORDS)))
    }

    #[test]
    fn test_basic_normalization() {
        let out = normalizer().normalize("The Dogs were RUNNING in the park!");
        assert_eq!(out, "dog run park");
    }

    #[test]
    fn test_punctuation_splits_words() {
        let out = normalizer().normalize("cat,dog;pet/market");
        assert_eq!(out, "cat dog pet market");
    }

    #[test]
    fn test_all_stopwords_yields_empty() {
        assert_eq!(normalizer().normalize("the and of to a"), "");
        assert_eq!(normalizer().normalize(""), "");
        assert_eq!(normalizer().normalize("!!! ... ???"), "");
    }

    #[test]
    fn test_control_characters_are_dropped() {
        let out = normalizer().normalize("stock\u{0}\u{7}market\u{FFFD}");
        assert_eq!(out, "stock market");
    }

    #[test]
    fn test_custom_stopwords() {
        let normalizer = TextNormalizer::new(Arc::new(LanguageResources::from_stopwords(&["stock"])));
        assert_eq!(normalizer.normalize("stock market"), "market");
    }

    #[test]
    fn test_english_list_keeps_content_words() {
        let n = TextNormalizer::new(Arc::new(LanguageResources::english()));
        assert_eq!(n.normalize("The dogs were running in the park"), "dog run park");

        let out = n.normalize("Information systems research at home and work around the world");
        for word in ["information", "system", "research", "home", "work", "world"] {
            assert!(out.split(' ').any(|t| t == word), "{} missing from {:?}", word, out);
        }
    }

    proptest! {
        #[test]
        fn prop_normalization_is_deterministic(text in "\\PC{0,200}") {
            let n = normalizer();
            prop_assert_eq!(n.normalize(&text), n.normalize(&text));
        }

        #[test]
        fn prop_output_has_no_punctuation_or_stopwords(text in "[a-zA-Z ,.;:!?'\"()-]{0,200}") {
            let n = TextNormalizer::new(Arc::new(LanguageResources::english()));
            let out = n.normalize(&text);
            prop_assert!(!PUNCTUATION_REGEX.is_match(&out));
            for token in out.split(' ').filter(|t| !t.is_empty()) {
                prop_assert!(!n.resources().is_stopword(token));
            }
        }
    }
}
