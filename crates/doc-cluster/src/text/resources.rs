//! Language resources shared by the normalizer and the feature extractor.
//!
//! Loaded once at startup and handed around behind an `Arc`; nothing in here is
//! mutated after construction.

use std::collections::{HashMap, HashSet};
use stop_words::{get, LANGUAGE};
use tracing::{debug, warn};

/// Stopword set plus lemma dictionary for one language.
#[derive(Debug, Clone)]
pub struct LanguageResources {
    language: String,
    stopwords: HashSet<String>,
    lemmatizer: Lemmatizer,
}

impl LanguageResources {
    /// Load resources for a language code or name (`en`, `english`, `de`, ...).
    ///
    /// Unknown languages fall back to English. Lemmatization rules only exist
    /// for English; other languages get an identity lemmatizer.
    ///
    /// Locale-style values such as `en_US.UTF-8` or `de-AT` are reduced to
    /// their leading language code.
    pub fn load(language: &str) -> Self {
        let (lang, code) = match language_code(language).as_str() {
            "en" | "english" => (LANGUAGE::English, "en"),
            "de" | "german" => (LANGUAGE::German, "de"),
            "fr" | "french" => (LANGUAGE::French, "fr"),
            "es" | "spanish" => (LANGUAGE::Spanish, "es"),
            "it" | "italian" => (LANGUAGE::Italian, "it"),
            "pt" | "portuguese" => (LANGUAGE::Portuguese, "pt"),
            "nl" | "dutch" => (LANGUAGE::Dutch, "nl"),
            "ru" | "russian" => (LANGUAGE::Russian, "ru"),
            "sv" | "swedish" => (LANGUAGE::Swedish, "sv"),
            other => {
                warn!("No stopword list for language '{}', using English", other);
                (LANGUAGE::English, "en")
            }
        };

        let stopwords: HashSet<String> = get(lang).iter().map(|s| s.to_string()).collect();
        let lemmatizer = if code == "en" {
            Lemmatizer::english()
        } else {
            Lemmatizer::identity()
        };

        debug!("Loaded {} stopwords for '{}'", stopwords.len(), code);

        Self {
            language: code.to_string(),
            stopwords,
            lemmatizer,
        }
    }

    pub fn english() -> Self {
        Self::load("en")
    }

    /// Build resources from an explicit word list (mostly for tests).
    pub fn from_stopwords(words: &[&str]) -> Self {
        Self {
            language: "custom".to_string(),
            stopwords: words.iter().map(|w| w.to_lowercase()).collect(),
            lemmatizer: Lemmatizer::english(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    pub fn stopwords(&self) -> &HashSet<String> {
        &self.stopwords
    }

    pub fn lemmatize(&self, token: &str) -> String {
        self.lemmatizer.lemmatize(token)
    }
}

fn language_code(language: &str) -> String {
    language
        .trim()
        .split(|c: char| matches!(c, '_' | '-' | '.' | ':' | '@'))
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Dictionary-plus-rules lemmatizer.
///
/// Irregular forms are looked up first. Regular inflections are only stripped
/// when the remaining stem looks like a plausible word, otherwise the token is
/// returned unchanged.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    irregular: HashMap<&'static str, &'static str>,
    invariant: HashSet<&'static str>,
    enabled: bool,
}

const IRREGULAR_FORMS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("data", "datum"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
    ("theses", "thesis"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("leaves", "leaf"),
    ("wives", "wife"),
    ("knives", "knife"),
    ("lives", "life"),
    ("ran", "run"),
    ("ate", "eat"),
    ("wrote", "write"),
    ("written", "write"),
    ("taken", "take"),
    ("took", "take"),
    ("gave", "give"),
    ("given", "give"),
    ("bought", "buy"),
    ("thought", "think"),
    ("made", "make"),
    ("said", "say"),
    ("began", "begin"),
    ("begun", "begin"),
    ("saw", "see"),
    ("seen", "see"),
    ("came", "come"),
    ("got", "get"),
    ("knew", "know"),
    ("known", "know"),
    ("told", "tell"),
    ("found", "find"),
    ("went", "go"),
    ("gone", "go"),
    ("sold", "sell"),
    ("paid", "pay"),
];

const INVARIANT_FORMS: &[&str] = &[
    "news", "series", "species", "physics", "economics", "mathematics", "politics", "lens",
    "gas", "bus", "always", "perhaps", "thus", "during", "nothing", "something", "anything",
    "everything", "morning", "evening", "ceiling", "building", "thing", "king", "ring",
    "spring", "string", "wing", "bring", "sing", "swing", "sting", "cling", "fling", "sling",
    "red", "bed", "need", "seed", "feed", "speed", "breed", "weed", "shed", "led", "fed",
    "hundred", "sacred", "naked", "wicked", "indeed", "bias", "atlas", "canvas", "alias",
];

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];

impl Lemmatizer {
    pub fn english() -> Self {
        Self {
            irregular: IRREGULAR_FORMS.iter().copied().collect(),
            invariant: INVARIANT_FORMS.iter().copied().collect(),
            enabled: true,
        }
    }

    pub fn identity() -> Self {
        Self {
            irregular: HashMap::new(),
            invariant: HashSet::new(),
            enabled: false,
        }
    }

    pub fn lemmatize(&self, token: &str) -> String {
        if !self.enabled || !token.chars().all(|c| c.is_ascii_lowercase()) {
            return token.to_string();
        }
        if let Some(lemma) = self.irregular.get(token) {
            return (*lemma).to_string();
        }
        if self.invariant.contains(token) || token.len() <= 3 {
            return token.to_string();
        }

        if let Some(stem) = token.strip_suffix("ing") {
            return Self::repair_verb_stem(stem).unwrap_or_else(|| token.to_string());
        }
        if let Some(stem) = token.strip_suffix("ied") {
            if stem.len() >= 2 {
                return format!("{}y", stem);
            }
        }
        if let Some(stem) = token.strip_suffix("ed") {
            return Self::repair_verb_stem(stem).unwrap_or_else(|| token.to_string());
        }
        Self::singularize(token)
    }

    fn singularize(token: &str) -> String {
        if let Some(stem) = token.strip_suffix("ies") {
            if stem.len() >= 2 {
                return format!("{}y", stem);
            }
        }
        if token.ends_with("sses") {
            return token[..token.len() - 2].to_string();
        }
        for suffix in ["xes", "ches", "shes", "zes"] {
            if token.ends_with(suffix) {
                return token[..token.len() - 2].to_string();
            }
        }
        if token.ends_with('s')
            && !token.ends_with("ss")
            && !token.ends_with("us")
            && !token.ends_with("is")
            && !token.ends_with("ics")
        {
            return token[..token.len() - 1].to_string();
        }
        token.to_string()
    }

    /// Undo `-ing`/`-ed` on a stem, or `None` when the result would be a guess.
    fn repair_verb_stem(stem: &str) -> Option<String> {
        let chars: Vec<char> = stem.chars().collect();
        let n = chars.len();
        if n < 3 {
            return None;
        }
        let is_vowel = |c: char| VOWELS.contains(&c);
        let (last, prev) = (chars[n - 1], chars[n - 2]);

        // running -> run, stopped -> stop
        if last == prev && !is_vowel(last) && !matches!(last, 'l' | 's' | 'z') {
            return Some(chars[..n - 1].iter().collect());
        }
        // making -> make, baked -> bake
        if n == 3 && !is_vowel(chars[0]) && is_vowel(prev) && !is_vowel(last) && !matches!(last, 'w' | 'x' | 'y') {
            return Some(format!("{}e", stem));
        }
        // danced -> dance, produced -> produce
        if last == 'c' {
            return Some(format!("{}e", stem));
        }
        // chased -> chase, caused -> cause, focused -> focus
        if last == 's' && is_vowel(prev) {
            if prev == 'u' && !is_vowel(chars[n - 3]) {
                return Some(stem.to_string());
            }
            return Some(format!("{}e", stem));
        }
        // working -> work, eating -> eat, reading -> read
        if !is_vowel(last) && (!is_vowel(prev) || (n >= 3 && is_vowel(chars[n - 3]))) {
            return Some(stem.to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_stopwords_loaded() {
        let resources = LanguageResources::english();
        assert_eq!(resources.language(), "en");
        assert!(resources.is_stopword("the"));
        assert!(resources.is_stopword("and"));
        assert!(!resources.is_stopword("giraffe"));
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        let resources = LanguageResources::load("klingon");
        assert_eq!(resources.language(), "en");
        assert!(resources.is_stopword("the"));
    }

    #[test]
    fn test_locale_values_use_language_code() {
        assert_eq!(LanguageResources::load("en_US:en").language(), "en");
        assert_eq!(LanguageResources::load("de_DE.UTF-8").language(), "de");
        assert_eq!(LanguageResources::load("FR").language(), "fr");
        assert_eq!(language_code(" pt-BR "), "pt");
    }

    #[test]
    fn test_english_list_keeps_content_words() {
        let resources = LanguageResources::english();
        for word in ["run", "information", "research", "world", "home", "work", "value"] {
            assert!(!resources.is_stopword(word), "{} should not be a stopword", word);
        }
    }

    #[test]
    fn test_verb_forms() {
        let lemmatizer = Lemmatizer::english();
        assert_eq!(lemmatizer.lemmatize("running"), "run");
        assert_eq!(lemmatizer.lemmatize("stopped"), "stop");
        assert_eq!(lemmatizer.lemmatize("making"), "make");
        assert_eq!(lemmatizer.lemmatize("working"), "work");
        assert_eq!(lemmatizer.lemmatize("studied"), "study");
        assert_eq!(lemmatizer.lemmatize("went"), "go");
    }

    #[test]
    fn test_silent_e_restored() {
        let lemmatizer = Lemmatizer::english();
        assert_eq!(lemmatizer.lemmatize("chased"), "chase");
        assert_eq!(lemmatizer.lemmatize("chasing"), "chase");
        assert_eq!(lemmatizer.lemmatize("danced"), "dance");
        assert_eq!(lemmatizer.lemmatize("produced"), "produce");
        assert_eq!(lemmatizer.lemmatize("increased"), "increase");
        assert_eq!(lemmatizer.lemmatize("caused"), "cause");
        assert_eq!(lemmatizer.lemmatize("focused"), "focus");
        assert_eq!(lemmatizer.lemmatize("focusing"), "focus");
        assert_eq!(lemmatizer.lemmatize("passed"), "pass");
    }

    #[test]
    fn test_noun_forms() {
        let lemmatizer = Lemmatizer::english();
        assert_eq!(lemmatizer.lemmatize("cats"), "cat");
        assert_eq!(lemmatizer.lemmatize("stories"), "story");
        assert_eq!(lemmatizer.lemmatize("boxes"), "box");
        assert_eq!(lemmatizer.lemmatize("classes"), "class");
        assert_eq!(lemmatizer.lemmatize("children"), "child");
    }

    #[test]
    fn test_words_left_alone() {
        let lemmatizer = Lemmatizer::english();
        assert_eq!(lemmatizer.lemmatize("glass"), "glass");
        assert_eq!(lemmatizer.lemmatize("status"), "status");
        assert_eq!(lemmatizer.lemmatize("economics"), "economics");
        assert_eq!(lemmatizer.lemmatize("building"), "building");
        assert_eq!(lemmatizer.lemmatize("dog"), "dog");
        assert_eq!(lemmatizer.lemmatize("café"), "café");
    }

    #[test]
    fn test_identity_lemmatizer() {
        let lemmatizer = Lemmatizer::identity();
        assert_eq!(lemmatizer.lemmatize("running"), "running");
    }
}
