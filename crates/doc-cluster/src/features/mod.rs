//! Feature extraction from normalized documents

pub mod stop_words;
pub mod tfidf;

pub use stop_words::{english_stop_words, ENGLISH_STOP_WORDS};
pub use tfidf::{FeatureMatrix, TfidfConfig, TfidfVectorizer};
