//! Smoothed TF-IDF document-term matrix

use lazy_static::lazy_static;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

use crate::error::{ClusterError, Result};

lazy_static! {
    static ref TOKEN_REGEX: Regex = Regex::new(r"(?u)\b\w\w+\b").unwrap();
}

#[derive(Debug, Clone)]
pub struct TfidfConfig {
    /// Upper document-frequency bound. Values in `(0, 1]` are a fraction of
    /// the corpus, larger whole numbers an absolute document count.
    pub max_df: f64,
    /// Terms in fewer documents than this are dropped.
    pub min_df: usize,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            max_df: 0.8,
            min_df: 1,
        }
    }
}

impl TfidfConfig {
    fn max_doc_count(&self, n_documents: usize) -> f64 {
        if self.max_df <= 1.0 {
            self.max_df * n_documents as f64
        } else {
            self.max_df
        }
    }
}

/// Document-term weight matrix with its vocabulary.
///
/// Row `i` belongs to document ordinal `i`; column `j` to `vocabulary[j]`.
/// Read-only once built.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    matrix: Array2<f64>,
    vocabulary: Vec<String>,
    idf: Vec<f64>,
}

impl FeatureMatrix {
    /// Wrap an existing matrix. Column count must match the vocabulary.
    pub fn new(matrix: Array2<f64>, vocabulary: Vec<String>, idf: Vec<f64>) -> Result<Self> {
        if matrix.ncols() != vocabulary.len() || idf.len() != vocabulary.len() {
            return Err(ClusterError::DegenerateCorpus(format!(
                "matrix has {} columns but vocabulary has {} terms",
                matrix.ncols(),
                vocabulary.len()
            )));
        }
        Ok(Self { matrix, vocabulary, idf })
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn n_documents(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_terms(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.matrix.row(i)
    }

    /// Total weight of each term across all documents.
    pub fn column_sums(&self) -> Array1<f64> {
        self.matrix.sum_axis(Axis(0))
    }

    pub fn to_nested_vec(&self) -> Vec<Vec<f64>> {
        self.matrix.outer_iter().map(|row| row.to_vec()).collect()
    }
}

/// Builds a [`FeatureMatrix`] from normalized documents.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    config: TfidfConfig,
    stop_words: HashSet<String>,
}

impl TfidfVectorizer {
    pub fn new(config: TfidfConfig, stop_words: HashSet<String>) -> Self {
        Self { config, stop_words }
    }

    fn tokenize<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        TOKEN_REGEX
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(move |token| !self.stop_words.contains(*token))
    }

    pub fn fit_transform(&self, documents: &[String]) -> Result<FeatureMatrix> {
        let n = documents.len();
        if n < 2 {
            return Err(ClusterError::DegenerateCorpus(format!(
                "need at least 2 documents, got {}",
                n
            )));
        }

        let counts: Vec<HashMap<&str, usize>> = documents
            .iter()
            .map(|doc| {
                let mut tf = HashMap::new();
                for token in self.tokenize(doc) {
                    *tf.entry(token).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for tf in &counts {
            for term in tf.keys() {
                *document_frequency.entry(*term).or_insert(0) += 1;
            }
        }
        let candidate_terms = document_frequency.len();

        let max_count = self.config.max_doc_count(n);
        let vocabulary: Vec<&str> = document_frequency
            .iter()
            .filter(|(_, &df)| df as f64 <= max_count && df >= self.config.min_df)
            .map(|(term, _)| *term)
            .collect();

        debug!(
            "Vocabulary pruning: {} candidate terms, {} kept (max_df {}, min_df {})",
            candidate_terms,
            vocabulary.len(),
            self.config.max_df,
            self.config.min_df
        );

        if vocabulary.is_empty() {
            return Err(ClusterError::DegenerateCorpus(
                "no terms remain after document-frequency and stopword filtering".to_string(),
            ));
        }

        let column: HashMap<&str, usize> = vocabulary.iter().enumerate().map(|(j, t)| (*t, j)).collect();
        let idf: Vec<f64> = vocabulary
            .iter()
            .map(|term| {
                let df = document_frequency[term] as f64;
                ((1.0 + n as f64) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let mut matrix = Array2::<f64>::zeros((n, vocabulary.len()));
        for (i, tf) in counts.iter().enumerate() {
            for (term, &count) in tf {
                if let Some(&j) = column.get(term) {
                    matrix[[i, j]] = count as f64 * idf[j];
                }
            }
        }

        for mut row in matrix.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|w| w / norm);
            }
        }

        info!("TF-IDF matrix shape: ({}, {})", n, vocabulary.len());

        FeatureMatrix::new(
            matrix,
            vocabulary.into_iter().map(String::from).collect(),
            idf,
        )
    }
}
