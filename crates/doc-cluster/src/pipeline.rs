// crates/doc-cluster/src/pipeline.rs

use anyhow::Context;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::chart::{build_chart_data, ChartData};
use crate::clustering::{ClusterCountEstimator, ClusterCountReport, Clustering, ClusteringEngine};
use crate::config::Config;
use crate::corpus::Corpus;
use crate::error::{ClusterError, Result};
use crate::features::{english_stop_words, FeatureMatrix, TfidfVectorizer};
use crate::output::OutputWriter;
use crate::results::{ClusteringReport, Diagnostic, ResultAggregator};
use crate::text::{EntityExtractor, LanguageResources, RuleBasedEntityExtractor, TextNormalizer};
use crate::thread_pool::{DocumentProcessor, ThreadPoolConfig};

/// Everything computed for one corpus.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub report: ClusteringReport,
    pub features: FeatureMatrix,
    pub metrics: ClusterCountReport,
    pub chart: Option<ChartData>,
}

/// Result of a full run: computed output plus the files written for it.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: PipelineOutput,
    pub written: Vec<PathBuf>,
}

pub struct ClusteringPipeline {
    config: Config,
    resources: Arc<LanguageResources>,
    /// Fixed English list re-applied by the vectorizer whatever the language.
    vectorizer_stopwords: HashSet<String>,
    extractor: Arc<dyn EntityExtractor>,
    coclusterer: Option<Arc<dyn Clustering>>,
}

impl ClusteringPipeline {
    pub fn new(config: Config) -> Self {
        let resources = Arc::new(LanguageResources::load(&config.language));
        Self::with_resources(config, resources)
    }

    pub fn with_resources(config: Config, resources: Arc<LanguageResources>) -> Self {
        Self {
            config,
            resources,
            vectorizer_stopwords: english_stop_words(),
            extractor: Arc::new(RuleBasedEntityExtractor::new()),
            coclusterer: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn EntityExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_coclusterer(mut self, coclusterer: Arc<dyn Clustering>) -> Self {
        self.coclusterer = Some(coclusterer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the dataset directory, cluster it and write every result file.
    ///
    /// Nothing is written unless clustering succeeded.
    pub fn run(&self) -> anyhow::Result<RunSummary> {
        let corpus = Corpus::load_dir(&self.config.dataset_dir, &self.config.file_extensions)?;
        let output = self.run_corpus(&corpus)?;

        let written = OutputWriter::new(&self.config.output_dir)
            .write_all(&output.report, &output.features, &output.metrics, output.chart.as_ref())
            .context("Failed to write clustering results")?;

        Ok(RunSummary { output, written })
    }

    /// Cluster an in-memory corpus.
    pub fn run_corpus(&self, corpus: &Corpus) -> Result<PipelineOutput> {
        let started = Instant::now();
        info!("Clustering {} documents", corpus.len());

        let processor = DocumentProcessor::new(
            ThreadPoolConfig::new(self.config.workers),
            TextNormalizer::new(self.resources.clone()),
            self.extractor.clone(),
        );
        let documents = processor.process(corpus);

        let mut diagnostics: Vec<Diagnostic> = documents
            .iter()
            .filter_map(|doc| {
                doc.entity_error.as_ref().map(|reason| {
                    Diagnostic::new("entities", format!("{}: {}", doc.filename, reason))
                })
            })
            .collect();

        let normalized: Vec<String> = documents.iter().map(|d| d.normalized.clone()).collect();
        let features = TfidfVectorizer::new(self.config.tfidf_config(), self.vectorizer_stopwords.clone())
            .fit_transform(&normalized)?;

        let metrics = ClusterCountEstimator::new(self.config.max_clusters, self.config.kmeans_config())
            .estimate(features.matrix())?;
        diagnostics.extend(metrics.diagnostics.iter().cloned());
        let k = metrics.optimal_k;
        if k > features.n_documents() {
            return Err(ClusterError::DegenerateCorpus(format!(
                "{} documents cannot form {} clusters",
                features.n_documents(),
                k
            )));
        }

        let mut engine = ClusteringEngine::new(self.config.kmeans_config());
        if let Some(coclusterer) = &self.coclusterer {
            engine = engine.with_coclusterer(coclusterer.clone());
        }
        let clusters = engine.run(features.matrix(), k)?;

        let mut report = ResultAggregator::new(self.config.top_terms).aggregate(
            &documents,
            features.vocabulary(),
            k,
            clusters,
            diagnostics,
        );

        let chart = match build_chart_data(&features, &report, &metrics, self.config.top_features) {
            Ok(chart) => Some(chart),
            Err(e) => {
                warn!("Skipping chart data: {}", e);
                report.diagnostics.push(Diagnostic::new("chart", e.to_string()));
                None
            }
        };

        for profile in &report.profiles {
            info!("Cluster {}: {}", profile.cluster, profile.term_names().join(", "));
        }
        info!(
            "Clustering finished in {:.2?} with {} diagnostics",
            started.elapsed(),
            report.diagnostics.len()
        );

        Ok(PipelineOutput {
            report,
            features,
            metrics,
            chart,
        })
    }
}
