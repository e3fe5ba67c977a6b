//! Fixed-size worker pool for per-document processing.
//!
//! Workers pull documents off a shared queue, normalize them and run entity
//! extraction. Results are keyed by ordinal so the output order never depends
//! on which worker finished first.

use crossbeam_queue::SegQueue;
use dashmap::DashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use crate::corpus::{Corpus, Document};
use crate::text::{EntityAnnotation, EntityExtractor, TextNormalizer};

#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    pub workers: usize,
}

impl ThreadPoolConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

/// Output of processing one document.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub ordinal: usize,
    pub filename: String,
    pub normalized: String,
    pub entities: EntityAnnotation,
    /// Set when entity extraction failed and `entities` is the empty fallback.
    pub entity_error: Option<String>,
}

/// Lock-free counters updated by the workers.
#[derive(Debug, Default)]
pub struct ProcessingCounters {
    pub processed: AtomicUsize,
    pub entity_failures: AtomicUsize,
}

impl ProcessingCounters {
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn entity_failures(&self) -> usize {
        self.entity_failures.load(Ordering::Relaxed)
    }
}

pub struct DocumentProcessor {
    config: ThreadPoolConfig,
    normalizer: TextNormalizer,
    extractor: Arc<dyn EntityExtractor>,
    counters: ProcessingCounters,
}

impl DocumentProcessor {
    pub fn new(
        config: ThreadPoolConfig,
        normalizer: TextNormalizer,
        extractor: Arc<dyn EntityExtractor>,
    ) -> Self {
        Self {
            config,
            normalizer,
            extractor,
            counters: ProcessingCounters::default(),
        }
    }

    pub fn counters(&self) -> &ProcessingCounters {
        &self.counters
    }

    /// Process every document and return the results in corpus order.
    pub fn process(&self, corpus: &Corpus) -> Vec<ProcessedDocument> {
        let documents = corpus.documents();
        let workers = self.config.workers.min(documents.len());

        let results = if workers <= 1 {
            debug!("Processing {} documents sequentially", documents.len());
            documents.iter().map(|doc| self.process_one(doc)).collect()
        } else {
            self.process_parallel(documents, workers)
        };

        info!(
            "Processed {} documents ({} entity extraction failures)",
            self.counters.processed(),
            self.counters.entity_failures()
        );
        results
    }

    fn process_parallel(&self, documents: &[Document], workers: usize) -> Vec<ProcessedDocument> {
        info!("Starting document pool with {} workers", workers);

        let queue: SegQueue<&Document> = SegQueue::new();
        for doc in documents {
            queue.push(doc);
        }
        let results: DashMap<usize, ProcessedDocument> = DashMap::with_capacity(documents.len());

        thread::scope(|scope| {
            for i in 0..workers {
                let spawned = thread::Builder::new()
                    .name(format!("doc-worker-{}", i))
                    .spawn_scoped(scope, || {
                        while let Some(doc) = queue.pop() {
                            results.insert(doc.ordinal, self.process_one(doc));
                        }
                    });
                if let Err(e) = spawned {
                    warn!("Failed to spawn document worker {}: {}", i, e);
                }
            }

            // The caller helps drain the queue, which also covers failed spawns.
            while let Some(doc) = queue.pop() {
                results.insert(doc.ordinal, self.process_one(doc));
            }
        });

        documents
            .iter()
            .map(|doc| match results.remove(&doc.ordinal) {
                Some((_, processed)) => processed,
                None => self.process_one(doc),
            })
            .collect()
    }

    fn process_one(&self, doc: &Document) -> ProcessedDocument {
        let normalized = self.normalizer.normalize(&doc.text);

        let extraction = panic::catch_unwind(AssertUnwindSafe(|| self.extractor.extract(&doc.text)));
        let (entities, entity_error) = match extraction {
            Ok(Ok(entities)) => (entities, None),
            Ok(Err(e)) => (EntityAnnotation::empty(), Some(e.to_string())),
            Err(_) => (
                EntityAnnotation::empty(),
                Some(format!("{} extractor panicked", self.extractor.name())),
            ),
        };

        if let Some(reason) = &entity_error {
            warn!("Error extracting named entities from {}: {}", doc.filename, reason);
            self.counters.entity_failures.fetch_add(1, Ordering::Relaxed);
        }
        self.counters.processed.fetch_add(1, Ordering::Relaxed);

        ProcessedDocument {
            ordinal: doc.ordinal,
            filename: doc.filename.clone(),
            normalized,
            entities,
            entity_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{LanguageResources, NullEntityExtractor};

    struct FlakyExtractor;

    impl EntityExtractor for FlakyExtractor {
        fn extract(&self, text: &str) -> anyhow::Result<EntityAnnotation> {
            if text.contains("boom") {
                anyhow::bail!("tagger blew up");
            }
            if text.contains("panic") {
                panic!("tagger panicked");
            }
            let mut annotation = EntityAnnotation::empty();
            annotation.push("PERSON", text.to_string());
            Ok(annotation)
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn processor(workers: usize, extractor: Arc<dyn EntityExtractor>) -> DocumentProcessor {
        let normalizer = TextNormalizer::new(Arc::new(LanguageResources::from_stopwords(&["the"])));
        DocumentProcessor::new(ThreadPoolConfig::new(workers), normalizer, extractor)
    }

    fn corpus(n: usize) -> Corpus {
        Corpus::from_texts((0..n).map(|i| (format!("doc{:03}", i), format!("word{} the text", i)))).unwrap()
    }

    #[test]
    fn test_parallel_output_matches_input_order() {
        let corpus = corpus(64);
        let results = processor(8, Arc::new(NullEntityExtractor)).process(&corpus);

        assert_eq!(results.len(), 64);
        for (i, processed) in results.iter().enumerate() {
            assert_eq!(processed.ordinal, i);
            assert_eq!(processed.filename, format!("doc{:03}", i));
            assert_eq!(processed.normalized, format!("word{} text", i));
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let corpus = corpus(20);
        let sequential = processor(1, Arc::new(NullEntityExtractor)).process(&corpus);
        let parallel = processor(4, Arc::new(NullEntityExtractor)).process(&corpus);

        let seq: Vec<_> = sequential.iter().map(|p| p.normalized.clone()).collect();
        let par: Vec<_> = parallel.iter().map(|p| p.normalized.clone()).collect();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_extractor_failures_are_contained() {
        let corpus = Corpus::from_texts(vec![
            ("a", "fine words"),
            ("b", "boom goes the tagger"),
            ("c", "panic in the tagger"),
            ("d", "more fine words"),
        ])
        .unwrap();
        let processor = processor(3, Arc::new(FlakyExtractor));
        let results = processor.process(&corpus);

        assert_eq!(results.len(), 4);
        assert!(results[0].entity_error.is_none());
        assert_eq!(results[0].entities.get("PERSON").len(), 1);
        assert!(results[1].entity_error.is_some());
        assert!(results[1].entities.is_empty());
        assert!(results[2].entity_error.is_some());
        assert!(results[2].entities.is_empty());
        assert_eq!(results[3].normalized, "more fine word");
        assert_eq!(processor.counters().entity_failures(), 2);
        assert_eq!(processor.counters().processed(), 4);
    }
}
