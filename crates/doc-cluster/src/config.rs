// crates/doc-cluster/src/config.rs

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::clustering::KMeansConfig;
use crate::features::TfidfConfig;

/// Stopword language variable. `LANGUAGE` itself belongs to the locale.
pub const LANGUAGE_VAR: &str = "DOC_CLUSTER_LANGUAGE";

#[derive(Debug, Clone)]
pub struct Config {
    pub dataset_dir: PathBuf,
    pub output_dir: PathBuf,
    pub language: String,
    pub file_extensions: Vec<String>,
    pub workers: usize,
    pub max_df: f64,
    pub min_df: usize,
    pub max_clusters: usize,
    pub top_terms: usize,
    pub top_features: usize,
    pub random_seed: u64,
    pub n_init: usize,
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("dataset"),
            output_dir: PathBuf::from("."),
            language: "en".to_string(),
            file_extensions: Vec::new(),
            workers: Self::auto_detect_workers(),
            max_df: 0.8,
            min_df: 1,
            max_clusters: 10,
            top_terms: 10,
            top_features: 20,
            random_seed: 42,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("Failed to load .env file: {}. Using system environment variables.", e);
        } else {
            info!("Loaded environment variables from .env file");
        }

        let defaults = Self::default();

        let dataset_dir = match env::var("DATASET_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => env::current_dir()
                .context("Failed to resolve current directory")?
                .join("dataset"),
        };

        let output_dir = env::var("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        // Auto‑detect workers if set to "auto"
        let workers = if env::var("WORKERS").unwrap_or_else(|_| "auto".into()) == "auto" {
            defaults.workers
        } else {
            env::var("WORKERS")
                .unwrap_or_default()
                .parse()
                .context("WORKERS must be \"auto\" or a positive integer")?
        };

        let file_extensions = env::var("FILE_EXTENSIONS")
            .map(|raw| Self::parse_extensions(&raw))
            .unwrap_or_default();

        let config = Self {
            dataset_dir,
            output_dir,
            language: env::var(LANGUAGE_VAR).unwrap_or(defaults.language),
            file_extensions,
            workers,
            max_df: env::var("MAX_DF")
                .unwrap_or_else(|_| "0.8".into())
                .parse()
                .context("MAX_DF must be a number")?,
            min_df: env::var("MIN_DF")
                .unwrap_or_else(|_| "1".into())
                .parse()
                .context("MIN_DF must be a non-negative integer")?,
            max_clusters: env::var("MAX_CLUSTERS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .context("MAX_CLUSTERS must be an integer")?,
            top_terms: env::var("TOP_TERMS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .context("TOP_TERMS must be an integer")?,
            top_features: env::var("TOP_FEATURES")
                .unwrap_or_else(|_| "20".into())
                .parse()
                .context("TOP_FEATURES must be an integer")?,
            random_seed: env::var("RANDOM_SEED")
                .unwrap_or_else(|_| "42".into())
                .parse()
                .context("RANDOM_SEED must be an unsigned integer")?,
            n_init: env::var("N_INIT")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .context("N_INIT must be an integer")?,
            max_iter: env::var("MAX_ITER")
                .unwrap_or_else(|_| "300".into())
                .parse()
                .context("MAX_ITER must be an integer")?,
            tolerance: defaults.tolerance,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.max_df.is_nan() || self.max_df <= 0.0 {
            anyhow::bail!("max_df must be positive, got {}", self.max_df);
        }
        if self.max_df > 1.0 && self.max_df.fract() != 0.0 {
            anyhow::bail!("max_df above 1.0 must be an absolute document count, got {}", self.max_df);
        }
        if self.max_clusters < 2 {
            anyhow::bail!("max_clusters must be at least 2, got {}", self.max_clusters);
        }
        if self.n_init == 0 || self.max_iter == 0 {
            anyhow::bail!("n_init and max_iter must be at least 1");
        }
        Ok(())
    }

    pub fn tfidf_config(&self) -> TfidfConfig {
        TfidfConfig {
            max_df: self.max_df,
            min_df: self.min_df,
        }
    }

    pub fn kmeans_config(&self) -> KMeansConfig {
        KMeansConfig {
            seed: self.random_seed,
            n_init: self.n_init,
            max_iter: self.max_iter,
            tolerance: self.tolerance,
        }
    }

    fn parse_extensions(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    fn auto_detect_workers() -> usize {
        let num_cpus = num_cpus::get();
        info!("Auto‑detected CPU cores: {}", num_cpus);
        num_cpus.max(1)
    }

    pub fn print_config(&self) {
        info!("Current Configuration:");
        info!("- Dataset: {}", self.dataset_dir.display());
        info!("- Output: {}", self.output_dir.display());
        info!("- Language: {}", self.language);
        info!("- Workers: {}", self.workers);
        info!("- max_df: {} / min_df: {}", self.max_df, self.min_df);
        info!("- Max clusters: {}", self.max_clusters);
        info!("- Top terms per cluster: {}", self.top_terms);
        info!("- Seed: {} (n_init {}, max_iter {})", self.random_seed, self.n_init, self.max_iter);
        if !self.file_extensions.is_empty() {
            info!("- Extensions: {}", self.file_extensions.join(", "));
        }
    }
}
