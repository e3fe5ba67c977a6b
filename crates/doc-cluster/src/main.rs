// crates/doc-cluster/src/main.rs

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use doc_cluster::{config::Config, telemetry, ClusteringPipeline};
#[cfg(feature = "cli")]
use std::{net::SocketAddr, path::PathBuf};
#[cfg(feature = "cli")]
use tracing::{error, info};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "doc-cluster", about = "Cluster a directory of text documents")]
struct Cli {
    /// Directory with one document per file
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Directory for the JSON result files
    #[arg(long)]
    output: Option<PathBuf>,
    /// Largest cluster count considered
    #[arg(long)]
    max_clusters: Option<usize>,
    /// Terms reported per cluster
    #[arg(long)]
    top_terms: Option<usize>,
    /// Number of document workers
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Stopword language (en, de, fr, ...)
    #[arg(long)]
    language: Option<String>,
    /// Browse the dataset over HTTP instead of clustering it
    #[arg(long, value_name = "ADDR", num_args = 0..=1, default_missing_value = "127.0.0.1:3000")]
    serve: Option<SocketAddr>,
}

#[cfg(feature = "cli")]
impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(dataset) = &self.dataset {
            config.dataset_dir = dataset.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(max_clusters) = self.max_clusters {
            config.max_clusters = max_clusters;
        }
        if let Some(top_terms) = self.top_terms {
            config.top_terms = top_terms;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(seed) = self.seed {
            config.random_seed = seed;
        }
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
    }
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() {
    telemetry::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Clustering failed: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut cfg = Config::from_env()?;
    cli.apply(&mut cfg);
    cfg.validate()?;
    cfg.print_config();

    if let Some(addr) = cli.serve {
        return doc_cluster::server::serve(&cfg, addr).await;
    }

    let summary = tokio::task::spawn_blocking(move || ClusteringPipeline::new(cfg).run()).await??;

    info!(
        "Done: {} documents in {} clusters, {} files written",
        summary.output.report.documents.len(),
        summary.output.report.optimal_k,
        summary.written.len()
    );
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    println!("CLI feature not enabled. Enable with --features cli");
}
