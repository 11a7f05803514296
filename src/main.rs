use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tfidf_landscape::config::PipelineConfig;
use tfidf_landscape::dataset::load_reviews;
use tfidf_landscape::report::write_report;
use tfidf_landscape::{Pipeline, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map wine reviews onto a 2D landscape: TF-IDF, truncated SVD, neighbor
/// embedding and graph clustering.
#[derive(Debug, Parser)]
#[command(name = "tfidf-landscape", version, about)]
struct Cli {
    /// Review dataset (CSV with description, points, price, variety, title)
    #[arg(long, env = "LANDSCAPE_DATASET")]
    dataset: PathBuf,

    /// TOML configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of the occurrence matrix cache
    #[arg(long, env = "LANDSCAPE_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Where points.csv and the plots are written
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Minimum number of documents a token must appear in
    #[arg(long)]
    min_occurrence: Option<u64>,

    /// SVD rank
    #[arg(long)]
    rank: Option<usize>,

    /// Neighbors of the 2D projection
    #[arg(long)]
    neighbors: Option<usize>,

    /// Minimum distance of the 2D projection
    #[arg(long)]
    min_dist: Option<f64>,

    /// Neighbors of the clustering graph
    #[arg(long)]
    cluster_k: Option<usize>,

    /// Always rebuild the occurrence matrix and do not write the cache
    #[arg(long)]
    no_cache: bool,

    /// Token to plot presence for (repeatable)
    #[arg(long = "highlight")]
    highlight: Vec<String>,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = &self.cache_dir {
            config.cache.dir = dir.clone();
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if let Some(v) = self.min_occurrence {
            config.vocabulary.min_occurrence = v;
        }
        if let Some(v) = self.rank {
            config.svd.rank = v;
        }
        if let Some(v) = self.neighbors {
            config.projection.n_neighbors = v;
        }
        if let Some(v) = self.min_dist {
            config.projection.min_dist = v;
        }
        if let Some(v) = self.cluster_k {
            config.clustering.k = v;
        }
        if !self.highlight.is_empty() {
            config.report.highlight_tokens = self.highlight.clone();
        }
        Ok(config)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let started = Instant::now();
    let config = cli.pipeline_config()?;
    let reviews = load_reviews(&cli.dataset)?;

    let mut pipeline = Pipeline::new(config);
    let analysis = pipeline.run(&reviews)?;
    let written = write_report(&cli.out_dir, &reviews, &analysis, &pipeline.config().report)?;

    tracing::info!(
        files = written.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "pipeline failed");
            ExitCode::FAILURE
        }
    }
}
