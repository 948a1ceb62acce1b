//! # Asset Optimizer - Main Entry Point
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento del file di configurazione e override da CLI
//! - Creazione del client remoto e avvio dell'optimizer
//!
//! ## Esempio di utilizzo:
//! ```bash
//! TINIFY_API_KEY=... asset-optimizer /path/to/project --skip-size 10240 --white-list logo.png
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use asset_optimizer::{config::CONFIG_FILE_NAME, AssetOptimizer, FormatFilter, OptimizerConfig, TinifyClient};

#[derive(Parser)]
#[command(name = "asset-optimizer")]
#[command(about = "Incrementally optimize image assets through a remote compression service")]
struct Args {
    /// Project root (the ledger is stored here)
    #[arg(default_value = ".")]
    project_root: PathBuf,

    /// JSON config file (default: <project_root>/optimizer.json when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compression service API key
    #[arg(long, env = "TINIFY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Convert images to WebP before optimizing
    #[arg(long)]
    webp: bool,

    /// Only convert to WebP, skip optimization
    #[arg(long)]
    only_convert: bool,

    /// Skip files of this size or smaller (bytes)
    #[arg(long)]
    skip_size: Option<u64>,

    /// Formats to optimize: all, jpeg, png, webp
    #[arg(short, long)]
    format: Option<FormatFilter>,

    /// Minimum reduction in percent to keep a result (0-100)
    #[arg(short = 't', long)]
    ratio_threshold: Option<u8>,

    /// Only process the given directories, no discovery
    #[arg(long)]
    exclusive: bool,

    /// Directory to optimize (repeatable)
    #[arg(short = 'd', long = "dir")]
    dirs: Vec<PathBuf>,

    /// File name never to touch (repeatable)
    #[arg(long = "white-list")]
    white_list: Vec<String>,

    /// Number of concurrent remote calls
    #[arg(short, long)]
    workers: Option<usize>,

    /// Stop submitting new files after this many seconds
    #[arg(long)]
    deadline: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Apply CLI overrides on top of the file configuration
    fn apply(self, mut config: OptimizerConfig) -> OptimizerConfig {
        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        config.convert_to_webp |= self.webp || self.only_convert;
        config.only_convert |= self.only_convert;
        if let Some(skip_size) = self.skip_size {
            config.skip_size = skip_size;
        }
        if let Some(format) = self.format {
            config.support_format = format;
        }
        if let Some(threshold) = self.ratio_threshold {
            config.compress_ratio_threshold = threshold;
        }
        if self.exclusive {
            config.append_mode = false;
        }
        config.resource_dirs.extend(self.dirs);
        config.white_list.extend(self.white_list);
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.deadline.is_some() {
            config.deadline_secs = self.deadline;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !args.project_root.is_dir() {
        return Err(anyhow::anyhow!(
            "Project root is not a directory: {}",
            args.project_root.display()
        ));
    }
    let project_root = args.project_root.canonicalize()?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| project_root.join(CONFIG_FILE_NAME));
    let config = args.apply(OptimizerConfig::from_file(&config_path).await?);

    let service = Arc::new(TinifyClient::new(
        &config.api_key,
        &config.endpoint,
        Duration::from_secs(config.request_timeout_secs),
    )?);

    let optimizer = AssetOptimizer::new(&project_root, config, service).with_progress(true);
    let outcome = optimizer.run().await?;
    if outcome.quota_exhausted {
        warn!(
            "Service quota exhausted: {} files optimized before stopping",
            outcome.records.len()
        );
    }
    Ok(())
}
