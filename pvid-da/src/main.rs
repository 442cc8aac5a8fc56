//! pvid-da (Discard Analysis) - explains why captures were not archived
//!
//! Reads batch files of capture ids, reconciles them against the archive's
//! tracks and the archiving job's datasets, and writes one report per batch.

use anyhow::{Context, Result};
use clap::Parser;
use pvid_common::config::load_toml_config;
use pvid_common::db::{connect_pool, connect_pool_lazy};
use pvid_common::time::format_date;
use pvid_da::archive::TaskDatasetCache;
use pvid_da::cli::{Args, Settings};
use pvid_da::db::{SqlSnapshotRepository, SqlTaskRepository};
use pvid_da::identifier::read_batch_dir;
use pvid_da::sink::FileReportSink;
use pvid_da::{run_batches, Reconciler};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let settings = Settings::resolve(&args, &config).context("Invalid configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str())),
        )
        .init();

    info!("Starting pvid-da (Discard Analysis) v{}", env!("CARGO_PKG_VERSION"));
    info!("Analytical store: {}", settings.analytical);
    info!("Metadata store: {}", settings.metadata);
    info!("Analysis date: {}", format_date(settings.date));
    info!("Dataset root: {}", settings.dataset_root.display());
    info!("Input directory: {}", settings.input_dir.display());

    let analytical = match connect_pool(&settings.analytical, settings.query_timeout).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to analytical store: {}", e);
            return Err(e).context("Analytical store unavailable");
        }
    };
    let metadata = connect_pool_lazy(&settings.metadata, settings.query_timeout)
        .context("Invalid metadata store configuration")?;

    let batches = read_batch_dir(&settings.input_dir).with_context(|| {
        format!("Failed to read input directory {}", settings.input_dir.display())
    })?;
    info!("Found {} batch files", batches.len());

    let mut reconciler = Reconciler::new(
        SqlSnapshotRepository::new(analytical, settings.query_timeout),
        SqlTaskRepository::new(metadata, settings.query_timeout),
        TaskDatasetCache::new(settings.dataset_root.clone()),
        settings.engine_options(),
    );
    let sink = FileReportSink::new(&settings.input_dir, settings.format);

    let summary = run_batches(&mut reconciler, &batches, &sink).await;
    if summary.failed > 0 {
        error!("{} of {} batches failed", summary.failed, summary.batches);
    }
    Ok(())
}
