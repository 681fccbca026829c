//! A complete export run
//!
//! Ties the pieces together in order: prepare the output tree, start the
//! preview server, wait for it, crawl pages, fetch assets, copy the static
//! tree. The server is shut down on every path out of the run, and a fatal
//! error is reported together with whatever the server printed.

use crate::config::Config;
use crate::crawler::{build_http_client, fetch_assets, Coordinator, Sanitizer};
use crate::output::{copy_static_tree, prepare_output_dir, ExportStats};
use crate::supervisor::{build_probe_client, wait_until_ready, ExitWatch, LogTails, ServerProcess};
use crate::url::UrlClassifier;
use crate::ExportError;
use std::fmt;
use std::time::Instant;

/// A fatal error together with the preview server's output tails
#[derive(Debug)]
pub struct ExportFailure {
    pub error: ExportError,
    pub tails: LogTails,
}

impl ExportFailure {
    fn new(error: ExportError, tails: LogTails) -> Self {
        Self { error, tails }
    }
}

impl fmt::Display for ExportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Export failed: {}", self.error)?;

        if !self.tails.stdout.is_empty() {
            write!(f, "\n\n--- server stdout (tail) ---\n{}", self.tails.stdout.trim_end())?;
        }
        if !self.tails.stderr.is_empty() {
            write!(f, "\n\n--- server stderr (tail) ---\n{}", self.tails.stderr.trim_end())?;
        }

        Ok(())
    }
}

impl std::error::Error for ExportFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<ExportError> for ExportFailure {
    fn from(error: ExportError) -> Self {
        Self::new(error, LogTails::default())
    }
}

/// Runs one export from start to finish
///
/// # Arguments
///
/// * `config` - Validated configuration for the run
///
/// # Returns
///
/// * `Ok(ExportStats)` - Pages, assets and static files are all on disk
/// * `Err(ExportFailure)` - The run was aborted; the failure carries the
///   server's stdout/stderr tails
pub async fn run_export(config: &Config) -> Result<ExportStats, ExportFailure> {
    let started = Instant::now();

    let classifier = UrlClassifier::from_origin(&config.server.origin, &config.paths)
        .map_err(ExportError::from)?;
    let output_dir = &config.export.output_dir;

    prepare_output_dir(output_dir).await?;
    tracing::info!("Output directory {} is ready", output_dir.display());

    let mut server = if config.server.spawn {
        Some(ServerProcess::start(
            &config.server,
            config.export.log_tail_bytes,
        )?)
    } else {
        tracing::info!("Using already running server at {}", classifier.origin());
        None
    };

    let exit = server.as_ref().map(ServerProcess::exit_watch);
    let result = export_site(config, classifier, exit).await;

    let mut tails = LogTails::default();
    let mut shutdown_error = None;
    if let Some(server) = server.as_mut() {
        if let Err(e) = server.shutdown().await {
            tracing::error!("Failed to stop preview server cleanly: {}", e);
            shutdown_error = Some(e);
        }
        tails = server.tails();
    }

    match (result, shutdown_error) {
        (Ok(mut stats), None) => {
            stats.elapsed = started.elapsed();
            tracing::info!("{} in {:?}", stats.summary(), stats.elapsed);
            Ok(stats)
        }
        (Err(error), _) | (Ok(_), Some(error)) => Err(ExportFailure::new(error, tails)),
    }
}

/// Everything between server start and server shutdown
async fn export_site(
    config: &Config,
    classifier: UrlClassifier,
    exit: Option<ExitWatch>,
) -> Result<ExportStats, ExportError> {
    let probe = build_probe_client()?;
    wait_until_ready(
        &probe,
        classifier.origin(),
        config.timing.startup_timeout(),
        config.timing.poll_interval(),
        exit,
    )
    .await?;

    let client = build_http_client(&config.timing)?;
    let sanitizer = Sanitizer::new(&config.paths, classifier.clone())?;
    let output_dir = config.export.output_dir.clone();

    let mut coordinator = Coordinator::new(
        client.clone(),
        classifier.clone(),
        sanitizer,
        output_dir.clone(),
    );
    coordinator.run().await?;

    let assets = fetch_assets(
        &client,
        &classifier,
        coordinator.assets(),
        &output_dir,
        config.export.asset_concurrency,
    )
    .await?;
    tracing::info!(
        "Assets: {} written, {} failed, {} skipped",
        assets.written,
        assets.failed,
        assets.skipped
    );

    let static_dir = config.export.static_dir.clone();
    let static_files =
        tokio::task::spawn_blocking(move || copy_static_tree(&static_dir, &output_dir)).await??;

    Ok(ExportStats {
        pages_visited: coordinator.visited().len() as u64,
        pages: coordinator.stats().clone(),
        assets,
        static_files: static_files as u64,
        elapsed: Default::default(),
    })
}
