//! Asset fetching - runs once, after the page crawl has finished
//!
//! Every asset path discovered by the crawl is fetched and written to the
//! mirror byte for byte. Assets are independent of each other, so they are
//! fetched concurrently up to a fixed number of permits.

use crate::crawler::{fetch_asset, AssetFetch};
use crate::output::{asset_path_to_file, write_file, AssetStats};
use crate::url::UrlClassifier;
use crate::ExportError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// What happened to a single asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOutcome {
    /// Fetched and written
    Written { bytes: usize },

    /// Under a live rendering prefix; never fetched
    Live,

    /// Ends in `/`, so it has no file name to be written under
    DirectoryShaped,

    /// The origin answered with a non-success status
    AssetFetchFailed { status_code: u16 },
}

/// Fetches and writes every path in `assets`
///
/// # Arguments
///
/// * `client` - HTTP client used for every request
/// * `classifier` - Origin to fetch from and live prefixes to skip
/// * `assets` - Asset paths collected by the crawl
/// * `output_dir` - Root of the mirror
/// * `concurrency` - Maximum number of requests in flight
///
/// # Returns
///
/// * `Ok(AssetStats)` - Counters per outcome
/// * `Err(ExportError)` - A transport or filesystem error; remaining
///   fetches are cancelled
pub async fn fetch_assets<'a>(
    client: &Client,
    classifier: &UrlClassifier,
    assets: impl IntoIterator<Item = &'a String>,
    output_dir: &Path,
    concurrency: usize,
) -> Result<AssetStats, ExportError> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut stats = AssetStats::default();

    for asset in assets {
        stats.discovered += 1;

        if classifier.is_live(asset) {
            record(&mut stats, asset, &AssetOutcome::Live);
            continue;
        }

        if asset.ends_with('/') {
            record(&mut stats, asset, &AssetOutcome::DirectoryShaped);
            continue;
        }

        let url = classifier.url_for(asset);
        let file = asset_path_to_file(output_dir, asset);
        let client = client.clone();
        let semaphore = Arc::clone(&semaphore);
        let path = asset.clone();

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let outcome = fetch_one(&client, &url, file).await?;
            Ok::<_, ExportError>((path, outcome))
        });
    }

    tracing::info!("Fetching {} assets", tasks.len());

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok((path, outcome))) => record(&mut stats, &path, &outcome),
            Ok(Err(e)) => {
                tasks.abort_all();
                return Err(e);
            }
            Err(e) => {
                tasks.abort_all();
                return Err(e.into());
            }
        }
    }

    Ok(stats)
}

async fn fetch_one(client: &Client, url: &Url, file: PathBuf) -> Result<AssetOutcome, ExportError> {
    match fetch_asset(client, url.as_str()).await? {
        AssetFetch::Body(bytes) => {
            write_file(&file, &bytes).await?;
            Ok(AssetOutcome::Written { bytes: bytes.len() })
        }
        AssetFetch::AssetFetchFailed { status_code } => {
            Ok(AssetOutcome::AssetFetchFailed { status_code })
        }
    }
}

fn record(stats: &mut AssetStats, path: &str, outcome: &AssetOutcome) {
    match outcome {
        AssetOutcome::Written { bytes } => {
            tracing::trace!("Wrote asset {} ({} bytes)", path, bytes);
            stats.written += 1;
            stats.bytes += *bytes as u64;
        }
        AssetOutcome::Live => {
            tracing::trace!("Skipping live endpoint {}", path);
            stats.skipped += 1;
        }
        AssetOutcome::DirectoryShaped => {
            tracing::debug!("Skipping directory-shaped asset {}", path);
            stats.skipped += 1;
        }
        AssetOutcome::AssetFetchFailed { status_code } => {
            tracing::debug!("Skipping asset {}: HTTP {}", path, status_code);
            stats.failed += 1;
        }
    }
}
