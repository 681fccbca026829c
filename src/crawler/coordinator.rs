//! Crawl engine - page discovery and persistence
//!
//! This module contains the main crawl loop. It owns all crawl state:
//! - The FIFO frontier of page paths still to fetch, seeded with `/`
//! - The set of page paths already fetched
//! - The set of asset paths discovered so far
//!
//! Pages are processed one at a time: fetch, sanitize, extract, write. Only
//! then is the next frontier entry dequeued, so the output order follows the
//! order links are discovered in.

use crate::crawler::parser::{extract_references, Reference};
use crate::crawler::sanitize::Sanitizer;
use crate::crawler::{fetch_page, FetchResult};
use crate::output::{page_path_to_file, write_file, PageStats};
use crate::url::UrlClassifier;
use crate::ExportError;
use reqwest::Client;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::PathBuf;

/// Crawl engine for one export run
pub struct Coordinator {
    client: Client,
    classifier: UrlClassifier,
    sanitizer: Sanitizer,
    output_dir: PathBuf,
    frontier: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    assets: BTreeSet<String>,
    stats: PageStats,
}

impl Coordinator {
    /// Creates a crawl engine with a frontier containing only `/`
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for every page request
    /// * `classifier` - Origin and route conventions of the site
    /// * `sanitizer` - Rewrites applied to each page before writing
    /// * `output_dir` - Root of the mirror; must already exist
    pub fn new(
        client: Client,
        classifier: UrlClassifier,
        sanitizer: Sanitizer,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let root = "/".to_string();

        Self {
            client,
            classifier,
            sanitizer,
            output_dir: output_dir.into(),
            frontier: VecDeque::from([root.clone()]),
            queued: HashSet::from([root]),
            visited: HashSet::new(),
            assets: BTreeSet::new(),
            stats: PageStats::default(),
        }
    }

    /// Drains the frontier
    ///
    /// Returns once every page reachable from `/` has been fetched. Pages
    /// that fail or are not HTML are logged and skipped; transport and
    /// filesystem errors abort the crawl.
    pub async fn run(&mut self) -> Result<(), ExportError> {
        tracing::info!("Crawling pages from {}", self.classifier.origin());

        while let Some(path) = self.frontier.pop_front() {
            self.queued.remove(&path);

            if self.visited.contains(&path) {
                continue;
            }
            self.visited.insert(path.clone());

            self.process_page(&path).await?;

            if self.visited.len() % 25 == 0 {
                tracing::info!(
                    "Progress: {} pages visited, {} in frontier, {} assets found",
                    self.visited.len(),
                    self.frontier.len(),
                    self.assets.len()
                );
            }
        }

        tracing::info!(
            "Frontier is empty: {} pages visited, {} written, {} assets found",
            self.visited.len(),
            self.stats.written,
            self.assets.len()
        );

        Ok(())
    }

    /// Fetches one page and writes its sanitized markup
    async fn process_page(&mut self, path: &str) -> Result<(), ExportError> {
        let url = self.classifier.url_for(path);
        tracing::debug!("Fetching page {}", url);

        match fetch_page(&self.client, url.as_str()).await? {
            FetchResult::Html {
                final_url,
                content_type,
                body,
            } => {
                if final_url != url.as_str() {
                    tracing::debug!("Page {} redirected to {}, writing it under {}", url, final_url, path);
                }
                tracing::trace!("Fetched {} ({}, {} bytes)", path, content_type, body.len());

                let sanitized = self.sanitizer.sanitize(&body);
                self.discover(&sanitized, path);

                let file = page_path_to_file(&self.output_dir, path);
                write_file(&file, sanitized.as_bytes()).await?;
                self.stats.written += 1;
            }

            FetchResult::PageFetchFailed { status_code } => {
                tracing::warn!("Skipping non-page {}: HTTP {}", path, status_code);
                self.stats.failed += 1;
            }

            FetchResult::UnsupportedContentType { content_type } => {
                tracing::warn!("Skipping non-HTML {}: {}", path, content_type);
                self.stats.unsupported += 1;
            }
        }

        Ok(())
    }

    /// Feeds references found on `current_path` into the frontier and asset set
    pub fn discover(&mut self, html: &str, current_path: &str) {
        for reference in extract_references(html, current_path, &self.classifier) {
            match reference {
                Reference::Page(page) => self.enqueue(page),
                Reference::Asset(asset) => {
                    self.assets.insert(asset);
                }
            }
        }
    }

    /// Adds a page path unless it was already visited or queued
    fn enqueue(&mut self, path: String) {
        if self.visited.contains(&path) || self.queued.contains(&path) {
            return;
        }

        tracing::trace!("Queueing page {}", path);
        self.queued.insert(path.clone());
        self.frontier.push_back(path);
    }

    /// Page paths fetched so far
    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    /// Page paths still waiting to be fetched, in order
    pub fn frontier(&self) -> impl Iterator<Item = &str> {
        self.frontier.iter().map(String::as_str)
    }

    /// Asset paths discovered so far
    pub fn assets(&self) -> &BTreeSet<String> {
        &self.assets
    }

    /// Per-page outcome counters
    pub fn stats(&self) -> &PageStats {
        &self.stats
    }
}
