//! Site-Mirror: a static mirror exporter for server-rendered sites
//!
//! This crate boots a local preview server, crawls every page reachable from
//! `/`, collects the assets those pages reference, and materializes a
//! self-contained static copy of the site on disk.

pub mod config;
pub mod crawler;
pub mod export;
pub mod output;
pub mod supervisor;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Site-Mirror operations
///
/// Every variant here is fatal for the run. Per-page and per-asset
/// conditions that only skip a single item are reported through
/// [`crawler::FetchResult`] and [`crawler::AssetOutcome`] instead.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Preview server did not become ready within {timeout_ms}ms")]
    StartupTimeout { timeout_ms: u64 },

    #[error("Preview server exited before becoming ready ({status})")]
    ProcessExitedEarly { status: String },

    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ExportError {
    /// Builds an [`ExportError::Io`] tagged with the path being touched
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid path prefix: {0}")]
    InvalidPrefix(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Invalid pattern: {0}")]
    Pattern(String),
}

/// Result type alias for Site-Mirror operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use export::{run_export, ExportFailure};
pub use output::ExportStats;
pub use crate::url::{normalize_page_path, UrlClassifier};
