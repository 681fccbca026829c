use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Site-Mirror
///
/// Every section and key is optional; a missing file is equivalent to
/// `Config::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub timing: TimingConfig,
    pub export: ExportConfig,
    pub paths: PathsConfig,
}

/// Preview server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Program used to start the preview server
    pub command: String,

    /// Arguments passed to the program
    pub args: Vec<String>,

    /// Directory the server is started from
    #[serde(rename = "working-dir")]
    pub working_dir: PathBuf,

    /// Base URL the server listens on
    pub origin: String,

    /// Whether to spawn the server; `false` exports from an origin that is already running
    pub spawn: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: "deno".to_string(),
            args: vec!["task".to_string(), "preview".to_string()],
            working_dir: PathBuf::from("."),
            origin: "http://127.0.0.1:8000".to_string(),
            spawn: true,
        }
    }
}

/// Readiness and request timing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Overall deadline for the server to answer at its root (milliseconds)
    #[serde(rename = "startup-timeout-ms")]
    pub startup_timeout_ms: u64,

    /// Delay between readiness probes (milliseconds)
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// Timeout applied to every page and asset request (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            startup_timeout_ms: 120_000,
            poll_interval_ms: 1_000,
            request_timeout_ms: 30_000,
        }
    }
}

impl TimingConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Root of the mirrored tree; wiped at the start of every run
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Hand-provided static files copied over the mirror last
    #[serde(rename = "static-dir")]
    pub static_dir: PathBuf,

    /// Maximum number of assets fetched at once
    #[serde(rename = "asset-concurrency")]
    pub asset_concurrency: usize,

    /// Bytes of server stdout/stderr kept for diagnostics
    #[serde(rename = "log-tail-bytes")]
    pub log_tail_bytes: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("dist"),
            static_dir: PathBuf::from("static"),
            asset_concurrency: 8,
            log_tail_bytes: 8 * 1024,
        }
    }
}

/// Route conventions of the site being exported
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Paths under these prefixes are never treated as pages
    #[serde(rename = "reserved-prefixes")]
    pub reserved_prefixes: Vec<String>,

    /// Server-side rendering endpoints; never fetched as assets
    #[serde(rename = "live-prefixes")]
    pub live_prefixes: Vec<String>,

    /// Image proxy route whose `src` query parameter holds the original image URL
    #[serde(rename = "image-loader-route")]
    pub image_loader_route: String,

    /// Development-only script stripped from exported pages
    #[serde(rename = "dev-client-script")]
    pub dev_client_script: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            reserved_prefixes: ["/_frsh/", "/live/", "/_live/", "/deco/", "/api/"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            live_prefixes: vec!["/live/".to_string()],
            image_loader_route: "/live/invoke/website/loaders/image.ts".to_string(),
            dev_client_script: "/_frsh/fresh_dev_client.js".to_string(),
        }
    }
}
