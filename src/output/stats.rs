//! Export run statistics
//!
//! Counters are collected by the crawl engine and the asset fetcher and
//! assembled into an [`ExportStats`] once the run has finished.

use std::time::Duration;

/// Per-page outcome counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStats {
    /// Pages fetched as HTML and written to the mirror
    pub written: u64,

    /// Pages that answered with a non-success status
    pub failed: u64,

    /// Pages that answered with something other than HTML
    pub unsupported: u64,
}

/// Per-asset outcome counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetStats {
    /// Distinct asset paths discovered by the crawl
    pub discovered: u64,

    /// Assets fetched and written
    pub written: u64,

    /// Assets that answered with a non-success status
    pub failed: u64,

    /// Live endpoints and paths without a file name
    pub skipped: u64,

    /// Total bytes written for assets
    pub bytes: u64,
}

/// Summary of one export run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Distinct page paths fetched
    pub pages_visited: u64,

    pub pages: PageStats,

    pub assets: AssetStats,

    /// Files copied from the static directory
    pub static_files: u64,

    /// Wall time of the whole run
    pub elapsed: Duration,
}

impl ExportStats {
    /// One-line completion summary
    ///
    /// Counts every page path the crawl processed and every asset path it
    /// discovered, whatever their outcome.
    pub fn summary(&self) -> String {
        format!(
            "Export completed. Pages: {}, Assets: {}",
            self.pages_visited, self.assets.discovered
        )
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ExportStats) {
    println!("{}\n", stats.summary());

    println!("Pages:");
    println!("  Visited: {}", stats.pages_visited);
    println!("  Written: {}", stats.pages.written);
    if stats.pages.failed > 0 {
        println!("  Failed: {}", stats.pages.failed);
    }
    if stats.pages.unsupported > 0 {
        println!("  Not HTML: {}", stats.pages.unsupported);
    }
    println!();

    println!("Assets:");
    println!("  Discovered: {}", stats.assets.discovered);
    println!(
        "  Written: {} ({})",
        stats.assets.written,
        format_bytes(stats.assets.bytes)
    );
    if stats.assets.failed > 0 {
        println!("  Failed: {}", stats.assets.failed);
    }
    if stats.assets.skipped > 0 {
        println!("  Skipped: {}", stats.assets.skipped);
    }
    println!();

    println!("Static files copied: {}", stats.static_files);
    println!("Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
