//! Output module for materializing the static mirror
//!
//! This module handles:
//! - Mapping page and asset paths to files under the output root
//! - Wiping and recreating the output root at the start of a run
//! - Writing fetched pages and assets
//! - Copying the hand-provided static tree over the mirror
//! - Recording and printing run statistics

pub mod stats;
mod tree;

pub use stats::{print_statistics, AssetStats, ExportStats, PageStats};
pub use tree::{copy_static_tree, prepare_output_dir, write_file};

use std::path::{Path, PathBuf};

/// Maps a page path to the file it is written to
///
/// `/` maps to `<root>/index.html`; any other page maps to
/// `<root>/<path>/index.html`, with one trailing slash removed first.
///
/// # Examples
///
/// ```
/// use site_mirror::output::page_path_to_file;
/// use std::path::Path;
///
/// let root = Path::new("dist");
/// assert_eq!(page_path_to_file(root, "/"), Path::new("dist/index.html"));
/// assert_eq!(page_path_to_file(root, "/a/b/"), Path::new("dist/a/b/index.html"));
/// ```
pub fn page_path_to_file(root: &Path, page_path: &str) -> PathBuf {
    if page_path == "/" {
        return root.join("index.html");
    }

    let normalized = page_path.strip_suffix('/').unwrap_or(page_path);
    let relative = normalized.trim_start_matches('/');

    if relative.is_empty() {
        return root.join("index.html");
    }

    root.join(relative).join("index.html")
}

/// Maps an asset path to the file it is written to
///
/// Asset paths map one to one below the root: `/x/y.ext` becomes
/// `<root>/x/y.ext`.
pub fn asset_path_to_file(root: &Path, asset_path: &str) -> PathBuf {
    root.join(asset_path.trim_start_matches('/'))
}
