//! Crawler module for page discovery and asset collection
//!
//! This module contains the core export logic, including:
//! - HTTP fetching of pages and assets
//! - Sanitization of exported markup
//! - Link and asset extraction
//! - The page crawl loop
//! - Concurrent asset fetching

mod assets;
mod coordinator;
mod fetcher;
mod parser;
mod sanitize;

pub use assets::{fetch_assets, AssetOutcome};
pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, fetch_asset, fetch_page, AssetFetch, FetchResult};
pub use parser::{extract_references, srcset_candidates, Reference};
pub use sanitize::Sanitizer;
