//! Configuration module for Site-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and applying command-line overrides on top of them.
//!
//! # Example
//!
//! ```no_run
//! use site_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("site-mirror.toml")).unwrap();
//! println!("Exporting {} into {}", config.server.origin, config.export.output_dir.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, ExportConfig, PathsConfig, ServerConfig, TimingConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
