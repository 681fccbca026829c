use crate::config::types::{Config, ExportConfig, PathsConfig, ServerConfig, TimingConfig};
use crate::ConfigError;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Smallest accepted log-tail budget
const MIN_LOG_TAIL_BYTES: usize = 256;

/// Largest accepted asset fetch concurrency
const MAX_ASSET_CONCURRENCY: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_timing_config(&config.timing)?;
    validate_export_config(&config.export)?;
    validate_output_location(config)?;
    validate_paths_config(&config.paths)?;
    Ok(())
}

/// Validates preview server configuration
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.spawn && config.command.trim().is_empty() {
        return Err(ConfigError::Validation(
            "server command cannot be empty when spawn is enabled".to_string(),
        ));
    }

    let origin = Url::parse(&config.origin)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", config.origin, e)))?;

    if origin.scheme() != "http" && origin.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "origin must use http or https, got '{}'",
            origin.scheme()
        )));
    }

    if origin.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "origin '{}' has no host",
            config.origin
        )));
    }

    Ok(())
}

/// Validates readiness and request timing
fn validate_timing_config(config: &TimingConfig) -> Result<(), ConfigError> {
    if config.startup_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "startup_timeout_ms must be > 0".to_string(),
        ));
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll_interval_ms must be > 0".to_string(),
        ));
    }

    if config.poll_interval_ms > config.startup_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms ({}) cannot exceed startup_timeout_ms ({})",
            config.poll_interval_ms, config.startup_timeout_ms
        )));
    }

    if config.request_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_export_config(config: &ExportConfig) -> Result<(), ConfigError> {
    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    // The output directory is removed recursively at the start of every run.
    let named = normalize_lexically(&config.output_dir)
        .components()
        .any(|c| matches!(c, Component::Normal(_)));
    if !named {
        return Err(ConfigError::Validation(format!(
            "output_dir must name a directory below the current one or the root, got '{}'",
            config.output_dir.display()
        )));
    }

    if config.asset_concurrency < 1 || config.asset_concurrency > MAX_ASSET_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "asset_concurrency must be between 1 and {}, got {}",
            MAX_ASSET_CONCURRENCY, config.asset_concurrency
        )));
    }

    if config.log_tail_bytes < MIN_LOG_TAIL_BYTES {
        return Err(ConfigError::Validation(format!(
            "log_tail_bytes must be >= {}, got {}",
            MIN_LOG_TAIL_BYTES, config.log_tail_bytes
        )));
    }

    Ok(())
}

/// Rejects an output directory that would wipe the static or working directory
fn validate_output_location(config: &Config) -> Result<(), ConfigError> {
    let output_dir = absolute_lexically(&config.export.output_dir);

    let protected = [
        ("static_dir", &config.export.static_dir),
        ("working_dir", &config.server.working_dir),
    ];

    for (name, dir) in protected {
        if absolute_lexically(dir).starts_with(&output_dir) {
            return Err(ConfigError::Validation(format!(
                "output_dir '{}' cannot be or contain {} '{}'",
                config.export.output_dir.display(),
                name,
                dir.display()
            )));
        }
    }

    Ok(())
}

/// Resolves `.` and `..` without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

/// Anchors a relative path at the current directory, then normalizes it
fn absolute_lexically(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize_lexically(path);
    }

    match std::env::current_dir() {
        Ok(cwd) => normalize_lexically(&cwd.join(path)),
        Err(_) => normalize_lexically(path),
    }
}

/// Validates route conventions
fn validate_paths_config(config: &PathsConfig) -> Result<(), ConfigError> {
    for prefix in config.reserved_prefixes.iter().chain(&config.live_prefixes) {
        validate_prefix(prefix)?;
    }

    validate_prefix(&config.image_loader_route)?;
    validate_prefix(&config.dev_client_script)?;

    Ok(())
}

/// Validates a single absolute path prefix
fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    if !prefix.starts_with('/') {
        return Err(ConfigError::InvalidPrefix(format!(
            "'{}' must start with '/'",
            prefix
        )));
    }

    if prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidPrefix(format!(
            "'{}' cannot contain whitespace",
            prefix
        )));
    }

    Ok(())
}
