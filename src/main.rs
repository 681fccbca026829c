//! Site-Mirror main entry point
//!
//! This is the command-line interface for the Site-Mirror static exporter.

use clap::Parser;
use site_mirror::config::{load_config_with_hash, validate, Config};
use site_mirror::output::print_statistics;
use site_mirror::run_export;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Site-Mirror: a static mirror exporter
///
/// Site-Mirror starts the site's preview server, crawls every page reachable
/// from `/`, downloads the assets those pages reference and writes a
/// self-contained static copy of the site to the output directory.
#[derive(Parser, Debug)]
#[command(name = "site-mirror")]
#[command(version = "1.0.0")]
#[command(about = "A static mirror exporter for server-rendered sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used if omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Origin the preview server listens on
    #[arg(long, value_name = "URL")]
    origin: Option<String>,

    /// Directory the mirror is written to
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Directory of hand-provided static files copied over the mirror
    #[arg(long, value_name = "DIR")]
    static_dir: Option<PathBuf>,

    /// How long to wait for the preview server to answer
    #[arg(long, value_name = "MS")]
    startup_timeout_ms: Option<u64>,

    /// Delay between readiness probes
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    /// Bytes of server stdout/stderr kept for failure reports
    #[arg(long, value_name = "BYTES")]
    log_tail_bytes: Option<usize>,

    /// Export from an already running server instead of starting one
    #[arg(long)]
    no_spawn: bool,

    /// Validate config and show what would be exported without exporting
    #[arg(long)]
    dry_run: bool,

    /// Preview server command, replacing the configured one
    #[arg(last = true, value_name = "COMMAND")]
    server_command: Vec<String>,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(origin) = &self.origin {
            config.server.origin = origin.clone();
        }
        if let Some(out) = &self.out {
            config.export.output_dir = out.clone();
        }
        if let Some(static_dir) = &self.static_dir {
            config.export.static_dir = static_dir.clone();
        }
        if let Some(ms) = self.startup_timeout_ms {
            config.timing.startup_timeout_ms = ms;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.timing.poll_interval_ms = ms;
        }
        if let Some(bytes) = self.log_tail_bytes {
            config.export.log_tail_bytes = bytes;
        }
        if self.no_spawn {
            config.server.spawn = false;
        }
        if let Some((command, args)) = self.server_command.split_first() {
            config.server.command = command.clone();
            config.server.args = args.to_vec();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    eprintln!("Failed to load configuration: {}", e);
                    return ExitCode::from(2);
                }
            }
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    cli.apply_overrides(&mut config);
    if let Err(e) = validate(&config) {
        eprintln!("Invalid configuration: {}", e);
        return ExitCode::from(2);
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return ExitCode::SUCCESS;
    }

    handle_export(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_mirror=info,warn"),
            1 => EnvFilter::new("site_mirror=debug,info"),
            2 => EnvFilter::new("site_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Site-Mirror Dry Run ===\n");

    println!("Server:");
    if config.server.spawn {
        println!(
            "  Command: {} {}",
            config.server.command,
            config.server.args.join(" ")
        );
        println!("  Working dir: {}", config.server.working_dir.display());
    } else {
        println!("  Command: (not started, using running server)");
    }
    println!("  Origin: {}", config.server.origin);

    println!("\nTiming:");
    println!("  Startup timeout: {}ms", config.timing.startup_timeout_ms);
    println!("  Poll interval: {}ms", config.timing.poll_interval_ms);
    println!("  Request timeout: {}ms", config.timing.request_timeout_ms);

    println!("\nExport:");
    println!("  Output dir: {}", config.export.output_dir.display());
    println!("  Static dir: {}", config.export.static_dir.display());
    println!("  Asset concurrency: {}", config.export.asset_concurrency);
    println!("  Log tail: {} bytes", config.export.log_tail_bytes);

    println!("\nReserved Prefixes ({}):", config.paths.reserved_prefixes.len());
    for prefix in &config.paths.reserved_prefixes {
        println!("  - {}", prefix);
    }

    println!("\nLive Prefixes ({}):", config.paths.live_prefixes.len());
    for prefix in &config.paths.live_prefixes {
        println!("  - {}", prefix);
    }

    println!("\nImage loader route: {}", config.paths.image_loader_route);
    println!("Dev client script: {}", config.paths.dev_client_script);

    println!("\n✓ Configuration is valid");
}

/// Handles the main export operation
async fn handle_export(config: &Config) -> ExitCode {
    tracing::info!(
        "Exporting {} into {}",
        config.server.origin,
        config.export.output_dir.display()
    );

    match run_export(config).await {
        Ok(stats) => {
            print_statistics(&stats);
            ExitCode::SUCCESS
        }
        Err(failure) => {
            tracing::error!("Export failed: {}", failure.error);
            eprintln!("{}", failure);
            ExitCode::from(1)
        }
    }
}
