use clap::{Parser, Subcommand};
use std::path::PathBuf;

use isoload_config::{ConfigLoader, IsoConfig, LoggingConfig};
use isoload_core::{IsoError, Result};

mod fetch;
mod inspect;

/// isoload: fetch, verify and isolate runtime dependencies
#[derive(Parser)]
#[command(name = "isoload", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to isoload.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download, verify and inject the dependencies listed in a manifest
    Fetch {
        /// TOML manifest with [[dependency]] tables
        #[arg(short, long)]
        manifest: PathBuf,
        /// Cache directory (defaults to resolver.cache_dir)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Check a file against its expected MD5 and SHA-1
    Verify {
        file: PathBuf,
        #[arg(long)]
        md5: String,
        #[arg(long)]
        sha1: String,
    },
    /// Print where a coordinate is cached
    Path {
        /// GROUP:ARTIFACT:VERSION[:CLASSIFIER]
        coordinate: String,
        /// Cache directory (defaults to resolver.cache_dir)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let config = config_loader.get();

        // --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level.as_deref().unwrap_or(&config.logging.level)
        };
        init_tracing(&config.logging, log_level);

        match self.command {
            Commands::Fetch {
                manifest,
                cache_dir,
            } => fetch::cmd_fetch(config, &manifest, cache_dir).await,
            Commands::Verify { file, md5, sha1 } => inspect::cmd_verify(&file, &md5, &sha1),
            Commands::Path {
                coordinate,
                cache_dir,
            } => inspect::cmd_path(&config, &coordinate, cache_dir),
            Commands::Config { json } => Self::cmd_config(config, json),
        }
    }

    fn cmd_config(config: IsoConfig, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| IsoError::Config(e.to_string()))?
            );
        }
        Ok(())
    }
}

fn init_tracing(logging: &LoggingConfig, level: &str) {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    match logging.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .json()
            .with_target(true)
            .init(),
        "compact" => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .compact()
            .with_target(false)
            .init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(false)
            .init(),
    }
}
