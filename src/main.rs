//! # Lyra
//!
//! A small code editor whose line-number gutter is kept in step with the
//! text beside it.
//!
//! ```bash
//! # Run the editor
//! cargo run
//!
//! # Open a file
//! cargo run -- path/to/file.rs
//!
//! # Use a specific config file, with debug logging
//! cargo run -- --config lyra.toml -vv
//! ```
//!
//! `RUST_LOG` overrides the `-v` level when set.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lyra_core::Config;
use lyra_ui::{run, Flags};

/// Lyra - a gutter-synchronized text editor
#[derive(Parser, Debug)]
#[command(name = "lyra")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to open
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e)),
        None => Ok(Config::load()),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(args.verbose).as_str()));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true),
        )
        .with(filter)
        .init();

    tracing::info!("Starting Lyra v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(args.config.as_deref())?;
    let flags = Flags {
        file: args.file,
        config,
    };

    run(flags).map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
