//! Kino Monitor CLI - inspect quality ladders and watch level changes
//!
//! Features:
//! - List the quality levels declared by a master playlist
//! - Run a bitrate monitor fed with frame sizes from stdin

use clap::{Parser, Subcommand};

mod commands;
mod output;

/// Kino Monitor CLI - HLS quality level detection
#[derive(Parser)]
#[command(name = "kino-monitor")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Detect which HLS quality level is on screen", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the quality levels in a master playlist
    Levels {
        /// URL of the master playlist
        manifest: String,

        /// Give up on the request after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Report level changes for frame sizes read from stdin (one WIDTHxHEIGHT per line)
    Watch {
        /// URL of the master playlist
        manifest: String,

        /// Sampling interval in milliseconds
        #[arg(short, long, default_value_t = kino_monitor::DEFAULT_POLL_INTERVAL_MS)]
        interval_ms: u64,

        /// Give up on the manifest request after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    kino_monitor::init();

    match cli.command {
        Commands::Levels { manifest, timeout_ms } => {
            commands::levels(&manifest, timeout_ms, &cli.format).await?;
        }
        Commands::Watch { manifest, interval_ms, timeout_ms } => {
            commands::watch(&manifest, interval_ms, timeout_ms, &cli.format).await?;
        }
    }

    Ok(())
}
