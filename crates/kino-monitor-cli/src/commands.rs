//! CLI command implementations

use crate::output::{format_level_change, format_table, OutputFormat};
use console::style;
use kino_monitor::{
    load_manifest_table, BitrateMonitor, HttpManifestLoader, MonitorConfig, MonitorPhase,
    Resolution, SharedSurface,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use url::Url;

/// List the quality levels in a master playlist
pub async fn levels(manifest_url: &str, timeout_ms: Option<u64>, format: &str) -> anyhow::Result<()> {
    let format = OutputFormat::from(format);
    let url = Url::parse(manifest_url)?;

    let loader = match timeout_ms {
        Some(ms) => HttpManifestLoader::with_timeout(Duration::from_millis(ms))?,
        None => HttpManifestLoader::new(),
    };
    let table = load_manifest_table(&loader, url.as_str()).await;

    if format == OutputFormat::Text {
        println!("Manifest: {}", url);
        println!("Levels: {}\n", table.len());
    }
    if table.is_empty() {
        if format == OutputFormat::Json {
            println!("[]");
        } else {
            println!("{}", style("No quality levels found").yellow());
        }
        return Ok(());
    }

    println!("{}", format_table(&table, format));

    Ok(())
}

/// Run a monitor whose surface is driven by `WIDTHxHEIGHT` lines on stdin
pub async fn watch(
    manifest_url: &str,
    interval_ms: u64,
    timeout_ms: Option<u64>,
    format: &str,
) -> anyhow::Result<()> {
    let format = OutputFormat::from(format);
    let url = Url::parse(manifest_url)?;

    if format == OutputFormat::Text {
        println!("Watching: {}", url);
        println!("  Interval: {}ms", interval_ms);
        println!("  Enter frame sizes as WIDTHxHEIGHT, Ctrl-D to finish");
    }

    let surface = SharedSurface::new();
    let config = MonitorConfig {
        poll_interval_ms: interval_ms,
        request_timeout_ms: timeout_ms,
    };
    let monitor = BitrateMonitor::builder()
        .surface(surface.clone())
        .manifest_url(url.as_str())
        .config(config)
        .on_change(move |level| match format {
            OutputFormat::Json => println!("{}", format_level_change(&level, format)),
            _ => println!(
                "[{}] {} {}",
                chrono::Utc::now().format("%H:%M:%S"),
                style("level").green(),
                format_level_change(&level, format)
            ),
        })
        .try_start()?;

    let mut phases = monitor.subscribe_phase();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line.parse::<Resolution>() {
                    Ok(dims) => {
                        debug!(%dims, "Surface updated");
                        surface.set_dimensions(dims.width, dims.height);
                    }
                    Err(e) => eprintln!("{} {}", style("ignored:").yellow(), e),
                }
            }
            changed = phases.changed() => {
                if changed.is_err() {
                    break;
                }
                let phase = *phases.borrow_and_update();
                if !phase.is_active() {
                    if phase == MonitorPhase::IdleNoData {
                        println!("{}", style("No quality levels found; nothing to watch").yellow());
                    }
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    monitor.stop();
    Ok(())
}
