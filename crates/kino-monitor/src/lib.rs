//! Kino Monitor - detects the HLS quality level a player is rendering
//!
//! Some playback engines never say which variant they picked. This crate
//! works it out from the outside:
//! - parse the master playlist into a table of quality levels
//! - sample the decoded frame size of the playing video on a timer
//! - match the size against the table and report each bitrate change once
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Kino Monitor                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐   text   ┌──────────────┐                     │
//! │  │   Manifest   │ ───────► │    Master    │                     │
//! │  │    Loader    │          │    Parser    │                     │
//! │  └──────────────┘          └──────┬───────┘                     │
//! │                                   │ ManifestTable               │
//! │                            ┌──────┴───────┐                     │
//! │  ┌──────────────┐  WxH     │    Level     │   QualityLevel      │
//! │  │   Playback   │ ───────► │   Tracker    │ ──────► on_change   │
//! │  │   Surface    │  (tick)  └──────────────┘                     │
//! │  └──────────────┘     driven by BitrateMonitor                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use kino_monitor::{BitrateMonitor, SharedSurface};
//! use std::time::Duration;
//!
//! # async fn run() {
//! let surface = SharedSurface::new();
//! let monitor = BitrateMonitor::builder()
//!     .surface(surface.clone())
//!     .manifest_url("https://cdn.example.com/vod/master.m3u8")
//!     .poll_interval(Duration::from_secs(2))
//!     .on_change(|level| println!("now playing {} bps", level.bitrate))
//!     .start();
//!
//! // The renderer reports each decoded frame size
//! surface.set_dimensions(1280, 720);
//! # monitor.stop();
//! # }
//! ```

pub mod error;
pub mod types;
pub mod manifest;
pub mod surface;
pub mod tracker;
pub mod monitor;

pub use error::{Error, Result};
pub use types::*;
pub use manifest::{
    load_manifest_table, parse_master_playlist, HttpManifestLoader, ManifestLoader,
};
pub use surface::{PlaybackSurface, SharedSurface};
pub use tracker::LevelTracker;
pub use monitor::{BitrateMonitor, BitrateMonitorBuilder, QualityCallback};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup
pub fn init() {
    tracing::info!(version = VERSION, "Kino Monitor initialized");
}
