//! Simulated playback example
//!
//! Feeds a scripted sequence of decoded frame sizes to a bitrate monitor and
//! prints every level change it reports. No network access is needed: the
//! master playlist is served from memory.
//!
//! Run with: cargo run -p kino-monitor --example simulated_playback

use async_trait::async_trait;
use kino_monitor::{BitrateMonitor, ManifestLoader, MonitorPhase, PlaybackSurface, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const MASTER: &str = r#"#EXTM3U
#EXT-X-VERSION:4
#EXT-X-STREAM-INF:BANDWIDTH=640000,RESOLUTION=416x234,CODECS="avc1.42e00a,mp4a.40.2"
234p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=1500000,RESOLUTION=960x540,CODECS="avc1.4d401f,mp4a.40.2",FRAME-RATE=30
540p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=3000000,RESOLUTION=1280x720,CODECS="avc1.4d401f,mp4a.40.2",FRAME-RATE=30
720p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=6000000,RESOLUTION=1920x1080,CODECS="avc1.640028,mp4a.40.2",FRAME-RATE=30
1080p.m3u8
"#;

/// Frame sizes a player might go through while ramping up and recovering
const SCRIPT: &[(u32, u32)] = &[
    (0, 0),
    (416, 234),
    (416, 234),
    (960, 540),
    (1280, 720),
    (1100, 619), // mid-switch, matches nothing
    (1920, 1080),
    (1920, 1080),
    (960, 540),
];

struct InMemoryLoader;

#[async_trait]
impl ManifestLoader for InMemoryLoader {
    async fn load(&self, _url: &str) -> Result<String> {
        Ok(MASTER.to_string())
    }
}

/// Surface that advances through `SCRIPT` on every read of the width
struct ScriptedSurface {
    step: AtomicUsize,
}

impl ScriptedSurface {
    fn current(&self) -> (u32, u32) {
        let step = self.step.load(Ordering::SeqCst);
        SCRIPT[step.min(SCRIPT.len() - 1)]
    }
}

impl PlaybackSurface for ScriptedSurface {
    fn video_width(&self) -> u32 {
        let (width, _) = self.current();
        width
    }

    fn video_height(&self) -> u32 {
        let (_, height) = self.current();
        self.step.fetch_add(1, Ordering::SeqCst);
        height
    }
}

#[tokio::main]
async fn main() {
    println!("Kino Monitor - Simulated Playback Example");
    println!("=========================================\n");

    let monitor = BitrateMonitor::builder()
        .surface(ScriptedSurface {
            step: AtomicUsize::new(0),
        })
        .manifest_url("memory://master.m3u8")
        .loader(InMemoryLoader)
        .poll_interval(Duration::from_millis(200))
        .on_change(|level| {
            println!(
                "  -> {:>5} kbps  {}x{}  ({})  video={} audio={}",
                level.bitrate / 1000,
                level.width,
                level.height,
                level.resolution().quality_name(),
                level.video_codec,
                level.audio_codec,
            );
        })
        .start();

    let mut phases = monitor.subscribe_phase();
    let _ = phases.wait_for(|phase| *phase != MonitorPhase::Loading).await;
    println!("Phase: {}\n", monitor.phase());

    tokio::time::sleep(Duration::from_millis(200 * (SCRIPT.len() as u64 + 1))).await;

    monitor.stop();
    println!("\nPhase: {}", monitor.phase());
    println!("Last reported bitrate: {:?}", monitor.last_notified());
}
