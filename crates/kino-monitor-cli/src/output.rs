//! Output formatting for CLI

use kino_monitor::{AudioCodec, ManifestTable, PlaylistEntry, QualityLevel, VideoCodec};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Pretty JSON, falling back to `{}` for values that cannot be serialized
pub fn to_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

#[derive(Tabled)]
struct LevelRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Bitrate")]
    bitrate: String,
    #[tabled(rename = "Resolution")]
    resolution: String,
    #[tabled(rename = "FPS")]
    fps: String,
    #[tabled(rename = "Video")]
    video: String,
    #[tabled(rename = "Audio")]
    audio: String,
    #[tabled(rename = "URL")]
    url: String,
}

impl LevelRow {
    fn new(index: usize, entry: &PlaylistEntry) -> Self {
        let level = &entry.level;
        Self {
            index,
            bitrate: format_bitrate(level.bitrate),
            resolution: format_resolution(level),
            fps: format_fps(level.fps),
            video: or_dash(&level.video_codec),
            audio: or_dash(&level.audio_codec),
            url: entry.url.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Render the whole ladder in the requested format
pub fn format_table(table: &ManifestTable, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(table),
        OutputFormat::Table => {
            let rows: Vec<LevelRow> = table
                .iter()
                .enumerate()
                .map(|(i, entry)| LevelRow::new(i + 1, entry))
                .collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Text => table
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let level = &entry.level;
                let rate = if level.fps > 0.0 {
                    format!(" @ {}fps", format_fps(level.fps))
                } else {
                    String::new()
                };
                format!(
                    "  {}. {} {}{} [{} / {}] {}",
                    i + 1,
                    format_bitrate(level.bitrate),
                    format_resolution(level),
                    rate,
                    or_dash(&level.video_codec),
                    or_dash(&level.audio_codec),
                    entry.url.as_deref().unwrap_or("-"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// One line describing a detected level
pub fn format_level_change(level: &QualityLevel, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(level).unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Text | OutputFormat::Table => format!(
            "{} {} ({}) {}",
            format_bitrate(level.bitrate),
            format_resolution(level),
            level.resolution().quality_name(),
            format_codecs(level),
        ),
    }
}

/// Codec families, falling back to the raw identifier for unknown ones
fn format_codecs(level: &QualityLevel) -> String {
    let video = match level.video_codec_family() {
        VideoCodec::Unknown => or_dash(&level.video_codec),
        family => family.to_string(),
    };
    match level.audio_codec_family() {
        AudioCodec::Unknown if level.audio_codec.is_empty() => video,
        AudioCodec::Unknown => format!("{} + {}", video, level.audio_codec),
        family => format!("{} + {}", video, family),
    }
}

pub fn format_bitrate(bps: u64) -> String {
    if bps >= 1_000_000 {
        format!("{:.2}Mbps", bps as f64 / 1_000_000.0)
    } else {
        format!("{}kbps", bps / 1_000)
    }
}

fn format_resolution(level: &QualityLevel) -> String {
    if level.width == 0 && level.height == 0 {
        "-".to_string()
    } else {
        level.resolution().to_string()
    }
}

fn format_fps(fps: f64) -> String {
    if fps > 0.0 {
        format!("{:.3}", fps).trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        "-".to_string()
    }
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kino_monitor::parse_master_playlist;

    #[test]
    fn test_format_bitrate() {
        assert_eq!(format_bitrate(2_000_000), "2.00Mbps");
        assert_eq!(format_bitrate(640_000), "640kbps");
    }

    #[test]
    fn test_format_fps() {
        assert_eq!(format_fps(29.97), "29.97");
        assert_eq!(format_fps(25.0), "25");
        assert_eq!(format_fps(0.0), "-");
    }

    #[test]
    fn test_text_listing() {
        let table = parse_master_playlist(
            "#EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720,CODECS=\"avc1.4d401f,mp4a.40.2\"\n720p.m3u8\n",
        );
        assert_eq!(
            format_table(&table, OutputFormat::Text),
            "  1. 2.00Mbps 1280x720 [avc1.4d401f / mp4a.40.2] 720p.m3u8"
        );
        assert!(format_table(&table, OutputFormat::Table).contains("1280x720"));
    }

    #[test]
    fn test_text_listing_shows_known_frame_rate() {
        let table = parse_master_playlist(
            "#EXT-X-STREAM-INF:BANDWIDTH=640000,RESOLUTION=640x360,FRAME-RATE=29.970\n360p.m3u8\n",
        );
        assert_eq!(
            format_table(&table, OutputFormat::Text),
            "  1. 640kbps 640x360 @ 29.97fps [- / -] 360p.m3u8"
        );
    }

    #[test]
    fn test_level_change_names_codec_families() {
        let table = parse_master_playlist(
            "#EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720,CODECS=\"mp4a.40.2,avc1.4d401f\"\n720p.m3u8\n\
             #EXT-X-STREAM-INF:BANDWIDTH=900000,RESOLUTION=640x360,CODECS=\"xyz1,opus\"\n360p.m3u8\n\
             #EXT-X-STREAM-INF:BANDWIDTH=300000,RESOLUTION=416x234\n234p.m3u8\n",
        );
        let lines: Vec<String> = table
            .iter()
            .map(|e| format_level_change(&e.level, OutputFormat::Text))
            .collect();
        assert_eq!(lines[0], "2.00Mbps 1280x720 (720p) H.264/AVC + AAC");
        assert_eq!(lines[1], "900kbps 640x360 (360p) xyz1 + Opus");
        assert_eq!(lines[2], "300kbps 416x234 (240p) -");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from("anything"), OutputFormat::Text);
    }
}
