//! HLS master playlist parsing
//!
//! Only `#EXT-X-STREAM-INF` declarations are read. Each one yields a
//! [`PlaylistEntry`] whose locator is the line directly after it, taken
//! verbatim. The parser is deliberately lenient: anything it does not
//! understand is skipped rather than rejected.

use super::attributes::AttributeList;
use super::codecs::{guess_codecs, split_codecs};
use crate::types::{ManifestTable, PlaylistEntry, QualityLevel};
use tracing::debug;

/// Tag that marks a level-declaration line
pub const STREAM_INF_TAG: &str = "#EXT-X-STREAM-INF";

/// Parse master playlist text into a table of quality levels.
///
/// Declarations without a usable `BANDWIDTH` are dropped. That includes a
/// `BANDWIDTH` attribute that is present but not an unsigned integer, since
/// such a declaration has no bitrate to report. Entries keep manifest order
/// and are not deduplicated.
pub fn parse_master_playlist(content: &str) -> ManifestTable {
    let lines: Vec<&str> = content.lines().collect();
    let mut entries = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let Some(attributes) = stream_inf_attributes(line) else {
            continue;
        };

        match parse_stream_inf(attributes) {
            Some(level) => entries.push(PlaylistEntry {
                level,
                url: lines.get(idx + 1).map(|next| next.to_string()),
            }),
            None => debug!(line = idx + 1, "Skipping stream declaration without usable BANDWIDTH"),
        }
    }

    ManifestTable::new(entries)
}

/// Attribute list of a level-declaration line, or `None` for any other line
fn stream_inf_attributes(line: &str) -> Option<&str> {
    let (_, after) = line.split_once(STREAM_INF_TAG)?;
    Some(after.strip_prefix(':').unwrap_or(after))
}

/// Build a quality level from one attribute list
fn parse_stream_inf(attributes: &str) -> Option<QualityLevel> {
    let mut level = QualityLevel::default();
    let mut bandwidth = None;

    for (key, value) in AttributeList::new(attributes) {
        match key {
            "BANDWIDTH" => bandwidth = Some(value),
            "RESOLUTION" => {
                if let Some((width, height)) = parse_resolution(value) {
                    level.width = width;
                    level.height = height;
                }
            }
            "CODECS" => {
                if let Some(assignment) = guess_codecs(&split_codecs(value)) {
                    level.video_codec = assignment.video.unwrap_or_default();
                    level.audio_codec = assignment.audio.unwrap_or_default();
                }
            }
            "FRAME-RATE" => {
                if let Some(fps) = parse_frame_rate(value) {
                    level.fps = fps;
                }
            }
            _ => {}
        }
    }

    level.bitrate = bandwidth?.parse().ok()?;
    Some(level)
}

fn parse_resolution(value: &str) -> Option<(u32, u32)> {
    let (width, height) = value.split_once('x')?;
    Some((width.trim().parse().ok()?, height.trim().parse().ok()?))
}

fn parse_frame_rate(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|fps| fps.is_finite() && *fps >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U
#EXT-X-VERSION:4
#EXT-X-STREAM-INF:BANDWIDTH=1000000,RESOLUTION=640x360,CODECS=\"avc1.4d401e,mp4a.40.2\",FRAME-RATE=25.000
360p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2000000,AVERAGE-BANDWIDTH=1800000,RESOLUTION=1280x720,CODECS=\"mp4a.40.2,avc1.4d401f\"
720p.m3u8
";

    #[test]
    fn test_parse_master() {
        let table = parse_master_playlist(MASTER);
        assert_eq!(table.len(), 2);

        let first = &table.entries()[0];
        assert_eq!(first.level.bitrate, 1_000_000);
        assert_eq!((first.level.width, first.level.height), (640, 360));
        assert_eq!(first.level.fps, 25.0);
        assert_eq!(first.level.video_codec, "avc1.4d401e");
        assert_eq!(first.level.audio_codec, "mp4a.40.2");
        assert_eq!(first.url.as_deref(), Some("360p.m3u8"));

        let second = &table.entries()[1];
        assert_eq!(second.level.bitrate, 2_000_000);
        assert_eq!(second.level.fps, 0.0);
        assert_eq!(second.level.video_codec, "avc1.4d401f");
        assert_eq!(second.url.as_deref(), Some("720p.m3u8"));
    }

    #[test]
    fn test_declaration_on_last_line_has_no_url() {
        let table = parse_master_playlist("#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=500000");
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries()[0].url, None);
    }

    #[test]
    fn test_next_line_is_taken_verbatim() {
        let table = parse_master_playlist(
            "#EXT-X-STREAM-INF:BANDWIDTH=1\n#EXT-X-STREAM-INF:BANDWIDTH=2\nlow.m3u8",
        );
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.entries()[0].url.as_deref(),
            Some("#EXT-X-STREAM-INF:BANDWIDTH=2")
        );
        assert_eq!(table.entries()[1].url.as_deref(), Some("low.m3u8"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let table = parse_master_playlist(
            "#EXTM3U\r\n#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=854x480\r\n480p.m3u8\r\n",
        );
        assert_eq!(table.entries()[0].url.as_deref(), Some("480p.m3u8"));
        assert_eq!(table.entries()[0].level.height, 480);
    }

    #[test]
    fn test_unusable_values() {
        let table = parse_master_playlist(
            "#EXT-X-STREAM-INF:BANDWIDTH=fast\na.m3u8\n\
             #EXT-X-STREAM-INF:BANDWIDTH=10,RESOLUTION=wide,FRAME-RATE=\nb.m3u8\n\
             #EXT-X-STREAM-INF:BANDWIDTH=20,FRAME-RATE=abc\nc.m3u8",
        );
        assert_eq!(table.len(), 2);
        let b = &table.entries()[0].level;
        assert_eq!((b.bitrate, b.width, b.height, b.fps), (10, 0, 0, 0.0));
        assert_eq!(table.entries()[1].level.fps, 0.0);
    }

    #[test]
    fn test_unknown_codec_pair_leaves_codecs_empty() {
        let table = parse_master_playlist(
            "#EXT-X-STREAM-INF:BANDWIDTH=10,CODECS=\"foo.1,bar.2\"\nx.m3u8",
        );
        let level = &table.entries()[0].level;
        assert!(level.video_codec.is_empty());
        assert!(level.audio_codec.is_empty());
    }
}
