//! Core types for Kino Monitor

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Video codec families, derived from a codec identifier such as `avc1.4d401f`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoCodec {
    H264,
    H265,
    Vp9,
    Av1,
    Unknown,
}

impl VideoCodec {
    /// Classify a codec identifier string
    pub fn from_identifier(codec: &str) -> Self {
        let codec = codec.to_ascii_lowercase();
        if codec.starts_with("avc1") || codec.starts_with("avc3") {
            VideoCodec::H264
        } else if codec.starts_with("hvc1")
            || codec.starts_with("hev1")
            || codec.starts_with("dvh1")
            || codec.starts_with("dvhe")
        {
            VideoCodec::H265
        } else if codec.starts_with("vp09") {
            VideoCodec::Vp9
        } else if codec.starts_with("av01") {
            VideoCodec::Av1
        } else {
            VideoCodec::Unknown
        }
    }
}

impl std::fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoCodec::H264 => write!(f, "H.264/AVC"),
            VideoCodec::H265 => write!(f, "H.265/HEVC"),
            VideoCodec::Vp9 => write!(f, "VP9"),
            VideoCodec::Av1 => write!(f, "AV1"),
            VideoCodec::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Audio codec families, derived from a codec identifier such as `mp4a.40.2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCodec {
    Aac,
    Ac3,
    Eac3,
    Opus,
    Flac,
    Unknown,
}

impl AudioCodec {
    /// Classify a codec identifier string
    pub fn from_identifier(codec: &str) -> Self {
        let codec = codec.to_ascii_lowercase();
        if codec.starts_with("mp4a") {
            AudioCodec::Aac
        } else if codec.starts_with("ac-3") {
            AudioCodec::Ac3
        } else if codec.starts_with("ec-3") {
            AudioCodec::Eac3
        } else if codec.starts_with("opus") {
            AudioCodec::Opus
        } else if codec.starts_with("flac") {
            AudioCodec::Flac
        } else {
            AudioCodec::Unknown
        }
    }
}

impl std::fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioCodec::Aac => write!(f, "AAC"),
            AudioCodec::Ac3 => write!(f, "AC-3"),
            AudioCodec::Eac3 => write!(f, "E-AC-3"),
            AudioCodec::Opus => write!(f, "Opus"),
            AudioCodec::Flac => write!(f, "FLAC"),
            AudioCodec::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Decoded frame dimensions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns quality tier name
    pub fn quality_name(&self) -> &'static str {
        match self.height {
            0..=240 => "240p",
            241..=360 => "360p",
            361..=480 => "480p",
            481..=720 => "720p",
            721..=1080 => "1080p",
            1081..=1440 => "1440p",
            _ => "4K",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    /// Parses `WIDTHxHEIGHT`, e.g. `1280x720`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (width, height) = s
            .trim()
            .split_once('x')
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let width = width
            .trim()
            .parse()
            .map_err(|_| format!("invalid width in '{}'", s))?;
        let height = height
            .trim()
            .parse()
            .map_err(|_| format!("invalid height in '{}'", s))?;
        Ok(Self { width, height })
    }
}

/// One encoded rendition of the media asset, as reported to callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityLevel {
    /// Bandwidth in bits per second
    pub bitrate: u64,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frames per second, 0 when unknown
    pub fps: f64,
    /// Audio codec identifier, empty when unknown
    pub audio_codec: String,
    /// Video codec identifier, empty when unknown
    pub video_codec: String,
}

impl QualityLevel {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// True when this level was encoded at the given frame dimensions
    pub fn matches_dimensions(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    pub fn video_codec_family(&self) -> VideoCodec {
        VideoCodec::from_identifier(&self.video_codec)
    }

    pub fn audio_codec_family(&self) -> AudioCodec {
        AudioCodec::from_identifier(&self.audio_codec)
    }
}

/// A quality level together with the locator line that followed it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    #[serde(flatten)]
    pub level: QualityLevel,
    /// Variant playlist locator, verbatim. `None` when the declaration was the last line.
    pub url: Option<String>,
}

impl PlaylistEntry {
    /// Resolve the locator against the master playlist URL
    pub fn resolve_against(&self, base: &Url) -> Option<Url> {
        self.url.as_deref().and_then(|u| base.join(u).ok())
    }
}

/// Quality levels in manifest order. Not deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestTable {
    entries: Vec<PlaylistEntry>,
}

impl ManifestTable {
    pub fn new(entries: Vec<PlaylistEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlaylistEntry> {
        self.entries.iter()
    }

    /// First entry in manifest order with exactly these dimensions.
    ///
    /// There is no nearest-resolution fallback: a sample taken mid-switch
    /// simply finds nothing.
    pub fn find_by_dimensions(&self, width: u32, height: u32) -> Option<&PlaylistEntry> {
        self.entries
            .iter()
            .find(|e| e.level.matches_dimensions(width, height))
    }
}

impl From<Vec<PlaylistEntry>> for ManifestTable {
    fn from(entries: Vec<PlaylistEntry>) -> Self {
        Self::new(entries)
    }
}

impl<'a> IntoIterator for &'a ManifestTable {
    type Item = &'a PlaylistEntry;
    type IntoIter = std::slice::Iter<'a, PlaylistEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Monitor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitorPhase {
    /// Construction was rejected; the monitor never runs
    Uninitialized,
    /// Fetching and parsing the master playlist
    Loading,
    /// The playlist yielded no levels; nothing will be reported
    IdleNoData,
    /// Sampling the playback surface on every tick
    Polling,
    /// Stopped by the caller. Terminal.
    Stopped,
}

impl MonitorPhase {
    /// Check if transition to target phase is valid
    pub fn can_transition_to(&self, target: MonitorPhase) -> bool {
        use MonitorPhase::*;
        matches!(
            (self, target),
            (Uninitialized, Loading) |
            (Loading, IdleNoData) | (Loading, Polling) | (Loading, Stopped) |
            (IdleNoData, Stopped) |
            (Polling, Stopped)
        )
    }

    /// True while the monitor can still report levels
    pub fn is_active(&self) -> bool {
        matches!(self, MonitorPhase::Loading | MonitorPhase::Polling)
    }
}

impl std::fmt::Display for MonitorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorPhase::Uninitialized => write!(f, "uninitialized"),
            MonitorPhase::Loading => write!(f, "loading"),
            MonitorPhase::IdleNoData => write!(f, "idle-no-data"),
            MonitorPhase::Polling => write!(f, "polling"),
            MonitorPhase::Stopped => write!(f, "stopped"),
        }
    }
}

/// Default sampling period
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Sampling period in milliseconds
    pub poll_interval_ms: u64,
    /// Timeout for the manifest request (None = wait indefinitely)
    pub request_timeout_ms: Option<u64>,
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(bitrate: u64, width: u32, height: u32) -> PlaylistEntry {
        PlaylistEntry {
            level: QualityLevel {
                bitrate,
                width,
                height,
                ..Default::default()
            },
            url: Some(format!("{}p.m3u8", height)),
        }
    }

    #[test]
    fn test_resolution_from_str() {
        assert_eq!("1280x720".parse::<Resolution>(), Ok(Resolution::new(1280, 720)));
        assert_eq!(" 640 x 360 ".parse::<Resolution>(), Ok(Resolution::new(640, 360)));
        assert!("1280".parse::<Resolution>().is_err());
        assert!("wide x tall".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_find_by_dimensions_returns_first_in_manifest_order() {
        let table = ManifestTable::new(vec![
            entry(1_000_000, 640, 360),
            entry(2_000_000, 1280, 720),
            entry(3_000_000, 1280, 720),
        ]);

        let found = table.find_by_dimensions(1280, 720).unwrap();
        assert_eq!(found.level.bitrate, 2_000_000);
        assert!(table.find_by_dimensions(1281, 720).is_none());
    }

    #[test]
    fn test_resolve_against_base() {
        let base = Url::parse("https://cdn.example.com/vod/master.m3u8").unwrap();
        let resolved = entry(1, 640, 360).resolve_against(&base).unwrap();
        assert_eq!(resolved.as_str(), "https://cdn.example.com/vod/360p.m3u8");

        let missing = PlaylistEntry::default();
        assert!(missing.resolve_against(&base).is_none());
    }

    #[test]
    fn test_phase_transitions() {
        use MonitorPhase::*;
        assert!(Uninitialized.can_transition_to(Loading));
        assert!(Loading.can_transition_to(Polling));
        assert!(Loading.can_transition_to(Stopped));
        assert!(Polling.can_transition_to(Stopped));

        assert!(!Stopped.can_transition_to(Polling));
        assert!(!IdleNoData.can_transition_to(Polling));
        assert!(!Uninitialized.can_transition_to(Polling));
    }

    #[test]
    fn test_codec_families() {
        let level = QualityLevel {
            video_codec: "avc1.4d401f".into(),
            audio_codec: "mp4a.40.2".into(),
            ..Default::default()
        };
        assert_eq!(level.video_codec_family(), VideoCodec::H264);
        assert_eq!(level.audio_codec_family(), AudioCodec::Aac);
        assert_eq!(VideoCodec::from_identifier("hvc1.1.6.L93"), VideoCodec::H265);
        assert_eq!(VideoCodec::from_identifier(""), VideoCodec::Unknown);
    }
}
