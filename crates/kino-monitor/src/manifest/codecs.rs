//! Audio/video assignment for `CODECS` identifiers
//!
//! HLS lists codecs without saying which track each belongs to, so the
//! assignment is a guess based on well-known identifier prefixes. Only the
//! first two identifiers are considered.

const VIDEO_SIGNATURES: &[&str] = &[
    "avc1", "avc3", "hvc1", "hev1", "dvh1", "dvhe", "vp09", "vp8", "av01",
];

const AUDIO_SIGNATURES: &[&str] = &["mp4a", "ac-3", "ec-3", "opus", "flac", "alac"];

/// Codec identifiers assigned to tracks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecAssignment {
    pub video: Option<String>,
    pub audio: Option<String>,
}

impl CodecAssignment {
    fn new(video: &str, audio: Option<&str>) -> Self {
        Self {
            video: Some(video.to_string()),
            audio: audio.map(str::to_string),
        }
    }
}

fn has_signature(codec: &str, signatures: &[&str]) -> bool {
    let codec = codec.to_ascii_lowercase();
    signatures.iter().any(|sig| codec.starts_with(sig))
}

pub fn looks_like_video(codec: &str) -> bool {
    has_signature(codec, VIDEO_SIGNATURES)
}

pub fn looks_like_audio(codec: &str) -> bool {
    has_signature(codec, AUDIO_SIGNATURES)
}

/// Split a `CODECS` value into its identifiers
pub fn split_codecs(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(|c| c.trim().trim_matches('"').trim())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Decide which identifier is video and which is audio.
///
/// Returns `None` when no rule applies; that is a normal outcome for codec
/// pairs the signature tables do not know.
pub fn guess_codecs(codecs: &[&str]) -> Option<CodecAssignment> {
    match *codecs {
        [] => None,
        [only] => Some(CodecAssignment::new(only, None)),
        [first, second, ..] => {
            if looks_like_video(first) {
                Some(CodecAssignment::new(first, Some(second)))
            } else if looks_like_video(second) {
                Some(CodecAssignment::new(second, Some(first)))
            } else if looks_like_audio(first) {
                Some(CodecAssignment::new(second, Some(first)))
            } else if looks_like_audio(second) {
                Some(CodecAssignment::new(first, Some(second)))
            } else {
                None
            }
        }
    }
}
