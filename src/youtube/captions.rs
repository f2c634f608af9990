use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const AUTO_SUFFIX: &str = "(auto-generated)";

/// yt-dlp lists live chat replays next to real subtitle tracks
const LIVE_CHAT: &str = "live_chat";

/// A caption track offered for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Language code as reported by YouTube (e.g. "en", "en-US")
    pub language_code: String,

    /// Human-readable track name
    pub display_name: String,

    /// Machine-transcribed rather than authored
    pub is_auto_generated: bool,
}

impl CaptionTrack {
    pub fn new(
        language_code: impl Into<String>,
        display_name: impl Into<String>,
        is_auto_generated: bool,
    ) -> Self {
        Self {
            language_code: language_code.into(),
            display_name: display_name.into(),
            is_auto_generated,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        if self.is_auto_generated {
            "auto-generated"
        } else {
            "manual"
        }
    }
}

/// Merge yt-dlp's `subtitles` and `automatic_captions` maps into a listing
/// sorted by language code.
///
/// Automatic captions never override a manual track with the same code.
pub fn merge_caption_maps(
    manual: &Map<String, Value>,
    automatic: &Map<String, Value>,
) -> Vec<CaptionTrack> {
    let mut tracks: Vec<CaptionTrack> = manual
        .iter()
        .filter(|(code, _)| code.as_str() != LIVE_CHAT)
        .map(|(code, formats)| {
            let name = first_format_name(formats).unwrap_or(code);
            CaptionTrack::new(code.as_str(), name, false)
        })
        .collect();

    for (code, formats) in automatic {
        if code == LIVE_CHAT || manual.contains_key(code) {
            continue;
        }
        let name = first_format_name(formats).unwrap_or(code);
        let name = if name.to_lowercase().contains(AUTO_SUFFIX) {
            name.to_string()
        } else {
            format!("{} {}", name, AUTO_SUFFIX)
        };
        tracks.push(CaptionTrack::new(code.as_str(), name, true));
    }

    tracks.sort_by(|a, b| a.language_code.cmp(&b.language_code));
    tracks
}

fn first_format_name(formats: &Value) -> Option<&str> {
    formats.as_array()?.first()?.get("name")?.as_str()
}

fn normalize(code: &str) -> String {
    code.trim().to_lowercase()
}

fn base_code(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}

/// Pick the best caption track for an optional language preference.
///
/// Without a preference the first manual track wins, else the first track.
/// With one, tracks score 100 for an exact code match, 50 for a shared base
/// code, 1 otherwise, plus 10 when manual; ties keep listing order.
/// Only an empty listing yields `None`.
pub fn select_caption_track<'a>(
    captions: &'a [CaptionTrack],
    preferred_lang: Option<&str>,
) -> Option<&'a CaptionTrack> {
    let preferred = preferred_lang.map(normalize).filter(|lang| !lang.is_empty());

    let Some(preferred) = preferred else {
        return captions
            .iter()
            .find(|track| !track.is_auto_generated)
            .or_else(|| captions.first());
    };
    let preferred_base = base_code(&preferred);

    let score = |track: &CaptionTrack| -> u32 {
        let code = normalize(&track.language_code);
        let relation = if code == preferred {
            100
        } else if base_code(&code) == preferred_base {
            50
        } else {
            1
        };
        relation + if track.is_auto_generated { 0 } else { 10 }
    };

    let mut best: Option<(u32, &CaptionTrack)> = None;
    for track in captions {
        let track_score = score(track);
        if best.map_or(true, |(best_score, _)| track_score > best_score) {
            best = Some((track_score, track));
        }
    }
    best.map(|(_, track)| track)
}

/// Whether a track is in the requested language or one of its regional variants
pub fn matches_language(track: &CaptionTrack, preferred_lang: &str) -> bool {
    let preferred = normalize(preferred_lang);
    let code = normalize(&track.language_code);
    code == preferred || base_code(&code) == base_code(&preferred)
}
