use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every YouTube URL shape we accept, anchored on both ends
static YOUTUBE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:(?:https?:)?//)?",
        r"(?:(?:(?:www|m(?:usic)?)\.)?youtu(?:\.be|be\.com)/",
        r"(?:shorts/|live/|v/|e(?:mbed)?/|watch(?:/|\?(?:\S+=\S+&)*v=)",
        r"|oembed\?url=https?://(?:www|m(?:usic)?)\.youtube\.com/watch\?(?:\S+=\S+&)*v=",
        r"|attribution_link\?(?:\S+=\S+&)*u=(?:/|%2F)watch(?:\?|%3F)v(?:=|%3D))?",
        r"|www\.youtube-nocookie\.com/embed/)",
        r"([A-Za-z0-9_-]{11})(?:[?&#].*)?$",
    ))
    .expect("YouTube URL pattern is valid")
});

/// Video id patterns, tried in order
static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // youtu.be/ID
        r"(?i)youtu\.be/([A-Za-z0-9_-]{11})",
        // watch?v=ID, with other query parameters around it
        r"(?i)[?&]v=([A-Za-z0-9_-]{11})(?:[&#]|$)",
        // /embed/ID and /v/ID
        r"(?i)(?:embed|v)/([A-Za-z0-9_-]{11})(?:[?&#]|$)",
        // /shorts/ID and /live/ID
        r"(?i)(?:shorts|live)/([A-Za-z0-9_-]{11})(?:[?&#]|$)",
        r"(?i)youtube-nocookie\.com/embed/([A-Za-z0-9_-]{11})(?:[?&#]|$)",
        // attribution_link?...&u=/watch?v=ID, possibly percent-encoded
        r"(?i)attribution_link\?.*u=(?:/|%2F)watch(?:\?|%3F)v(?:=|%3D)([A-Za-z0-9_-]{11})",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("video id pattern is valid"))
    .collect()
});

/// An 11-character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub const LEN: usize = 11;

    /// Accepts exactly 11 characters from `[A-Za-z0-9_-]`
    pub fn parse(id: &str) -> Option<Self> {
        let valid = id.len() == Self::LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        valid.then(|| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check whether a string is a YouTube video URL.
///
/// Accepts watch, `youtu.be`, `/embed/`, `/v/`, `/shorts/`, `/live/`, `music.`
/// and `m.` hosts, the no-cookie embed domain and attribution links, with or
/// without a scheme and with trailing query or fragment.
pub fn is_youtube_url(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && YOUTUBE_URL.is_match(url)
}

/// Extract the video id from a YouTube URL.
///
/// Does not validate the URL itself; callers combine this with [`is_youtube_url`].
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    VIDEO_ID_PATTERNS
        .iter()
        .chain(std::iter::once(&*YOUTUBE_URL))
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .and_then(|m| VideoId::parse(m.as_str()))
}

/// Find the first YouTube URL in free-form text such as clipboard contents
pub fn find_youtube_url(text: &str) -> Option<&str> {
    text.split_whitespace().find(|token| is_youtube_url(token))
}
