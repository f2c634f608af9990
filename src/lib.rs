//! ClipDrop - save YouTube caption tracks from the clipboard as transcripts
//!
//! This library recognizes YouTube URLs, lists and selects caption tracks through
//! yt-dlp, caches video info and VTT subtitles per video, and renders the captions
//! as plain text, SRT, VTT or JSON.

pub mod cli;
pub mod config;
pub mod output;
pub mod transcript;
pub mod utils;
pub mod youtube;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use transcript::{parse_vtt, Cue};
pub use youtube::{
    extract_video_id, is_youtube_url, select_caption_track, CacheStore, CachedVideoInfo,
    CaptionTrack, Chapter, SubtitleTool, VideoId, YoutubeClient, YtDlp,
};

/// Result type used by the application surface
pub type Result<T> = anyhow::Result<T>;

/// Error types surfaced by the YouTube caption pipeline
#[derive(thiserror::Error, Debug)]
pub enum YoutubeError {
    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("yt-dlp is not installed. Install it with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("No captions available for {0}")]
    NoCaptions(String),

    #[error("{0}")]
    Failed(String),

    #[error("Timeout while {operation} (after {timeout:?})")]
    Timeout {
        operation: &'static str,
        timeout: std::time::Duration,
    },

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl YoutubeError {
    /// Whether this error belongs to the generic tool-failure category
    /// (non-zero exit, unparsable output, or timeout).
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, YoutubeError::Failed(_) | YoutubeError::Timeout { .. })
    }
}

/// Result type for the YouTube caption pipeline
pub type YoutubeResult<T> = std::result::Result<T, YoutubeError>;
