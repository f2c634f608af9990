//! YouTube caption pipeline: URL recognition, yt-dlp adapter, per-video cache
//! and caption track selection.

pub mod cache;
pub mod captions;
pub mod client;
pub mod url;
pub mod ytdlp;

pub use cache::{CacheStore, CachedVideoInfo, Chapter};
pub use captions::{matches_language, merge_caption_maps, select_caption_track, CaptionTrack};
pub use client::YoutubeClient;
pub use url::{extract_video_id, find_youtube_url, is_youtube_url, VideoId};
pub use ytdlp::{SubtitleTool, YtDlp};

use crate::{YoutubeError, YoutubeResult};

/// Validate a YouTube URL and extract its video id
pub fn validate_url(url: &str) -> YoutubeResult<VideoId> {
    if !is_youtube_url(url) {
        return Err(YoutubeError::InvalidUrl(url.to_string()));
    }
    extract_video_id(url).ok_or_else(|| YoutubeError::InvalidUrl(url.to_string()))
}
