use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::VideoId;

const INFO_FILE: &str = "info.json";

/// A chapter marker from the video description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,

    /// Start offset in seconds
    pub start_time: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
}

/// Video metadata as persisted in `<video_id>/info.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedVideoInfo {
    pub title: String,
    pub id: String,
    pub uploader: String,

    /// Duration in whole seconds
    pub duration: u64,

    /// `YYYYMMDD` as reported by yt-dlp
    pub upload_date: Option<String>,
    pub description: String,
    pub view_count: u64,
    pub like_count: u64,
    pub chapters: Option<Vec<Chapter>>,
    pub url: String,
    pub cached_at: DateTime<Utc>,
}

impl CachedVideoInfo {
    /// Whether the document was fetched longer than `ttl` before `now`
    pub fn is_stale_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.cached_at) > ttl
    }
}

/// Per-video cache directory holding `info.json` and `<id>.<lang>.vtt` files
#[derive(Debug, Clone)]
pub struct CacheStore {
    base_dir: PathBuf,
    info_ttl: Duration,
}

impl CacheStore {
    pub const DEFAULT_INFO_TTL_DAYS: i64 = 7;

    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            info_ttl: Duration::days(Self::DEFAULT_INFO_TTL_DAYS),
        }
    }

    pub fn with_info_ttl(mut self, ttl: Duration) -> Self {
        self.info_ttl = ttl;
        self
    }

    /// Default base directory: `<user cache dir>/clipdrop/youtube`
    pub fn default_base_dir() -> PathBuf {
        dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
            .unwrap_or_else(std::env::temp_dir)
            .join("clipdrop")
            .join("youtube")
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resolve_dir(&self, video_id: &VideoId) -> PathBuf {
        self.base_dir.join(video_id.as_str())
    }

    /// Create a directory and its parents if missing
    pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
        fs_err::create_dir_all(path)
    }

    pub fn info_path(&self, video_id: &VideoId) -> PathBuf {
        self.resolve_dir(video_id).join(INFO_FILE)
    }

    /// Canonical subtitle path: `<dir>/<id>.<lang>.vtt`
    pub fn vtt_path(&self, video_id: &VideoId, lang: &str) -> PathBuf {
        self.resolve_dir(video_id)
            .join(format!("{}.{}.vtt", video_id, lang))
    }

    /// Load a fresh info document.
    ///
    /// Missing, unreadable, unparsable and stale documents all read as a miss.
    pub fn load_info(&self, video_id: &VideoId) -> Option<CachedVideoInfo> {
        self.load_info_at(video_id, Utc::now())
    }

    pub fn load_info_at(&self, video_id: &VideoId, now: DateTime<Utc>) -> Option<CachedVideoInfo> {
        let path = self.info_path(video_id);
        if !path.exists() {
            tracing::debug!("No cached info for {}", video_id);
            return None;
        }

        let info = fs_err::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<CachedVideoInfo>(&content).map_err(|e| e.to_string())
            });

        match info {
            Ok(info) if info.is_stale_at(now, self.info_ttl) => {
                tracing::debug!(
                    "Cached info for {} is stale (cached at {})",
                    video_id,
                    info.cached_at
                );
                None
            }
            Ok(info) => {
                tracing::debug!("Using cached info for {}", video_id);
                Some(info)
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Persist an info document, replacing any previous one atomically
    pub fn store_info(
        &self,
        video_id: &VideoId,
        info: &CachedVideoInfo,
    ) -> std::io::Result<PathBuf> {
        let dir = self.resolve_dir(video_id);
        Self::ensure_dir(&dir)?;

        let json = serde_json::to_string_pretty(info)?;
        let mut file = tempfile::NamedTempFile::new_in(&dir)?;
        file.write_all(json.as_bytes())?;

        let path = dir.join(INFO_FILE);
        file.persist(&path).map_err(|e| e.error)?;
        Ok(path)
    }

    /// Existing subtitle file for the pair, regardless of its age
    pub fn cached_vtt(&self, video_id: &VideoId, lang: &str) -> Option<PathBuf> {
        let path = self.vtt_path(video_id, lang);
        path.is_file().then_some(path)
    }

    /// Drop everything cached for a video
    pub fn clear(&self, video_id: &VideoId) -> std::io::Result<()> {
        let dir = self.resolve_dir(video_id);
        if dir.exists() {
            fs_err::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}
