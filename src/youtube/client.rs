use chrono::Utc;
use std::path::PathBuf;

use super::captions::merge_caption_maps;
use super::ytdlp::{parse_subtitle_maps, parse_video_fields};
use super::{validate_url, CacheStore, CachedVideoInfo, CaptionTrack, SubtitleTool, YtDlp};
use crate::{YoutubeError, YoutubeResult};

/// Caption listing, video info and subtitle downloads backed by the cache
pub struct YoutubeClient<T: SubtitleTool = YtDlp> {
    tool: T,
    cache: CacheStore,
}

impl<T: SubtitleTool> YoutubeClient<T> {
    pub fn new(tool: T, cache: CacheStore) -> Self {
        Self { tool, cache }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn tool_available(&self) -> (bool, String) {
        self.tool.tool_available()
    }

    fn ensure_tool(&self) -> YoutubeResult<()> {
        let (available, message) = self.tool.tool_available();
        tracing::debug!("{}", message);
        if available {
            Ok(())
        } else {
            Err(YoutubeError::YtDlpNotFound)
        }
    }

    /// List caption tracks, manual ones first for each language code.
    ///
    /// Never returns an empty listing.
    pub async fn list_captions(&self, url: &str) -> YoutubeResult<Vec<CaptionTrack>> {
        let video_id = validate_url(url)?;
        self.ensure_tool()?;

        let stdout = self.tool.print_subtitle_maps(url).await?;
        let Some((manual, automatic)) = parse_subtitle_maps(&stdout)? else {
            return Err(YoutubeError::NoCaptions(video_id.to_string()));
        };

        let captions = merge_caption_maps(&manual, &automatic);
        if captions.is_empty() {
            return Err(YoutubeError::NoCaptions(video_id.to_string()));
        }

        tracing::debug!("Found {} caption tracks for {}", captions.len(), video_id);
        Ok(captions)
    }

    /// Video info from the cache when fresh, otherwise from yt-dlp
    pub async fn fetch_video_info(&self, url: &str) -> YoutubeResult<CachedVideoInfo> {
        let video_id = validate_url(url)?;
        CacheStore::ensure_dir(&self.cache.resolve_dir(&video_id))?;

        if let Some(info) = self.cache.load_info(&video_id) {
            return Ok(info);
        }

        self.ensure_tool()?;
        let stdout = self.tool.print_video_fields(url).await?;
        let info = parse_video_fields(&stdout, &video_id, url, Utc::now())?;

        let path = self.cache.store_info(&video_id, &info)?;
        tracing::info!("Fetched video info for {}", video_id);
        tracing::debug!("Cached video info at {}", path.display());
        Ok(info)
    }

    /// Path of the VTT file for `lang`, downloading it on first use.
    ///
    /// An existing file is returned as-is without invoking yt-dlp.
    pub async fn fetch_vtt(&self, url: &str, lang: &str) -> YoutubeResult<PathBuf> {
        let video_id = validate_url(url)?;
        let video_dir = self.cache.resolve_dir(&video_id);
        CacheStore::ensure_dir(&video_dir)?;

        if let Some(path) = self.cache.cached_vtt(&video_id, lang) {
            tracing::debug!("Using cached subtitles {}", path.display());
            return Ok(path);
        }

        self.ensure_tool()?;
        let output_template = video_dir.join(format!("{}.%(lang)s.%(ext)s", video_id));
        self.tool
            .download_subtitles(url, lang, &output_template)
            .await?;

        let vtt_path = self.cache.vtt_path(&video_id, lang);
        if vtt_path.is_file() {
            tracing::info!("Downloaded {} subtitles for {}", lang, video_id);
            return Ok(vtt_path);
        }

        // yt-dlp may save a regional request under the base language code
        let base_lang = lang.split('-').next().unwrap_or(lang);
        let base_path = self.cache.vtt_path(&video_id, base_lang);
        if base_path != vtt_path && base_path.is_file() {
            tracing::debug!("Renaming {} to {}", base_path.display(), vtt_path.display());
            fs_err::rename(&base_path, &vtt_path)?;
            return Ok(vtt_path);
        }

        Err(YoutubeError::NoCaptions(format!("language: {}", lang)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::ytdlp::MockSubtitleTool;
    use crate::youtube::{Chapter, VideoId};
    use chrono::Duration;
    use mockall::predicate::eq;
    use tempfile::TempDir;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    const INFO_STDOUT: &str = concat!(
        "\"Test Video\"\n\"dQw4w9WgXcQ\"\n\"TestUser\"\n300\n\"20240101\"\n",
        "\"Description\"\n1000\n50\n",
        "[{\"title\": \"Introduction\", \"start_time\": 0}, {\"title\": \"Main Content\", \"start_time\": 60}]\n"
    );

    fn available_tool() -> MockSubtitleTool {
        let mut tool = MockSubtitleTool::new();
        tool.expect_tool_available()
            .returning(|| (true, "yt-dlp found at: /usr/bin/yt-dlp".to_string()));
        tool
    }

    fn client(tool: MockSubtitleTool, temp: &TempDir) -> YoutubeClient<MockSubtitleTool> {
        YoutubeClient::new(tool, CacheStore::new(temp.path()))
    }

    fn video_id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[test]
    fn test_tool_available_reports_the_tool_status() {
        let temp = TempDir::new().unwrap();
        let (available, message) = client(available_tool(), &temp).tool_available();
        assert!(available);
        assert!(message.contains("/usr/bin/yt-dlp"));
    }

    #[tokio::test]
    async fn test_list_captions_merges_manual_and_auto() {
        let temp = TempDir::new().unwrap();
        let mut tool = available_tool();
        tool.expect_print_subtitle_maps()
            .with(eq(URL))
            .times(1)
            .returning(|_| {
                Ok(concat!(
                    "{\"en\": [{\"ext\": \"vtt\", \"name\": \"English\"}]}\n",
                    "{\"en\": [{\"ext\": \"vtt\", \"name\": \"English\"}], \"fr\": [{\"ext\": \"vtt\", \"name\": \"French\"}]}\n"
                )
                .to_string())
            });

        let captions = client(tool, &temp).list_captions(URL).await.unwrap();
        assert_eq!(
            captions,
            vec![
                CaptionTrack::new("en", "English", false),
                CaptionTrack::new("fr", "French (auto-generated)", true),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_captions_empty_is_an_error() {
        let temp = TempDir::new().unwrap();
        let mut tool = available_tool();
        tool.expect_print_subtitle_maps()
            .returning(|_| Ok("{}\n{}\n".to_string()));

        let err = client(tool, &temp).list_captions(URL).await.unwrap_err();
        assert!(matches!(err, YoutubeError::NoCaptions(id) if id == "dQw4w9WgXcQ"));
    }

    #[tokio::test]
    async fn test_list_captions_invalid_url() {
        let temp = TempDir::new().unwrap();
        let mut tool = MockSubtitleTool::new();
        tool.expect_tool_available().times(0);
        tool.expect_print_subtitle_maps().times(0);

        let err = client(tool, &temp)
            .list_captions("https://vimeo.com/123456789")
            .await
            .unwrap_err();
        assert!(matches!(err, YoutubeError::InvalidUrl(url) if url.contains("vimeo")));
    }

    #[tokio::test]
    async fn test_list_captions_tool_missing() {
        let temp = TempDir::new().unwrap();
        let mut tool = MockSubtitleTool::new();
        tool.expect_tool_available()
            .returning(|| (false, "yt-dlp not found".to_string()));
        tool.expect_print_subtitle_maps().times(0);

        let err = client(tool, &temp).list_captions(URL).await.unwrap_err();
        assert!(matches!(err, YoutubeError::YtDlpNotFound));
    }

    #[tokio::test]
    async fn test_list_captions_tool_error_propagates() {
        let temp = TempDir::new().unwrap();
        let mut tool = available_tool();
        tool.expect_print_subtitle_maps().returning(|_| {
            Err(YoutubeError::Failed(
                "Failed to fetch video info: ERROR: Video unavailable".to_string(),
            ))
        });

        let err = client(tool, &temp).list_captions(URL).await.unwrap_err();
        assert!(err.is_tool_failure());
        assert!(err.to_string().contains("Failed to fetch video info"));
    }

    #[tokio::test]
    async fn test_fetch_video_info_fetches_and_caches() {
        let temp = TempDir::new().unwrap();
        let mut tool = available_tool();
        tool.expect_print_video_fields()
            .times(1)
            .returning(|_| Ok(INFO_STDOUT.to_string()));

        let client = client(tool, &temp);
        let info = client.fetch_video_info(URL).await.unwrap();
        assert_eq!(info.title, "Test Video");
        assert_eq!(info.url, URL);
        assert_eq!(
            info.chapters.as_deref().map(<[Chapter]>::len),
            Some(2)
        );
        assert!(client.cache().info_path(&video_id()).is_file());

        // second call is served from the cache
        let again = client.fetch_video_info(URL).await.unwrap();
        assert_eq!(again, info);
    }

    #[tokio::test]
    async fn test_fetch_video_info_recent_cache_skips_tool() {
        let temp = TempDir::new().unwrap();
        let cache = CacheStore::new(temp.path());
        let stdout = INFO_STDOUT;
        let mut cached = parse_video_fields(stdout, &video_id(), URL, Utc::now()).unwrap();
        cached.cached_at = Utc::now() - Duration::days(1);
        cached.title = "Cached Title".to_string();
        cache.store_info(&video_id(), &cached).unwrap();

        let mut tool = MockSubtitleTool::new();
        tool.expect_tool_available().times(0);
        tool.expect_print_video_fields().times(0);

        let info = YoutubeClient::new(tool, cache)
            .fetch_video_info(URL)
            .await
            .unwrap();
        assert_eq!(info.title, "Cached Title");
    }

    #[tokio::test]
    async fn test_fetch_video_info_stale_cache_refetches() {
        let temp = TempDir::new().unwrap();
        let cache = CacheStore::new(temp.path());
        let mut stale = parse_video_fields(INFO_STDOUT, &video_id(), URL, Utc::now()).unwrap();
        stale.cached_at = Utc::now() - Duration::days(8);
        stale.title = "Old Title".to_string();
        cache.store_info(&video_id(), &stale).unwrap();

        let mut tool = available_tool();
        tool.expect_print_video_fields()
            .times(1)
            .returning(|_| Ok(INFO_STDOUT.to_string()));

        let info = YoutubeClient::new(tool, cache.clone())
            .fetch_video_info(URL)
            .await
            .unwrap();
        assert_eq!(info.title, "Test Video");
        assert_eq!(cache.load_info(&video_id()).unwrap().title, "Test Video");
    }

    #[tokio::test]
    async fn test_fetch_vtt_cached_file_skips_tool() {
        let temp = TempDir::new().unwrap();
        let cache = CacheStore::new(temp.path());
        let path = cache.vtt_path(&video_id(), "en");
        CacheStore::ensure_dir(&cache.resolve_dir(&video_id())).unwrap();
        fs_err::write(&path, "WEBVTT\n\n00:00.000 --> 00:05.000\nHello world\n").unwrap();

        let mut tool = MockSubtitleTool::new();
        tool.expect_tool_available().times(0);
        tool.expect_download_subtitles().times(0);

        let fetched = YoutubeClient::new(tool, cache).fetch_vtt(URL, "en").await.unwrap();
        assert_eq!(fetched, path);
    }

    #[tokio::test]
    async fn test_fetch_vtt_downloads_to_canonical_path() {
        let temp = TempDir::new().unwrap();
        let mut tool = available_tool();
        tool.expect_download_subtitles()
            .times(1)
            .returning(|_, lang, template| {
                let template = template.to_string_lossy().to_string();
                assert!(template.ends_with("dQw4w9WgXcQ.%(lang)s.%(ext)s"));
                let path = template.replace("%(lang)s", lang).replace("%(ext)s", "vtt");
                fs_err::write(path, "WEBVTT\n").unwrap();
                Ok(())
            });

        let client = client(tool, &temp);
        let path = client.fetch_vtt(URL, "en").await.unwrap();
        assert_eq!(path, client.cache().vtt_path(&video_id(), "en"));
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn test_fetch_vtt_renames_base_language_file() {
        let temp = TempDir::new().unwrap();
        let mut tool = available_tool();
        tool.expect_download_subtitles()
            .with(eq(URL), eq("en-GB"), mockall::predicate::always())
            .returning(|_, _, template| {
                let path = template
                    .to_string_lossy()
                    .replace("%(lang)s", "en")
                    .replace("%(ext)s", "vtt");
                fs_err::write(path, "WEBVTT\n").unwrap();
                Ok(())
            });

        let client = client(tool, &temp);
        let path = client.fetch_vtt(URL, "en-GB").await.unwrap();
        assert_eq!(path, client.cache().vtt_path(&video_id(), "en-GB"));
        assert!(path.is_file());
        assert!(!client.cache().vtt_path(&video_id(), "en").exists());
    }

    #[tokio::test]
    async fn test_fetch_vtt_nothing_downloaded() {
        let temp = TempDir::new().unwrap();
        let mut tool = available_tool();
        tool.expect_download_subtitles().returning(|_, _, _| Ok(()));

        let err = client(tool, &temp).fetch_vtt(URL, "de").await.unwrap_err();
        assert!(matches!(err, YoutubeError::NoCaptions(msg) if msg.contains("de")));
    }

    #[tokio::test]
    async fn test_fetch_vtt_timeout_propagates() {
        let temp = TempDir::new().unwrap();
        let mut tool = available_tool();
        tool.expect_download_subtitles().returning(|_, _, _| {
            Err(YoutubeError::Timeout {
                operation: "downloading subtitles",
                timeout: std::time::Duration::from_secs(60),
            })
        });

        let err = client(tool, &temp).fetch_vtt(URL, "en").await.unwrap_err();
        assert!(err.is_tool_failure());
    }
}
