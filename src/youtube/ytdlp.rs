use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use super::{CachedVideoInfo, Chapter, VideoId};
use crate::{YoutubeError, YoutubeResult};

/// Fields requested for video info, one JSON value per output line
const VIDEO_FIELDS: [&str; 9] = [
    "title",
    "id",
    "uploader",
    "duration",
    "upload_date",
    "description",
    "view_count",
    "like_count",
    "chapters",
];

/// Raw operations of the external caption tool.
///
/// Implementations only run the tool and report its output; validation,
/// caching and merging live in [`super::YoutubeClient`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubtitleTool: Send + Sync {
    /// Whether the tool can be found, with a message for the user
    fn tool_available(&self) -> (bool, String);

    /// Print the manual and automatic subtitle maps, one JSON document per line
    async fn print_subtitle_maps(&self, url: &str) -> YoutubeResult<String>;

    /// Print the video info fields, one JSON value per line
    async fn print_video_fields(&self, url: &str) -> YoutubeResult<String>;

    /// Download only the VTT subtitle track for `lang` using an output template
    async fn download_subtitles(
        &self,
        url: &str,
        lang: &str,
        output_template: &Path,
    ) -> YoutubeResult<()>;
}

/// yt-dlp invoked as a subprocess
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    query_timeout: Duration,
    download_timeout: Duration,
}

impl YtDlp {
    pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new() -> Self {
        Self::with_program("yt-dlp")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            query_timeout: Self::DEFAULT_QUERY_TIMEOUT,
            download_timeout: Self::DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, query: Duration, download: Duration) -> Self {
        self.query_timeout = query;
        self.download_timeout = download;
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(["--quiet", "--no-warnings"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Run to completion, killing the child if it outlives `timeout`
    async fn execute(
        &self,
        mut command: Command,
        timeout: Duration,
        operation: &'static str,
    ) -> YoutubeResult<Output> {
        tracing::debug!("Running {:?}", command.as_std());

        match tokio::time::timeout(timeout, command.output()).await {
            Err(_) => Err(YoutubeError::Timeout {
                operation,
                timeout,
            }),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(YoutubeError::YtDlpNotFound)
            }
            Ok(Err(e)) => Err(YoutubeError::Failed(format!("Failed to run yt-dlp: {}", e))),
            Ok(Ok(output)) => Ok(output),
        }
    }

    async fn print(&self, url: &str, templates: &[&str]) -> YoutubeResult<String> {
        let mut command = self.command();
        command.arg("--skip-download");
        for template in templates {
            command.arg("--print").arg(template);
        }
        command.arg(url);

        let output = self
            .execute(command, self.query_timeout, "fetching video information")
            .await?;

        if !output.status.success() {
            return Err(YoutubeError::Failed(format!(
                "Failed to fetch video info: {}",
                stderr_message(&output)
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| YoutubeError::Failed(format!("yt-dlp printed invalid UTF-8: {}", e)))
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubtitleTool for YtDlp {
    fn tool_available(&self) -> (bool, String) {
        match which::which(&self.program) {
            Ok(path) => (true, format!("yt-dlp found at: {}", path.display())),
            Err(_) => (
                false,
                "yt-dlp not found. Install with: pip install yt-dlp".to_string(),
            ),
        }
    }

    async fn print_subtitle_maps(&self, url: &str) -> YoutubeResult<String> {
        self.print(url, &["%(subtitles)j", "%(automatic_captions)j"])
            .await
    }

    async fn print_video_fields(&self, url: &str) -> YoutubeResult<String> {
        let templates: Vec<String> = VIDEO_FIELDS
            .iter()
            .map(|field| format!("%({})j", field))
            .collect();
        let templates: Vec<&str> = templates.iter().map(String::as_str).collect();
        self.print(url, &templates).await
    }

    async fn download_subtitles(
        &self,
        url: &str,
        lang: &str,
        output_template: &Path,
    ) -> YoutubeResult<()> {
        let mut command = self.command();
        command
            .args([
                "--skip-download",
                "--write-sub",
                "--write-auto-sub",
                "--sub-format",
                "vtt",
                "--sub-lang",
                lang,
            ])
            .arg("-o")
            .arg(output_template)
            .arg(url);

        let output = self
            .execute(command, self.download_timeout, "downloading subtitles")
            .await?;

        if !output.status.success() {
            let message = stderr_message(&output);
            if message.to_lowercase().contains("subtitle") {
                return Err(YoutubeError::NoCaptions(format!("language: {}", lang)));
            }
            return Err(YoutubeError::Failed(format!(
                "Failed to download VTT: {}",
                message
            )));
        }

        Ok(())
    }
}

fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        "Unknown error".to_string()
    } else {
        stderr.to_string()
    }
}

/// Split the two subtitle maps out of `print_subtitle_maps` output.
///
/// Returns `None` when fewer than two lines were printed.
pub fn parse_subtitle_maps(
    stdout: &str,
) -> YoutubeResult<Option<(Map<String, Value>, Map<String, Value>)>> {
    let lines: Vec<&str> = stdout.trim().lines().collect();
    if lines.len() < 2 {
        return Ok(None);
    }

    let manual = parse_subtitle_map(lines[0], "subtitles")?;
    let automatic = parse_subtitle_map(lines[1], "automatic_captions")?;
    Ok(Some((manual, automatic)))
}

fn parse_subtitle_map(line: &str, field: &str) -> YoutubeResult<Map<String, Value>> {
    let line = line.trim();
    if line.is_empty() || line == "null" {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(YoutubeError::Failed(format!(
            "Unexpected {} value from yt-dlp: {}",
            field, other
        ))),
        Err(e) => Err(YoutubeError::Failed(format!(
            "Failed to parse {} from yt-dlp: {}",
            field, e
        ))),
    }
}

/// Build a [`CachedVideoInfo`] from `print_video_fields` output.
///
/// Null fields fall back to defaults; negative or fractional numbers are
/// clamped and truncated to whole values.
pub fn parse_video_fields(
    stdout: &str,
    video_id: &VideoId,
    url: &str,
    cached_at: DateTime<Utc>,
) -> YoutubeResult<CachedVideoInfo> {
    let lines: Vec<&str> = stdout.trim().lines().collect();
    if lines.len() < VIDEO_FIELDS.len() {
        return Err(YoutubeError::Failed(
            "Incomplete video information received".to_string(),
        ));
    }

    let values = lines[..VIDEO_FIELDS.len()]
        .iter()
        .map(|line| serde_json::from_str::<Value>(line.trim()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| YoutubeError::Failed(format!("Failed to parse video information: {}", e)))?;

    let chapters = match &values[8] {
        Value::Null => None,
        value => {
            let chapters: Vec<Chapter> = serde_json::from_value(value.clone()).map_err(|e| {
                YoutubeError::Failed(format!("Failed to parse video information: {}", e))
            })?;
            (!chapters.is_empty()).then_some(chapters)
        }
    };

    Ok(CachedVideoInfo {
        title: text_field(&values[0]).unwrap_or_else(|| "Unknown Title".to_string()),
        id: text_field(&values[1]).unwrap_or_else(|| video_id.to_string()),
        uploader: text_field(&values[2]).unwrap_or_else(|| "Unknown".to_string()),
        duration: count_field(&values[3]),
        upload_date: text_field(&values[4]),
        description: text_field(&values[5]).unwrap_or_default(),
        view_count: count_field(&values[6]),
        like_count: count_field(&values[7]),
        chapters,
        url: url.to_string(),
        cached_at,
    })
}

fn text_field(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn count_field(value: &Value) -> u64 {
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|n| n.max(0.0) as u64))
        .unwrap_or(0)
}
