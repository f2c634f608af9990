use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "clipdrop",
    about = "Save YouTube captions from the clipboard as transcripts",
    version,
    long_about = "Pipe a YouTube URL from the clipboard (or pass --url) to fetch its captions with yt-dlp and save them as plain text, SRT, WebVTT or JSON. Video info and subtitles are cached per video."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download captions for a YouTube video and save them as a transcript
    Youtube {
        /// Output file (defaults to the video title; format inferred from the extension)
        #[arg(value_name = "FILENAME")]
        filename: Option<PathBuf>,

        /// YouTube URL (read from stdin if not given, e.g. `pbpaste | clipdrop youtube`)
        #[arg(short, long, value_name = "URL")]
        url: Option<String>,

        /// Preferred caption language code (e.g. en, en-US, fr)
        #[arg(short, long, value_name = "LANG")]
        lang: Option<String>,

        /// Output format (overrides the filename extension)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Add chapter markers when the video has chapters
        #[arg(long)]
        chapters: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,

        /// Check transcript text for secrets before saving (not applied to vtt)
        #[arg(long, value_enum, value_name = "MODE")]
        paranoid: Option<ParanoidMode>,

        /// Drop cached info and subtitles for this video before fetching
        #[arg(long)]
        refresh: bool,

        /// Cache directory (overrides the configured one)
        #[arg(long, value_name = "DIR", env = "CLIPDROP_CACHE_DIR")]
        cache_dir: Option<PathBuf>,
    },

    /// List the caption tracks available for a YouTube video
    Captions {
        /// YouTube URL (read from stdin if not given)
        #[arg(short, long, value_name = "URL")]
        url: Option<String>,
    },

    /// Check that yt-dlp is installed
    Check,

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text
    #[default]
    Text,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
    /// JSON with cue timings
    Json,
}

impl OutputFormat {
    /// Format named by a filename extension, if any
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("srt") => Some(OutputFormat::Srt),
            Some("vtt") => Some(OutputFormat::Vtt),
            Some("json") => Some(OutputFormat::Json),
            Some("txt") | Some("text") => Some(OutputFormat::Text),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
            OutputFormat::Json => "json",
        }
    }
}

/// What to do when a transcript contains something that looks like a secret
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParanoidMode {
    /// Replace secrets with [REDACTED]
    Redact,
    /// Refuse to save the transcript
    Block,
    /// Log a warning and save unchanged
    Warn,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Vtt => write!(f, "vtt"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
