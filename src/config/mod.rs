use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::youtube::{CacheStore, YtDlp};

/// Name of the per-directory override file
pub const LOCAL_CONFIG_FILE: &str = "clipdrop.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache location and freshness
    pub cache: CacheConfig,

    /// yt-dlp invocation settings
    pub ytdlp: YtDlpConfig,

    /// Transcript output defaults
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Base cache directory (defaults to the user cache dir)
    pub dir: Option<PathBuf>,

    /// Days before cached video info is refetched
    pub info_ttl_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YtDlpConfig {
    /// Program name or path
    pub program: String,

    /// Timeout for listing and info queries
    pub query_timeout_secs: u64,

    /// Timeout for subtitle downloads
    pub download_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Preferred caption language when --lang is not given
    pub default_language: Option<String>,

    /// Format used when neither --format nor a known extension is given
    pub default_format: OutputFormat,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            info_ttl_days: CacheStore::DEFAULT_INFO_TTL_DAYS,
        }
    }
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            query_timeout_secs: YtDlp::DEFAULT_QUERY_TIMEOUT.as_secs(),
            download_timeout_secs: YtDlp::DEFAULT_DOWNLOAD_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Load configuration from the first config file found, or defaults.
    ///
    /// Never writes a config file.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get configuration file path: `./clipdrop.yaml`, else the user config dir
    pub fn config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("clipdrop").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.info_ttl()?;
        if self.ytdlp.program.trim().is_empty() {
            anyhow::bail!("ytdlp.program cannot be empty");
        }
        if self.ytdlp.query_timeout_secs == 0 || self.ytdlp.download_timeout_secs == 0 {
            anyhow::bail!("yt-dlp timeouts must be greater than zero");
        }
        Ok(())
    }

    /// Freshness window for cached video info
    pub fn info_ttl(&self) -> Result<Duration> {
        let days = self.cache.info_ttl_days;
        if days <= 0 {
            anyhow::bail!("cache.info_ttl_days must be positive");
        }
        Duration::try_days(days)
            .with_context(|| format!("cache.info_ttl_days is out of range: {}", days))
    }

    /// Base cache directory: `override_dir`, the configured dir, or the default
    pub fn cache_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.cache.dir.clone())
            .unwrap_or_else(CacheStore::default_base_dir)
    }

    /// Cache store rooted at [`Config::cache_dir`]
    pub fn cache_store(&self, override_dir: Option<&Path>) -> Result<CacheStore> {
        Ok(CacheStore::new(self.cache_dir(override_dir)).with_info_ttl(self.info_ttl()?))
    }

    /// yt-dlp adapter built from the configured program and timeouts
    pub fn ytdlp(&self) -> YtDlp {
        YtDlp::with_program(&self.ytdlp.program).with_timeouts(
            std::time::Duration::from_secs(self.ytdlp.query_timeout_secs),
            std::time::Duration::from_secs(self.ytdlp.download_timeout_secs),
        )
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        match Self::config_path() {
            Some(path) if path.exists() => println!("  Config File: {}", path.display()),
            Some(path) => println!("  Config File: {} (not present, using defaults)", path.display()),
            None => println!("  Config File: (none)"),
        }
        println!("  Cache Dir: {}", self.cache_dir(None).display());
        println!("  Info TTL: {} days", self.cache.info_ttl_days);
        println!("  yt-dlp Program: {}", self.ytdlp.program);
        println!(
            "  Timeouts: {}s query, {}s download",
            self.ytdlp.query_timeout_secs, self.ytdlp.download_timeout_secs
        );
        if let Some(lang) = &self.output.default_language {
            println!("  Default Language: {}", lang);
        }
        println!("  Default Format: {}", self.output.default_format);
    }
}
