use anyhow::Result;
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::{OutputFormat, ParanoidMode};
use crate::transcript::Cue;
use crate::youtube::Chapter;

pub mod formatters;
pub mod redact;

pub use formatters::*;
pub use redact::{redact_secrets, REDACTED};

/// Errors raised while writing a transcript to disk
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("File already exists: {} (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Nothing to write: transcript is empty")]
    EmptyContent,

    #[error("Transcript contains {0} possible secret(s); not saved (use --paranoid redact)")]
    SecretsDetected(usize),

    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Render cues in the requested format, with optional chapter markers.
///
/// With a `paranoid` mode, cue texts are screened for secrets first. WebVTT
/// output is always written as downloaded.
pub fn render(
    cues: &[Cue],
    format: &OutputFormat,
    chapters: &[Chapter],
    paranoid: Option<ParanoidMode>,
) -> Result<String> {
    let cues: Cow<'_, [Cue]> = match paranoid {
        Some(mode) if *format != OutputFormat::Vtt => Cow::Owned(screen_cues(cues, mode)?),
        _ => Cow::Borrowed(cues),
    };

    let content = match format {
        OutputFormat::Text => format_as_text(&cues, chapters),
        OutputFormat::Srt => format_as_srt(&cues, chapters),
        OutputFormat::Vtt => format_as_vtt(&cues, chapters),
        OutputFormat::Json => format_as_json(&cues, chapters)?,
    };
    Ok(content)
}

fn screen_cues(cues: &[Cue], mode: ParanoidMode) -> Result<Vec<Cue>, OutputError> {
    let mut found = 0;
    let redacted: Vec<Cue> = cues
        .iter()
        .map(|cue| {
            let (text, count) = redact_secrets(&cue.text);
            found += count;
            Cue::new(cue.start_ms, cue.end_ms, text)
        })
        .collect();

    match mode {
        _ if found == 0 => Ok(redacted),
        ParanoidMode::Redact => {
            tracing::info!("Redacted {} possible secret(s)", found);
            Ok(redacted)
        }
        ParanoidMode::Block => Err(OutputError::SecretsDetected(found)),
        ParanoidMode::Warn => {
            tracing::warn!("Transcript contains {} possible secret(s)", found);
            Ok(cues.to_vec())
        }
    }
}

/// Write content to `path` atomically.
///
/// Parent directories are created as needed. An existing file is only
/// replaced when `force` is set.
pub fn save_to_file(path: &Path, content: &str, force: bool) -> Result<(), OutputError> {
    if content.trim().is_empty() {
        return Err(OutputError::EmptyContent);
    }
    if path.exists() && !force {
        return Err(OutputError::AlreadyExists(path.to_path_buf()));
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs_err::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;

    if force {
        temp.persist(path).map_err(|e| OutputError::Io(e.error))?;
    } else {
        temp.persist_noclobber(path).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                OutputError::AlreadyExists(path.to_path_buf())
            } else {
                OutputError::Io(e.error)
            }
        })?;
    }

    tracing::debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
