use serde::{Deserialize, Serialize};

pub mod vtt;

pub use vtt::{parse_timestamp, parse_vtt};

/// A single timed caption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    /// Start time in milliseconds
    pub start_ms: u64,

    /// End time in milliseconds, never before `start_ms`
    pub end_ms: u64,

    /// Caption text, one or more lines joined by `\n`
    pub text: String,
}

impl Cue {
    pub fn new(start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms: end_ms.max(start_ms),
            text: text.into(),
        }
    }
}

/// Errors raised while reading subtitle files
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
