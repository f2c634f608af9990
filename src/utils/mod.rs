use anyhow::Result;

/// Longest filename stem produced by `sanitize_filename`
pub const MAX_FILENAME_LEN: usize = 200;

/// Fallback stem when nothing usable is left after sanitizing
pub const DEFAULT_FILENAME: &str = "transcript";

const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format duration in human-readable format
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Turn a video title into a filename stem.
///
/// Reserved characters and whitespace become `_`, leading and trailing
/// spaces and dots are trimmed, and the result is capped at
/// `MAX_FILENAME_LEN` characters.
pub fn sanitize_filename(title: &str) -> String {
    let trimmed = title.trim_matches(|c: char| c == ' ' || c == '.' || c.is_whitespace());

    let sanitized: String = trimmed
        .chars()
        .map(|c| {
            if RESERVED_CHARS.contains(&c) || c.is_whitespace() || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .take(MAX_FILENAME_LEN)
        .collect();

    let sanitized = sanitized.trim_end_matches('.').to_string();
    if sanitized.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        sanitized
    }
}

/// Reject filenames the filesystem would choke on
pub fn validate_filename(filename: &str) -> Result<()> {
    let name = filename.trim();
    if name.is_empty() {
        anyhow::bail!("Filename cannot be empty");
    }
    if name == "." || name == ".." {
        anyhow::bail!("Invalid filename: {}", filename);
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*') || c.is_control())
    {
        anyhow::bail!("Filename contains invalid character {:?}: {}", c, filename);
    }
    Ok(())
}
