use once_cell::sync::Lazy;
use regex::Regex;

use super::{Cue, TranscriptError};

/// Inline markup such as `<c>`, `</c>` and `<00:00:01.520>`
static INLINE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

const SKIPPED_BLOCKS: [&str; 4] = ["WEBVTT", "NOTE", "STYLE", "REGION"];

/// Parse a `HH:MM:SS.mmm` or `MM:SS.mmm` timestamp into milliseconds.
///
/// A comma is accepted as the decimal separator so SRT timestamps parse too.
pub fn parse_timestamp(raw: &str) -> Result<u64, TranscriptError> {
    let invalid = || TranscriptError::InvalidTimestamp(raw.to_string());
    let raw = raw.trim();

    let (clock, fraction) = raw.split_once(['.', ',']).unwrap_or((raw, "0"));
    if fraction.is_empty() || fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }
    // ".5" means 500 ms
    let millis: u64 = format!("{:0<3}", fraction).parse().map_err(|_| invalid())?;

    let parts = clock
        .split(':')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                Err(invalid())
            } else {
                part.parse::<u64>().map_err(|_| invalid())
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return Err(invalid()),
    };
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1000 + millis))
        .ok_or_else(invalid)
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn clean_line(line: &str) -> String {
    decode_entities(&INLINE_TAG.replace_all(line, "")).trim().to_string()
}

fn parse_timing(line: &str) -> Result<(u64, u64), TranscriptError> {
    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| TranscriptError::InvalidTimestamp(line.to_string()))?;
    // cue settings such as "align:start position:0%" follow the end time
    let end = rest.split_whitespace().next().unwrap_or_default();
    Ok((parse_timestamp(start)?, parse_timestamp(end)?))
}

fn parse_block(lines: &[&str]) -> Option<Cue> {
    let first = lines.first()?.trim_start_matches('\u{feff}');
    if SKIPPED_BLOCKS.iter().any(|kind| first.starts_with(kind)) && !first.contains("-->") {
        return None;
    }

    // an optional cue identifier may precede the timing line
    let timing_index = lines.iter().position(|line| line.contains("-->"))?;
    let (start_ms, end_ms) = match parse_timing(lines[timing_index]) {
        Ok(timing) => timing,
        Err(e) => {
            tracing::debug!("Skipping cue: {}", e);
            return None;
        }
    };

    let text = lines[timing_index + 1..]
        .iter()
        .map(|line| clean_line(line))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    (!text.is_empty()).then(|| Cue::new(start_ms, end_ms, text))
}

/// Parse a WebVTT document into cues, in file order.
///
/// Header, `NOTE`, `STYLE` and `REGION` blocks are skipped, inline tags are
/// stripped and cues left without text are dropped. Cues with malformed
/// timing are skipped rather than failing the whole document.
pub fn parse_vtt(input: &str) -> Vec<Cue> {
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");

    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    // YouTube puts whitespace-only lines inside cues, so only empty lines end a block
    for line in normalized.lines().chain(std::iter::once("")) {
        if line.is_empty() {
            if !block.is_empty() {
                cues.extend(parse_block(&block));
                block.clear();
            }
        } else {
            block.push(line);
        }
    }

    cues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:00:05.000"), Ok(5_000));
        assert_eq!(parse_timestamp("01:02:03.456"), Ok(3_723_456));
        assert_eq!(parse_timestamp("02:03.4"), Ok(123_400));
        assert_eq!(parse_timestamp("00:00:01,250"), Ok(1_250));
        assert_eq!(parse_timestamp(" 00:10 "), Ok(10_000));
        assert!(parse_timestamp("00:61.000").is_err());
        assert!(parse_timestamp("abc").is_err());
        assert!(parse_timestamp("00:00:01.2345").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_parse_timestamp_out_of_range() {
        assert!(parse_timestamp("99999999999999999:00:00.000").is_err());
        // largest hour count that fits, pushed over by the minutes
        assert!(parse_timestamp("5124095576031:00:00.000").is_err());
        assert!(parse_timestamp("5124095576030:59:59.999").is_err());
        assert!(parse_timestamp("5124095576030:00:00.000").is_ok());
        assert_eq!(parse_timestamp("100:00:00.000"), Ok(360_000_000));
    }

    #[test]
    fn test_parse_skips_cue_with_huge_hours() {
        let vtt = concat!(
            "WEBVTT\n\n",
            "99999999999999999:00:00.000 --> 99999999999999999:00:05.000\nbroken\n\n",
            "00:00:01.000 --> 00:00:02.000\nkept\n",
        );
        assert_eq!(parse_vtt(vtt), vec![Cue::new(1_000, 2_000, "kept")]);
    }

    #[test]
    fn test_parse_simple_document() {
        let vtt = "WEBVTT\n\n00:00.000 --> 00:05.000\nHello world\n";
        assert_eq!(parse_vtt(vtt), vec![Cue::new(0, 5_000, "Hello world")]);
    }

    #[test]
    fn test_parse_youtube_auto_captions() {
        let vtt = concat!(
            "WEBVTT\r\nKind: captions\r\nLanguage: en\r\n\r\n",
            "00:00:00.000 --> 00:00:02.510 align:start position:0%\r\n",
            " \r\n",
            "so<00:00:00.320><c> today</c><00:00:00.640><c> we're</c>\r\n\r\n",
            "00:00:02.510 --> 00:00:02.520 align:start position:0%\r\n",
            " \r\n\r\n",
        );
        assert_eq!(parse_vtt(vtt), vec![Cue::new(0, 2_510, "so today we're")]);
    }

    #[test]
    fn test_parse_skips_notes_identifiers_and_bad_timing() {
        let vtt = concat!(
            "WEBVTT - Some title\n\n",
            "NOTE this is a comment\nspanning lines\n\n",
            "STYLE\n::cue { color: red }\n\n",
            "intro\n00:00:01.000 --> 00:00:03.000\nFirst &amp; <b>second</b>\nline two\n\n",
            "00:00:xx.000 --> 00:00:04.000\nbroken\n\n",
            "00:00:05.000 --> 00:00:04.000\nbackwards\n",
        );
        assert_eq!(
            parse_vtt(vtt),
            vec![
                Cue::new(1_000, 3_000, "First & second\nline two"),
                Cue::new(5_000, 5_000, "backwards"),
            ]
        );
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_vtt("").is_empty());
        assert!(parse_vtt("WEBVTT\n\n").is_empty());
    }
}
