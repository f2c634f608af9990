use anyhow::Result;
use serde::Serialize;

use crate::transcript::Cue;
use crate::youtube::Chapter;

/// Render milliseconds as `HH:MM:SS` followed by `separator` and milliseconds
fn timecode(ms: u64, separator: char) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, seconds, separator, millis)
}

/// SRT timecode, e.g. `00:01:02,500`
pub fn srt_timestamp(ms: u64) -> String {
    timecode(ms, ',')
}

/// WebVTT timecode, e.g. `00:01:02.500`
pub fn vtt_timestamp(ms: u64) -> String {
    timecode(ms, '.')
}

/// Whole-second chapter offset, e.g. `01:00:05`
pub fn chapter_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

fn chapter_lines(chapters: &[Chapter]) -> Vec<String> {
    chapters
        .iter()
        .map(|chapter| format!("{} {}", chapter_timestamp(chapter.start_time), chapter.title))
        .collect()
}

/// `CHAPTERS` header block, one line per chapter, ending with a blank line
pub fn format_chapter_header(chapters: &[Chapter]) -> String {
    if chapters.is_empty() {
        return String::new();
    }

    let mut header = String::from("CHAPTERS\n");
    for line in chapter_lines(chapters) {
        header.push_str(&line);
        header.push('\n');
    }
    header.push('\n');
    header
}

/// Plain transcript: cue text only, cues separated by blank lines
pub fn format_as_text(cues: &[Cue], chapters: &[Chapter]) -> String {
    let mut output = format_chapter_header(chapters);

    let body = cues
        .iter()
        .map(|cue| cue.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    output.push_str(&body);

    if !body.is_empty() {
        output.push('\n');
    }
    output
}

/// Format as SRT subtitle file
pub fn format_as_srt(cues: &[Cue], chapters: &[Chapter]) -> String {
    let mut output = format_chapter_header(chapters);

    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            srt_timestamp(cue.start_ms),
            srt_timestamp(cue.end_ms),
            cue.text
        ));
    }

    output
}

/// Format as WebVTT file; chapters go into a `NOTE` block so players ignore them
pub fn format_as_vtt(cues: &[Cue], chapters: &[Chapter]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    if !chapters.is_empty() {
        output.push_str("NOTE CHAPTERS\n");
        for line in chapter_lines(chapters) {
            output.push_str(&line);
            output.push('\n');
        }
        output.push('\n');
    }

    for cue in cues {
        output.push_str(&format!(
            "{} --> {}\n{}\n\n",
            vtt_timestamp(cue.start_ms),
            vtt_timestamp(cue.end_ms),
            cue.text
        ));
    }

    output
}

#[derive(Serialize)]
struct JsonTranscript<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    chapters: Option<&'a [Chapter]>,
    cues: &'a [Cue],
}

/// Format as pretty JSON with cues and optional chapters
pub fn format_as_json(cues: &[Cue], chapters: &[Chapter]) -> Result<String> {
    let document = JsonTranscript {
        chapters: (!chapters.is_empty()).then_some(chapters),
        cues,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cues() -> Vec<Cue> {
        vec![
            Cue::new(0, 5_000, "Hello world"),
            Cue::new(5_000, 7_250, "Second line\nwraps"),
        ]
    }

    fn sample_chapters() -> Vec<Chapter> {
        vec![
            Chapter {
                title: "Introduction".to_string(),
                start_time: 0.0,
                end_time: Some(60.0),
            },
            Chapter {
                title: "Main Content".to_string(),
                start_time: 3_725.4,
                end_time: None,
            },
        ]
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(srt_timestamp(0), "00:00:00,000");
        assert_eq!(srt_timestamp(3_723_456), "01:02:03,456");
        assert_eq!(vtt_timestamp(62_500), "00:01:02.500");
        assert_eq!(chapter_timestamp(3_725.9), "01:02:05");
        assert_eq!(chapter_timestamp(-3.0), "00:00:00");
    }

    #[test]
    fn test_format_as_srt() {
        let srt = format_as_srt(&sample_cues(), &[]);
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:05,000\nHello world\n\n"));
        assert!(srt.contains("2\n00:00:05,000 --> 00:00:07,250\nSecond line\nwraps\n\n"));
    }

    #[test]
    fn test_format_as_text() {
        assert_eq!(
            format_as_text(&sample_cues(), &[]),
            "Hello world\n\nSecond line\nwraps\n"
        );
        assert_eq!(format_as_text(&[], &[]), "");
    }

    #[test]
    fn test_chapter_header() {
        let text = format_as_text(&sample_cues(), &sample_chapters());
        assert!(text.starts_with(
            "CHAPTERS\n00:00:00 Introduction\n01:02:05 Main Content\n\nHello world"
        ));

        let srt = format_as_srt(&sample_cues(), &sample_chapters());
        assert!(srt.starts_with("CHAPTERS\n"));
        assert!(srt.contains("\n\n1\n00:00:00,000 --> 00:00:05,000"));
    }

    #[test]
    fn test_format_as_vtt() {
        let vtt = format_as_vtt(&sample_cues(), &sample_chapters());
        assert!(vtt.starts_with("WEBVTT\n\nNOTE CHAPTERS\n00:00:00 Introduction\n"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:05.000\nHello world\n"));

        // re-rendered VTT parses back to the same cues
        assert_eq!(crate::transcript::parse_vtt(&vtt), sample_cues());
    }

    #[test]
    fn test_format_as_json() {
        let json = format_as_json(&sample_cues(), &sample_chapters()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["cues"][0]["text"], "Hello world");
        assert_eq!(value["cues"][1]["end_ms"], 7_250);
        assert_eq!(value["chapters"][1]["title"], "Main Content");

        let plain = format_as_json(&sample_cues(), &[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&plain).unwrap();
        assert!(value.get("chapters").is_none());
    }
}
