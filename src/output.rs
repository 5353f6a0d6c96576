use serde::{Deserialize, Serialize};

use crate::{TranscriptLine, VideoId};

/// Fallback cue length for SRT when neither a duration nor a following line is known
const DEFAULT_SRT_CUE_SECS: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Timed,
    Json,
    Srt,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Timed => write!(f, "timed"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
        }
    }
}

/// One transcript line in the `json` output format
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub timestamp: String,
    pub link: String,
}

/// Rendered transcript body: a string, or a segment list for `json`
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Rendered {
    Text(String),
    Segments(Vec<Segment>),
}

/// Trim every line and drop the ones left empty
pub fn normalize_lines(lines: Vec<TranscriptLine>) -> Vec<TranscriptLine> {
    lines
        .into_iter()
        .filter_map(|line| {
            let text = line.text.trim();
            if text.is_empty() {
                None
            } else {
                Some(TranscriptLine {
                    text: text.to_string(),
                    ..line
                })
            }
        })
        .collect()
}

/// Decode HTML entities and percent-encoding found in caption text
pub fn decode_caption_text(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw).into_owned();
    urlencoding::decode(&decoded)
        .map(|text| text.into_owned())
        .unwrap_or(decoded)
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Format seconds as `MM:SS`, or `HH:MM:SS` once past the hour
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3600, total % 3600 / 60, total % 60);
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Link that opens the video at the given offset
pub fn watch_link(video_id: &VideoId, seconds: f64) -> String {
    format!("https://youtube.com/watch?v={video_id}&t={}s", seconds.max(0.0) as u64)
}

pub fn render(format: OutputFormat, video_id: &VideoId, lines: &[TranscriptLine]) -> Rendered {
    match format {
        OutputFormat::Text => Rendered::Text(render_text(lines)),
        OutputFormat::Timed => Rendered::Text(render_timed(lines)),
        OutputFormat::Json => Rendered::Segments(render_segments(video_id, lines)),
        OutputFormat::Srt => Rendered::Text(render_srt(lines)),
    }
}

/// Render transcript as plain text (one line per caption, no timestamps)
pub fn render_text(lines: &[TranscriptLine]) -> String {
    lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n")
}

/// Render transcript as `[m:ss] text` lines
pub fn render_timed(lines: &[TranscriptLine]) -> String {
    lines
        .iter()
        .map(|l| format!("[{}] {}", format_time(l.start), l.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_segments(video_id: &VideoId, lines: &[TranscriptLine]) -> Vec<Segment> {
    lines
        .iter()
        .map(|l| Segment {
            text: l.text.clone(),
            start: l.start,
            duration: l.duration,
            timestamp: format_timestamp(l.start),
            link: watch_link(video_id, l.start),
        })
        .collect()
}

pub fn render_srt(lines: &[TranscriptLine]) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let end = match line.duration {
            Some(d) => line.start + d,
            None => lines
                .get(i + 1)
                .map(|next| next.start)
                .filter(|&next| next > line.start)
                .unwrap_or(line.start + DEFAULT_SRT_CUE_SECS),
        };
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            srt_timestamp(line.start),
            srt_timestamp(end),
            line.text
        ));
    }
    out.trim_end().to_string()
}

fn srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let secs = (total_ms / 1000) % 60;
    let mins = (total_ms / 60_000) % 60;
    let hours = total_ms / 3_600_000;
    format!("{hours:02}:{mins:02}:{secs:02},{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lines() -> Vec<TranscriptLine> {
        vec![
            TranscriptLine::new("Hello world", 0.0).with_duration(1.5),
            TranscriptLine::new("This is a test", 1.5).with_duration(2.0),
        ]
    }

    #[test]
    fn test_normalize_lines() {
        let lines = vec![
            TranscriptLine::new("  Hello  ", 0.0),
            TranscriptLine::new("", 1.0),
            TranscriptLine::new("World", 2.0),
        ];
        let normalized = normalize_lines(lines);
        assert_eq!(render_text(&normalized), "Hello\nWorld");
        assert_eq!(normalized[1].start, 2.0);
    }

    #[test]
    fn test_normalize_drops_whitespace_only() {
        let lines = vec![TranscriptLine::new(" \n\t ", 0.0)];
        assert!(normalize_lines(lines).is_empty());
    }

    #[test]
    fn test_decode_caption_text() {
        assert_eq!(decode_caption_text("Don&#39;t stop"), "Don't stop");
        assert_eq!(decode_caption_text("&quot;quoted&quot;"), "\"quoted\"");
        assert_eq!(decode_caption_text("rock%20and%20roll"), "rock and roll");
        assert_eq!(decode_caption_text("100% sure"), "100% sure");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(125.4), "02:05");
        assert_eq!(format_timestamp(3599.9), "59:59");
        assert_eq!(format_timestamp(3725.0), "01:02:05");
        assert_eq!(format_timestamp(-4.0), "00:00");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(125.4), "2:05");
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.99), "0:59");
        assert_eq!(format_time(3725.0), "62:05");
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render_text(&sample_lines()), "Hello world\nThis is a test");
    }

    #[test]
    fn test_render_text_empty() {
        assert_eq!(render_text(&[]), "");
    }

    #[test]
    fn test_render_timed() {
        let lines = vec![
            TranscriptLine::new("Intro", 0.0),
            TranscriptLine::new("Later", 125.4),
        ];
        assert_eq!(render_timed(&lines), "[0:00] Intro\n[2:05] Later");
    }

    #[test]
    fn test_render_segments_links() {
        let id = VideoId::new_unchecked("dQw4w9WgXcQ");
        let lines = vec![TranscriptLine::new("Later", 125.4)];
        let segments = render_segments(&id, &lines);
        assert_eq!(segments[0].timestamp, "02:05");
        assert_eq!(segments[0].link, "https://youtube.com/watch?v=dQw4w9WgXcQ&t=125s");
        assert!(segments[0].duration.is_none());
    }

    #[test]
    fn test_render_srt() {
        let srt = render_srt(&sample_lines());
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:01,500\nHello world\n\n2\n00:00:01,500 --> 00:00:03,500\nThis is a test"
        );
    }

    #[test]
    fn test_render_srt_without_durations() {
        let lines = vec![TranscriptLine::new("a", 1.0), TranscriptLine::new("b", 4.0)];
        let srt = render_srt(&lines);
        assert!(srt.contains("00:00:01,000 --> 00:00:04,000"));
        assert!(srt.contains("00:00:04,000 --> 00:00:06,000"));
    }

    #[test]
    fn test_output_format_parse() {
        let f: OutputFormat = serde_json::from_str("\"srt\"").unwrap();
        assert_eq!(f, OutputFormat::Srt);
        assert!(serde_json::from_str::<OutputFormat>("\"xml\"").is_err());
    }
}
