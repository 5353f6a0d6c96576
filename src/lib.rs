pub mod config;
pub mod data_api;
pub mod error;
pub mod output;
pub mod server;
pub mod strategy;
pub mod youtube;

#[cfg(test)]
mod test_support;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use error::TranscriptError;

/// Opaque 11-character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn new_unchecked(id: &str) -> Self {
        VideoId(id.to_string())
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single captioned line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptLine {
    pub text: String,
    pub start: f64,
    pub duration: Option<f64>,
}

impl TranscriptLine {
    pub fn new(text: impl Into<String>, start: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Raw output of one caption strategy, before normalization
#[derive(Debug, Clone, Default)]
pub struct Captions {
    pub title: Option<String>,
    pub language: Option<String>,
    pub lines: Vec<TranscriptLine>,
}

/// Normalized transcript for a video
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResult {
    pub video_id: VideoId,
    pub title: Option<String>,
    pub language: Option<String>,
    pub source: &'static str,
    pub lines: Vec<TranscriptLine>,
}

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?|shorts)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
    )
    .unwrap()
});

/// Extract video ID from the known YouTube URL shapes
pub fn extract_video_id(input: &str) -> Result<VideoId, TranscriptError> {
    let input = input.trim();

    VIDEO_ID_RE
        .captures(input)
        .map(|caps| VideoId(caps[1].to_string()))
        .ok_or_else(|| TranscriptError::InvalidUrl(format!("could not extract video ID from: {input}")))
}
