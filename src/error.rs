use thiserror::Error;

/// Failures surfaced while turning a URL into a transcript
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// No 11-character video id could be isolated from the input
    #[error("invalid YouTube URL: {0}")]
    InvalidUrl(String),

    /// Upstream reports that the video does not exist
    #[error("video not found: {0}")]
    VideoNotFound(String),

    /// No caption source produced usable text
    #[error("no transcript available: {0}")]
    NoTranscript(String),

    /// Network or parse failure while talking to an upstream source
    #[error("transport error: {0}")]
    Transport(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TranscriptError {
    /// Whether the resolver may move on to the next strategy after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TranscriptError::Transport(_) | TranscriptError::NoTranscript(_))
    }
}

impl From<reqwest::Error> for TranscriptError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranscriptError::Transport("upstream request timed out".to_string())
        } else {
            TranscriptError::Transport(e.to_string())
        }
    }
}

impl From<eyre::Report> for TranscriptError {
    fn from(e: eyre::Report) -> Self {
        TranscriptError::Transport(format!("{e:#}"))
    }
}
