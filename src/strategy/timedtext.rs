use async_trait::async_trait;
use log::debug;

use super::CaptionStrategy;
use crate::youtube::{USER_AGENT, fetch_text, parse_caption_xml};
use crate::{Captions, TranscriptError, VideoId};

/// Last-resort caption fetch from the public timed-text endpoint
///
/// Asks for the uploaded track in the configured language first and, if that
/// comes back empty, for the auto-generated one (reported as `a.<lang>`).
/// The auto-generated request is best-effort; the endpoint does not document it.
pub struct TimedTextStrategy {
    client: reqwest::Client,
    base_url: String,
    language: String,
    user_agent: String,
}

/// Which flavour of caption track to ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackKind {
    Uploaded,
    AutoGenerated,
}

impl TimedTextStrategy {
    pub fn new(client: reqwest::Client, base_url: &str, language: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
            user_agent: USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    fn track_url(&self, video_id: &VideoId, kind: TrackKind) -> String {
        let mut url = format!("{}/api/timedtext?v={video_id}&lang={}", self.base_url, self.language);
        if kind == TrackKind::AutoGenerated {
            url.push_str("&kind=asr");
        }
        url
    }

    fn language_tag(&self, kind: TrackKind) -> String {
        match kind {
            TrackKind::Uploaded => self.language.clone(),
            TrackKind::AutoGenerated => format!("a.{}", self.language),
        }
    }
}

#[async_trait]
impl CaptionStrategy for TimedTextStrategy {
    fn name(&self) -> &'static str {
        "timedtext"
    }

    async fn fetch(&self, video_id: &VideoId) -> Result<Captions, TranscriptError> {
        for kind in [TrackKind::Uploaded, TrackKind::AutoGenerated] {
            // A missing track is not a missing video
            let url = self.track_url(video_id, kind);
            let body = match fetch_text(&self.client, &url, &self.user_agent, video_id.as_str()).await {
                Ok(body) => body,
                Err(TranscriptError::VideoNotFound(_)) => String::new(),
                Err(e) => return Err(e),
            };
            let lines = if body.trim().is_empty() {
                Vec::new()
            } else {
                parse_caption_xml(&body)?
            };

            if lines.iter().any(|l| !l.text.trim().is_empty()) {
                return Ok(Captions {
                    title: None,
                    language: Some(self.language_tag(kind)),
                    lines,
                });
            }

            debug!("No {:?} timed-text captions for video {video_id}", kind);
        }

        Ok(Captions::default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::Query;
    use axum::routing::get;

    use super::*;
    use crate::test_support::spawn_upstream;

    const XML: &str = r#"<transcript><text start="1.0" dur="2.0">auto words</text></transcript>"#;

    /// Upstream serving captions only for the requested kinds, recording every query
    async fn upstream(
        uploaded: Option<&'static str>,
        auto: Option<&'static str>,
    ) -> (String, Arc<Mutex<Vec<HashMap<String, String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let app = Router::new().route(
            "/api/timedtext",
            get(move |Query(q): Query<HashMap<String, String>>| {
                let log = log.clone();
                async move {
                    let is_auto = q.get("kind").map(String::as_str) == Some("asr");
                    log.lock().unwrap().push(q);
                    if is_auto { auto.unwrap_or("") } else { uploaded.unwrap_or("") }
                }
            }),
        );
        (spawn_upstream(app).await, seen)
    }

    #[tokio::test]
    async fn test_uploaded_track_used_first() {
        let (base, seen) = upstream(Some(XML), Some(XML)).await;
        let strategy = TimedTextStrategy::new(reqwest::Client::new(), &base, "en");

        let captions = strategy.fetch(&VideoId::new_unchecked("dQw4w9WgXcQ")).await.unwrap();
        assert_eq!(captions.language.as_deref(), Some("en"));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_auto_generated_attempted_when_primary_empty() {
        let (base, seen) = upstream(None, Some(XML)).await;
        let strategy = TimedTextStrategy::new(reqwest::Client::new(), &base, "en");

        let captions = strategy.fetch(&VideoId::new_unchecked("dQw4w9WgXcQ")).await.unwrap();
        assert_eq!(captions.language.as_deref(), Some("a.en"));
        assert_eq!(captions.lines[0].text, "auto words");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].get("lang").map(String::as_str), Some("en"));
        assert!(seen[0].get("kind").is_none());
        assert_eq!(seen[1].get("kind").map(String::as_str), Some("asr"));
    }

    #[tokio::test]
    async fn test_nothing_available_is_empty() {
        let (base, seen) = upstream(None, None).await;
        let strategy = TimedTextStrategy::new(reqwest::Client::new(), &base, "en");

        let captions = strategy.fetch(&VideoId::new_unchecked("dQw4w9WgXcQ")).await.unwrap();
        assert!(captions.lines.is_empty());
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_configured_user_agent_is_sent() {
        let agents = Arc::new(Mutex::new(Vec::new()));
        let log = agents.clone();
        let app = Router::new().route(
            "/api/timedtext",
            get(move |headers: axum::http::HeaderMap| {
                let log = log.clone();
                async move {
                    let agent = headers
                        .get(axum::http::header::USER_AGENT)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    log.lock().unwrap().push(agent);
                    XML
                }
            }),
        );
        let base = spawn_upstream(app).await;

        let strategy = TimedTextStrategy::new(reqwest::Client::new(), &base, "en").with_user_agent("ytscribe-test/1.0");
        strategy.fetch(&VideoId::new_unchecked("dQw4w9WgXcQ")).await.unwrap();
        assert_eq!(agents.lock().unwrap().as_slice(), ["ytscribe-test/1.0"]);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_recoverable() {
        let strategy = TimedTextStrategy::new(reqwest::Client::new(), "http://127.0.0.1:1", "en");
        let err = strategy.fetch(&VideoId::new_unchecked("dQw4w9WgXcQ")).await.unwrap_err();
        assert!(err.is_recoverable());
    }
}
