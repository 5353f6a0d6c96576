use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use super::CaptionStrategy;
use crate::youtube::{USER_AGENT, extract_embedded_json, fetch_text, formatted_text, parse_caption_xml};
use crate::{Captions, TranscriptError, TranscriptLine, VideoId};

/// Scrapes the watch page: embedded transcript cues first, caption tracks second
pub struct WatchPageStrategy {
    client: reqwest::Client,
    base_url: String,
    language: String,
    user_agent: String,
}

/// A caption track listed in the player response
#[derive(Debug, Clone, PartialEq)]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    auto_generated: bool,
}

impl WatchPageStrategy {
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
}

#[async_trait]
impl CaptionStrategy for WatchPageStrategy {
    fn name(&self) -> &'static str {
        "watch-page"
    }

    async fn fetch(&self, video_id: &VideoId) -> Result<Captions, TranscriptError> {
        let watch_url = format!("{}/watch?v={video_id}", self.base_url);
        let html = fetch_text(&self.client, &watch_url, &self.user_agent, video_id.as_str()).await?;

        let data = extract_embedded_json(&html, "ytInitialData");
        let player = extract_embedded_json(&html, "ytInitialPlayerResponse");

        if data.is_none() && player.is_none() {
            return Err(TranscriptError::Transport("could not find video data in watch page".to_string()));
        }

        if player.as_ref().is_some_and(is_missing_video) {
            return Err(TranscriptError::VideoNotFound(video_id.to_string()));
        }

        let title = data
            .as_ref()
            .and_then(page_title)
            .or_else(|| player.as_ref().and_then(player_title));

        if let Some(lines) = data.as_ref().and_then(transcript_cues) {
            debug!("Found {} embedded transcript cues", lines.len());
            return Ok(Captions {
                title,
                language: None,
                lines,
            });
        }

        let tracks = player.as_ref().map(caption_tracks).unwrap_or_default();
        let Some(track) = select_track(&tracks, &self.language) else {
            debug!("No {} caption track among {} tracks", self.language, tracks.len());
            return Ok(Captions {
                title,
                ..Captions::default()
            });
        };

        debug!(
            "Using caption track: lang={} auto_generated={}",
            track.language_code, track.auto_generated
        );

        let xml = fetch_text(&self.client, &track.base_url, &self.user_agent, video_id.as_str())
            .await
            .map_err(|e| match e {
                TranscriptError::VideoNotFound(_) => TranscriptError::Transport("caption track not found".to_string()),
                other => other,
            })?;
        let lines = parse_caption_xml(&xml)?;

        Ok(Captions {
            title,
            language: Some(track.language_code.clone()),
            lines,
        })
    }
}

fn is_missing_video(player: &Value) -> bool {
    player.pointer("/playabilityStatus/status").and_then(Value::as_str) == Some("ERROR")
}

fn page_title(data: &Value) -> Option<String> {
    data.pointer("/playerOverlays/playerOverlayRenderer/videoTitle")
        .and_then(formatted_text)
        .or_else(|| {
            data.pointer("/microformat/playerMicroformatRenderer/title")
                .and_then(formatted_text)
        })
        .filter(|t| !t.is_empty())
}

fn player_title(player: &Value) -> Option<String> {
    player
        .pointer("/videoDetails/title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Cue groups from the first engagement panel carrying a transcript renderer
fn transcript_cues(data: &Value) -> Option<Vec<TranscriptLine>> {
    let renderer = data
        .get("engagementPanels")?
        .as_array()?
        .iter()
        .find_map(|panel| panel.pointer("/engagementPanelSectionListRenderer/content/transcriptRenderer"))?;

    let groups = renderer
        .pointer("/body/transcriptBodyRenderer/cueGroups")?
        .as_array()?;

    let lines: Vec<TranscriptLine> = groups
        .iter()
        .filter_map(|group| {
            let cue = group.pointer("/transcriptCueGroupRenderer/cues/0/transcriptCueRenderer")?;
            let text = cue.get("cue").and_then(formatted_text)?;
            let start = millis(cue.get("startOffsetMs")?)? / 1000.0;
            let mut line = TranscriptLine::new(text, start);
            line.duration = cue.get("durationMs").and_then(millis).map(|ms| ms / 1000.0);
            Some(line)
        })
        .collect();

    if lines.is_empty() { None } else { Some(lines) }
}

/// Millisecond offsets arrive as strings or numbers
fn millis(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn caption_tracks(player: &Value) -> Vec<CaptionTrack> {
    player
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .and_then(Value::as_array)
        .map(|tracks| {
            tracks
                .iter()
                .filter_map(|t| {
                    Some(CaptionTrack {
                        base_url: t.get("baseUrl")?.as_str()?.to_string(),
                        language_code: t.get("languageCode")?.as_str()?.to_string(),
                        auto_generated: t.get("kind").and_then(Value::as_str) == Some("asr"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Track whose code is `lang` or `lang-*`, uploaded tracks before auto-generated ones
fn select_track<'a>(tracks: &'a [CaptionTrack], lang: &str) -> Option<&'a CaptionTrack> {
    let prefix = format!("{lang}-");
    let matching = |t: &&CaptionTrack| t.language_code == lang || t.language_code.starts_with(&prefix);

    tracks
        .iter()
        .filter(matching)
        .find(|t| !t.auto_generated)
        .or_else(|| tracks.iter().find(matching))
}
