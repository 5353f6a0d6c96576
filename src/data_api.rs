use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{TranscriptError, VideoId};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionMetadata {
    pub title: String,
    pub caption_id: String,
    pub language: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    items: Option<Vec<T>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<u16>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Option<VideoSnippet>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionItem {
    id: String,
    snippet: Option<CaptionSnippet>,
}

#[derive(Debug, Deserialize)]
struct CaptionSnippet {
    language: Option<String>,
}

/// Metadata-only lookup through the YouTube Data API
///
/// The captions listing gives a track id and language but no caption body
/// (downloading it needs OAuth), so this never feeds the transcript chain.
pub struct DataApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl DataApiClient {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str, language: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            language: language.to_string(),
        }
    }

    /// Title plus the id and language of the first matching caption track
    pub async fn fetch_caption_metadata(&self, video_id: &VideoId) -> Result<CaptionMetadata, TranscriptError> {
        let videos: Vec<VideoItem> = self
            .list("videos", &[("part", "snippet"), ("id", video_id.as_str())])
            .await?;

        let Some(video) = videos.into_iter().next() else {
            return Err(TranscriptError::VideoNotFound(video_id.to_string()));
        };

        let title = video
            .snippet
            .and_then(|s| s.title)
            .unwrap_or_default();

        let captions: Vec<CaptionItem> = self
            .list("captions", &[("part", "snippet"), ("videoId", video_id.as_str())])
            .await?;
        debug!("Data API lists {} caption tracks for video {video_id}", captions.len());

        let prefix = format!("{}-", self.language);
        captions
            .into_iter()
            .find_map(|c| {
                let language = c.snippet?.language?;
                (language == self.language || language.starts_with(&prefix)).then(|| CaptionMetadata {
                    title: title.clone(),
                    caption_id: c.id,
                    language,
                })
            })
            .ok_or_else(|| TranscriptError::NoTranscript(format!("no {} captions for video {video_id}", self.language)))
    }

    async fn list<T: for<'de> Deserialize<'de>>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, TranscriptError> {
        let resp: ListResponse<T> = self
            .client
            .get(format!("{}/{resource}", self.base_url))
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = resp.error {
            let code = error.code.unwrap_or_default();
            warn!(
                "Data API {resource}.list failed ({code}): {}",
                error.message.as_deref().unwrap_or("no message")
            );
            return Err(TranscriptError::Transport(format!("Data API {resource}.list returned {code}")));
        }

        Ok(resp.items.unwrap_or_default())
    }
}
