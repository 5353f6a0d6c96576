use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::output::normalize_lines;
use crate::{Captions, TranscriptError, TranscriptResult, VideoId};

pub mod timedtext;
pub mod watch_page;

pub use timedtext::TimedTextStrategy;
pub use watch_page::WatchPageStrategy;

/// A single way of obtaining caption lines for a video
#[async_trait]
pub trait CaptionStrategy: Send + Sync {
    /// Name of the strategy (for logging)
    fn name(&self) -> &'static str;

    /// Fetch captions; an empty line list means "not applicable"
    async fn fetch(&self, video_id: &VideoId) -> Result<Captions, TranscriptError>;
}

/// Strategies selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    WatchPage,
    Timedtext,
}

impl StrategyKind {
    pub fn default_order() -> Vec<StrategyKind> {
        vec![StrategyKind::WatchPage, StrategyKind::Timedtext]
    }
}

/// Tries each strategy in order until one yields non-empty normalized lines
pub struct Resolver {
    strategies: Vec<Box<dyn CaptionStrategy>>,
}

impl Resolver {
    pub fn new(strategies: Vec<Box<dyn CaptionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Build the configured chain against a YouTube base URL
    pub fn from_kinds(
        kinds: &[StrategyKind],
        client: &reqwest::Client,
        base_url: &str,
        language: &str,
        user_agent: &str,
    ) -> Self {
        let strategies = kinds
            .iter()
            .map(|kind| -> Box<dyn CaptionStrategy> {
                match kind {
                    StrategyKind::WatchPage => Box::new(
                        WatchPageStrategy::new(client.clone(), base_url, language).with_user_agent(user_agent),
                    ),
                    StrategyKind::Timedtext => Box::new(
                        TimedTextStrategy::new(client.clone(), base_url, language).with_user_agent(user_agent),
                    ),
                }
            })
            .collect();
        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(&self, video_id: &VideoId) -> Result<TranscriptResult, TranscriptError> {
        let mut title = None;

        for strategy in &self.strategies {
            debug!("Trying strategy {} for video {video_id}", strategy.name());

            let captions = match strategy.fetch(video_id).await {
                Ok(captions) => captions,
                Err(e) if e.is_recoverable() => {
                    warn!("Strategy {} failed for video {video_id}: {e}", strategy.name());
                    continue;
                }
                Err(e) => {
                    warn!("Strategy {} aborted resolution for video {video_id}: {e}", strategy.name());
                    return Err(e);
                }
            };

            // A strategy may find the title even when it finds no captions
            if title.is_none() {
                title = captions.title.clone();
            }

            let lines = normalize_lines(captions.lines);
            if lines.is_empty() {
                debug!("Strategy {} returned no usable lines for video {video_id}", strategy.name());
                continue;
            }

            info!(
                "Resolved video {video_id} via {} ({} lines)",
                strategy.name(),
                lines.len()
            );

            return Ok(TranscriptResult {
                video_id: video_id.clone(),
                title: captions.title.or(title),
                language: captions.language,
                source: strategy.name(),
                lines,
            });
        }

        Err(TranscriptError::NoTranscript(format!(
            "no caption source yielded text for video {video_id}"
        )))
    }
}
