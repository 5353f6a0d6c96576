use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use eyre::Result;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::data_api::{CaptionMetadata, DataApiClient};
use crate::output::{OutputFormat, Rendered, render};
use crate::strategy::Resolver;
use crate::{TranscriptError, VideoId, extract_video_id};

/// Shared, read-only request context
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub metadata: Option<Arc<DataApiClient>>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        let resolver = Resolver::from_kinds(
            &config.strategies,
            &client,
            &config.youtube_base_url,
            &config.language,
            &config.user_agent,
        );
        info!("Caption strategies: {}", resolver.strategy_names().join(" -> "));

        let metadata = config.youtube_api_key.as_deref().map(|key| {
            Arc::new(DataApiClient::new(
                client.clone(),
                &config.data_api_base_url,
                key,
                &config.language,
            ))
        });
        if metadata.is_none() {
            info!("No YouTube API key configured; /api/captions is disabled");
        }

        Ok(Self {
            resolver: Arc::new(resolver),
            metadata,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route(
            "/api/transcript",
            post(transcript).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/api/captions",
            post(captions).options(preflight).fallback(method_not_allowed),
        )
        .layer(middleware::map_response(allow_any_origin))
        .with_state(state)
}

/// Client-facing error: `{ "error", "details" }`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    details: String,
}

impl ApiError {
    fn bad_request(error: &'static str, details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
            details: details.into(),
        }
    }

    fn internal(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Server error",
            details: details.into(),
        }
    }
}

impl From<TranscriptError> for ApiError {
    fn from(e: TranscriptError) -> Self {
        match e {
            TranscriptError::InvalidUrl(_) => {
                ApiError::bad_request("Invalid YouTube URL", "Could not extract a video ID from the URL")
            }
            TranscriptError::VideoNotFound(_) => {
                ApiError::bad_request("Video not found", "The video does not exist or is unavailable")
            }
            TranscriptError::NoTranscript(details) => ApiError::bad_request("Failed to get transcript", details),
            TranscriptError::Transport(_) => ApiError::bad_request(
                "Failed to get transcript",
                "Make sure the video exists and has captions enabled",
            ),
            TranscriptError::Internal(_) => ApiError::internal("An unexpected error occurred"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.error,
            "details": self.details,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    video_id: VideoId,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    source: &'static str,
    format: OutputFormat,
    transcript: Rendered,
}

/// Validated request body
struct TranscriptRequest {
    url: String,
    format: OutputFormat,
}

impl TranscriptRequest {
    fn parse(body: &[u8]) -> ApiResult<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|_| ApiError::bad_request("Invalid request", "Request body must be a JSON object"))?;

        let url = value
            .get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Invalid request", "URL is required and must be a string"))?
            .to_string();

        let format = match value.get("format") {
            None | Some(Value::Null) => OutputFormat::default(),
            Some(f) => serde_json::from_value(f.clone()).map_err(|_| {
                ApiError::bad_request("Invalid request", "format must be one of: text, timed, json, srt")
            })?,
        };

        Ok(Self { url, format })
    }
}

async fn root() -> Html<&'static str> {
    Html("<h1>YouTube Transcriber API</h1>")
}

async fn transcript(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<TranscriptResponse>> {
    let request = TranscriptRequest::parse(&body)?;

    let video_id = extract_video_id(&request.url).inspect_err(|e| warn!("{e}"))?;

    let result = state.resolver.resolve(&video_id).await.map_err(|e| {
        log_failure(&video_id, &e);
        ApiError::from(e)
    })?;

    Ok(Json(TranscriptResponse {
        transcript: render(request.format, &result.video_id, &result.lines),
        video_id: result.video_id,
        title: result.title,
        language: result.language,
        source: result.source,
        format: request.format,
    }))
}

async fn captions(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<CaptionMetadata>> {
    let request = TranscriptRequest::parse(&body)?;
    let video_id = extract_video_id(&request.url).inspect_err(|e| warn!("{e}"))?;

    let Some(client) = state.metadata.as_ref() else {
        let e = TranscriptError::Internal("caption metadata lookup requested without an API key".to_string());
        log_failure(&video_id, &e);
        return Err(e.into());
    };

    let metadata = client.fetch_caption_metadata(&video_id).await.map_err(|e| {
        log_failure(&video_id, &e);
        ApiError::from(e)
    })?;

    Ok(Json(metadata))
}

fn log_failure(video_id: &VideoId, e: &TranscriptError) {
    match e {
        TranscriptError::Internal(_) => error!("Request for video {video_id} failed: {e}"),
        _ => warn!("Request for video {video_id} failed: {e}"),
    }
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}

async fn method_not_allowed() -> ApiError {
    ApiError {
        status: StatusCode::METHOD_NOT_ALLOWED,
        error: "Method not allowed",
        details: "Only POST requests are allowed".to_string(),
    }
}

async fn allow_any_origin(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}
