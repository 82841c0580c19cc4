//! HTTP client for the inference backend.
//!
//! One attempt per call: a failed request surfaces as a `TransportError`
//! and is never retried.

use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;

use super::plain::PlainTextStream;
use super::sse::{ChunkSource, UpdateStream};
use super::types::{AskRequest, HealthStatus, StreamUpdate};
use super::UpdateSource;

pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST the question and screenshot to `/ask`.
    ///
    /// Event-stream and plain-text responses are decoded lazily; anything
    /// else is read whole and parsed as a single JSON object.
    pub async fn ask(
        &self,
        query: &str,
        screenshot: Option<String>,
    ) -> Result<AskResponse, TransportError> {
        let start = Instant::now();
        let has_screenshot = screenshot.is_some();
        let body = AskRequest {
            query: query.to_string(),
            screenshot,
        };

        log::info!(
            "[ASK] POST {} ({} chars, screenshot: {})",
            self.endpoint("ask"),
            query.len(),
            has_screenshot
        );

        let response = self
            .http
            .post(self.endpoint("ask"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("[ASK] Backend returned {}", status);
            return Err(TransportError::Status(status.to_string()));
        }

        log::info!("[ASK] TTFB: {}ms", start.elapsed().as_millis());

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        match BodyKind::from_content_type(&content_type) {
            BodyKind::EventStream => {
                log::info!("[ASK] Streaming response ({})", content_type);
                return Ok(AskResponse::Events(UpdateStream::new(response)));
            }
            BodyKind::PlainText => {
                log::info!("[ASK] Plain-text response ({})", content_type);
                return Ok(AskResponse::Text(PlainTextStream::new(response)));
            }
            BodyKind::Json => {}
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidJson(e.to_string()))?;

        log::info!("[ASK] JSON response in {}ms", start.elapsed().as_millis());
        Ok(AskResponse::Json(Some(StreamUpdate::from_json_body(&json))))
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus, TransportError> {
        let response = self
            .http
            .get(self.endpoint("health"))
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.to_string()));
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::InvalidJson(e.to_string()))
    }
}

/// How an `/ask` response body is read, by its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// `data:` lines carrying JSON payloads.
    EventStream,
    /// The answer text itself, streamed cumulatively.
    PlainText,
    /// One JSON object.
    Json,
}

impl BodyKind {
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "text/event-stream" => Self::EventStream,
            "text/plain" => Self::PlainText,
            _ => Self::Json,
        }
    }
}

impl ChunkSource for reqwest::Response {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        self.chunk()
            .await
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .map_err(|e| TransportError::Body(e.to_string()))
    }
}

/// A successful `/ask` response, either shape.
pub enum AskResponse {
    /// Whole JSON body, already turned into its single final update.
    Json(Option<StreamUpdate>),
    Events(UpdateStream<reqwest::Response>),
    Text(PlainTextStream<reqwest::Response>),
}

impl UpdateSource for AskResponse {
    async fn next_update(&mut self) -> Option<Result<StreamUpdate, TransportError>> {
        match self {
            Self::Json(update) => update.take().map(Ok),
            Self::Events(stream) => stream.next().await,
            Self::Text(stream) => stream.next().await,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Backend request failed: {0}")]
    Request(String),

    #[error("Backend error: {0}")]
    Status(String),

    #[error("Failed to read backend response: {0}")]
    Body(String),

    #[error("Backend returned invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Backend response contained no answer")]
    EmptyAnswer,
}
