//! Wire types shared by the `/ask` client, the SSE decoder and the overlay.
//!
//! The backend speaks loosely-typed JSON: `text` is the cumulative answer,
//! `streaming` defaults to true, and `bbox` is only meaningful on the final
//! payload. Everything here turns those payloads into strongly-typed values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Axis-aligned region of interest in screen pixel coordinates.
///
/// Serialized as the four-number array `[x1, y1, x2, y2]` the backend and
/// the overlay content both use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, BoundingBoxError> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(BoundingBoxError::NonFinite);
        }
        if x1 >= x2 || y1 >= y2 {
            return Err(BoundingBoxError::Inverted { x1, y1, x2, y2 });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Lenient extraction from an arbitrary JSON value.
    ///
    /// Anything other than four finite numbers forming a non-empty box
    /// (including the backend's `[]` on error) yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        let coords: Vec<f64> = items.iter().map(Value::as_f64).collect::<Option<_>>()?;
        Self::try_from(coords).ok()
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Point-in-box test, edges included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }
}

impl TryFrom<Vec<f64>> for BoundingBox {
    type Error = BoundingBoxError;

    fn try_from(coords: Vec<f64>) -> Result<Self, Self::Error> {
        match coords.as_slice() {
            &[x1, y1, x2, y2] => Self::new(x1, y1, x2, y2),
            other => Err(BoundingBoxError::WrongArity(other.len())),
        }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BoundingBoxError {
    #[error("Bounding box needs exactly 4 coordinates, got {0}")]
    WrongArity(usize),

    #[error("Bounding box coordinates must be finite numbers")]
    NonFinite,

    #[error("Bounding box ({x1},{y1},{x2},{y2}) is empty or inverted")]
    Inverted { x1: f64, y1: f64, x2: f64, y2: f64 },
}

/// One decoded answer update.
///
/// `text` is always the full answer so far, never a delta: each update
/// replaces whatever was displayed before.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StreamUpdate {
    Partial { text: String },
    Final { text: String, bbox: Option<BoundingBox> },
}

impl StreamUpdate {
    pub fn text(&self) -> &str {
        match self {
            Self::Partial { text } | Self::Final { text, .. } => text,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Final { .. })
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        match self {
            Self::Final { bbox, .. } => *bbox,
            Self::Partial { .. } => None,
        }
    }

    /// Interpret one SSE `data:` payload.
    ///
    /// Returns `None` for payloads without a string `text` field.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let text = payload.get("text")?.as_str()?.to_string();
        let streaming = payload
            .get("streaming")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        if streaming {
            return Some(Self::Partial { text });
        }

        let bbox = match payload.get("bbox") {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let parsed = BoundingBox::from_value(raw);
                if parsed.is_none() {
                    log::warn!("[SSE] Ignoring malformed bbox on final payload: {}", raw);
                }
                parsed
            }
        };

        Some(Self::Final { text, bbox })
    }

    /// Interpret a complete `application/json` response body.
    ///
    /// Answer text is taken from `text`, then `response`, then `answer`;
    /// when none is present the whole object is shown pretty-printed.
    pub fn from_json_body(body: &Value) -> Self {
        let text = ["text", "response", "answer"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| serde_json::to_string_pretty(body).unwrap_or_default());

        let bbox = body.get("bbox").and_then(BoundingBox::from_value);

        Self::Final { text, bbox }
    }
}

/// Body of `POST /ask`.
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest {
    pub query: String,
    pub screenshot: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}
