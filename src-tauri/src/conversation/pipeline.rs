use tauri::{AppHandle, Emitter, Manager};

use super::{QaEntry, QueryPipeline};
use crate::backend::{AskResponse, BackendClient, BoundingBox, TransportError};
use crate::capture::{self, CaptureError};
use crate::config::AppConfig;
use crate::overlay::{AppOverlay, OverlayError};
use crate::MAIN_WINDOW_LABEL;

pub const QA_UPDATED_EVENT: &str = "qa-updated";

/// Query cycle wired to the running app's managed state.
pub struct TauriPipeline {
    app: AppHandle,
}

impl TauriPipeline {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl QueryPipeline for TauriPipeline {
    type Updates = AskResponse;

    async fn capture(&self) -> Result<String, CaptureError> {
        let settle = self.app.state::<AppConfig>().settle_delay;
        let target = capture::primary_work_area(&self.app)?;

        capture::with_hidden_windows(&self.app, settle, || capture::capture_work_area(target)).await
    }

    async fn ask(&self, query: &str, screenshot: Option<String>) -> Result<AskResponse, TransportError> {
        self.app.state::<BackendClient>().ask(query, screenshot).await
    }

    async fn show_overlay(&self, bbox: BoundingBox, text: &str) -> Result<(), OverlayError> {
        self.app.state::<AppOverlay>().show(bbox, text).await.map(|_| ())
    }

    fn publish(&self, entry: &QaEntry) {
        if let Err(e) = self.app.emit_to(MAIN_WINDOW_LABEL, QA_UPDATED_EVENT, entry) {
            log::warn!("[QUERY] Failed to publish entry #{}: {}", entry.id, e);
        }
    }
}
