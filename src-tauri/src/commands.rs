//! Tauri commands exposed to the two webviews.
//!
//! Errors cross the boundary as plain strings; the domain modules keep
//! their typed errors.

use serde::Serialize;
use tauri::{AppHandle, State};

use crate::backend::{types::HealthStatus, BackendClient, BoundingBox};
use crate::capture;
use crate::config::AppConfig;
use crate::conversation::{Conversation, QaEntry, TauriPipeline};
use crate::overlay::{AppOverlay, OverlayInput, Placement};

/// Result shape of `capture_screenshot`.
#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Tauri command: ask about the screen. Returns the new entry id, or
/// `None` when ignored (blank, or a request is already in flight).
#[tauri::command]
pub async fn submit_question(
    app: AppHandle,
    conversation: State<'_, Conversation>,
    question: String,
) -> Result<Option<u64>, String> {
    let pipeline = TauriPipeline::new(app);
    Ok(conversation.submit(&question, &pipeline).await)
}

/// Tauri command: every entry so far, in submission order.
#[tauri::command]
pub fn get_conversation(conversation: State<'_, Conversation>) -> Vec<QaEntry> {
    conversation.entries()
}

/// Tauri command: capture the work area with the app's windows hidden.
#[tauri::command]
pub async fn capture_screenshot(
    app: AppHandle,
    config: State<'_, AppConfig>,
) -> Result<CaptureResponse, String> {
    let settle = config.settle_delay;
    let result = match capture::primary_work_area(&app) {
        Ok(target) => {
            capture::with_hidden_windows(&app, settle, || capture::capture_work_area(target)).await
        }
        Err(e) => Err(e),
    };

    Ok(match result {
        Ok(data) => CaptureResponse {
            success: true,
            data: Some(data),
            error: None,
        },
        Err(e) => {
            log::warn!("[CAPTURE] {}", e);
            CaptureResponse {
                success: false,
                data: None,
                error: Some(e.to_string()),
            }
        }
    })
}

/// Tauri command: highlight `bbox` with `text`.
#[tauri::command]
pub async fn show_overlay(
    overlay: State<'_, AppOverlay>,
    bbox: BoundingBox,
    text: String,
) -> Result<Placement, String> {
    overlay.show(bbox, &text).await.map_err(|e| e.to_string())
}

/// Tauri command: hide the overlay, keeping its window for reuse.
#[tauri::command]
pub async fn hide_overlay(overlay: State<'_, AppOverlay>) -> Result<(), String> {
    overlay.hide().await.map_err(|e| e.to_string())
}

/// Tauri command: fire-and-forget dismissal from the overlay content.
#[tauri::command]
pub async fn close_overlay(overlay: State<'_, AppOverlay>) -> Result<(), String> {
    if let Err(e) = overlay.hide().await {
        log::error!("[OVERLAY] Close failed: {}", e);
    }
    Ok(())
}

/// Tauri command: key or click forwarded from the overlay content.
/// Returns whether it dismissed the overlay.
#[tauri::command]
pub async fn overlay_input(
    overlay: State<'_, AppOverlay>,
    input: OverlayInput,
) -> Result<bool, String> {
    overlay.dismiss(&input).await.map_err(|e| e.to_string())
}

/// Tauri command: the overlay content is loaded and listening.
#[tauri::command]
pub fn overlay_ready(overlay: State<'_, AppOverlay>) {
    overlay.signal_ready();
}

/// Tauri command: probe the backend's `/health` endpoint.
#[tauri::command]
pub async fn backend_health(client: State<'_, BackendClient>) -> Result<HealthStatus, String> {
    client.health().await.map_err(|e| e.to_string())
}
