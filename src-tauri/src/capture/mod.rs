//! Screen capture domain: public API.
//!
//! `capture_work_area` produces the upload-ready screenshot; callers that
//! must keep the app's own windows out of the picture wrap it in
//! `visibility::with_hidden_windows`.

mod encode;
mod host;
mod screenshot;
pub mod visibility;

pub use encode::{encode_for_upload, CaptureSize};
pub use host::primary_work_area;
pub use screenshot::capture_primary_monitor;
pub use visibility::{with_hidden_windows, CaptureSession, TopLevelWindow, VisibilityError, WindowHost};

/// Captures the primary display and returns it as base64 PNG text scaled
/// to `target`.
///
/// Pixel grabbing and PNG encoding are CPU-bound, so they run on the
/// blocking pool. Window visibility is not touched here.
pub async fn capture_work_area(target: CaptureSize) -> Result<String, CaptureError> {
    let start = std::time::Instant::now();

    let encoded = tauri::async_runtime::spawn_blocking(move || {
        let screenshot = capture_primary_monitor()?;
        encode_for_upload(&screenshot, target)
    })
    .await
    .map_err(|e| CaptureError::Worker(e.to_string()))??;

    log::info!(
        "[CAPTURE] {}x{} work-area capture ready in {}ms ({} base64 chars)",
        target.width,
        target.height,
        start.elapsed().as_millis(),
        encoded.len()
    );

    Ok(encoded)
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No primary monitor found")]
    NoPrimaryMonitor,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Capture target has zero width or height")]
    EmptyTarget,

    #[error("Capture worker failed: {0}")]
    Worker(String),
}
