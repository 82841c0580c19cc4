//! Tauri webview implementation of the overlay surface.
//!
//! A transparent, borderless, always-on-top window exactly covering the
//! primary display. The content page draws the highlight and bubble from
//! the `overlay-data` event, blanks itself on `overlay-clear`, and forwards key/click input back to Rust.

use tauri::{AppHandle, Emitter, LogicalPosition, LogicalSize, Manager, WebviewUrl, WebviewWindow};

use super::controller::{OverlayError, OverlayPayload, OverlaySurface, Prepared, Viewport};

pub const OVERLAY_LABEL: &str = "overlay";
pub const OVERLAY_DATA_EVENT: &str = "overlay-data";
pub const OVERLAY_CLEAR_EVENT: &str = "overlay-clear";

pub struct TauriOverlaySurface {
    app: AppHandle,
}

impl TauriOverlaySurface {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }

    fn window(&self) -> Result<WebviewWindow, OverlayError> {
        self.app
            .get_webview_window(OVERLAY_LABEL)
            .ok_or_else(|| OverlayError::Window("overlay window does not exist".into()))
    }
}

impl OverlaySurface for TauriOverlaySurface {
    fn prepare(&self) -> Result<Prepared, OverlayError> {
        let monitor = self
            .app
            .primary_monitor()
            .map_err(|e| OverlayError::Window(e.to_string()))?
            .ok_or(OverlayError::NoPrimaryMonitor)?;

        let scale = monitor.scale_factor();
        let size: LogicalSize<f64> = monitor.size().to_logical(scale);
        let position: LogicalPosition<f64> = monitor.position().to_logical(scale);
        let viewport = Viewport {
            width: size.width,
            height: size.height,
        };

        if let Some(window) = self.app.get_webview_window(OVERLAY_LABEL) {
            window
                .set_position(position)
                .and_then(|_| window.set_size(size))
                .map_err(|e| OverlayError::Window(e.to_string()))?;
            return Ok(Prepared {
                viewport,
                created: false,
            });
        }

        tauri::WebviewWindowBuilder::new(
            &self.app,
            OVERLAY_LABEL,
            WebviewUrl::App("overlay.html".into()),
        )
        .title("Screen Ask Overlay")
        .position(position.x, position.y)
        .inner_size(size.width, size.height)
        .transparent(true)
        .decorations(false)
        .shadow(false)
        .always_on_top(true)
        .skip_taskbar(true)
        .resizable(false)
        .visible(false)
        .build()
        .map_err(|e| OverlayError::Window(format!("creation failed: {}", e)))?;

        Ok(Prepared {
            viewport,
            created: true,
        })
    }

    fn show(&self) -> Result<(), OverlayError> {
        let window = self.window()?;
        window
            .show()
            .map_err(|e| OverlayError::Window(e.to_string()))?;
        // Focus so the content receives Escape.
        if let Err(e) = window.set_focus() {
            log::warn!("[OVERLAY] Could not focus overlay: {}", e);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), OverlayError> {
        self.app
            .emit_to(OVERLAY_LABEL, OVERLAY_CLEAR_EVENT, ())
            .map_err(|e| OverlayError::Delivery(e.to_string()))
    }

    fn hide(&self) -> Result<(), OverlayError> {
        match self.app.get_webview_window(OVERLAY_LABEL) {
            Some(window) => window
                .hide()
                .map_err(|e| OverlayError::Window(e.to_string())),
            None => Ok(()),
        }
    }

    fn deliver(&self, payload: &OverlayPayload) -> Result<(), OverlayError> {
        self.app
            .emit_to(OVERLAY_LABEL, OVERLAY_DATA_EVENT, payload)
            .map_err(|e| OverlayError::Delivery(e.to_string()))
    }
}
