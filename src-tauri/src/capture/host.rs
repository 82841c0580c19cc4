//! Tauri side of the capture domain: webview windows as `TopLevelWindow`s
//! and the primary display's work area as the capture size.

use tauri::{AppHandle, Manager, WebviewWindow};

use super::encode::CaptureSize;
use super::visibility::{TopLevelWindow, VisibilityError, WindowHost};
use super::CaptureError;

impl TopLevelWindow for WebviewWindow {
    fn label(&self) -> String {
        WebviewWindow::label(self).to_string()
    }

    fn is_visible(&self) -> Result<bool, VisibilityError> {
        WebviewWindow::is_visible(self).map_err(|e| VisibilityError::Query {
            label: self.label().to_string(),
            message: e.to_string(),
        })
    }

    fn set_visible(&self, visible: bool) -> Result<(), VisibilityError> {
        let result = if visible { self.show() } else { self.hide() };
        result.map_err(|e| VisibilityError::Toggle {
            label: self.label().to_string(),
            message: e.to_string(),
        })
    }

    fn focus(&self) -> Result<(), VisibilityError> {
        self.set_focus().map_err(|e| VisibilityError::Focus {
            label: self.label().to_string(),
            message: e.to_string(),
        })
    }
}

impl WindowHost for AppHandle {
    type Window = WebviewWindow;

    fn top_level_windows(&self) -> Vec<WebviewWindow> {
        self.webview_windows().into_values().collect()
    }
}

/// Work area of the primary display in logical pixels.
///
/// This bounds the upload size: the capture is scaled to the usable
/// screen area rather than shipped at native resolution.
pub fn primary_work_area(app: &AppHandle) -> Result<CaptureSize, CaptureError> {
    let monitor = app
        .primary_monitor()
        .map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?
        .ok_or(CaptureError::NoPrimaryMonitor)?;

    let scale = monitor.scale_factor();
    let area = monitor.work_area().size.to_logical::<f64>(scale);

    Ok(CaptureSize {
        width: area.width.round() as u32,
        height: area.height.round() as u32,
    })
}
