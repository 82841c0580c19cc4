//! Primary display capture using the `xcap` crate.
//!
//! This is the infrastructure layer: it reads screen pixels and nothing
//! else. Hiding the app's own windows first is the visibility module's job.

use image::DynamicImage;
use xcap::Monitor;

use super::CaptureError;

/// Captures the primary monitor at native resolution.
///
/// Falls back to the first enumerated monitor when none reports itself
/// as primary (some Linux compositors never do).
pub fn capture_primary_monitor() -> Result<DynamicImage, CaptureError> {
    let start = std::time::Instant::now();

    let monitors = Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;
    if monitors.is_empty() {
        return Err(CaptureError::NoPrimaryMonitor);
    }

    let index = monitors
        .iter()
        .position(|m| m.is_primary().unwrap_or(false))
        .unwrap_or_else(|| {
            log::warn!("[CAPTURE] No monitor reports as primary, using the first one");
            0
        });
    let primary = &monitors[index];

    let image = primary
        .capture_image()
        .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

    log::info!(
        "[CAPTURE] Primary display {}x{} captured in {}ms",
        image.width(),
        image.height(),
        start.elapsed().as_millis()
    );

    Ok(DynamicImage::ImageRgba8(image))
}
