//! Pure capture encoding, the functional core.
//!
//! Scales a full-screen image down to the primary display's work area,
//! encodes it as PNG and wraps it in base64 so it can ride inside a JSON
//! request body. No OS access happens here.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::io::Cursor;

use super::CaptureError;

/// Usable size of the primary display, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSize {
    pub width: u32,
    pub height: u32,
}

/// Scales `image` to fit within `target` (aspect ratio kept) and returns
/// the base64 text of its PNG encoding.
///
/// Images already within the target are encoded as-is, never upscaled.
pub fn encode_for_upload(image: &DynamicImage, target: CaptureSize) -> Result<String, CaptureError> {
    if target.width == 0 || target.height == 0 {
        return Err(CaptureError::EmptyTarget);
    }

    let fits = image.width() <= target.width && image.height() <= target.height;
    let scaled;
    let image = if fits {
        image
    } else {
        scaled = image.resize(target.width, target.height, FilterType::Triangle);
        &scaled
    };

    let mut png_bytes: Vec<u8> = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;

    log::debug!(
        "[CAPTURE] Encoded {}x{} PNG ({} bytes)",
        image.width(),
        image.height(),
        png_bytes.len()
    );

    Ok(STANDARD.encode(&png_bytes))
}
