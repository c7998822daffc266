//! Magic-byte classification of uploaded content.
//!
//! Only the leading [`SNIFF_LEN`] bytes are inspected, and only JPEG and PNG are accepted. The
//! declared filename and any client-supplied content type are ignored.

use crate::errors::Error;

/// Number of leading bytes inspected when classifying content.
pub const SNIFF_LEN: usize = 512;

/// The full PNG file signature. A partial match is not a PNG.
const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Classify `content` from its first [`SNIFF_LEN`] bytes.
///
/// Content that is empty, unrecognisable, or recognised as anything other than JPEG or PNG
/// yields [`Error::UnsupportedMediaType`] naming what was detected.
pub fn classify(content: &[u8]) -> Result<ImageFormat, Error> {
    let head = &content[..content.len().min(SNIFF_LEN)];

    if infer::image::is_jpeg(head) {
        return Ok(ImageFormat::Jpeg);
    }
    if head.starts_with(PNG_SIGNATURE) {
        return Ok(ImageFormat::Png);
    }

    let detected = if head.is_empty() {
        "empty file".to_string()
    } else {
        // infer only checks the first four PNG bytes, so a truncated signature is not reported as PNG
        infer::get(head)
            .map(|kind| kind.mime_type())
            .filter(|mime| *mime != ImageFormat::Png.mime_type())
            .unwrap_or("unknown")
            .to_string()
    };

    tracing::debug!(detected = %detected, len = content.len(), "Rejecting unsupported content");
    Err(Error::UnsupportedMediaType { detected })
}
