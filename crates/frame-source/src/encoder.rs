//! JPEG encoding for transport
//!
//! Rasterizes a decoded frame into a compressed still image the detection
//! client can ship as a multipart upload.

use crate::frame::VideoFrame;
use crate::SourceError;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

/// Compressed still image ready for transport. Produced once, consumed once.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Compressed image bytes
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`
    pub mime_type: &'static str,
    /// Capture timestamp carried over from the source frame
    pub captured_at: DateTime<Utc>,
}

/// Encode a frame as JPEG.
///
/// `quality` is a [0, 1] factor mapped onto the JPEG 1-100 scale. A frame
/// with zero width or height yields `InvalidFrame`; the source has simply
/// not warmed up and the tick should be skipped, not counted as an error.
pub fn encode_jpeg(frame: &VideoFrame, quality: f32) -> Result<EncodedFrame, SourceError> {
    if frame.is_empty() {
        return Err(SourceError::InvalidFrame);
    }

    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.data.len() != expected {
        return Err(SourceError::Encode(format!(
            "pixel buffer is {} bytes, expected {expected}",
            frame.data.len()
        )));
    }

    let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode(
            &frame.data,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| SourceError::Encode(e.to_string()))?;

    Ok(EncodedFrame {
        bytes,
        mime_type: "image/jpeg",
        captured_at: frame.captured_at,
    })
}
