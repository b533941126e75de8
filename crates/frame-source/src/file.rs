//! Still-image file source
//!
//! Covers the "uploaded media" path: the operator points the monitor at an
//! image on disk instead of a live camera. Every tick re-serves the same
//! decoded frame with a fresh capture timestamp.

use crate::frame::VideoFrame;
use crate::{FrameSource, SourceError};
use std::path::Path;
use tracing::info;

pub struct StillFileSource {
    data: Vec<u8>,
    width: u32,
    height: u32,
    closed: bool,
}

impl StillFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let img = image::open(path).map_err(|e| {
            SourceError::DeviceUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        info!(path = %path.display(), width, height, "opened still file source");

        Ok(Self {
            data: rgb.into_raw(),
            width,
            height,
            closed: false,
        })
    }
}

impl FrameSource for StillFileSource {
    fn current_frame(&mut self) -> Option<VideoFrame> {
        if self.closed {
            return None;
        }
        Some(VideoFrame::new(self.data.clone(), self.width, self.height))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn test_serves_decoded_file() {
        let dir = std::env::temp_dir().join("frame-source-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("still.png");
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(4, 3, Rgb([120, 60, 30]));
        img.save(&path).unwrap();

        let mut source = StillFileSource::open(&path).unwrap();
        let frame = source.current_frame().unwrap();
        assert_eq!((frame.width, frame.height), (4, 3));
        assert_eq!(frame.get_pixel(0, 0), Some([120, 60, 30]));

        source.close();
        assert!(source.current_frame().is_none());
    }
}
