//! Live camera source via nokhwa (feature `webcam`)

use crate::frame::VideoFrame;
use crate::{FrameSource, SourceError};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tracing::{info, warn};

pub struct WebcamSource {
    camera: Option<Camera>,
}

impl WebcamSource {
    pub fn open(index: u32) -> Result<Self, SourceError> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera =
            Camera::new(CameraIndex::Index(index), requested).map_err(|e| classify(index, &e))?;
        camera.open_stream().map_err(|e| classify(index, &e))?;
        info!(index, "opened camera device");

        Ok(Self {
            camera: Some(camera),
        })
    }
}

/// OS-level permission refusals are a distinct, non-retryable failure.
fn classify(index: u32, err: &nokhwa::NokhwaError) -> SourceError {
    let msg = format!("device {index}: {err}");
    let lowered = msg.to_lowercase();
    if lowered.contains("permission") || lowered.contains("access denied") {
        SourceError::PermissionDenied(msg)
    } else {
        SourceError::DeviceUnavailable(msg)
    }
}

impl FrameSource for WebcamSource {
    fn current_frame(&mut self) -> Option<VideoFrame> {
        let camera = self.camera.as_mut()?;
        let buffer = match camera.frame() {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!("camera frame read failed: {e}");
                return None;
            }
        };
        match buffer.decode_image::<RgbFormat>() {
            Ok(decoded) => {
                let (width, height) = (decoded.width(), decoded.height());
                Some(VideoFrame::new(decoded.into_raw(), width, height))
            }
            Err(e) => {
                warn!("camera frame decode failed: {e}");
                None
            }
        }
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            let _ = camera.stop_stream();
            info!("camera device released");
        }
    }
}
