//! Frame Acquisition for the Monitoring Pipeline
//!
//! Wraps the video source behind a single trait so the scheduler does not
//! care whether frames come from:
//! - A live camera device (`webcam` feature, via nokhwa)
//! - An uploaded still image on disk
//! - A synthetic test pattern

pub mod encoder;
pub mod frame;

mod file;
mod pattern;
#[cfg(feature = "webcam")]
mod webcam;

pub use encoder::{encode_jpeg, EncodedFrame};
pub use frame::VideoFrame;
pub use pattern::TestPatternSource;

use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Frame source error types
#[derive(Error, Debug)]
pub enum SourceError {
    /// Device missing, busy, or unreadable. Terminal for the session.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// OS refused access to the device. Terminal for the session.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    /// Frame has zero width or height (source still warming up)
    #[error("frame has no pixels yet")]
    InvalidFrame,

    /// JPEG encoding failed
    #[error("frame encode failed: {0}")]
    Encode(String),
}

impl SourceError {
    /// Terminal errors must not be retried by the scheduler.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SourceError::DeviceUnavailable(_) | SourceError::PermissionDenied(_)
        )
    }
}

/// Which video source to acquire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelector {
    /// Live camera by platform device index
    Device(u32),
    /// Uploaded still image on disk
    File(PathBuf),
    /// Synthetic gradient frames; the first `warmup_ticks` reads are not ready
    TestPattern { warmup_ticks: u32 },
}

/// Pulls decoded frames from some source (camera, file, test generator).
///
/// `current_frame` returns `None` until the source has warmed up. `close`
/// releases the underlying resource and is idempotent.
pub trait FrameSource: Send {
    fn current_frame(&mut self) -> Option<VideoFrame>;
    fn close(&mut self);
}

/// Acquire the source named by the selector.
///
/// Device acquisition may be refused by the OS; that surfaces as
/// `PermissionDenied`, which callers must treat as non-retryable.
pub fn open(selector: &SourceSelector) -> Result<Box<dyn FrameSource>, SourceError> {
    match selector {
        SourceSelector::Device(index) => open_device(*index),
        SourceSelector::File(path) => {
            let source = file::StillFileSource::open(path)?;
            Ok(Box::new(source))
        }
        SourceSelector::TestPattern { warmup_ticks } => {
            info!(warmup_ticks, "opening test pattern source");
            Ok(Box::new(TestPatternSource::new(*warmup_ticks)))
        }
    }
}

#[cfg(feature = "webcam")]
fn open_device(index: u32) -> Result<Box<dyn FrameSource>, SourceError> {
    let source = webcam::WebcamSource::open(index)?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "webcam"))]
fn open_device(index: u32) -> Result<Box<dyn FrameSource>, SourceError> {
    Err(SourceError::DeviceUnavailable(format!(
        "device {index} requested but built without the `webcam` feature"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(SourceError::DeviceUnavailable("gone".into()).is_terminal());
        assert!(SourceError::PermissionDenied("denied".into()).is_terminal());
        assert!(!SourceError::InvalidFrame.is_terminal());
        assert!(!SourceError::Encode("bad buffer".into()).is_terminal());
    }

    #[test]
    fn test_open_missing_file() {
        let selector = SourceSelector::File(PathBuf::from("/nonexistent/frame.jpg"));
        match open(&selector) {
            Err(SourceError::DeviceUnavailable(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected DeviceUnavailable"),
        }
    }

    #[cfg(not(feature = "webcam"))]
    #[test]
    fn test_open_device_without_webcam_feature() {
        match open(&SourceSelector::Device(0)) {
            Err(SourceError::DeviceUnavailable(msg)) => assert!(msg.contains("webcam")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected DeviceUnavailable"),
        }
    }
}
