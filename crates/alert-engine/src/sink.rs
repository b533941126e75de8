//! Notification sinks the engine fans out to

use detection_client::DetectionResult;
use tracing::{info, warn};

/// Receives raise/clear transitions from the engine.
pub trait AlertSink: Send {
    fn raise(&mut self, result: &DetectionResult);
    fn clear(&mut self);
}

/// Visible banner on the operator console
pub struct ConsoleBanner;

impl AlertSink for ConsoleBanner {
    fn raise(&mut self, result: &DetectionResult) {
        warn!(
            confidence = result.confidence,
            message = %result.raw_message,
            "HAZARD ALERT raised"
        );
    }

    fn clear(&mut self) {
        info!("hazard alert dismissed");
    }
}
