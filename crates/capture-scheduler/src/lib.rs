//! Capture Scheduler
//!
//! The control loop at the heart of the monitor: while a session is
//! active, it extracts a frame, encodes it, and submits it to the
//! detection service on a fixed period, never allowing two submissions
//! for the same source to overlap. Successes feed the alert engine,
//! failures feed the error counter, and stopping is deterministic and
//! idempotent.

pub mod scheduler;

pub use scheduler::{CaptureScheduler, SchedulerConfig};

use chrono::{DateTime, Utc};
use frame_source::SourceError;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Scheduler error types
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A session already owns the frame source; it is never silently replaced
    #[error("a capture session is already active")]
    SessionActive,

    /// Source acquisition failed; terminal errors must not be retried
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Lifecycle of the capture pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CaptureState {
    #[default]
    Stopped,
    Starting,
    Streaming,
    Stopping,
}

/// One active capture-to-alert pipeline instance. Owned exclusively by
/// the scheduler; created on start, destroyed on stop.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureSession {
    pub id: Uuid,
    pub period_ms: u64,
    pub started_at: DateTime<Utc>,
}

impl CaptureSession {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            period_ms: period.as_millis() as u64,
            started_at: Utc::now(),
        }
    }
}
