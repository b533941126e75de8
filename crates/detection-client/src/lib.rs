//! Detection Service Client
//!
//! Ships encoded frames to the remote detection endpoint, interprets the
//! structured response, and supervises service liveness. Transport faults,
//! rejected credentials, and malformed bodies are classified but never
//! retried here; the scheduler's next tick is the implicit retry.

pub mod client;
pub mod health;

pub use client::{
    Detection, DetectionBackend, DetectionClient, DetectionResult, EnvToken, StaticToken,
    TokenProvider,
};
pub use health::{ConnectivityState, HealthMonitor};

use thiserror::Error;

/// Errors from one detection submission. All are per-tick failures:
/// counted, surfaced via statistics, never fatal to the session.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// No bearer token could be obtained for this call
    #[error("credential unavailable: {0}")]
    Credential(String),

    /// Connection or timeout failure before a response arrived
    #[error("transport error: {0}")]
    Transport(String),

    /// The service rejected the credential (401/403)
    #[error("detection service rejected the credential")]
    Unauthorized,

    /// Non-2xx response, or a 2xx body that fails validation
    #[error("detection service fault: {0}")]
    ServerFault(String),
}
