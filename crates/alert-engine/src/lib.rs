//! Hazard Alert Engine
//!
//! Decides when to raise and clear the audible + visual hazard alert.
//! A positive detection while idle raises the alert; it holds for a fixed
//! display duration, then cools down for a configurable suppression
//! interval before it can re-arm. Positives arriving while the alert is
//! active or cooling down are ignored, which keeps consecutive positive
//! frames from causing alert storms.

pub mod engine;
pub mod sink;
#[cfg(feature = "audio")]
pub mod tone;

pub use engine::{AlertConfig, AlertEngine, AlertPhase};
pub use sink::{AlertSink, ConsoleBanner};
#[cfg(feature = "audio")]
pub use tone::AudibleTone;
