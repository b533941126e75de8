//! Environment configuration
//!
//! All settings come from `FIREWATCH_`-prefixed environment variables.
//! Only the backend URL is required.

use frame_source::SourceSelector;
use serde::Deserialize;

/// Monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Detection backend base URL (required)
    pub backend_url: String,

    /// Capture tick period in milliseconds
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// JPEG quality factor in [0, 1]
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: f32,

    /// Health probe cadence in milliseconds
    #[serde(default = "default_health_interval_ms")]
    pub health_interval_ms: u64,

    /// How long a raised alert stays up, in milliseconds
    #[serde(default = "default_alert_display_ms")]
    pub alert_display_ms: u64,

    /// Suppression interval after dismissal before re-arming
    #[serde(default)]
    pub alert_cooldown_ms: u64,

    /// Service message that marks a positive frame
    #[serde(default = "default_hazard_sentinel")]
    pub hazard_sentinel: String,

    /// Video source: `test`, `device:<n>`, or a path to a still image
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_tick_period_ms() -> u64 {
    1000
}

fn default_jpeg_quality() -> f32 {
    0.8
}

fn default_health_interval_ms() -> u64 {
    5000
}

fn default_alert_display_ms() -> u64 {
    10_000
}

fn default_hazard_sentinel() -> String {
    "fire detected".to_string()
}

fn default_source() -> String {
    "test".to_string()
}

/// Load configuration from the environment.
pub fn load() -> Result<MonitorConfig, config::ConfigError> {
    config::Config::builder()
        .add_source(config::Environment::with_prefix("FIREWATCH"))
        .build()?
        .try_deserialize()
}

/// Resolve the `source` setting into a selector.
pub fn parse_source(raw: &str) -> anyhow::Result<SourceSelector> {
    if raw == "test" {
        return Ok(SourceSelector::TestPattern { warmup_ticks: 0 });
    }
    if let Some(index) = raw.strip_prefix("device:") {
        let index: u32 = index
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid device index in source `{raw}`"))?;
        return Ok(SourceSelector::Device(index));
    }
    Ok(SourceSelector::File(raw.into()))
}
