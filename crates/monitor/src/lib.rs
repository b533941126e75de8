//! Firewatch Monitoring Client
//!
//! Wires the capture pipeline together: frame source -> encoder ->
//! detection client -> alert engine, with the health monitor running on
//! its own cadence and session statistics surfaced to the operator.

pub mod config;

use alert_engine::{AlertConfig, AlertEngine, ConsoleBanner};
use capture_scheduler::{CaptureScheduler, SchedulerConfig};
use detection_client::{DetectionClient, EnvToken, HealthMonitor};
use detection_stats::DetectionStats;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Environment variable read freshly for every submission
const TOKEN_VAR: &str = "FIREWATCH_API_TOKEN";

/// Operator status line cadence
const STATUS_INTERVAL: Duration = Duration::from_secs(30);

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the monitor until Ctrl-C.
pub async fn run() -> anyhow::Result<()> {
    let cfg = config::load()?;
    info!("=== Firewatch Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!(backend = %cfg.backend_url, source = %cfg.source, "starting monitoring client");

    let stats = Arc::new(DetectionStats::new());
    let cancel = CancellationToken::new();

    let client = Arc::new(
        DetectionClient::new(
            &cfg.backend_url,
            Box::new(EnvToken {
                var: TOKEN_VAR.to_string(),
            }),
        )
        .with_hazard_sentinel(&cfg.hazard_sentinel),
    );

    // Health runs on its own timer, probing whether or not capture is active
    let (health, connectivity) = HealthMonitor::new(&cfg.backend_url);
    let health_task = health.spawn(
        Duration::from_millis(cfg.health_interval_ms),
        cancel.clone(),
    );

    let mut engine = AlertEngine::new(
        AlertConfig {
            display_duration: Duration::from_millis(cfg.alert_display_ms),
            cooldown: Duration::from_millis(cfg.alert_cooldown_ms),
        },
        stats.clone(),
    );
    engine.add_sink(Box::new(ConsoleBanner));
    #[cfg(feature = "audio")]
    engine.add_sink(Box::new(alert_engine::AudibleTone::new(880.0)));

    let (alert_tx, alert_rx) = mpsc::channel(32);
    let alert_task = tokio::spawn(engine.run(alert_rx, cancel.clone()));

    let mut scheduler = CaptureScheduler::new(
        SchedulerConfig {
            period: Duration::from_millis(cfg.tick_period_ms),
            jpeg_quality: cfg.jpeg_quality,
        },
        client,
        stats.clone(),
        alert_tx,
    );

    let selector = config::parse_source(&cfg.source)?;
    scheduler.start(&selector)?;

    let mut status_ticker = tokio::time::interval(STATUS_INTERVAL);
    status_ticker.tick().await; // first tick is immediate, skip it
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = status_ticker.tick() => {
                let snap = stats.snapshot();
                let state = *connectivity.borrow();
                info!(
                    connected = state.connected,
                    total_frames = snap.total_frames,
                    hazards = snap.hazard_count,
                    errors = snap.error_count,
                    last_frame = ?scheduler.last_frame_at(),
                    "status"
                );
            }
        }
    }

    info!("shutdown requested");
    scheduler.stop().await;
    cancel.cancel();
    let _ = alert_task.await;
    let _ = health_task.await;

    let snap = stats.snapshot();
    info!(
        total_frames = snap.total_frames,
        hazards = snap.hazard_count,
        errors = snap.error_count,
        "session closed"
    );
    Ok(())
}
