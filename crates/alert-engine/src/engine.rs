//! Alert state machine

use crate::sink::AlertSink;
use detection_client::DetectionResult;
use detection_stats::DetectionStats;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Alert timing configuration
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// How long a raised alert stays visible and audible
    pub display_duration: Duration,
    /// Minimum suppression interval after dismissal before re-arming
    pub cooldown: Duration,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            display_duration: Duration::from_secs(10),
            cooldown: Duration::ZERO,
        }
    }
}

/// Where the engine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AlertPhase {
    #[default]
    Idle,
    Raised,
    CoolingDown,
}

/// Alert engine: consumes detection results, owns the alert phase, drives
/// the notification sinks, and counts hazards.
pub struct AlertEngine {
    config: AlertConfig,
    phase: AlertPhase,
    sinks: Vec<Box<dyn AlertSink>>,
    stats: Arc<DetectionStats>,
    /// When the current phase expires; None while idle
    deadline: Option<Instant>,
}

impl AlertEngine {
    pub fn new(config: AlertConfig, stats: Arc<DetectionStats>) -> Self {
        Self {
            config,
            phase: AlertPhase::Idle,
            sinks: Vec::new(),
            stats,
            deadline: None,
        }
    }

    /// Register a notification sink.
    pub fn add_sink(&mut self, sink: Box<dyn AlertSink>) {
        self.sinks.push(sink);
    }

    pub fn phase(&self) -> AlertPhase {
        self.phase
    }

    /// Feed one detection result into the state machine. Only a positive
    /// result seen while idle raises the alert; no re-trigger, no stacking.
    pub fn observe(&mut self, result: &DetectionResult) {
        if !result.hazard_detected {
            return;
        }
        if self.phase != AlertPhase::Idle {
            debug!(phase = ?self.phase, "positive frame while alert active, ignored");
            return;
        }

        info!(
            confidence = result.confidence,
            "hazard detected, raising alert"
        );
        self.stats.record_hazard();
        for sink in &mut self.sinks {
            sink.raise(result);
        }
        self.phase = AlertPhase::Raised;
        self.deadline = Some(Instant::now() + self.config.display_duration);
    }

    /// Advance past an expired phase deadline.
    pub fn on_deadline(&mut self) {
        match self.phase {
            AlertPhase::Raised => {
                for sink in &mut self.sinks {
                    sink.clear();
                }
                self.phase = AlertPhase::CoolingDown;
                self.deadline = Some(Instant::now() + self.config.cooldown);
            }
            AlertPhase::CoolingDown => {
                debug!("cooldown over, alert re-armed");
                self.phase = AlertPhase::Idle;
                self.deadline = None;
            }
            AlertPhase::Idle => {}
        }
    }

    /// When the current phase expires, if ever.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Silence everything on the way out.
    fn shutdown(&mut self) {
        if self.phase == AlertPhase::Raised {
            for sink in &mut self.sinks {
                sink.clear();
            }
        }
        self.phase = AlertPhase::Idle;
        self.deadline = None;
    }

    /// Consume results until the channel closes or the token cancels.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<DetectionResult>,
        cancel: CancellationToken,
    ) {
        info!(
            display_ms = self.config.display_duration.as_millis() as u64,
            cooldown_ms = self.config.cooldown.as_millis() as u64,
            "alert engine started"
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = rx.recv() => match result {
                    Some(result) => self.observe(&result),
                    None => break,
                },
                _ = wait_for(self.deadline) => self.on_deadline(),
            }
        }
        self.shutdown();
        info!("alert engine stopped");
    }
}

/// Sleeps until the deadline, or forever when there is none.
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Sink that records raise/clear transitions for assertions
    struct RecordingSink(Arc<Mutex<Vec<&'static str>>>);

    impl AlertSink for RecordingSink {
        fn raise(&mut self, _result: &DetectionResult) {
            self.0.lock().unwrap().push("raise");
        }
        fn clear(&mut self) {
            self.0.lock().unwrap().push("clear");
        }
    }

    fn positive() -> DetectionResult {
        DetectionResult {
            hazard_detected: true,
            confidence: 0.92,
            detections: Vec::new(),
            raw_message: "fire detected".to_string(),
        }
    }

    fn negative() -> DetectionResult {
        DetectionResult {
            hazard_detected: false,
            confidence: 0.0,
            detections: Vec::new(),
            raw_message: "safe".to_string(),
        }
    }

    fn engine_with_recorder(
        config: AlertConfig,
    ) -> (AlertEngine, Arc<DetectionStats>, Arc<Mutex<Vec<&'static str>>>) {
        let stats = Arc::new(DetectionStats::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut engine = AlertEngine::new(config, stats.clone());
        engine.add_sink(Box::new(RecordingSink(events.clone())));
        (engine, stats, events)
    }

    #[tokio::test(start_paused = true)]
    async fn test_positive_raises_exactly_once() {
        let (mut engine, stats, events) = engine_with_recorder(AlertConfig::default());

        engine.observe(&positive());
        assert_eq!(engine.phase(), AlertPhase::Raised);
        assert_eq!(stats.snapshot().hazard_count, 1);

        // Further positives while raised are ignored
        engine.observe(&positive());
        engine.observe(&positive());
        assert_eq!(stats.snapshot().hazard_count, 1);
        assert_eq!(*events.lock().unwrap(), vec!["raise"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_results_never_raise() {
        let (mut engine, stats, _events) = engine_with_recorder(AlertConfig::default());
        engine.observe(&negative());
        engine.observe(&negative());
        assert_eq!(engine.phase(), AlertPhase::Idle);
        assert_eq!(stats.snapshot().hazard_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_then_cooldown_then_rearm() {
        let config = AlertConfig {
            display_duration: Duration::from_secs(10),
            cooldown: Duration::from_secs(5),
        };
        let (mut engine, stats, events) = engine_with_recorder(config);

        engine.observe(&positive());
        assert_eq!(engine.phase(), AlertPhase::Raised);

        engine.on_deadline();
        assert_eq!(engine.phase(), AlertPhase::CoolingDown);
        assert_eq!(*events.lock().unwrap(), vec!["raise", "clear"]);

        // Positives during cooldown stay suppressed
        engine.observe(&positive());
        assert_eq!(engine.phase(), AlertPhase::CoolingDown);
        assert_eq!(stats.snapshot().hazard_count, 1);

        engine.on_deadline();
        assert_eq!(engine.phase(), AlertPhase::Idle);

        // Re-armed: a new positive raises again
        engine.observe(&positive());
        assert_eq!(engine.phase(), AlertPhase::Raised);
        assert_eq!(stats.snapshot().hazard_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_cooldown_rearms_immediately() {
        let (mut engine, _stats, _events) = engine_with_recorder(AlertConfig::default());
        engine.observe(&positive());
        engine.on_deadline();
        engine.on_deadline();
        assert_eq!(engine.phase(), AlertPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_auto_dismisses_after_display_duration() {
        let (engine, stats, events) = engine_with_recorder(AlertConfig::default());
        let (tx, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(engine.run(rx, cancel.clone()));

        tx.send(positive()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*events.lock().unwrap(), vec!["raise"]);

        // Banner dismissed automatically once the display duration elapses
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(*events.lock().unwrap(), vec!["raise", "clear"]);
        assert_eq!(stats.snapshot().hazard_count, 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_clears_active_alert_on_shutdown() {
        let (engine, _stats, events) = engine_with_recorder(AlertConfig::default());
        let (tx, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(engine.run(rx, cancel.clone()));

        tx.send(positive()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(*events.lock().unwrap(), vec!["raise", "clear"]);
    }
}
