//! Tick loop implementation

use crate::{CaptureSession, CaptureState, SchedulerError};
use chrono::{DateTime, Utc};
use detection_client::{DetectionBackend, DetectionResult};
use detection_stats::DetectionStats;
use frame_source::{encode_jpeg, EncodedFrame, FrameSource, SourceError, SourceSelector};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Configuration for the capture scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Tick period (reference cadence: 1000 ms)
    pub period: Duration,
    /// JPEG quality factor in [0, 1]
    pub jpeg_quality: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(1000),
            jpeg_quality: 0.8,
        }
    }
}

struct ActiveSession {
    session: CaptureSession,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Capture scheduler: owns the frame source for the lifetime of a session
/// and drives the extract -> encode -> submit tick.
pub struct CaptureScheduler<C: DetectionBackend + 'static> {
    config: SchedulerConfig,
    client: Arc<C>,
    stats: Arc<DetectionStats>,
    alert_tx: mpsc::Sender<DetectionResult>,
    state: CaptureState,
    active: Option<ActiveSession>,
    last_frame_at: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl<C: DetectionBackend + 'static> CaptureScheduler<C> {
    pub fn new(
        config: SchedulerConfig,
        client: Arc<C>,
        stats: Arc<DetectionStats>,
        alert_tx: mpsc::Sender<DetectionResult>,
    ) -> Self {
        Self {
            config,
            client,
            stats,
            alert_tx,
            state: CaptureState::Stopped,
            active: None,
            last_frame_at: Arc::new(Mutex::new(None)),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<&CaptureSession> {
        self.active.as_ref().map(|a| &a.session)
    }

    /// When the most recent submission of this session resolved.
    pub fn last_frame_at(&self) -> Option<DateTime<Utc>> {
        *self
            .last_frame_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the source and begin ticking.
    ///
    /// Rejected with `SessionActive` while a session owns the source.
    /// Terminal source failures (device gone, permission denied) return
    /// the scheduler to `Stopped` and are surfaced, never retried.
    pub fn start(&mut self, selector: &SourceSelector) -> Result<CaptureSession, SchedulerError> {
        if self.active.is_some() {
            return Err(SchedulerError::SessionActive);
        }

        self.state = CaptureState::Starting;
        let source = match frame_source::open(selector) {
            Ok(source) => source,
            Err(e) => {
                error!("source acquisition failed: {e}");
                self.state = CaptureState::Stopped;
                return Err(e.into());
            }
        };

        // Counters belong to the session: fresh start, fresh zeroes
        self.stats.reset();
        *self
            .last_frame_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;

        let session = CaptureSession::new(self.config.period);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_loop(
            source,
            self.client.clone(),
            self.stats.clone(),
            self.alert_tx.clone(),
            self.last_frame_at.clone(),
            self.config.clone(),
            cancel.clone(),
        ));

        info!(
            session = %session.id,
            period_ms = session.period_ms,
            "capture session started"
        );
        self.state = CaptureState::Streaming;
        self.active = Some(ActiveSession {
            session: session.clone(),
            cancel,
            task,
        });
        Ok(session)
    }

    /// Cancel the tick timer, release the source, and return to `Stopped`.
    ///
    /// Idempotent: stopping with no active session is a no-op. An in-flight
    /// submission is not force-cancelled; it completes on its own and
    /// discards its result.
    pub async fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            debug!("stop requested but no session is active");
            return;
        };

        self.state = CaptureState::Stopping;
        info!(session = %active.session.id, "stopping capture session");
        active.cancel.cancel();
        if let Err(e) = active.task.await {
            warn!("capture loop join failed: {e}");
        }
        self.state = CaptureState::Stopped;
    }
}

async fn run_loop<C: DetectionBackend + 'static>(
    mut source: Box<dyn FrameSource>,
    client: Arc<C>,
    stats: Arc<DetectionStats>,
    alert_tx: mpsc::Sender<DetectionResult>,
    last_frame_at: Arc<Mutex<Option<DateTime<Utc>>>>,
    config: SchedulerConfig,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.period);
    // Dropped ticks are never queued up for catch-up bursts
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if in_flight.as_ref().is_some_and(|task| !task.is_finished()) {
                    debug!("previous submission still in flight, dropping tick");
                    continue;
                }

                let Some(frame) = source.current_frame() else {
                    debug!("no frame ready, skipping tick");
                    continue;
                };

                let encoded = match encode_jpeg(&frame, config.jpeg_quality) {
                    Ok(encoded) => encoded,
                    Err(SourceError::InvalidFrame) => {
                        debug!("source not warmed up, skipping tick");
                        continue;
                    }
                    Err(e) => {
                        warn!("frame encode failed: {e}");
                        continue;
                    }
                };

                in_flight = Some(tokio::spawn(submit_one(
                    client.clone(),
                    stats.clone(),
                    alert_tx.clone(),
                    last_frame_at.clone(),
                    cancel.clone(),
                    encoded,
                )));
            }
        }
    }

    source.close();
    debug!("capture loop exited");
}

/// One submission. Runs detached from the timer so a slow network call
/// never blocks tick eligibility checks; a session stopped mid-call
/// discards the outcome entirely.
async fn submit_one<C: DetectionBackend>(
    client: Arc<C>,
    stats: Arc<DetectionStats>,
    alert_tx: mpsc::Sender<DetectionResult>,
    last_frame_at: Arc<Mutex<Option<DateTime<Utc>>>>,
    cancel: CancellationToken,
    frame: EncodedFrame,
) {
    let outcome = client.submit(frame).await;

    if cancel.is_cancelled() {
        debug!("session stopped during submission, result discarded");
        return;
    }

    *last_frame_at
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());

    match outcome {
        Ok(result) => {
            stats.record_frame();
            if alert_tx.try_send(result).is_err() {
                debug!("alert channel unavailable, result dropped");
            }
        }
        Err(e) => {
            stats.record_error();
            warn!("frame submission failed: {e}");
        }
    }
}
