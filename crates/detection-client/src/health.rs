//! Service liveness supervision
//!
//! Probes `GET <backend>/health` on a fixed cadence, independent of capture
//! state. Each probe is standalone: no backoff, no retry, so staleness is
//! bounded by the probe interval. The monitor is the only writer of
//! `ConnectivityState`; everyone else holds a watch receiver and reads
//! snapshot copies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Probe timeout, kept short so one stuck probe cannot blur the cadence
const PROBE_TIMEOUT_MS: u64 = 3_000;

/// Current view of backend connectivity
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConnectivityState {
    pub connected: bool,
    /// None until the first probe completes
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self {
            connected: false,
            last_checked_at: None,
        }
    }
}

/// Periodic health prober for the detection backend
pub struct HealthMonitor {
    http: reqwest::Client,
    health_url: String,
    tx: watch::Sender<ConnectivityState>,
}

impl HealthMonitor {
    /// Create a monitor for the given backend base URL, returning the
    /// receiver other components use to observe connectivity.
    pub fn new(base_url: &str) -> (Self, watch::Receiver<ConnectivityState>) {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(PROBE_TIMEOUT_MS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let health_url = format!("{}/health", base_url.trim_end_matches('/'));
        let (tx, rx) = watch::channel(ConnectivityState::default());

        (
            Self {
                http,
                health_url,
                tx,
            },
            rx,
        )
    }

    /// Probe once and publish the outcome. Any 2xx is healthy; transport
    /// failure or a non-2xx status flips `connected` to false immediately.
    pub async fn check_now(&self) -> bool {
        let connected = match self.http.get(&self.health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("health probe failed: {e}");
                false
            }
        };

        let previous = self.tx.borrow().connected;
        if previous != connected {
            if connected {
                info!("detection backend reachable");
            } else {
                warn!("detection backend unreachable");
            }
        }

        self.tx.send_replace(ConnectivityState {
            connected,
            last_checked_at: Some(Utc::now()),
        });
        connected
    }

    /// Run the probe loop until cancelled.
    pub fn spawn(self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(url = %self.health_url, interval_ms = interval.as_millis() as u64,
                "health monitor started");
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("health monitor stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.check_now().await;
                    }
                }
            }
        })
    }
}
