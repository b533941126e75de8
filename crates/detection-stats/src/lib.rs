//! Session Statistics
//!
//! Running counters surfaced to the operator: frames processed, hazards
//! detected, detection errors. The scheduler writes `total_frames` and
//! `error_count`, the alert engine writes `hazard_count`; everyone else
//! reads snapshot copies. Counters are monotonic for the lifetime of a
//! session and reset only when a new session starts.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared session counters
#[derive(Debug, Default)]
pub struct DetectionStats {
    total_frames: AtomicU64,
    hazard_count: AtomicU64,
    error_count: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_frames: u64,
    pub hazard_count: u64,
    pub error_count: u64,
}

impl DetectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// One frame successfully submitted and interpreted
    pub fn record_frame(&self) {
        self.total_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// One alert raised (counted on the Idle -> Raised transition only)
    pub fn record_hazard(&self) {
        self.hazard_count.fetch_add(1, Ordering::Relaxed);
    }

    /// One failed submission
    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Zero all counters. Called once per session start.
    pub fn reset(&self) {
        self.total_frames.store(0, Ordering::Relaxed);
        self.hazard_count.store(0, Ordering::Relaxed);
        self.error_count.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            hazard_count: self.hazard_count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = DetectionStats::new();
        stats.record_frame();
        stats.record_frame();
        stats.record_error();
        stats.record_hazard();

        let snap = stats.snapshot();
        assert_eq!(snap.total_frames, 2);
        assert_eq!(snap.error_count, 1);
        assert_eq!(snap.hazard_count, 1);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let stats = DetectionStats::new();
        stats.record_frame();
        stats.record_hazard();
        stats.reset();
        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                total_frames: 0,
                hazard_count: 0,
                error_count: 0
            }
        );
    }

    proptest! {
        #[test]
        fn prop_frames_and_errors_are_independent(frames in 0u64..200, errors in 0u64..200) {
            // A tick contributes to exactly one counter; totals never bleed
            let stats = DetectionStats::new();
            for _ in 0..frames {
                stats.record_frame();
            }
            for _ in 0..errors {
                stats.record_error();
            }
            let snap = stats.snapshot();
            prop_assert_eq!(snap.total_frames, frames);
            prop_assert_eq!(snap.error_count, errors);
            prop_assert_eq!(snap.total_frames + snap.error_count, frames + errors);
        }
    }
}
