use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::observer::{CloseReason, SessionObserver, SessionSummary};
use crate::streaming::decoder::MalformedFrame;

/// Bridge-wide counters for frame decoding and session outcomes
///
/// Thread-safe atomic counters shared by every session through the observer hooks.
#[derive(Debug, Default)]
pub struct SessionMetrics {
    /// Complete frames cut from upstream buffers
    pub frames_received: AtomicU64,

    /// Frames skipped because they failed to decode
    pub frames_malformed: AtomicU64,

    /// Text deltas forwarded downstream
    pub deltas_emitted: AtomicU64,

    /// Sessions that reached the terminator normally
    pub sessions_completed: AtomicU64,

    /// Sessions closed after an upstream read failure
    pub sessions_interrupted: AtomicU64,

    /// Sessions dropped by the downstream consumer
    pub sessions_cancelled: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total sessions that ended, whatever the reason
    pub fn sessions_total(&self) -> u64 {
        self.sessions_completed.load(Ordering::Relaxed)
            + self.sessions_interrupted.load(Ordering::Relaxed)
            + self.sessions_cancelled.load(Ordering::Relaxed)
    }

    /// Share of received frames that were malformed, as a percentage
    pub fn malformed_rate(&self) -> f64 {
        let total = self.frames_received.load(Ordering::Relaxed);
        let malformed = self.frames_malformed.load(Ordering::Relaxed);
        if total > 0 {
            (malformed as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Get snapshot of current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_malformed: self.frames_malformed.load(Ordering::Relaxed),
            deltas_emitted: self.deltas_emitted.load(Ordering::Relaxed),
            sessions_completed: self.sessions_completed.load(Ordering::Relaxed),
            sessions_interrupted: self.sessions_interrupted.load(Ordering::Relaxed),
            sessions_cancelled: self.sessions_cancelled.load(Ordering::Relaxed),
            malformed_rate: self.malformed_rate(),
        }
    }
}

impl SessionObserver for SessionMetrics {
    fn frame_received(&self, _session_id: &str, _len: usize) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    fn frame_malformed(&self, _session_id: &str, _frame: &MalformedFrame) {
        self.frames_malformed.fetch_add(1, Ordering::Relaxed);
    }

    fn session_closed(&self, _session_id: &str, reason: CloseReason, summary: &SessionSummary) {
        self.deltas_emitted
            .fetch_add(summary.deltas, Ordering::Relaxed);
        let counter = match reason {
            CloseReason::Completed => &self.sessions_completed,
            CloseReason::UpstreamInterrupted => &self.sessions_interrupted,
            CloseReason::Cancelled => &self.sessions_cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Immutable snapshot of metrics at a point in time
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub frames_malformed: u64,
    pub deltas_emitted: u64,
    pub sessions_completed: u64,
    pub sessions_interrupted: u64,
    pub sessions_cancelled: u64,
    pub malformed_rate: f64,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Session Metrics: {} completed, {} interrupted, {} cancelled, {} frames ({:.1}% malformed), {} deltas",
            self.sessions_completed,
            self.sessions_interrupted,
            self.sessions_cancelled,
            self.frames_received,
            self.malformed_rate,
            self.deltas_emitted,
        )
    }
}
