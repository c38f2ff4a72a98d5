//! Out-of-band session diagnostics.
//!
//! Sessions report what they see to a [`SessionObserver`]. Observers never
//! influence transcoding: every hook has a no-op default and returns nothing.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::streaming::decoder::MalformedFrame;

/// Why a session stopped producing events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Upstream source ended (or a batch document was fully sequenced)
    Completed,
    /// Upstream read failed mid-stream; the session was still closed gracefully
    UpstreamInterrupted,
    /// Downstream consumer went away before the terminator was written
    Cancelled,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Completed => "completed",
            CloseReason::UpstreamInterrupted => "upstream_interrupted",
            CloseReason::Cancelled => "cancelled",
        }
    }
}

/// Counters collected over one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: u64,
    pub malformed: u64,
    pub deltas: u64,
}

pub trait SessionObserver: Send + Sync {
    /// A complete protocol frame was cut from the upstream buffer
    fn frame_received(&self, _session_id: &str, _len: usize) {}

    /// A frame failed to decode and was skipped
    fn frame_malformed(&self, _session_id: &str, _frame: &MalformedFrame) {}

    /// The session reached its end, normally or not
    fn session_closed(&self, _session_id: &str, _reason: CloseReason, _summary: &SessionSummary) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Reports session activity through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn frame_received(&self, session_id: &str, len: usize) {
        debug!(session_id, len, "Frame received");
    }

    fn frame_malformed(&self, session_id: &str, frame: &MalformedFrame) {
        warn!(
            session_id,
            reason = %frame.reason,
            raw = %frame.raw,
            "Skipping malformed frame"
        );
    }

    fn session_closed(&self, session_id: &str, reason: CloseReason, summary: &SessionSummary) {
        match reason {
            CloseReason::Completed => info!(
                session_id,
                reason = reason.as_str(),
                frames = summary.frames,
                malformed = summary.malformed,
                deltas = summary.deltas,
                "Session closed"
            ),
            _ => warn!(
                session_id,
                reason = reason.as_str(),
                frames = summary.frames,
                malformed = summary.malformed,
                deltas = summary.deltas,
                "Session closed abnormally"
            ),
        }
    }
}

/// Forwards every hook to each inner observer in order
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl SessionObserver for ObserverSet {
    fn frame_received(&self, session_id: &str, len: usize) {
        for observer in &self.observers {
            observer.frame_received(session_id, len);
        }
    }

    fn frame_malformed(&self, session_id: &str, frame: &MalformedFrame) {
        for observer in &self.observers {
            observer.frame_malformed(session_id, frame);
        }
    }

    fn session_closed(&self, session_id: &str, reason: CloseReason, summary: &SessionSummary) {
        for observer in &self.observers {
            observer.session_closed(session_id, reason, summary);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SessionMetrics;

    #[test]
    fn test_observer_set_fans_out() {
        let a = Arc::new(SessionMetrics::new());
        let b = Arc::new(SessionMetrics::new());
        let set = ObserverSet::new()
            .with(a.clone())
            .with(b.clone())
            .with(Arc::new(NoopObserver));

        set.frame_received("s", 10);
        set.session_closed("s", CloseReason::Completed, &SessionSummary::default());

        for metrics in [a, b] {
            let snapshot = metrics.snapshot();
            assert_eq!(snapshot.frames_received, 1);
            assert_eq!(snapshot.sessions_completed, 1);
        }
    }

    #[test]
    fn test_close_reason_labels() {
        assert_eq!(CloseReason::Completed.as_str(), "completed");
        assert_eq!(
            CloseReason::UpstreamInterrupted.as_str(),
            "upstream_interrupted"
        );
        assert_eq!(CloseReason::Cancelled.as_str(), "cancelled");
    }
}
