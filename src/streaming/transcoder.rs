use tracing::error;

use crate::models::azure::ChatCompletionChunk;
use crate::streaming::events::CanonicalEvent;

/// Text sent when a batch response carries no content
pub const BATCH_FALLBACK_TEXT: &str = "No response was returned by the model.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscoderState {
    Init,
    Streaming,
    Done,
}

/// Maps provider payloads onto the canonical event life cycle of one response
///
/// `open` → any number of deltas → `close`. Calls out of that order are
/// programming errors: they are logged and produce no events.
#[derive(Debug)]
pub struct EventTranscoder {
    id: String,
    state: TranscoderState,
    deltas: u64,
}

impl EventTranscoder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: TranscoderState::Init,
            deltas: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> TranscoderState {
        self.state
    }

    /// Number of deltas produced so far
    pub fn deltas(&self) -> u64 {
        self.deltas
    }

    /// INIT → STREAMING: `start`, `start-step`, `text-start`
    pub fn open(&mut self) -> Vec<CanonicalEvent> {
        if self.state != TranscoderState::Init {
            error!(id = %self.id, state = ?self.state, "open() called twice");
            return Vec::new();
        }
        self.state = TranscoderState::Streaming;

        vec![
            CanonicalEvent::Start,
            CanonicalEvent::StartStep,
            CanonicalEvent::TextStart {
                id: self.id.clone(),
            },
        ]
    }

    /// Turn one streamed payload into a delta, if it carries text
    pub fn transcode(&mut self, chunk: &ChatCompletionChunk) -> Option<CanonicalEvent> {
        let fragment = chunk.delta_content()?;
        if fragment.is_empty() {
            return None;
        }
        self.text(fragment.to_string())
    }

    /// Emit `text` as a delta unconditionally, empty strings included
    pub fn text(&mut self, text: String) -> Option<CanonicalEvent> {
        if self.state != TranscoderState::Streaming {
            error!(id = %self.id, state = ?self.state, "delta outside of an open text block");
            return None;
        }
        self.deltas += 1;

        Some(CanonicalEvent::TextDelta {
            id: self.id.clone(),
            delta: text,
        })
    }

    /// STREAMING → DONE: `text-end`, `finish-step`, `finish`
    pub fn close(&mut self) -> Vec<CanonicalEvent> {
        if self.state != TranscoderState::Streaming {
            error!(id = %self.id, state = ?self.state, "close() outside of an open text block");
            return Vec::new();
        }
        self.state = TranscoderState::Done;

        vec![
            CanonicalEvent::TextEnd {
                id: self.id.clone(),
            },
            CanonicalEvent::FinishStep,
            CanonicalEvent::Finish,
        ]
    }
}

/// Full event sequence for a response that arrived as one string
///
/// Drives a fresh transcoder from open to close. Always exactly one
/// `text-delta`; `None` becomes [`BATCH_FALLBACK_TEXT`].
pub fn sequence_batch(transcoder: &mut EventTranscoder, text: Option<String>) -> Vec<CanonicalEvent> {
    let mut events = transcoder.open();
    events.extend(transcoder.text(text.unwrap_or_else(|| BATCH_FALLBACK_TEXT.to_string())));
    events.extend(transcoder.close());
    events
}
