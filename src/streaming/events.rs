use serde::{Deserialize, Serialize};

/// Life-cycle events of the UI message stream protocol
///
/// Serialized as `{"type": "<kebab-case name>", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CanonicalEvent {
    Start,
    StartStep,
    TextStart { id: String },
    TextDelta { id: String, delta: String },
    TextEnd { id: String },
    FinishStep,
    Finish,
}

impl CanonicalEvent {
    /// Text id carried by `text-*` events
    pub fn text_id(&self) -> Option<&str> {
        match self {
            CanonicalEvent::TextStart { id }
            | CanonicalEvent::TextDelta { id, .. }
            | CanonicalEvent::TextEnd { id } => Some(id),
            _ => None,
        }
    }

    pub fn as_delta(&self) -> Option<&str> {
        match self {
            CanonicalEvent::TextDelta { delta, .. } => Some(delta),
            _ => None,
        }
    }

    /// Wire name of the event
    pub fn kind(&self) -> &'static str {
        match self {
            CanonicalEvent::Start => "start",
            CanonicalEvent::StartStep => "start-step",
            CanonicalEvent::TextStart { .. } => "text-start",
            CanonicalEvent::TextDelta { .. } => "text-delta",
            CanonicalEvent::TextEnd { .. } => "text-end",
            CanonicalEvent::FinishStep => "finish-step",
            CanonicalEvent::Finish => "finish",
        }
    }
}
