use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::streaming::events::CanonicalEvent;

/// Final frame of every downstream stream
pub const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

/// Append one event as `data: <json>\n\n`
pub fn encode_event(event: &CanonicalEvent, out: &mut BytesMut) -> Result<()> {
    out.put_slice(b"data: ");
    serde_json::to_writer((&mut *out).writer(), event)?;
    out.put_slice(b"\n\n");
    Ok(())
}

/// Encode a batch of events into one buffer, preserving order
pub fn encode_events(events: &[CanonicalEvent], out: &mut BytesMut) -> Result<()> {
    for event in events {
        encode_event(event, out)?;
    }
    Ok(())
}

/// Convenience wrapper returning a single frozen frame
pub fn event_frame(event: &CanonicalEvent) -> Result<Bytes> {
    let mut out = BytesMut::with_capacity(64);
    encode_event(event, &mut out)?;
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_start() {
        let frame = event_frame(&CanonicalEvent::Start).unwrap();
        assert_eq!(&frame[..], b"data: {\"type\":\"start\"}\n\n");
    }

    #[test]
    fn test_encode_delta_escapes_text() {
        let frame = event_frame(&CanonicalEvent::TextDelta {
            id: "t1".into(),
            delta: "line\n\n\"quoted\"".into(),
        })
        .unwrap();
        let text = std::str::from_utf8(&frame).unwrap();

        assert!(text.starts_with("data: "));
        assert!(text.ends_with("\n\n"));
        // Newlines inside the payload are escaped, so the frame has one separator
        assert_eq!(text.matches("\n\n").count(), 1);
        assert!(text.contains(r#""delta":"line\n\n\"quoted\"""#));
    }

    #[test]
    fn test_encode_events_in_order() {
        let mut out = BytesMut::new();
        encode_events(
            &[
                CanonicalEvent::FinishStep,
                CanonicalEvent::Finish,
            ],
            &mut out,
        )
        .unwrap();
        out.put_slice(DONE_FRAME);

        assert_eq!(
            std::str::from_utf8(&out).unwrap(),
            "data: {\"type\":\"finish-step\"}\n\ndata: {\"type\":\"finish\"}\n\ndata: [DONE]\n\n"
        );
    }
}
