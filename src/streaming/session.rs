//! One response-production session.
//!
//! A [`Session`] owns everything a single inbound request needs: the upstream
//! body, the frame decoder and the transcoder. It yields canonical events in
//! protocol order and, through [`Session::into_stream`], the encoded
//! downstream bytes ending with the `[DONE]` frame.
//!
//! The upstream source is released when the session closes, and also when
//! the session is dropped early (e.g. the downstream client disconnected).

use bytes::{BufMut, Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::id::IdGenerator;
use crate::models::azure::ChatCompletionChunk;
use crate::observer::{CloseReason, SessionObserver, SessionSummary};
use crate::provider::{ProviderStream, UpstreamBody};
use crate::streaming::decoder::{DecodedFrame, FlushPolicy, FrameDecoder};
use crate::streaming::events::CanonicalEvent;
use crate::streaming::sse::{DONE_FRAME, encode_events};
use crate::streaming::transcoder::{EventTranscoder, sequence_batch};

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub flush: FlushPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Opening,
    Streaming,
    Done,
}

pub struct Session {
    transcoder: EventTranscoder,
    decoder: FrameDecoder<ChatCompletionChunk>,
    upstream: Option<UpstreamBody>,
    source: Option<ProviderStream>,
    options: SessionOptions,
    observer: Arc<dyn SessionObserver>,
    summary: SessionSummary,
    phase: Phase,
}

impl Session {
    pub fn new(
        upstream: UpstreamBody,
        ids: &dyn IdGenerator,
        options: SessionOptions,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            transcoder: EventTranscoder::new(ids.next_id()),
            decoder: FrameDecoder::new(),
            upstream: Some(upstream),
            source: None,
            options,
            observer,
            summary: SessionSummary::default(),
            phase: Phase::Opening,
        }
    }

    /// Text id shared by every `text-*` event of this session
    pub fn id(&self) -> &str {
        self.transcoder.id()
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Next group of events, or `None` once the session is closed
    ///
    /// The group that closes the session ends with `finish`.
    pub async fn next_events(&mut self) -> Option<Vec<CanonicalEvent>> {
        match self.phase {
            Phase::Opening => Some(self.open()),
            Phase::Streaming => Some(self.read_events().await),
            Phase::Done => None,
        }
    }

    /// Drive the session to the end and collect every event
    pub async fn collect_events(mut self) -> Vec<CanonicalEvent> {
        let mut events = Vec::new();
        while let Some(batch) = self.next_events().await {
            events.extend(batch);
        }
        events
    }

    /// Encoded downstream body: one buffer per event group, then `[DONE]`
    ///
    /// The stream ends exactly once. An encoding failure ends it early with
    /// an error; dropping the stream drops the session and its upstream source.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send {
        futures::stream::unfold(Some(self), |state| async move {
            let mut session = state?;
            let events = session.next_events().await?;

            let mut out = BytesMut::with_capacity(events.len() * 64);
            if let Err(e) = encode_events(&events, &mut out) {
                warn!(id = %session.id(), "Failed to encode events: {}", e);
                return Some((Err(std::io::Error::other(e)), None));
            }

            if session.is_done() {
                out.put_slice(DONE_FRAME);
                return Some((Ok(out.freeze()), None));
            }
            Some((Ok(out.freeze()), Some(session)))
        })
    }

    fn open(&mut self) -> Vec<CanonicalEvent> {
        match self.upstream.take() {
            Some(UpstreamBody::Stream(source)) => {
                debug!(id = %self.id(), "Session opened in streaming mode");
                self.source = Some(source);
                self.phase = Phase::Streaming;
                self.transcoder.open()
            }
            Some(UpstreamBody::Document(document)) => {
                debug!(id = %self.id(), "Session opened in batch mode");
                let events = sequence_batch(&mut self.transcoder, document.into_content());
                self.mark_closed(CloseReason::Completed);
                events
            }
            None => {
                let mut events = self.transcoder.open();
                events.extend(self.close(CloseReason::Completed));
                events
            }
        }
    }

    /// Read upstream chunks until one yields events or the source ends
    async fn read_events(&mut self) -> Vec<CanonicalEvent> {
        loop {
            let Some(source) = self.source.as_mut() else {
                return self.close(CloseReason::Completed);
            };

            match source.next().await {
                Some(Ok(chunk)) => {
                    let events = self.decode_chunk(&chunk);
                    if !events.is_empty() {
                        return events;
                    }
                }
                Some(Err(e)) => {
                    warn!(id = %self.id(), "Upstream read failed, closing session: {}", e);
                    return self.close(CloseReason::UpstreamInterrupted);
                }
                None => return self.close(CloseReason::Completed),
            }
        }
    }

    fn decode_chunk(&mut self, chunk: &[u8]) -> Vec<CanonicalEvent> {
        let frames = self.decoder.feed(chunk);
        frames
            .into_iter()
            .filter_map(|frame| self.accept(frame))
            .collect()
    }

    /// Filter one decoded frame: malformed frames are reported and skipped
    fn accept(&mut self, frame: DecodedFrame<ChatCompletionChunk>) -> Option<CanonicalEvent> {
        self.summary.frames += 1;
        self.observer.frame_received(self.transcoder.id(), frame.len);

        match frame.payload {
            Ok(chunk) => self.transcoder.transcode(&chunk),
            Err(malformed) => {
                self.summary.malformed += 1;
                self.observer
                    .frame_malformed(self.transcoder.id(), &malformed);
                None
            }
        }
    }

    /// CLOSING: flush the decoder, emit the closing events, release the source
    fn close(&mut self, reason: CloseReason) -> Vec<CanonicalEvent> {
        let mut events = Vec::new();
        if let Some(frame) = self.decoder.finish(self.options.flush) {
            events.extend(self.accept(frame));
        }
        events.extend(self.transcoder.close());

        if !self.decoder.saw_terminator() && self.summary.frames > 0 {
            debug!(id = %self.id(), "Upstream ended without a [DONE] frame");
        }
        self.mark_closed(reason);

        events
    }

    fn mark_closed(&mut self, reason: CloseReason) {
        self.source = None;
        self.summary.deltas = self.transcoder.deltas();
        self.phase = Phase::Done;
        self.observer
            .session_closed(self.transcoder.id(), reason, &self.summary);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.phase != Phase::Done {
            self.source = None;
            self.upstream = None;
            self.summary.deltas = self.transcoder.deltas();
            self.observer
                .session_closed(self.transcoder.id(), CloseReason::Cancelled, &self.summary);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::id::SequentialIdGenerator;
    use crate::observer::NoopObserver;
    use futures::stream;

    fn stream_body(chunks: Vec<&'static [u8]>) -> UpstreamBody {
        let items: Vec<crate::error::Result<Bytes>> = chunks
            .into_iter()
            .map(|c| Ok(Bytes::from_static(c)))
            .collect();
        UpstreamBody::Stream(Box::pin(stream::iter(items)))
    }

    fn session(upstream: UpstreamBody) -> Session {
        Session::new(
            upstream,
            &SequentialIdGenerator::new("t"),
            SessionOptions::default(),
            Arc::new(NoopObserver),
        )
    }

    fn kinds(events: &[CanonicalEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.kind()).collect()
    }

    #[tokio::test]
    async fn test_streaming_session_events() {
        let events = session(stream_body(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n\ndata: [DONE]\n\n",
        ]))
        .collect_events()
        .await;

        assert_eq!(
            kinds(&events),
            vec![
                "start",
                "start-step",
                "text-start",
                "text-delta",
                "text-delta",
                "text-end",
                "finish-step",
                "finish"
            ]
        );
        assert!(events.iter().filter_map(|e| e.text_id()).all(|id| id == "t-0"));
    }

    #[tokio::test]
    async fn test_empty_source_closes_normally() {
        let events = session(stream_body(vec![])).collect_events().await;
        assert_eq!(
            kinds(&events),
            vec![
                "start",
                "start-step",
                "text-start",
                "text-end",
                "finish-step",
                "finish"
            ]
        );
    }

    #[tokio::test]
    async fn test_read_error_closes_gracefully() {
        let items: Vec<crate::error::Result<Bytes>> = vec![
            Ok(Bytes::from_static(
                b"data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n",
            )),
            Err(BridgeError::UpstreamInterrupted("connection reset".to_string())),
            Ok(Bytes::from_static(
                b"data: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n\n",
            )),
        ];
        let events = session(UpstreamBody::Stream(Box::pin(stream::iter(items))))
            .collect_events()
            .await;

        let deltas: Vec<_> = events.iter().filter_map(|e| e.as_delta()).collect();
        assert_eq!(deltas, vec!["partial"]);
        assert_eq!(events.last(), Some(&CanonicalEvent::Finish));
    }

    #[tokio::test]
    async fn test_batch_document() {
        let document = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "All at once"}}]
        }))
        .unwrap();
        let mut session = session(UpstreamBody::Document(document));

        let first = session.next_events().await.unwrap();
        assert_eq!(first.len(), 7);
        assert_eq!(first[3].as_delta(), Some("All at once"));
        assert!(session.is_done());
        assert_eq!(session.summary().deltas, 1);
        assert!(session.next_events().await.is_none());
    }

    #[tokio::test]
    async fn test_into_stream_ends_with_done() {
        let chunks: Vec<Bytes> = session(stream_body(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n",
        ]))
        .into_stream()
        .map(|r| r.unwrap())
        .collect()
        .await;

        let body: Vec<u8> = chunks.concat();
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("data: {\"type\":\"start\"}\n\n"));
        assert!(text.ends_with("data: {\"type\":\"finish\"}\n\ndata: [DONE]\n\n"));
        assert_eq!(text.matches("[DONE]").count(), 1);
    }
}
