pub mod decoder;
pub mod events;
pub mod session;
pub mod sse;
pub mod transcoder;

pub use decoder::{DecodedFrame, FlushPolicy, FrameDecoder, FrameResult, MalformedFrame};
pub use events::CanonicalEvent;
pub use session::{Session, SessionOptions};
pub use sse::{DONE_FRAME, encode_event, encode_events, event_frame};
pub use transcoder::{BATCH_FALLBACK_TEXT, EventTranscoder, TranscoderState, sequence_batch};
