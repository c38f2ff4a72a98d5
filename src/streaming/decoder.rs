use bytes::BytesMut;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Marker every protocol frame starts with (an optional single space may follow)
pub const DATA_PREFIX: &[u8] = b"data:";

/// Payload of the frame that ends a stream
pub const DONE_TOKEN: &str = "[DONE]";

/// A frame that carried the data marker but could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedFrame {
    /// Raw frame text (lossy UTF-8)
    pub raw: String,
    /// Why decoding failed
    pub reason: String,
}

impl MalformedFrame {
    fn new(raw: &[u8], reason: impl Into<String>) -> Self {
        Self {
            raw: String::from_utf8_lossy(raw).into_owned(),
            reason: reason.into(),
        }
    }
}

pub type FrameResult<T> = std::result::Result<T, MalformedFrame>;

/// One complete data frame cut from the byte stream
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame<T> {
    /// Frame length in bytes, separator excluded
    pub len: usize,
    pub payload: FrameResult<T>,
}

/// What to do with bytes left in the buffer when the source ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushPolicy {
    /// Decode the unterminated tail as a final frame
    #[default]
    Lenient,
    /// Report the unterminated tail as malformed and drop it
    Strict,
}

impl std::str::FromStr for FlushPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(FlushPolicy::Lenient),
            "strict" => Ok(FlushPolicy::Strict),
            other => Err(format!("unknown flush policy: {}", other)),
        }
    }
}

/// Incremental decoder for blank-line separated `data:` frames
///
/// Bytes may arrive in arbitrary chunks; a frame is only decoded once its
/// separator (`\n\n` or `\r\n\r\n`) has been seen, so the resulting frame
/// sequence does not depend on how the input was split.
pub struct FrameDecoder<T> {
    buffer: BytesMut,
    /// Bytes of `buffer` already searched for a separator
    scanned: usize,
    saw_terminator: bool,
    _payload: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> FrameDecoder<T> {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            scanned: 0,
            saw_terminator: false,
            _payload: PhantomData,
        }
    }

    /// Feed new data and extract every complete data frame
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DecodedFrame<T>> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some((end, sep_len)) = self.find_separator() {
            let raw = self.buffer.split_to(end + sep_len);
            self.scanned = 0;
            if let Some(frame) = self.decode_frame(&raw[..end]) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Apply the end-of-stream policy to whatever is still buffered
    pub fn finish(&mut self, policy: FlushPolicy) -> Option<DecodedFrame<T>> {
        let rest = self.buffer.split();
        self.scanned = 0;

        if rest.iter().all(u8::is_ascii_whitespace) {
            return None;
        }

        match policy {
            FlushPolicy::Lenient => {
                tracing::debug!(len = rest.len(), "Decoding unterminated trailing frame");
                self.decode_frame(&rest)
            }
            FlushPolicy::Strict => Some(DecodedFrame {
                len: rest.len(),
                payload: Err(MalformedFrame::new(
                    &rest,
                    "truncated frame: stream ended before the frame separator",
                )),
            }),
        }
    }

    /// Whether the `[DONE]` frame has been seen
    pub fn saw_terminator(&self) -> bool {
        self.saw_terminator
    }

    /// Bytes waiting for a separator
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Position and length of the first separator: `\n` + optional `\r` + `\n`
    fn find_separator(&mut self) -> Option<(usize, usize)> {
        let buf = &self.buffer[..];
        let mut i = self.scanned;

        while i < buf.len() {
            if buf[i] == b'\n' {
                match (buf.get(i + 1), buf.get(i + 2)) {
                    (Some(b'\n'), _) => return Some((i, 2)),
                    (Some(b'\r'), Some(b'\n')) => return Some((i, 3)),
                    // Not enough bytes yet to rule a separator in or out
                    (None, _) | (Some(b'\r'), None) => break,
                    _ => {}
                }
            }
            i += 1;
        }

        self.scanned = i;
        None
    }

    fn decode_frame(&mut self, raw: &[u8]) -> Option<DecodedFrame<T>> {
        let body = raw.trim_ascii_start().strip_prefix(DATA_PREFIX)?;
        let body = body.strip_prefix(b" ").unwrap_or(body);

        let payload = match std::str::from_utf8(body) {
            Ok(text) => {
                let text = text.trim();
                if text == DONE_TOKEN {
                    self.saw_terminator = true;
                    return None;
                }
                serde_json::from_str::<T>(text).map_err(|e| MalformedFrame::new(raw, e.to_string()))
            }
            Err(e) => Err(MalformedFrame::new(raw, format!("invalid UTF-8: {}", e))),
        };

        Some(DecodedFrame {
            len: raw.len(),
            payload,
        })
    }
}

impl<T: DeserializeOwned> Default for FrameDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}
