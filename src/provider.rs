use bytes::Bytes;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::models::azure::{ChatCompletion, ProviderRequest};

/// Type alias for the streaming response body from a provider
pub type ProviderStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Type alias for the future returned by `complete`
pub type CompletionFuture = Pin<Box<dyn Future<Output = Result<UpstreamBody>> + Send>>;

/// Successful provider response, in whichever shape the provider chose
pub enum UpstreamBody {
    /// Raw body bytes, positioned at the start of the event stream
    Stream(ProviderStream),
    /// Already parsed batch document
    Document(ChatCompletion),
}

impl UpstreamBody {
    pub fn is_stream(&self) -> bool {
        matches!(self, UpstreamBody::Stream(_))
    }
}

impl std::fmt::Debug for UpstreamBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamBody::Stream(_) => f.write_str("UpstreamBody::Stream(..)"),
            UpstreamBody::Document(doc) => f.debug_tuple("UpstreamBody::Document").field(doc).finish(),
        }
    }
}

/// Trait for chat completion providers
pub trait Provider: Send + Sync {
    /// Send a chat completion request
    ///
    /// `request.stream` selects the response shape. Non-success statuses and
    /// connection failures resolve to an error before any body is handed out.
    fn complete(&self, request: ProviderRequest) -> CompletionFuture;

    /// Get the provider name for logging
    fn name(&self) -> &str;
}
