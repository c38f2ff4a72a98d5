use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::id::{IdGenerator, UuidIdGenerator};
use crate::metrics::SessionMetrics;
use crate::models::ui::ChatRequest;
use crate::observer::{ObserverSet, SessionObserver, TracingObserver};
use crate::provider::Provider;
use crate::streaming::{FlushPolicy, Session, SessionOptions};
use crate::transform::build_provider_request;

/// Header announcing the UI message stream protocol version
pub const UI_MESSAGE_STREAM_HEADER: &str = "x-vercel-ai-ui-message-stream";

pub struct AppState {
    pub provider: Arc<dyn Provider>,
    pub ids: Arc<dyn IdGenerator>,
    pub metrics: Arc<SessionMetrics>,
    pub observer: Arc<dyn SessionObserver>,
    /// Ask the provider for an SSE stream instead of a single document
    pub stream: bool,
    pub data_sources: Option<serde_json::Value>,
    pub session: SessionOptions,
}

impl AppState {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        let metrics = Arc::new(SessionMetrics::new());
        Self {
            provider,
            ids: Arc::new(UuidIdGenerator),
            observer: Arc::new(default_observers(&metrics)),
            metrics,
            stream: true,
            data_sources: None,
            session: SessionOptions::default(),
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &BridgeConfig) -> Self {
        Self::new(provider)
            .with_stream(config.azure.stream)
            .with_data_sources(config.data_sources())
            .with_flush(config.session.flush)
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_data_sources(mut self, data_sources: Option<serde_json::Value>) -> Self {
        self.data_sources = data_sources;
        self
    }

    pub fn with_flush(mut self, flush: FlushPolicy) -> Self {
        self.session.flush = flush;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Add an observer next to the default tracing and metrics observers
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Arc::new(default_observers(&self.metrics).with(observer));
        self
    }
}

fn default_observers(metrics: &Arc<SessionMetrics>) -> ObserverSet {
    ObserverSet::new()
        .with(Arc::new(TracingObserver))
        .with(metrics.clone())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn handle_chat(
    State(state): State<Arc<AppState>>,
    Json(chat_req): Json<ChatRequest>,
) -> Response {
    info!("Incoming chat request with {} messages", chat_req.messages.len());
    for (index, msg) in chat_req.messages.iter().enumerate() {
        debug!(
            index,
            id = ?msg.id,
            role = msg.role.as_str(),
            parts = msg.parts.len(),
            "Incoming message"
        );
    }

    let request = build_provider_request(
        &chat_req.messages,
        state.data_sources.clone(),
        state.stream,
    );

    let upstream = match state.provider.complete(request).await {
        Ok(body) => body,
        Err(e) => {
            error!("{} request failed: {}", state.provider.name(), e);
            return upstream_error_response(&e);
        }
    };

    let session = Session::new(
        upstream,
        state.ids.as_ref(),
        state.session,
        state.observer.clone(),
    );
    info!(id = %session.id(), "Streaming UI message events");

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (HeaderName::from_static(UI_MESSAGE_STREAM_HEADER), "v1"),
        ],
        Body::from_stream(session.into_stream()),
    )
        .into_response()
}

/// Plain-text 500 answer for failures that happen before any event
fn upstream_error_response(err: &BridgeError) -> Response {
    let body = match err {
        BridgeError::UpstreamStatus { .. } => err.to_string(),
        other => format!("Error: {}", other),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "provider": state.provider.name(),
        "metrics": state.metrics.snapshot(),
    }))
}
