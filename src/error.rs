use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// The provider answered with a non-success status. The display form is
    /// the plain-text body returned to the client.
    #[error("Error: {status} - {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream stream interrupted: {0}")]
    UpstreamInterrupted(String),

    #[error("Invalid upstream response: {0}")]
    InvalidUpstreamResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl BridgeError {
    /// Whether this error happened before any event could reach the client.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::UpstreamStatus { .. }
                | BridgeError::UpstreamUnavailable(_)
                | BridgeError::InvalidUpstreamResponse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
