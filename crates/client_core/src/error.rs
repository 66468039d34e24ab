use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid coordinator endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },
    #[error("timed out connecting to {endpoint} after {timeout_ms} ms")]
    ConnectTimeout { endpoint: String, timeout_ms: u64 },
    #[error("transport was already used for a session")]
    Reused,
    #[error("transport is not connected")]
    NotConnected,
    #[error("failed to encode outbound command: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Reasons an inbound frame was dropped. None of these end the session.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("unknown event type: {0}")]
    UnknownEventType(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("sprint goal must not be empty")]
    EmptyGoal,
    #[error("could not open sprint session: {0}")]
    Connect(#[from] TransportError),
}
