use thiserror::Error;

/// Failures reported by the transport collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection dropped: {0}")]
    ConnectionDropped(String),

    #[error("Subscription rejected: {0}")]
    SubscriptionRejected(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::SourceUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::MalformedPayload(err.to_string())
    }
}

/// Errors surfaced by the subscription registry
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid subscription purpose: {0}")]
    InvalidPurpose(String),
}
