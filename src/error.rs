use crate::types::ConnectionId;

/// Transport-level failure while writing to a peer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("connection closed")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors returned by the connection registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("connection {0} is already registered")]
    DuplicateId(ConnectionId),

    #[error("connection {0} not found")]
    NotFound(ConnectionId),

    #[error("send to {id} failed: {source}")]
    Send {
        id: ConnectionId,
        #[source]
        source: SendError,
    },
}

/// Faults raised while building or encoding a reply
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Invalid configuration values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
