//! Error types for the accounts API client.
//!
//! # Design
//! Transport failures get their own enum so callers can tell a deadline that
//! elapsed apart from a refused connection or an explicit cancellation. Every
//! error is handed back to the immediate caller; nothing is retried here.

use thiserror::Error;

/// Errors returned by `Transport::execute` and the `AccountsClient` verbs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A response body could not be decoded into the requested type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The verb, location or a header of the request is not valid on the wire.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The HTTP client could not be built from the given `TransportOptions`.
    #[error("client build error: {0}")]
    Build(String),

    /// The round trip itself failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Network-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The call deadline (or the client request timeout) elapsed first.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// The caller fired the cancellation token.
    #[error("context canceled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// True when the call was aborted because its deadline passed.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, ApiError::Transport(TransportError::DeadlineExceeded))
    }

    /// True when the call was aborted through its cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Transport(TransportError::Cancelled))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::DeadlineExceeded.into()
        } else if err.is_builder() {
            ApiError::MalformedRequest(err.to_string())
        } else if err.is_connect() {
            TransportError::Connection(err.to_string()).into()
        } else {
            TransportError::Other(err.to_string()).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_message_mentions_deadline() {
        let err = ApiError::from(TransportError::DeadlineExceeded);
        assert!(err.to_string().contains("deadline exceeded"));
        assert!(err.is_deadline_exceeded());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn cancelled_is_not_a_deadline() {
        let err = ApiError::from(TransportError::Cancelled);
        assert!(err.is_cancelled());
        assert!(!err.is_deadline_exceeded());
        assert_eq!(err.to_string(), "transport error: context canceled");
    }

    #[test]
    fn connection_display() {
        let err = ApiError::from(TransportError::Connection("refused".to_string()));
        assert_eq!(err.to_string(), "transport error: connection failed: refused");
    }

    #[test]
    fn build_error_is_not_a_transport_failure() {
        let err = ApiError::Build("no TLS backend".to_string());
        assert_eq!(err.to_string(), "client build error: no TLS backend");
        assert!(!matches!(err, ApiError::Transport(_)));
        assert!(!err.is_deadline_exceeded());
    }
}
