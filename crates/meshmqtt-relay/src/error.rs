//! Relay error types

use thiserror::Error;

/// Errors that end a relay or fan-out session
#[derive(Error, Debug)]
pub enum RelayError {
    /// Could not reach the broker
    #[error("Failed to connect {role} broker: {reason}")]
    Connect { role: String, reason: String },

    /// The broker refused a subscription
    #[error("Failed to subscribe to {filter}: {reason}")]
    Subscribe { filter: String, reason: String },

    /// A publish was rejected or the client is gone
    #[error("Failed to publish to {topic}: {reason}")]
    Publish { topic: String, reason: String },

    /// No acknowledgment before the publish deadline
    #[error("Publish to {topic} timed out after {duration_ms}ms")]
    PublishTimeout { topic: String, duration_ms: u64 },

    /// Broker URL could not be parsed
    #[error("Invalid broker URL: {0}")]
    InvalidBrokerUrl(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Internal channel closed
    #[error("Channel error: {0}")]
    ChannelClosed(String),

    /// Translation failed
    #[error(transparent)]
    Translate(#[from] meshmqtt_translate::TranslateError),

    /// Store failed
    #[error(transparent)]
    Store(#[from] meshmqtt_store::StoreError),
}

impl RelayError {
    /// Connect failure for the named role (`source` or `dest`).
    pub fn connect(role: impl Into<String>, reason: impl ToString) -> Self {
        RelayError::Connect {
            role: role.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if this is a broker transport error
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            RelayError::Connect { .. }
                | RelayError::Subscribe { .. }
                | RelayError::Publish { .. }
                | RelayError::PublishTimeout { .. }
        )
    }

    /// Get an error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            RelayError::Connect { .. } => "CONNECT",
            RelayError::Subscribe { .. } => "SUBSCRIBE",
            RelayError::Publish { .. } => "PUBLISH",
            RelayError::PublishTimeout { .. } => "PUBLISH_TIMEOUT",
            RelayError::InvalidBrokerUrl(_) => "INVALID_BROKER_URL",
            RelayError::InvalidConfig(_) => "INVALID_CONFIG",
            RelayError::ChannelClosed(_) => "CHANNEL_CLOSED",
            RelayError::Translate(e) => e.error_code(),
            RelayError::Store(e) => e.error_code(),
        }
    }
}

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(RelayError::connect("source", "refused").is_transport_error());
        assert!(RelayError::PublishTimeout {
            topic: "a/b".into(),
            duration_ms: 60_000
        }
        .is_transport_error());
        assert!(!RelayError::InvalidConfig("x".into()).is_transport_error());
    }

    #[test]
    fn test_messages() {
        let err = RelayError::connect("dest", "connection refused");
        assert_eq!(
            err.to_string(),
            "Failed to connect dest broker: connection refused"
        );
        assert_eq!(err.error_code(), "CONNECT");
    }

    #[test]
    fn test_store_error_code_passes_through() {
        let err: RelayError = meshmqtt_store::StoreError::EmptyDsn.into();
        assert_eq!(err.error_code(), "EMPTY_DSN");
    }
}
