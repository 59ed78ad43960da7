//! Error types for envelope translation
//!
//! Outer envelope failures are fatal to a translation call. Inner payload
//! failures are reported through [`TranslateError::PayloadDecode`] so the
//! parser can log them and fall back to raw bytes.

use thiserror::Error;

/// Main error type for translation operations
#[derive(Error, Debug)]
pub enum TranslateError {
    // ===== Protocol Errors =====
    /// The outer ServiceEnvelope could not be decoded
    #[error("Failed to decode ServiceEnvelope: {0}")]
    EnvelopeDecode(String),

    /// An inner payload could not be decoded
    #[error("Failed to decode {port} payload: {reason}")]
    PayloadDecode {
        /// Port name the payload was addressed to
        port: String,
        /// Decoder failure reason
        reason: String,
    },

    /// Protobuf decode error
    #[error("Protobuf decode error: {0}")]
    ProtobufDecode(String),

    // ===== Serialization Errors =====
    /// JSON encoding failed
    #[error("JSON encoding failed: {0}")]
    JsonEncode(String),

    // ===== Hook Errors =====
    /// The parse hook reported a failure
    #[error("Parse hook failed: {0}")]
    Hook(String),
}

impl TranslateError {
    /// Check if this error was caused by bad data on the wire
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            TranslateError::EnvelopeDecode(_)
                | TranslateError::PayloadDecode { .. }
                | TranslateError::ProtobufDecode(_)
        )
    }

    /// Get an error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            TranslateError::EnvelopeDecode(_) => "ENVELOPE_DECODE",
            TranslateError::PayloadDecode { .. } => "PAYLOAD_DECODE",
            TranslateError::ProtobufDecode(_) => "PROTOBUF_DECODE",
            TranslateError::JsonEncode(_) => "JSON_ENCODE",
            TranslateError::Hook(_) => "HOOK_FAILED",
        }
    }
}

/// Result type alias for translation operations
pub type Result<T> = std::result::Result<T, TranslateError>;

// Conversion from prost decode error
impl From<prost::DecodeError> for TranslateError {
    fn from(err: prost::DecodeError) -> Self {
        TranslateError::ProtobufDecode(err.to_string())
    }
}

impl From<serde_json::Error> for TranslateError {
    fn from(err: serde_json::Error) -> Self {
        TranslateError::JsonEncode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = TranslateError::EnvelopeDecode("truncated".to_string());
        assert_eq!(err.error_code(), "ENVELOPE_DECODE");
        assert_eq!(TranslateError::Hook("x".into()).error_code(), "HOOK_FAILED");
    }

    #[test]
    fn test_is_protocol_error() {
        assert!(TranslateError::EnvelopeDecode("bad".into()).is_protocol_error());
        assert!(TranslateError::PayloadDecode {
            port: "TELEMETRY_APP".into(),
            reason: "bad".into(),
        }
        .is_protocol_error());
        assert!(!TranslateError::Hook("store down".into()).is_protocol_error());
    }

    #[test]
    fn test_payload_decode_message() {
        let err = TranslateError::PayloadDecode {
            port: "POSITION_APP".into(),
            reason: "buffer underflow".into(),
        };
        assert!(err.to_string().contains("POSITION_APP"));
        assert!(err.to_string().contains("buffer underflow"));
    }

    #[test]
    fn test_from_prost_error() {
        let err = <crate::proto::ServiceEnvelope as prost::Message>::decode(&[0xff, 0xff][..])
            .map_err(TranslateError::from)
            .unwrap_err();
        assert_eq!(err.error_code(), "PROTOBUF_DECODE");
    }
}
