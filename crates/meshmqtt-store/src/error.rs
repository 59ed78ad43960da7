//! Error types for the message archive

use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema creation failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// No backend handles the DSN scheme
    #[error("unsupported store type: {0}")]
    UnsupportedStore(String),

    /// The DSN could not be parsed
    #[error("Invalid store DSN: {0}")]
    InvalidDsn(String),

    /// No DSN was configured
    #[error("Store DSN is empty")]
    EmptyDsn,
}

impl StoreError {
    /// Message lookup miss.
    pub fn message_not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: "message".to_string(),
            id: id.into(),
        }
    }

    /// Check if this error is caused by configuration rather than runtime state
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StoreError::UnsupportedStore(_) | StoreError::InvalidDsn(_) | StoreError::EmptyDsn
        )
    }

    /// Check if retrying the operation could succeed
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            StoreError::Database(_) | StoreError::Connection(_) | StoreError::Io(_)
        )
    }

    /// Get an error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Database(_) => "DATABASE",
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::Serialization(_) => "SERIALIZATION",
            StoreError::Io(_) => "IO",
            StoreError::Connection(_) => "CONNECTION",
            StoreError::Migration(_) => "MIGRATION",
            StoreError::UnsupportedStore(_) => "UNSUPPORTED_STORE",
            StoreError::InvalidDsn(_) => "INVALID_DSN",
            StoreError::EmptyDsn => "EMPTY_DSN",
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound {
                entity: "record".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::Configuration(e) => StoreError::InvalidDsn(e.to_string()),
            sqlx::Error::Io(e) => StoreError::Connection(e.to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Connection(err.to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<meshmqtt_translate::TranslateError> for StoreError {
    fn from(err: meshmqtt_translate::TranslateError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
