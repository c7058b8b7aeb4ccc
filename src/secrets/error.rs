//! Error types for key-manager client operations.

use thiserror::Error;

/// Result type for key-manager operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors that can occur while talking to the key-manager service.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Referenced object does not exist in the store.
    #[error("Secret not found: {key}")]
    NotFound { key: String },

    /// Failed to connect to the key manager.
    #[error("Key manager connection failed: {message}")]
    ConnectionFailed { message: String },

    /// The key manager rejected our credentials.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The key manager answered with a non-success status.
    #[error("Key manager returned {status}: {message}")]
    BackendError { status: u16, message: String },

    /// Client configuration error.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Response body could not be decoded.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Transport-level HTTP failure that is not a connect error.
    #[error("HTTP request failed: {0}")]
    HttpError(String),
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: message.into() }
    }

    /// Create an authentication failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: message.into() }
    }

    /// Create a backend error carrying the HTTP status.
    pub fn backend_error(status: u16, message: impl Into<String>) -> Self {
        Self::BackendError { status, message: message.into() }
    }

    /// Create a config error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    /// Whether the failure happened before the store saw the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::HttpError(_))
    }
}

impl From<reqwest::Error> for SecretsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::connection_failed(err.to_string())
        } else if err.is_decode() {
            Self::HttpError(format!("invalid response body: {err}"))
        } else {
            Self::HttpError(err.to_string())
        }
    }
}
