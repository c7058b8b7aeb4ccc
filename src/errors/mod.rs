//! # Error Handling
//!
//! Crate-level error type plus the field-check errors raised while reading
//! PEM material. Store and probe failures have their own enums next to the
//! code that produces them and convert into [`Error`].

pub mod pem;

pub use pem::PemError;

use crate::catalog::CatalogError;
use crate::secrets::SecretsError;

/// Custom result type for certbundle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for certbundle
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors on user-supplied input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Key-manager client errors
    #[error(transparent)]
    Secrets(#[from] SecretsError),

    /// Service catalog errors
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}
