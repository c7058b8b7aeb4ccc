//! # Service catalog
//!
//! Answers whether an optional backend service type is deployed before any
//! work is sent to it. Two probes are provided:
//!
//! - [`ServiceCatalog`]: a fixed list of enabled service types, usually taken
//!   from configuration.
//! - [`KeystoneCatalogProbe`]: asks the identity service for the caller's
//!   service catalog on every probe.

pub mod keystone;

pub use keystone::KeystoneCatalogProbe;

use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;

/// Service type of the key manager.
pub const KEY_MANAGER_SERVICE: &str = "key-manager";

/// Errors raised while probing the service catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Identity service could not be reached.
    #[error("Identity service unreachable: {message}")]
    Unreachable { message: String },

    /// Identity service rejected the token.
    #[error("Identity service rejected the token: {message}")]
    Unauthorized { message: String },

    /// Identity service answered with something we could not use.
    #[error("Invalid catalog response: {message}")]
    InvalidResponse { message: String },
}

impl CatalogError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse { message: message.into() }
    }
}

/// Reports whether a named service type is available.
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    async fn is_capability_enabled(&self, name: &str) -> Result<bool, CatalogError>;
}

/// Static set of enabled service types.
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    enabled: BTreeSet<String>,
}

impl ServiceCatalog {
    pub fn new<I, S>(enabled: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { enabled: enabled.into_iter().map(Into::into).collect() }
    }

    /// Catalog with only the key manager enabled.
    pub fn with_key_manager() -> Self {
        Self::new([KEY_MANAGER_SERVICE])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }
}

#[async_trait]
impl CapabilityProbe for ServiceCatalog {
    async fn is_capability_enabled(&self, name: &str) -> Result<bool, CatalogError> {
        Ok(self.contains(name))
    }
}
