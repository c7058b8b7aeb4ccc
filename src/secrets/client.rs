//! Key-manager client trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::Result;
use super::types::{ContainerRef, SecretRef};
use crate::certificates::{ContainerSpec, SecretSlot};

/// A certificate container as reported by the store's listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerSummary {
    /// Container name; the store allows unnamed containers
    #[serde(default)]
    pub name: Option<String>,

    /// Reference of the container
    pub container_ref: ContainerRef,

    /// Lifecycle status reported by the store, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Operations the certificate workflow needs from a key manager.
///
/// # Security Considerations
///
/// - Implementations MUST NOT log payload values
/// - Timeouts belong to the implementation; callers do not impose any
///
/// # Example Implementation
///
/// ```rust,ignore
/// use certbundle::secrets::{SecretStoreClient, SecretRef, ContainerRef, Result};
///
/// struct NullStore;
///
/// #[async_trait]
/// impl SecretStoreClient for NullStore {
///     async fn create_secret(&self, slot: &SecretSlot) -> Result<SecretRef> {
///         Ok(SecretRef::from_string(format!("null://secrets/{}", slot.name)))
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait SecretStoreClient: Send + Sync {
    /// Store one secret and return its reference.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::AuthenticationFailed`] if credentials are rejected
    /// - [`SecretsError::BackendError`] if the store refuses the secret
    /// - [`SecretsError::ConnectionFailed`] if the store is unreachable
    ///
    /// [`SecretsError::AuthenticationFailed`]: super::SecretsError::AuthenticationFailed
    /// [`SecretsError::BackendError`]: super::SecretsError::BackendError
    /// [`SecretsError::ConnectionFailed`]: super::SecretsError::ConnectionFailed
    async fn create_secret(&self, slot: &SecretSlot) -> Result<SecretRef>;

    /// Create a certificate container referencing previously created secrets.
    async fn create_certificate_container(&self, container: &ContainerSpec)
        -> Result<ContainerRef>;

    /// List every certificate container visible to the caller.
    async fn list_certificate_containers(&self) -> Result<Vec<ContainerSummary>>;
}
