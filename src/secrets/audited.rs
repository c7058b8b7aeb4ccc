//! Audited key-manager client wrapper.
//!
//! Wraps any [`SecretStoreClient`] and writes one audit record per store call
//! to the `certbundle::audit` tracing target, plus a store-call counter.
//!
//! The audited client logs:
//! - Operation (`secrets.create`, `containers.create`, `containers.list`)
//! - Object name and, for containers, the role tags it references
//! - Success/failure status and the returned reference or error
//!
//! Payload values are NEVER logged.
//!
//! # Example
//!
//! ```rust,ignore
//! use certbundle::secrets::{AuditedSecretStore, BarbicanClient};
//!
//! let store = AuditedSecretStore::new(BarbicanClient::new(config)?);
//! let secret_ref = store.create_secret(&slot).await?;
//! ```

use async_trait::async_trait;

use super::client::{ContainerSummary, SecretStoreClient};
use super::error::Result;
use super::types::{ContainerRef, SecretRef};
use crate::certificates::{ContainerSpec, SecretSlot};
use crate::observability::MetricsRecorder;

const AUDIT_TARGET: &str = "certbundle::audit";

/// Audited wrapper for [`SecretStoreClient`] implementations.
pub struct AuditedSecretStore<T: SecretStoreClient> {
    inner: T,
    metrics: MetricsRecorder,
}

impl<T: SecretStoreClient> AuditedSecretStore<T> {
    pub fn new(inner: T) -> Self {
        Self { inner, metrics: MetricsRecorder::new() }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn record_success(&self, action: &str, name: &str, reference: &str) {
        tracing::info!(
            target: AUDIT_TARGET,
            action = %action,
            name = %name,
            reference = %reference,
            success = true,
            "Key manager operation succeeded"
        );
        self.metrics.record_store_call(action, true);
    }

    fn record_failure(&self, action: &str, name: &str, error: &str) {
        tracing::warn!(
            target: AUDIT_TARGET,
            action = %action,
            name = %name,
            error = %error,
            success = false,
            "Key manager operation failed"
        );
        self.metrics.record_store_call(action, false);
    }
}

#[async_trait]
impl<T: SecretStoreClient> SecretStoreClient for AuditedSecretStore<T> {
    async fn create_secret(&self, slot: &SecretSlot) -> Result<SecretRef> {
        match self.inner.create_secret(slot).await {
            Ok(secret_ref) => {
                self.record_success("secrets.create", &slot.name, secret_ref.as_str());
                Ok(secret_ref)
            }
            Err(e) => {
                self.record_failure("secrets.create", &slot.name, &e.to_string());
                Err(e)
            }
        }
    }

    async fn create_certificate_container(
        &self,
        container: &ContainerSpec,
    ) -> Result<ContainerRef> {
        let roles: Vec<&str> =
            container.secret_refs.iter().map(|entry| entry.name.tag()).collect();
        tracing::debug!(
            target: AUDIT_TARGET,
            container = %container.name,
            roles = ?roles,
            "Submitting container"
        );

        match self.inner.create_certificate_container(container).await {
            Ok(container_ref) => {
                self.record_success("containers.create", &container.name, container_ref.as_str());
                Ok(container_ref)
            }
            Err(e) => {
                self.record_failure("containers.create", &container.name, &e.to_string());
                Err(e)
            }
        }
    }

    async fn list_certificate_containers(&self) -> Result<Vec<ContainerSummary>> {
        match self.inner.list_certificate_containers().await {
            Ok(containers) => {
                self.record_success("containers.list", "*", &containers.len().to_string());
                Ok(containers)
            }
            Err(e) => {
                self.record_failure("containers.list", "*", &e.to_string());
                Err(e)
            }
        }
    }
}
