//! Known certificate names, used for uniqueness checks and refreshed after a
//! bundle is created.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::secrets::{ContainerSummary, Result, SecretStoreClient};

/// Source of the certificate names that already exist.
#[async_trait]
pub trait NameRegistry: Send + Sync {
    /// Current snapshot of known certificate names.
    fn certificate_names(&self) -> Vec<String>;

    /// Re-fetch the listing so the snapshot includes newly created bundles.
    async fn refresh_certificate_list(&self) -> Result<()>;
}

/// Name registry backed by the key manager's certificate container listing.
pub struct CertificateModel {
    store: Arc<dyn SecretStoreClient>,
    certificates: RwLock<Vec<ContainerSummary>>,
}

impl CertificateModel {
    /// Create an empty model; call [`NameRegistry::refresh_certificate_list`]
    /// to populate it.
    pub fn new(store: Arc<dyn SecretStoreClient>) -> Self {
        Self { store, certificates: RwLock::new(Vec::new()) }
    }

    /// Containers from the last successful refresh.
    pub fn certificates(&self) -> Vec<ContainerSummary> {
        match self.certificates.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl NameRegistry for CertificateModel {
    fn certificate_names(&self) -> Vec<String> {
        self.certificates().into_iter().filter_map(|summary| summary.name).collect()
    }

    async fn refresh_certificate_list(&self) -> Result<()> {
        let listing = match self.store.list_certificate_containers().await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(error = %e, "Failed to refresh certificate listing");
                return Err(e);
            }
        };

        debug!(count = listing.len(), "Refreshed certificate listing");
        match self.certificates.write() {
            Ok(mut guard) => *guard = listing,
            Err(poisoned) => *poisoned.into_inner() = listing,
        }
        Ok(())
    }
}
