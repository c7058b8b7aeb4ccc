//! Capability probe backed by the identity service's `/v3/auth/catalog`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace};

use super::{CapabilityProbe, CatalogError};
use crate::secrets::SecretPayload;

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<serde_json::Value>,
}

/// Probes the caller's service catalog on every call.
pub struct KeystoneCatalogProbe {
    client: Client,
    identity_endpoint: String,
    token: SecretPayload,
}

impl KeystoneCatalogProbe {
    pub fn new(
        identity_endpoint: impl Into<String>,
        token: SecretPayload,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::unreachable(format!("failed to build HTTP client: {e}")))?;

        let identity_endpoint = identity_endpoint.into().trim_end_matches('/').to_string();
        Ok(Self { client, identity_endpoint, token })
    }

    async fn fetch_catalog(&self) -> Result<CatalogResponse, CatalogError> {
        let url = format!("{}/v3/auth/catalog", self.identity_endpoint);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Auth-Token", self.token.expose_secret())
            .send()
            .await
            .map_err(|e| CatalogError::unreachable(e.to_string()))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CatalogError::unauthorized(status.to_string()));
        }

        let body = response.text().await.map_err(|e| CatalogError::unreachable(e.to_string()))?;
        if !status.is_success() {
            trace!("Error response:\n{}", body);
            return Err(CatalogError::invalid_response(format!("status {status}: {body}")));
        }

        serde_json::from_str(&body).map_err(|e| CatalogError::invalid_response(e.to_string()))
    }
}

#[async_trait]
impl CapabilityProbe for KeystoneCatalogProbe {
    async fn is_capability_enabled(&self, name: &str) -> Result<bool, CatalogError> {
        let catalog = self.fetch_catalog().await?;
        let enabled = catalog
            .catalog
            .iter()
            .any(|entry| entry.service_type == name && !entry.endpoints.is_empty());

        debug!(service_type = %name, enabled, "Probed service catalog");
        Ok(enabled)
    }
}
