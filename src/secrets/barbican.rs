//! Barbican-style key-manager client.
//!
//! Talks to the key manager's REST API directly over `reqwest`:
//!
//! - `POST {endpoint}/v1/secrets` stores one secret
//! - `POST {endpoint}/v1/containers` assembles a certificate container
//! - `GET {endpoint}/v1/containers?type=certificate` lists containers, paged
//!
//! Every request carries `X-Auth-Token` and, when configured,
//! `X-Project-Id`. The token and payloads are never logged.
//!
//! # Example
//!
//! ```rust,ignore
//! use certbundle::secrets::{BarbicanClient, BarbicanConfig};
//!
//! let client = BarbicanClient::new(BarbicanConfig {
//!     endpoint: "https://kms.example.com:9311".to_string(),
//!     token: "gAAAA...".into(),
//!     ..Default::default()
//! })?;
//! let names = client.list_certificate_containers().await?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

use super::client::{ContainerSummary, SecretStoreClient};
use super::error::{Result, SecretsError};
use super::types::{ContainerRef, SecretPayload, SecretRef};
use crate::certificates::{ContainerSpec, SecretSlot, CERTIFICATE_CONTAINER_TYPE};

/// Connection settings for [`BarbicanClient`].
#[derive(Debug, Clone)]
pub struct BarbicanConfig {
    /// Base URL of the key manager (e.g., "https://kms.example.com:9311")
    pub endpoint: String,

    /// Identity token sent as `X-Auth-Token`
    pub token: SecretPayload,

    /// Project scope sent as `X-Project-Id`
    pub project_id: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,

    /// Containers requested per listing page
    pub page_size: u32,
}

impl Default for BarbicanConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9311".to_string(),
            token: SecretPayload::default(),
            project_id: None,
            timeout: Duration::from_secs(30),
            page_size: 100,
        }
    }
}

#[derive(Serialize)]
struct CreateSecretBody<'a> {
    name: &'a str,
    payload: &'a str,
    payload_content_type: &'a str,
}

#[derive(Deserialize)]
struct CreateSecretResponse {
    secret_ref: SecretRef,
}

#[derive(Deserialize)]
struct CreateContainerResponse {
    container_ref: ContainerRef,
}

#[derive(Deserialize)]
struct ContainerPage {
    #[serde(default)]
    containers: Vec<ContainerSummary>,
    #[serde(default)]
    total: Option<usize>,
}

/// [`SecretStoreClient`] over the key manager's REST API.
#[derive(Debug, Clone)]
pub struct BarbicanClient {
    client: Client,
    config: BarbicanConfig,
}

impl BarbicanClient {
    /// Build a client; fails only when the endpoint is unusable or the HTTP
    /// client cannot be constructed.
    pub fn new(mut config: BarbicanConfig) -> Result<Self> {
        url::Url::parse(&config.endpoint).map_err(|e| {
            SecretsError::config_error(format!("invalid key manager endpoint: {e}"))
        })?;
        if config.page_size == 0 {
            return Err(SecretsError::config_error("page_size must be at least 1"));
        }
        config.endpoint = config.endpoint.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SecretsError::config_error(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Base URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("X-Auth-Token", self.config.token.expose_secret());
        match &self.config.project_id {
            Some(project_id) => builder.header("X-Project-Id", project_id),
            None => builder,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.endpoint, path);
        debug!("GET {}", url);
        self.authorize(self.client.get(&url))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.endpoint, path);
        debug!("POST {}", url);
        self.authorize(self.client.post(&url))
    }

    /// Check the status and decode the JSON body.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            let error_text =
                response.text().await.unwrap_or_else(|_| "<unable to read error>".to_string());
            trace!("Error response:\n{}", error_text);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    SecretsError::authentication_failed(format!("{status}: {error_text}"))
                }
                StatusCode::NOT_FOUND => SecretsError::not_found(error_text),
                _ => SecretsError::backend_error(status.as_u16(), error_text),
            });
        }

        let body = response.text().await?;
        trace!("Response body:\n{}", body);
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SecretStoreClient for BarbicanClient {
    async fn create_secret(&self, slot: &SecretSlot) -> Result<SecretRef> {
        let body = CreateSecretBody {
            name: &slot.name,
            payload: slot.payload.expose_secret(),
            payload_content_type: &slot.payload_content_type,
        };

        let response = self.post("/v1/secrets").json(&body).send().await?;
        let created: CreateSecretResponse = self.handle_response(response).await?;

        debug!(secret = %slot.name, secret_ref = %created.secret_ref, "Created secret");
        Ok(created.secret_ref)
    }

    async fn create_certificate_container(
        &self,
        container: &ContainerSpec,
    ) -> Result<ContainerRef> {
        let response = self.post("/v1/containers").json(container).send().await?;
        let created: CreateContainerResponse = self.handle_response(response).await?;

        debug!(
            container = %container.name,
            container_ref = %created.container_ref,
            secrets = container.secret_refs.len(),
            "Created certificate container"
        );
        Ok(created.container_ref)
    }

    async fn list_certificate_containers(&self) -> Result<Vec<ContainerSummary>> {
        let limit = self.config.page_size as usize;
        let mut containers = Vec::new();

        loop {
            let path = format!(
                "/v1/containers?type={}&limit={}&offset={}",
                CERTIFICATE_CONTAINER_TYPE,
                limit,
                containers.len()
            );
            let response = self.get(&path).send().await?;
            let page: ContainerPage = self.handle_response(response).await?;

            let received = page.containers.len();
            containers.extend(page.containers);

            let exhausted = match page.total {
                Some(total) => containers.len() >= total,
                None => received < limit,
            };
            if received == 0 || exhausted {
                break;
            }
        }

        debug!(count = containers.len(), "Listed certificate containers");
        Ok(containers)
    }
}
