//! # Configuration Settings
//!
//! Defines the configuration structure for certbundle.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use validator::Validate;

use crate::catalog::KEY_MANAGER_SERVICE;
use crate::errors::{Error, Result};
use crate::secrets::{BarbicanConfig, SecretPayload};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// Key-manager connection
    #[validate(nested)]
    #[serde(default)]
    pub key_manager: KeyManagerConfig,

    /// Service catalog probing
    #[validate(nested)]
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Observability configuration
    #[validate(nested)]
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()?;
        Ok(())
    }

    /// Checks the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        if self.catalog.enabled_services.iter().any(|service| service.trim().is_empty()) {
            return Err(Error::validation("Enabled service types cannot be empty strings"));
        }

        EnvFilter::try_new(&self.observability.log_level).map_err(|e| {
            Error::validation(format!(
                "Invalid log level '{}': {}",
                self.observability.log_level, e
            ))
        })?;

        Ok(())
    }
}

/// Key-manager connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct KeyManagerConfig {
    /// Key-manager base URL
    #[validate(url(message = "Key manager endpoint must be a valid URL"))]
    pub endpoint: String,

    /// Identity token; never written back out
    #[serde(default, skip_serializing)]
    pub token: SecretPayload,

    /// Project scope for multi-project deployments
    #[serde(default)]
    pub project_id: Option<String>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,

    /// Containers requested per listing page
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    pub page_size: u32,
}

impl Default for KeyManagerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9311".to_string(),
            token: SecretPayload::default(),
            project_id: None,
            timeout_seconds: 30,
            page_size: 100,
        }
    }
}

impl KeyManagerConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Whether a token has been configured
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    /// Client settings for [`crate::secrets::BarbicanClient`]
    pub fn client_config(&self) -> BarbicanConfig {
        BarbicanConfig {
            endpoint: self.endpoint.clone(),
            token: self.token.clone(),
            project_id: self.project_id.clone(),
            timeout: self.timeout(),
            page_size: self.page_size,
        }
    }
}

/// Service catalog settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CatalogConfig {
    /// Identity service URL; when set the catalog is probed live
    #[validate(url(message = "Identity endpoint must be a valid URL"))]
    #[serde(default)]
    pub identity_endpoint: Option<String>,

    /// Service types treated as enabled when no identity endpoint is set
    pub enabled_services: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { identity_endpoint: None, enabled_services: vec![KEY_MANAGER_SERVICE.to_string()] }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is not set
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Emit logs as JSON lines
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "warn".to_string(), json_logging: false }
    }
}
