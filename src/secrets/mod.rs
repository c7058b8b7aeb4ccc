//! Key-manager client abstraction.
//!
//! The certificate workflow only needs three operations from a key manager:
//! store a secret, assemble a certificate container, and list existing
//! certificate containers. They are expressed by the [`SecretStoreClient`]
//! trait so the workflow can run against the real REST API or a test double.
//!
//! # Composable Architecture Example
//!
//! ```rust,ignore
//! use certbundle::secrets::{AuditedSecretStore, BarbicanClient, BarbicanConfig};
//!
//! let barbican = BarbicanClient::new(BarbicanConfig::default())?;
//! let store = AuditedSecretStore::new(barbican);
//! let secret_ref = store.create_secret(&slot).await?;
//! ```
//!
//! # Security Considerations
//!
//! - Payloads live in [`SecretPayload`] and are never logged or serialized
//! - The auth token is held the same way
//! - Created objects are referenced by opaque [`SecretRef`] / [`ContainerRef`]

pub mod audited;
pub mod barbican;
pub mod client;
pub mod error;
pub mod types;

pub use audited::AuditedSecretStore;
pub use barbican::{BarbicanClient, BarbicanConfig};
pub use client::{ContainerSummary, SecretStoreClient};
pub use error::{Result, SecretsError};
pub use types::{ContainerRef, SecretPayload, SecretRef};
