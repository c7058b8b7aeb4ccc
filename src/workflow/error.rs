//! Terminal failures of a certificate workflow.

use thiserror::Error;

use super::WorkflowState;
use crate::certificates::{SecretRefEntry, SecretRole};
use crate::secrets::SecretsError;

pub const KEY_MANAGER_UNAVAILABLE: &str = "Unable to connect to key manager.";
pub const SECRETS_FAILED: &str = "Error(s) in creating secrets.";
pub const CONTAINER_FAILED: &str = "Unable to create container.";
pub const CERTIFICATES_CREATED: &str = "Certificates creation succeeds.";

/// Why `submit()` did not produce a container.
///
/// Secrets created before a failure are not deleted; they are carried in
/// `orphaned` so the caller can clean up or report them.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Key manager is not available: {reason}")]
    CapabilityUnavailable { reason: String },

    #[error("Failed to create secrets: {}", join_roles(.failed))]
    SecretCreation { failed: Vec<SecretRole>, orphaned: Vec<SecretRefEntry> },

    #[error("Failed to create certificate container: {source}")]
    ContainerCreation { source: SecretsError, orphaned: Vec<SecretRefEntry> },

    #[error("Workflow cannot be submitted from state '{state}'")]
    NotIdle { state: WorkflowState },
}

impl WorkflowError {
    /// Fixed notification text for the failure, if it is shown to the user.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::CapabilityUnavailable { .. } => Some(KEY_MANAGER_UNAVAILABLE),
            Self::SecretCreation { .. } => Some(SECRETS_FAILED),
            Self::ContainerCreation { .. } => Some(CONTAINER_FAILED),
            Self::NotIdle { .. } => None,
        }
    }

    /// Secrets left in the store by this failure.
    pub fn orphaned(&self) -> &[SecretRefEntry] {
        match self {
            Self::SecretCreation { orphaned, .. } | Self::ContainerCreation { orphaned, .. } => {
                orphaned
            }
            _ => &[],
        }
    }
}

fn join_roles(roles: &[SecretRole]) -> String {
    roles.iter().map(SecretRole::tag).collect::<Vec<_>>().join(", ")
}
