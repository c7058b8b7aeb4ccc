//! Certificate bundle domain types.
//!
//! A bundle is described by a [`CertificateSpec`] (four secret slots) and is
//! stored as one secret per used slot plus a [`ContainerSpec`] that ties the
//! resulting references together under role tags.
//!
//! ## Slots and roles
//!
//! | slot           | container tag            | name suffix     | required |
//! |----------------|--------------------------|-----------------|----------|
//! | `certificate`  | `certificate`            | (none)          | yes      |
//! | `private_key`  | `private_key`            | `-private_key`  | yes      |
//! | `passphrase`   | `private_key_passphrase` | `-passphrase`   | no       |
//! | `intermediate` | `intermediates`          | `-intermediate` | no       |

pub mod pem;
pub mod registry;
pub mod validation;

pub use registry::{CertificateModel, NameRegistry};
pub use validation::{validate_fields, Field, FieldErrors};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::secrets::{SecretPayload, SecretRef};

/// Content type every slot starts with.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Container type used for TLS bundles.
pub const CERTIFICATE_CONTAINER_TYPE: &str = "certificate";

/// Role a secret plays inside a certificate container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretRole {
    /// Leaf certificate
    Certificate,
    /// Private key of the leaf certificate
    PrivateKey,
    /// Passphrase protecting the private key
    PrivateKeyPassphrase,
    /// Intermediate chain
    Intermediates,
}

impl SecretRole {
    /// All roles in slot order.
    pub const ALL: [SecretRole; 4] =
        [Self::Certificate, Self::PrivateKey, Self::PrivateKeyPassphrase, Self::Intermediates];

    /// Tag stored in the container's `secret_refs`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::PrivateKey => "private_key",
            Self::PrivateKeyPassphrase => "private_key_passphrase",
            Self::Intermediates => "intermediates",
        }
    }

    /// Suffix appended to the certificate name to name this role's secret.
    pub fn name_suffix(&self) -> Option<&'static str> {
        match self {
            Self::Certificate => None,
            Self::PrivateKey => Some("-private_key"),
            Self::PrivateKeyPassphrase => Some("-passphrase"),
            Self::Intermediates => Some("-intermediate"),
        }
    }

    /// Optional roles are skipped when their payload is empty.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::PrivateKeyPassphrase | Self::Intermediates)
    }
}

impl fmt::Display for SecretRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One secret to create: `{name, payload, payload_content_type}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSlot {
    pub name: String,
    pub payload: SecretPayload,
    pub payload_content_type: String,
}

impl Default for SecretSlot {
    fn default() -> Self {
        Self {
            name: String::new(),
            payload: SecretPayload::default(),
            payload_content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl SecretSlot {
    /// Whether the slot carries no payload.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// The four slots of a certificate bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateSpec {
    pub certificate: SecretSlot,
    pub private_key: SecretSlot,
    pub passphrase: SecretSlot,
    pub intermediate: SecretSlot,
}

impl CertificateSpec {
    /// Slot backing a role.
    pub fn slot(&self, role: SecretRole) -> &SecretSlot {
        match role {
            SecretRole::Certificate => &self.certificate,
            SecretRole::PrivateKey => &self.private_key,
            SecretRole::PrivateKeyPassphrase => &self.passphrase,
            SecretRole::Intermediates => &self.intermediate,
        }
    }

    /// Mutable slot backing a role.
    pub fn slot_mut(&mut self, role: SecretRole) -> &mut SecretSlot {
        match role {
            SecretRole::Certificate => &mut self.certificate,
            SecretRole::PrivateKey => &mut self.private_key,
            SecretRole::PrivateKeyPassphrase => &mut self.passphrase,
            SecretRole::Intermediates => &mut self.intermediate,
        }
    }

    /// Recompute the derived secret names from `certificate.name`.
    ///
    /// Idempotent; only the three derived names change.
    pub fn after_cert_name(&mut self) {
        let base = self.certificate.name.clone();
        for role in SecretRole::ALL {
            if let Some(suffix) = role.name_suffix() {
                self.slot_mut(role).name = format!("{base}{suffix}");
            }
        }
    }

    /// Roles whose secret must actually be created, in slot order.
    ///
    /// Required roles are always included; optional roles only when their
    /// payload is non-empty.
    pub fn issued_roles(&self) -> Vec<SecretRole> {
        SecretRole::ALL
            .into_iter()
            .filter(|role| !role.is_optional() || !self.slot(*role).is_empty())
            .collect()
    }
}

/// A `{name, secret_ref}` pair inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRefEntry {
    /// Role tag (`certificate`, `private_key`, ...)
    pub name: SecretRole,
    pub secret_ref: SecretRef,
}

/// Container request: `{type, name, secret_refs}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    #[serde(rename = "type")]
    pub container_type: String,
    pub name: String,
    pub secret_refs: Vec<SecretRefEntry>,
}

impl Default for ContainerSpec {
    fn default() -> Self {
        Self {
            container_type: CERTIFICATE_CONTAINER_TYPE.to_string(),
            name: String::new(),
            secret_refs: Vec::new(),
        }
    }
}

impl ContainerSpec {
    /// Empty certificate container with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Look up a collected reference by role tag.
    pub fn secret_ref(&self, role: SecretRole) -> Option<&SecretRef> {
        self.secret_refs.iter().find(|entry| entry.name == role).map(|entry| &entry.secret_ref)
    }
}
