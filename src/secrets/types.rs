//! Value types exchanged with the key manager.
//!
//! [`SecretPayload`] keeps certificate, key and passphrase material out of
//! logs and diagnostics. [`SecretRef`] and [`ContainerRef`] are the opaque
//! references the store hands back for created objects.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret material held in memory until it is sent to the key manager.
///
/// `Debug`, `Display` and `Serialize` all print `[REDACTED]`; the raw value
/// is only reachable through [`SecretPayload::expose_secret`]. The buffer is
/// zeroed on drop.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretPayload(String);

impl SecretPayload {
    /// Wrap a payload value.
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    /// Borrow the raw payload. Only request builders should call this.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Length in bytes, without exposing the value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// An empty payload marks an optional slot as unused.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SecretPayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretPayload)
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretPayload([REDACTED], {} bytes)", self.0.len())
    }
}

impl fmt::Display for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretPayload {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretPayload {}

impl From<String> for SecretPayload {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretPayload {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Generates a newtype for a key-manager object reference.
macro_rules! store_ref {
    ($(#[$meta:meta])* $name:ident, $collection:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Path segment the store uses for this object type.
            pub const COLLECTION: &'static str = $collection;

            /// Wrap a reference returned by the store without checking it.
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Parse a reference, requiring an absolute http(s) URL.
            pub fn parse(s: &str) -> Result<Self, url::ParseError> {
                let url = Url::parse(s)?;
                if url.cannot_be_a_base() {
                    return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
                }
                Ok(Self(s.to_string()))
            }

            /// Get the reference as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Trailing object id (the last path segment of the reference).
            pub fn object_id(&self) -> Option<&str> {
                self.0.trim_end_matches('/').rsplit('/').next().filter(|s| !s.is_empty())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = url::ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(reference: $name) -> Self {
                reference.0
            }
        }
    };
}

store_ref!(
    /// Reference to a secret created in the key manager
    SecretRef,
    "secrets"
);

store_ref!(
    /// Reference to a container created in the key manager
    ContainerRef,
    "containers"
);
