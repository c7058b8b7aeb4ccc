use chrono::{DateTime, Utc};
use thiserror::Error;

/// Problems found while checking PEM payloads before they are stored.
#[derive(Debug, Error)]
pub enum PemError {
    /// The payload did not contain a single PEM block.
    #[error("{field} does not contain any PEM blocks")]
    NoPemBlocks { field: &'static str },

    /// A PEM block could not be decoded.
    #[error("{field} is not a valid PEM document: {reason}")]
    Malformed { field: &'static str, reason: String },

    /// A block had a label other than the ones accepted for this field.
    #[error("{field} contains an unexpected '{label}' block")]
    UnexpectedLabel { field: &'static str, label: String },

    /// A CERTIFICATE block failed X.509 parsing.
    #[error("{field} contains a certificate that is not valid X.509: {reason}")]
    InvalidCertificate { field: &'static str, reason: String },

    /// The key is encrypted but no passphrase accompanies it.
    #[error("Private key is encrypted but no passphrase was supplied")]
    EncryptedKeyWithoutPassphrase,

    /// The private key could not be loaded for its declared algorithm.
    #[error("Private key could not be parsed as {algorithm}")]
    UnreadableKey { algorithm: &'static str },

    /// Certificate and key belong to different key pairs.
    #[error("Certificate and private key do not match")]
    CertificateKeyMismatch,

    /// Leaf certificate is outside its validity window.
    #[error("Certificate is only valid from {not_before} until {not_after}")]
    OutsideValidity { not_before: DateTime<Utc>, not_after: DateTime<Utc> },
}
