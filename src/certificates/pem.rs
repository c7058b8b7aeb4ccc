//! PEM checks for certificate, key and chain payloads.
//!
//! These run before anything is sent to the key manager so a malformed paste
//! is reported against the field it came from instead of as a store failure.

use chrono::{DateTime, TimeZone, Utc};
use ring::{
    rand::SystemRandom,
    signature::{
        EcdsaKeyPair, Ed25519KeyPair, KeyPair, RsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING,
        ECDSA_P384_SHA384_ASN1_SIGNING,
    },
};
use x509_parser::pem::Pem;

use crate::errors::PemError;

const OID_ED25519: &str = "1.3.101.112";
const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";

/// Metadata extracted from one certificate block.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub public_key_algorithm: String,
    pub public_key: Vec<u8>,
}

impl CertificateInfo {
    /// Whether `now` falls inside the validity window.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before <= now && now < self.not_after
    }

    /// Fail with [`PemError::OutsideValidity`] when `now` is outside the window.
    pub fn ensure_valid_at(&self, now: DateTime<Utc>) -> Result<(), PemError> {
        if self.is_valid_at(now) {
            Ok(())
        } else {
            Err(PemError::OutsideValidity {
                not_before: self.not_before,
                not_after: self.not_after,
            })
        }
    }
}

/// How a private key payload is encoded.
#[derive(Debug)]
pub enum PrivateKeyPem {
    /// `PRIVATE KEY`
    Pkcs8(Vec<u8>),
    /// `RSA PRIVATE KEY`
    Pkcs1(Vec<u8>),
    /// `EC PRIVATE KEY`
    Sec1(Vec<u8>),
    /// `ENCRYPTED PRIVATE KEY`; contents are opaque without the passphrase
    EncryptedPkcs8,
}

impl PrivateKeyPem {
    /// Whether decrypting the key requires a passphrase.
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::EncryptedPkcs8)
    }
}

fn pem_blocks(payload: &str, field: &'static str) -> Result<Vec<Pem>, PemError> {
    let blocks = Pem::iter_from_buffer(payload.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| PemError::Malformed { field, reason: err.to_string() })?;

    if blocks.is_empty() {
        return Err(PemError::NoPemBlocks { field });
    }
    Ok(blocks)
}

/// Parse every block of a certificate payload. All blocks must be
/// `CERTIFICATE`; the first one is the leaf for a certificate field.
pub fn parse_certificates(
    payload: &str,
    field: &'static str,
) -> Result<Vec<CertificateInfo>, PemError> {
    pem_blocks(payload, field)?
        .iter()
        .map(|block| {
            if block.label != "CERTIFICATE" {
                return Err(PemError::UnexpectedLabel { field, label: block.label.clone() });
            }
            certificate_info(block, field)
        })
        .collect()
}

fn certificate_info(block: &Pem, field: &'static str) -> Result<CertificateInfo, PemError> {
    let cert = block
        .parse_x509()
        .map_err(|err| PemError::InvalidCertificate { field, reason: err.to_string() })?;

    let validity = cert.validity();
    let not_before = to_utc(validity.not_before.timestamp(), field)?;
    let not_after = to_utc(validity.not_after.timestamp(), field)?;

    let spki = cert.public_key();
    Ok(CertificateInfo {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        not_before,
        not_after,
        public_key_algorithm: spki.algorithm.algorithm.to_id_string(),
        public_key: spki.subject_public_key.data.to_vec(),
    })
}

fn to_utc(timestamp: i64, field: &'static str) -> Result<DateTime<Utc>, PemError> {
    Utc.timestamp_opt(timestamp, 0).single().ok_or_else(|| PemError::InvalidCertificate {
        field,
        reason: format!("validity timestamp {timestamp} is out of range"),
    })
}

/// Parse a private key payload. Only the first block is considered.
pub fn parse_private_key(payload: &str) -> Result<PrivateKeyPem, PemError> {
    const FIELD: &str = "private key";

    let mut blocks = pem_blocks(payload, FIELD)?;
    let block = blocks.swap_remove(0);
    match block.label.as_str() {
        "PRIVATE KEY" => Ok(PrivateKeyPem::Pkcs8(block.contents)),
        "RSA PRIVATE KEY" => Ok(PrivateKeyPem::Pkcs1(block.contents)),
        "EC PRIVATE KEY" => Ok(PrivateKeyPem::Sec1(block.contents)),
        "ENCRYPTED PRIVATE KEY" => Ok(PrivateKeyPem::EncryptedPkcs8),
        other => Err(PemError::UnexpectedLabel { field: FIELD, label: other.to_string() }),
    }
}

/// Check that `key` is the private half of `certificate`'s public key.
///
/// Encrypted and SEC1 keys cannot be loaded here and are accepted as-is, as
/// are certificates using algorithms other than RSA, ECDSA P-256/P-384 and
/// Ed25519.
pub fn ensure_key_matches(
    certificate: &CertificateInfo,
    key: &PrivateKeyPem,
) -> Result<(), PemError> {
    let expected = certificate.public_key.as_slice();

    match (certificate.public_key_algorithm.as_str(), key) {
        (OID_ED25519, PrivateKeyPem::Pkcs8(der)) => {
            let pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(der)
                .map_err(|_| PemError::UnreadableKey { algorithm: "Ed25519" })?;
            compare(pair.public_key().as_ref(), expected)
        }
        (OID_EC_PUBLIC_KEY, PrivateKeyPem::Pkcs8(der)) => {
            let rng = SystemRandom::new();
            for alg in [&ECDSA_P256_SHA256_ASN1_SIGNING, &ECDSA_P384_SHA384_ASN1_SIGNING] {
                if let Ok(pair) = EcdsaKeyPair::from_pkcs8(alg, der, &rng) {
                    return compare(pair.public_key().as_ref(), expected);
                }
            }
            Err(PemError::CertificateKeyMismatch)
        }
        (OID_RSA_ENCRYPTION, PrivateKeyPem::Pkcs8(der)) => {
            let pair = RsaKeyPair::from_pkcs8(der)
                .map_err(|_| PemError::UnreadableKey { algorithm: "RSA" })?;
            compare(pair.public().as_ref(), expected)
        }
        (OID_RSA_ENCRYPTION, PrivateKeyPem::Pkcs1(der)) => {
            let pair = RsaKeyPair::from_der(der)
                .map_err(|_| PemError::UnreadableKey { algorithm: "RSA" })?;
            compare(pair.public().as_ref(), expected)
        }
        (_, PrivateKeyPem::Pkcs1(_)) => Err(PemError::CertificateKeyMismatch),
        _ => Ok(()),
    }
}

fn compare(actual: &[u8], expected: &[u8]) -> Result<(), PemError> {
    if actual == expected {
        Ok(())
    } else {
        Err(PemError::CertificateKeyMismatch)
    }
}
