//! Generated certificate material.

use rcgen::{CertificateParams, CertifiedKey, KeyPair};

/// A self-signed leaf plus a separate CA certificate usable as a chain.
pub struct Bundle {
    pub certificate: String,
    pub private_key: String,
    pub intermediate: String,
}

pub fn self_signed(host: &str) -> CertifiedKey {
    rcgen::generate_simple_self_signed(vec![host.to_string()]).unwrap()
}

pub fn bundle(host: &str) -> Bundle {
    let leaf = self_signed(host);

    let ca_key = KeyPair::generate().unwrap();
    let mut ca_params = CertificateParams::new(vec!["Test Intermediate".to_string()]).unwrap();
    ca_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    let ca = ca_params.self_signed(&ca_key).unwrap();

    Bundle {
        certificate: leaf.cert.pem(),
        private_key: leaf.key_pair.serialize_pem(),
        intermediate: ca.pem(),
    }
}
