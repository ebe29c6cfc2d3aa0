//! Root CA certificate operations.
//!
//! This module creates the self-signed development CA and loads an existing
//! one back from its PEM files so it can sign further requests.

use crate::cert::builder::{parse_subject, set_validity};
use crate::cert::inspect::{cert_from_pem, summarize_pem};
use crate::cert::serial::random_serial;
use crate::crypto::keys::{load_key_from_pem, GeneratedKey};
use crate::error::{DevCertError, Result};
use rcgen::{
    BasicConstraints, CertificateParams, IsCa, Issuer, KeyPair, KeyUsagePurpose, SerialNumber,
};
use tracing::debug;

/// A CA certificate together with its signing key.
#[derive(Debug)]
pub struct CertificateAuthority {
    cert_pem: String,
    key: KeyPair,
}

impl CertificateAuthority {
    /// CA certificate in PEM format.
    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }

    /// CA private key in PKCS#8 PEM format.
    pub fn key_pem(&self) -> String {
        self.key.serialize_pem()
    }

    /// Issuer handle used by rcgen to sign subordinate certificates.
    pub fn issuer(&self) -> Result<Issuer<'static, &KeyPair>> {
        Issuer::from_ca_cert_pem(&self.cert_pem, &self.key).map_err(|e| {
            DevCertError::Certificate(format!("Failed to load CA as issuer: {}", e))
        })
    }
}

/// Create a self-signed Root CA certificate.
///
/// # Arguments
///
/// * `key` - The freshly generated CA key
/// * `subject` - The subject distinguished name (e.g., "CN=My Root CA,O=My Org")
/// * `validity_days` - Number of days the certificate is valid for
///
/// # Example
///
/// ```
/// use devcert::cert::ca::create_root_ca;
/// use devcert::crypto::keys::{generate_key, KeyAlgorithm};
///
/// # fn example() -> devcert::error::Result<()> {
/// let key = generate_key(KeyAlgorithm::EcdsaP256)?;
/// let ca = create_root_ca(key, "CN=My Root CA", 3650)?;
/// assert!(ca.cert_pem().contains("BEGIN CERTIFICATE"));
/// # Ok(())
/// # }
/// ```
pub fn create_root_ca(
    key: GeneratedKey,
    subject: &str,
    validity_days: u32,
) -> Result<CertificateAuthority> {
    let distinguished_name = parse_subject(subject)?;

    let mut params = CertificateParams::default();
    params.distinguished_name = distinguished_name;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
    ];
    params.serial_number = Some(SerialNumber::from_slice(&random_serial()));
    set_validity(&mut params, validity_days);

    let key = key.into_key_pair();
    let cert = params
        .self_signed(&key)
        .map_err(|e| DevCertError::Certificate(format!("Failed to create Root CA: {}", e)))?;

    debug!(subject, validity_days, "created self-signed CA");

    Ok(CertificateAuthority {
        cert_pem: cert.pem(),
        key,
    })
}

/// Load an existing CA from its certificate and private key PEM.
///
/// Fails if the certificate is not marked as a CA or the key does not
/// belong to it.
pub fn load_ca(cert_pem: &str, key_pem: &str) -> Result<CertificateAuthority> {
    let summary = summarize_pem(cert_pem)?;
    if !summary.is_ca {
        return Err(DevCertError::Certificate(format!(
            "Certificate '{}' is not a CA",
            summary.subject
        )));
    }

    let key = load_key_from_pem(key_pem)?;

    let cert = cert_from_pem(cert_pem)?;
    let cert_public_key = cert
        .tbs_certificate
        .subject_public_key_info
        .subject_public_key
        .raw_bytes();
    if cert_public_key != key.public_key_raw() {
        return Err(DevCertError::InvalidKey(format!(
            "Private key does not match CA certificate '{}'",
            summary.subject
        )));
    }

    Ok(CertificateAuthority {
        cert_pem: cert_pem.to_string(),
        key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{generate_key, KeyAlgorithm};

    fn test_key() -> GeneratedKey {
        generate_key(KeyAlgorithm::EcdsaP256).unwrap()
    }

    #[test]
    fn test_create_root_ca_success() {
        let result = create_root_ca(test_key(), "CN=Test Root CA", 365);
        assert!(result.is_ok());
    }

    #[test]
    fn test_create_root_ca_pem_format() {
        let ca = create_root_ca(test_key(), "CN=Test Root CA", 365).unwrap();
        assert!(ca.cert_pem().contains("BEGIN CERTIFICATE"));
        assert!(ca.cert_pem().contains("END CERTIFICATE"));
        assert!(ca.key_pem().contains("BEGIN PRIVATE KEY"));
    }

    #[test]
    fn test_create_root_ca_invalid_subject() {
        let result = create_root_ca(test_key(), "XX=invalid", 365);
        assert!(result.is_err());
    }

    #[test]
    fn test_root_ca_is_self_issued_ca() {
        let ca = create_root_ca(test_key(), "CN=Test Root CA,O=Test Org,C=US", 3650).unwrap();
        let summary = summarize_pem(ca.cert_pem()).unwrap();

        assert!(summary.is_ca);
        assert_eq!(summary.subject, summary.issuer);
        assert!(summary.subject.contains("CN=Test Root CA"));
    }

    #[test]
    fn test_root_ca_validity_window() {
        let ca = create_root_ca(test_key(), "CN=Test Root CA", 3650).unwrap();
        let summary = summarize_pem(ca.cert_pem()).unwrap();

        let days = (summary.not_after - summary.not_before) / 86_400;
        assert_eq!(days, 3650);
    }

    #[test]
    fn test_load_ca_roundtrip() {
        let ca = create_root_ca(test_key(), "CN=Test Root CA", 365).unwrap();
        let loaded = load_ca(ca.cert_pem(), &ca.key_pem()).unwrap();

        assert_eq!(loaded.cert_pem(), ca.cert_pem());
        assert!(loaded.issuer().is_ok());
    }

    #[test]
    fn test_load_ca_rejects_garbage_key() {
        let ca = create_root_ca(test_key(), "CN=Test Root CA", 365).unwrap();
        assert!(load_ca(ca.cert_pem(), "garbage").is_err());
    }

    #[test]
    fn test_load_ca_rejects_foreign_key() {
        let ca = create_root_ca(test_key(), "CN=Test Root CA", 365).unwrap();
        let other = create_root_ca(test_key(), "CN=Other Root CA", 365).unwrap();

        let result = load_ca(ca.cert_pem(), &other.key_pem());
        assert!(matches!(result, Err(DevCertError::InvalidKey(_))));
    }

    #[test]
    fn test_root_ca_key_usages() {
        let ca = create_root_ca(test_key(), "CN=Test Root CA", 365).unwrap();
        let cert = cert_from_pem(ca.cert_pem()).unwrap();

        let ext = cert
            .tbs_certificate
            .extensions
            .as_ref()
            .unwrap()
            .iter()
            .find(|ext| ext.extn_id == const_oid::db::rfc5280::ID_CE_KEY_USAGE)
            .unwrap();
        let usage = <x509_cert::ext::pkix::KeyUsage as der::Decode>::from_der(
            ext.extn_value.as_bytes(),
        )
        .unwrap();

        assert!(usage.key_cert_sign());
        assert!(usage.crl_sign());
        assert!(!usage.digital_signature());
    }
}
