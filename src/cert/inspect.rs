//! Certificate inspection using x509-cert.
//!
//! Parses issued certificates back into a [`CertificateSummary`] so the
//! provisioning result can be checked field by field.

use crate::error::{DevCertError, Result};
use const_oid::db::{rfc5280, rfc5912, rfc8410};
use der::Decode;
use serde::Serialize;
use x509_cert::certificate::Certificate;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{BasicConstraints, SubjectAltName};

/// The identity fields of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub serial_hex: String,
    /// Unix timestamp, seconds.
    pub not_before: i64,
    /// Unix timestamp, seconds.
    pub not_after: i64,
    pub dns_names: Vec<String>,
    pub is_ca: bool,
    pub key_algorithm: String,
}

/// Load a Certificate from PEM format.
pub fn cert_from_pem(pem_str: &str) -> Result<Certificate> {
    let pem = pem::parse(pem_str)
        .map_err(|e| DevCertError::Pem(format!("Failed to parse PEM: {}", e)))?;

    if pem.tag() != "CERTIFICATE" {
        return Err(DevCertError::Pem(format!(
            "Expected CERTIFICATE, got {}",
            pem.tag()
        )));
    }

    cert_from_der(pem.contents())
}

/// Load a Certificate from DER bytes.
pub fn cert_from_der(der: &[u8]) -> Result<Certificate> {
    Certificate::from_der(der)
        .map_err(|e| DevCertError::Certificate(format!("Failed to decode certificate: {}", e)))
}

/// DNS names listed in the subject-alternative-name extension, in order.
///
/// Returns an empty list when the extension is absent.
pub fn subject_alt_dns_names(cert: &Certificate) -> Result<Vec<String>> {
    let Some(ext) = find_extension(cert, rfc5280::ID_CE_SUBJECT_ALT_NAME) else {
        return Ok(Vec::new());
    };

    let san = SubjectAltName::from_der(ext).map_err(|e| {
        DevCertError::Certificate(format!("Invalid subjectAltName extension: {}", e))
    })?;

    Ok(san
        .0
        .iter()
        .filter_map(|name| match name {
            GeneralName::DnsName(dns) => Some(dns.to_string()),
            _ => None,
        })
        .collect())
}

/// Whether the basicConstraints extension marks the certificate as a CA.
pub fn is_ca(cert: &Certificate) -> Result<bool> {
    let Some(ext) = find_extension(cert, rfc5280::ID_CE_BASIC_CONSTRAINTS) else {
        return Ok(false);
    };

    BasicConstraints::from_der(ext)
        .map(|bc| bc.ca)
        .map_err(|e| DevCertError::Certificate(format!("Invalid basicConstraints: {}", e)))
}

/// Summarize a parsed certificate.
pub fn summarize(cert: &Certificate) -> Result<CertificateSummary> {
    let tbs = &cert.tbs_certificate;
    let algorithm = &tbs.subject_public_key_info.algorithm.oid;

    let key_algorithm = if *algorithm == rfc5912::RSA_ENCRYPTION {
        "RSA".to_string()
    } else if *algorithm == rfc5912::ID_EC_PUBLIC_KEY {
        "ECDSA".to_string()
    } else if *algorithm == rfc8410::ID_ED_25519 {
        "Ed25519".to_string()
    } else {
        algorithm.to_string()
    };

    Ok(CertificateSummary {
        subject: tbs.subject.to_string(),
        issuer: tbs.issuer.to_string(),
        serial_hex: hex::encode_upper(tbs.serial_number.as_bytes()),
        not_before: unix_seconds(&tbs.validity.not_before),
        not_after: unix_seconds(&tbs.validity.not_after),
        dns_names: subject_alt_dns_names(cert)?,
        is_ca: is_ca(cert)?,
        key_algorithm,
    })
}

/// Parse and summarize a PEM certificate.
pub fn summarize_pem(pem_str: &str) -> Result<CertificateSummary> {
    summarize(&cert_from_pem(pem_str)?)
}

fn find_extension(cert: &Certificate, oid: const_oid::ObjectIdentifier) -> Option<&[u8]> {
    cert.tbs_certificate
        .extensions
        .as_ref()?
        .iter()
        .find(|ext| ext.extn_id == oid)
        .map(|ext| ext.extn_value.as_bytes())
}

fn unix_seconds(time: &x509_cert::time::Time) -> i64 {
    time.to_unix_duration().as_secs() as i64
}
