//! Chain validation.
//!
//! A server certificate is accepted when webpki can build a path from it to
//! the CA certificate: the CA signature must verify, the certificate must be
//! inside its validity window, carry the serverAuth usage, and be valid for
//! the DNS name being checked.

use crate::cert::inspect::{cert_from_der, subject_alt_dns_names};
use crate::cert::loader::load_certificate_from_pem;
use crate::error::{DevCertError, Result};
use rustls::client::danger::ServerCertVerifier;
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::RootCertStore;
use std::sync::Arc;
use tracing::debug;

/// Verify a PEM server certificate against a PEM CA certificate.
///
/// With `dns_name` set, the certificate must also be valid for that name.
/// Without it, every DNS name in the certificate's SAN extension is
/// checked.
///
/// # Example
///
/// ```rust,no_run
/// use devcert::cert::verify::verify_server_cert;
///
/// # fn example() -> devcert::error::Result<()> {
/// let ca = std::fs::read_to_string("ca.crt")?;
/// let server = std::fs::read_to_string("server.crt")?;
/// verify_server_cert(&ca, &server, Some("localhost"))?;
/// # Ok(())
/// # }
/// ```
pub fn verify_server_cert(
    ca_cert_pem: &str,
    server_cert_pem: &str,
    dns_name: Option<&str>,
) -> Result<()> {
    let ca_der = load_certificate_from_pem(ca_cert_pem)?;
    let server_der = load_certificate_from_pem(server_cert_pem)?;

    verify_server_cert_der(ca_der, &server_der, dns_name)
}

/// Verify a DER server certificate against a DER CA certificate.
pub fn verify_server_cert_der(
    ca_der: CertificateDer<'static>,
    server_der: &CertificateDer<'_>,
    dns_name: Option<&str>,
) -> Result<()> {
    let names = match dns_name {
        Some(name) => vec![name.to_string()],
        None => {
            let cert = cert_from_der(server_der)?;
            let names = subject_alt_dns_names(&cert)?;
            if names.is_empty() {
                return Err(DevCertError::Verification(
                    "Certificate has no DNS subject-alternative-names".to_string(),
                ));
            }
            names
        }
    };

    let verifier = build_verifier(ca_der)?;
    let now = UnixTime::now();

    for name in &names {
        let server_name = server_name_for(name)?;
        verifier
            .verify_server_cert(server_der, &[], &server_name, &[], now)
            .map_err(|e| DevCertError::Verification(format!("{}: {}", name, e)))?;
        debug!(name = %name, "certificate valid for name");
    }

    Ok(())
}

fn build_verifier(ca_der: CertificateDer<'static>) -> Result<Arc<WebPkiServerVerifier>> {
    let mut roots = RootCertStore::empty();
    roots
        .add(ca_der)
        .map_err(|e| DevCertError::Verification(format!("Unusable CA certificate: {}", e)))?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
        .build()
        .map_err(|e| DevCertError::Verification(format!("Failed to build verifier: {}", e)))
}

/// Wildcard SANs are checked through a concrete name under the wildcard.
fn server_name_for(name: &str) -> Result<ServerName<'static>> {
    let concrete = match name.strip_prefix("*.") {
        Some(rest) => format!("wildcard-check.{}", rest),
        None => name.to_string(),
    };

    ServerName::try_from(concrete)
        .map_err(|e| DevCertError::Verification(format!("Invalid DNS name '{}': {}", name, e)))
}
