//! Loading PEM artifacts into rustls types.

use crate::error::{DevCertError, Result};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls_pemfile::Item;
use std::io::Cursor;

/// Load the first certificate from a PEM string.
///
/// # Example
///
/// ```rust,no_run
/// use devcert::cert::loader::load_certificate_from_pem;
///
/// # fn example() -> devcert::error::Result<()> {
/// let pem = std::fs::read_to_string("server.crt")?;
/// let cert = load_certificate_from_pem(&pem)?;
/// # Ok(())
/// # }
/// ```
pub fn load_certificate_from_pem(pem_str: &str) -> Result<CertificateDer<'static>> {
    let mut cursor = Cursor::new(pem_str.as_bytes());

    loop {
        match rustls_pemfile::read_one(&mut cursor)
            .map_err(|e| DevCertError::Pem(format!("Failed to read PEM: {}", e)))?
        {
            Some(Item::X509Certificate(cert_der)) => return Ok(cert_der),
            Some(_) => continue,
            None => {
                return Err(DevCertError::Pem(
                    "PEM data does not contain a certificate".to_string(),
                ))
            }
        }
    }
}

/// Load every certificate from a PEM string.
pub fn load_certificates_from_pem(pem_str: &str) -> Result<Vec<CertificateDer<'static>>> {
    let mut cursor = Cursor::new(pem_str.as_bytes());

    let certificates = rustls_pemfile::certs(&mut cursor)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| DevCertError::Pem(format!("Failed to read PEM: {}", e)))?;

    if certificates.is_empty() {
        return Err(DevCertError::Pem(
            "No certificates found in PEM data".to_string(),
        ));
    }

    Ok(certificates)
}

/// Load a private key (PKCS#8, PKCS#1 or SEC1) from a PEM string.
pub fn load_private_key_from_pem(pem_str: &str) -> Result<PrivateKeyDer<'static>> {
    let mut cursor = Cursor::new(pem_str.as_bytes());

    rustls_pemfile::private_key(&mut cursor)
        .map_err(|e| DevCertError::Pem(format!("Failed to read PEM: {}", e)))?
        .ok_or_else(|| DevCertError::InvalidKey("PEM data does not contain a private key".to_string()))
}
