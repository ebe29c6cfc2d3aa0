//! TLS configuration built from a provisioned chain.
//!
//! The server side serves the issued certificate and key and is pinned to
//! TLS 1.2, the version the local development clients speak. The client
//! side trusts only the development CA.

use crate::cert::loader::{
    load_certificate_from_pem, load_certificates_from_pem, load_private_key_from_pem,
};
use crate::error::{DevCertError, Result};
use rustls::{ClientConfig, RootCertStore, ServerConfig};
use std::sync::Arc;

/// Install the ring provider as the process default if none is set.
fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Build a TLS 1.2 server configuration from PEM certificate and key.
///
/// `cert_pem` may hold the full chain; the leaf must come first.
///
/// # Example
///
/// ```rust,no_run
/// use devcert::net::config::build_server_config;
///
/// # fn example() -> devcert::error::Result<()> {
/// let cert = std::fs::read_to_string("server.crt")?;
/// let key = std::fs::read_to_string("server.key")?;
/// let config = build_server_config(&cert, &key)?;
/// # Ok(())
/// # }
/// ```
pub fn build_server_config(cert_pem: &str, key_pem: &str) -> Result<Arc<ServerConfig>> {
    let certs = load_certificates_from_pem(cert_pem)?;
    let private_key = load_private_key_from_pem(key_pem)?;

    install_crypto_provider();

    let config = ServerConfig::builder_with_protocol_versions(&[&rustls::version::TLS12])
        .with_no_client_auth()
        .with_single_cert(certs, private_key)
        .map_err(|e| DevCertError::Tls(format!("Failed to build server config: {}", e)))?;

    Ok(Arc::new(config))
}

/// Build a client configuration that trusts only the given CA.
pub fn build_client_config(ca_cert_pem: &str) -> Result<Arc<ClientConfig>> {
    let ca_der = load_certificate_from_pem(ca_cert_pem)?;

    let mut root_store = RootCertStore::empty();
    root_store
        .add(ca_der)
        .map_err(|e| DevCertError::Tls(format!("Failed to add CA cert: {}", e)))?;

    install_crypto_provider();

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, KeyPair};

    fn self_signed() -> (String, String) {
        let key = KeyPair::generate().unwrap();
        let cert = CertificateParams::new(vec!["localhost".to_string()])
            .unwrap()
            .self_signed(&key)
            .unwrap();
        (cert.pem(), key.serialize_pem())
    }

    #[test]
    fn test_build_server_config() {
        let (cert, key) = self_signed();
        assert!(build_server_config(&cert, &key).is_ok());
    }

    #[test]
    fn test_build_server_config_missing_key() {
        let (cert, _) = self_signed();
        assert!(matches!(
            build_server_config(&cert, &cert),
            Err(DevCertError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_build_client_config() {
        let (cert, _) = self_signed();
        assert!(build_client_config(&cert).is_ok());
    }

    #[test]
    fn test_build_client_config_invalid_pem() {
        assert!(build_client_config("nope").is_err());
    }
}
