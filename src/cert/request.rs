//! Server certificate-signing requests.

use crate::cert::builder::dns_sans;
use crate::config::openssl_conf::RequestConfig;
use crate::crypto::keys::GeneratedKey;
use crate::error::{DevCertError, Result};
use rcgen::{CertificateParams, DistinguishedName, DnType};
use tracing::debug;

/// A server key and the CSR binding it to the server identity.
#[derive(Debug)]
pub struct ServerRequest {
    key: GeneratedKey,
    csr_pem: String,
}

impl ServerRequest {
    /// The server's private key.
    pub fn key(&self) -> &GeneratedKey {
        &self.key
    }

    /// Private key in PKCS#8 PEM format.
    pub fn key_pem(&self) -> String {
        self.key.to_pem()
    }

    /// The CSR in PEM format.
    pub fn csr_pem(&self) -> &str {
        &self.csr_pem
    }
}

/// Create a CSR for the server identity described by `config`.
///
/// The request subject is `CN=<common name>` and the SAN list is requested
/// through the extensionRequest attribute.
///
/// # Example
///
/// ```
/// use devcert::cert::request::create_server_request;
/// use devcert::config::openssl_conf::RequestConfig;
/// use devcert::crypto::keys::{generate_key, KeyAlgorithm};
///
/// # fn example() -> devcert::error::Result<()> {
/// let config = RequestConfig::new("localhost", vec!["localhost".to_string()])?;
/// let key = generate_key(KeyAlgorithm::EcdsaP256)?;
/// let request = create_server_request(key, &config)?;
/// assert!(request.csr_pem().contains("BEGIN CERTIFICATE REQUEST"));
/// # Ok(())
/// # }
/// ```
pub fn create_server_request(key: GeneratedKey, config: &RequestConfig) -> Result<ServerRequest> {
    let mut distinguished_name = DistinguishedName::new();
    distinguished_name.push(DnType::CommonName, config.common_name.as_str());

    let mut params = CertificateParams::default();
    params.distinguished_name = distinguished_name;
    params.subject_alt_names = dns_sans(&config.dns_names)?;

    let csr = params
        .serialize_request(key.key_pair())
        .map_err(|e| DevCertError::Csr(format!("Failed to create CSR: {}", e)))?;
    let csr_pem = csr
        .pem()
        .map_err(|e| DevCertError::Csr(format!("Failed to encode CSR: {}", e)))?;

    debug!(common_name = %config.common_name, sans = config.dns_names.len(), "created server CSR");

    Ok(ServerRequest { key, csr_pem })
}
