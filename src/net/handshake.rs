//! Loopback TLS handshake self-test.
//!
//! Runs a TLS server and client over an in-memory duplex pipe: the server
//! presents the provisioned certificate, the client trusts only the CA.
//! Both sides exchange a short message after the handshake.

use crate::error::{DevCertError, Result};
use crate::net::config::{build_client_config, build_server_config};
use rustls::pki_types::ServerName;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_rustls::{TlsAcceptor, TlsConnector};
use tracing::debug;

const DUPLEX_BUFFER: usize = 64 * 1024;
const PING: &[u8; 4] = b"ping";
const PONG: &[u8; 4] = b"pong";

/// Negotiated parameters of a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandshakeReport {
    pub server_name: String,
    pub protocol_version: String,
    pub cipher_suite: String,
}

/// Perform a TLS handshake between an in-process server and client.
///
/// # Arguments
///
/// * `ca_cert_pem` - The CA the client trusts
/// * `server_cert_pem` - Certificate presented by the server
/// * `server_key_pem` - The server's private key
/// * `server_name` - Name the client expects the certificate to be valid for
pub async fn loopback_handshake(
    ca_cert_pem: &str,
    server_cert_pem: &str,
    server_key_pem: &str,
    server_name: &str,
) -> Result<HandshakeReport> {
    let acceptor = TlsAcceptor::from(build_server_config(server_cert_pem, server_key_pem)?);
    let connector = TlsConnector::from(build_client_config(ca_cert_pem)?);
    let name = ServerName::try_from(server_name.to_string())
        .map_err(|e| DevCertError::Tls(format!("Invalid server name '{}': {}", server_name, e)))?;

    let (client_io, server_io) = tokio::io::duplex(DUPLEX_BUFFER);

    let server = async move {
        let mut stream = acceptor.accept(server_io).await?;
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await?;
        stream.write_all(PONG).await?;
        stream.flush().await?;
        Ok::<_, std::io::Error>(buf)
    };

    let client = async move {
        let mut stream = connector.connect(name, client_io).await?;
        stream.write_all(PING).await?;
        stream.flush().await?;
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await?;

        let (_, connection) = stream.get_ref();
        let version = connection
            .protocol_version()
            .map(|v| format!("{:?}", v))
            .unwrap_or_default();
        let suite = connection
            .negotiated_cipher_suite()
            .map(|s| format!("{:?}", s.suite()))
            .unwrap_or_default();
        Ok::<_, std::io::Error>((buf, version, suite))
    };

    let (server_result, client_result) = tokio::join!(server, client);

    let (reply, protocol_version, cipher_suite) =
        client_result.map_err(|e| DevCertError::Tls(format!("Client handshake failed: {}", e)))?;
    let request =
        server_result.map_err(|e| DevCertError::Tls(format!("Server handshake failed: {}", e)))?;

    if &request != PING || &reply != PONG {
        return Err(DevCertError::Tls(
            "Unexpected application data after handshake".to_string(),
        ));
    }

    debug!(server_name, %protocol_version, %cipher_suite, "loopback handshake complete");

    Ok(HandshakeReport {
        server_name: server_name.to_string(),
        protocol_version,
        cipher_suite,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvisionConfig;
    use crate::crypto::keys::KeyAlgorithm;
    use crate::provision::{provision, ProvisionedChain};
    use tempfile::TempDir;

    fn chain(dir: &TempDir, algorithm: KeyAlgorithm) -> ProvisionedChain {
        let mut config = ProvisionConfig::default();
        config.output_dir = dir.path().to_path_buf();
        config.key_algorithm = algorithm;
        provision(&config).unwrap()
    }

    #[tokio::test]
    async fn test_handshake_succeeds() {
        let dir = TempDir::new().unwrap();
        let chain = chain(&dir, KeyAlgorithm::EcdsaP256);

        let report = loopback_handshake(
            &chain.ca_cert_pem,
            &chain.server_cert_pem,
            &chain.server_key_pem,
            "localhost",
        )
        .await
        .unwrap();

        assert_eq!(report.protocol_version, "TLSv1_2");
        assert!(!report.cipher_suite.is_empty());
    }

    #[tokio::test]
    async fn test_handshake_with_ed25519_chain() {
        let dir = TempDir::new().unwrap();
        let chain = chain(&dir, KeyAlgorithm::Ed25519);

        let result = loopback_handshake(
            &chain.ca_cert_pem,
            &chain.server_cert_pem,
            &chain.server_key_pem,
            "localhost.localdomain",
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_handshake_rejects_unlisted_name() {
        let dir = TempDir::new().unwrap();
        let chain = chain(&dir, KeyAlgorithm::EcdsaP256);

        let result = loopback_handshake(
            &chain.ca_cert_pem,
            &chain.server_cert_pem,
            &chain.server_key_pem,
            "example.com",
        )
        .await;

        assert!(matches!(result, Err(DevCertError::Tls(_))));
    }

    #[tokio::test]
    async fn test_handshake_rejects_untrusted_ca() {
        let dir = TempDir::new().unwrap();
        let chain_a = chain(&dir, KeyAlgorithm::EcdsaP256);
        let other = TempDir::new().unwrap();
        let chain_b = chain(&other, KeyAlgorithm::EcdsaP256);

        let result = loopback_handshake(
            &chain_b.ca_cert_pem,
            &chain_a.server_cert_pem,
            &chain_a.server_key_pem,
            "localhost",
        )
        .await;

        assert!(result.is_err());
    }
}
