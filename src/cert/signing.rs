//! CA signing of server requests.
//!
//! The CA takes the subject and public key from the CSR. Everything else in
//! the issued certificate (SANs, key usages, validity, serial) comes from
//! the signing side: the request configuration document and the CA's serial
//! file. A CSR cannot widen the names it is issued for.

use crate::cert::builder::{dns_sans, set_validity};
use crate::cert::ca::CertificateAuthority;
use crate::cert::serial::{next_serial, record_serial};
use crate::config::openssl_conf::RequestConfig;
use crate::error::{DevCertError, Result};
use rcgen::{
    CertificateSigningRequestParams, ExtendedKeyUsagePurpose, IsCa, KeyUsagePurpose, SerialNumber,
};
use std::path::Path;
use tracing::debug;

/// Sign a server CSR with the CA.
///
/// # Arguments
///
/// * `ca` - The signing CA
/// * `csr_pem` - The server's certificate-signing request
/// * `extensions` - Configuration document supplying the SAN list
/// * `validity_days` - Number of days the certificate is valid for
/// * `serial_file` - The CA serial file, updated only after signing succeeds
///
/// # Example
///
/// ```
/// use devcert::cert::ca::create_root_ca;
/// use devcert::cert::request::create_server_request;
/// use devcert::cert::signing::sign_request;
/// use devcert::config::openssl_conf::RequestConfig;
/// use devcert::crypto::keys::{generate_key, KeyAlgorithm};
///
/// # fn example() -> devcert::error::Result<()> {
/// let dir = std::env::temp_dir();
/// let ca = create_root_ca(generate_key(KeyAlgorithm::EcdsaP256)?, "CN=Root CA", 3650)?;
/// let config = RequestConfig::new("localhost", vec!["localhost".to_string()])?;
/// let request = create_server_request(generate_key(KeyAlgorithm::EcdsaP256)?, &config)?;
///
/// let cert_pem = sign_request(&ca, request.csr_pem(), &config, 365, &dir.join("ca.srl"))?;
/// assert!(cert_pem.contains("BEGIN CERTIFICATE"));
/// # Ok(())
/// # }
/// ```
pub fn sign_request(
    ca: &CertificateAuthority,
    csr_pem: &str,
    extensions: &RequestConfig,
    validity_days: u32,
    serial_file: &Path,
) -> Result<String> {
    let mut csr = CertificateSigningRequestParams::from_pem(csr_pem)
        .map_err(|e| DevCertError::Csr(format!("Failed to parse CSR: {}", e)))?;

    csr.params.is_ca = IsCa::ExplicitNoCa;
    csr.params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    csr.params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    csr.params.subject_alt_names = dns_sans(&extensions.dns_names)?;
    csr.params.use_authority_key_identifier_extension = true;
    set_validity(&mut csr.params, validity_days);
    let serial = next_serial(serial_file)?;
    csr.params.serial_number = Some(SerialNumber::from_slice(&serial));

    let issuer = ca.issuer()?;
    let cert = csr
        .signed_by(&issuer)
        .map_err(|e| DevCertError::Signing(format!("Failed to sign server certificate: {}", e)))?;
    record_serial(serial_file, &serial)?;

    debug!(
        sans = ?extensions.dns_names,
        validity_days,
        "signed server certificate"
    );

    Ok(cert.pem())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::ca::create_root_ca;
    use crate::cert::inspect::summarize_pem;
    use crate::cert::request::create_server_request;
    use crate::crypto::keys::{generate_key, KeyAlgorithm};
    use tempfile::TempDir;

    fn ca() -> CertificateAuthority {
        let key = generate_key(KeyAlgorithm::EcdsaP256).unwrap();
        create_root_ca(key, "CN=Root CA,O=Test", 3650).unwrap()
    }

    fn config(names: &[&str]) -> RequestConfig {
        RequestConfig::new("localhost", names.iter().map(|n| n.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_sign_request_sets_issuer() {
        let dir = TempDir::new().unwrap();
        let ca = ca();
        let config = config(&["localhost", "dev.localhost"]);
        let key = generate_key(KeyAlgorithm::EcdsaP256).unwrap();
        let request = create_server_request(key, &config).unwrap();

        let pem = sign_request(&ca, request.csr_pem(), &config, 365, &dir.path().join("ca.srl"))
            .unwrap();

        let ca_summary = summarize_pem(ca.cert_pem()).unwrap();
        let summary = summarize_pem(&pem).unwrap();
        assert_eq!(summary.issuer, ca_summary.subject);
        assert_eq!(summary.subject, "CN=localhost");
        assert!(!summary.is_ca);
    }

    #[test]
    fn test_sans_come_from_signing_config() {
        let dir = TempDir::new().unwrap();
        let ca = ca();
        let requested = config(&["localhost", "extra.localhost"]);
        let key = generate_key(KeyAlgorithm::EcdsaP256).unwrap();
        let request = create_server_request(key, &requested).unwrap();

        let signing = config(&["localhost"]);
        let pem = sign_request(&ca, request.csr_pem(), &signing, 365, &dir.path().join("ca.srl"))
            .unwrap();

        assert_eq!(summarize_pem(&pem).unwrap().dns_names, vec!["localhost"]);
    }

    #[test]
    fn test_serial_matches_serial_file() {
        let dir = TempDir::new().unwrap();
        let serial_path = dir.path().join("ca.srl");
        let ca = ca();
        let config = config(&["localhost"]);
        let key = generate_key(KeyAlgorithm::EcdsaP256).unwrap();
        let request = create_server_request(key, &config).unwrap();

        let pem = sign_request(&ca, request.csr_pem(), &config, 30, &serial_path).unwrap();

        let recorded = std::fs::read_to_string(&serial_path).unwrap();
        assert_eq!(summarize_pem(&pem).unwrap().serial_hex, recorded.trim());
    }

    #[test]
    fn test_sign_invalid_csr() {
        let dir = TempDir::new().unwrap();
        let result = sign_request(
            &ca(),
            "-----BEGIN CERTIFICATE REQUEST-----\nAAAA\n-----END CERTIFICATE REQUEST-----\n",
            &config(&["localhost"]),
            30,
            &dir.path().join("ca.srl"),
        );
        assert!(matches!(result, Err(DevCertError::Csr(_))));
    }

    #[test]
    fn test_failed_signing_keeps_serial_file() {
        let dir = TempDir::new().unwrap();
        let serial_path = dir.path().join("ca.srl");
        std::fs::write(&serial_path, "1000\n").unwrap();

        let result = sign_request(
            &ca(),
            "-----BEGIN CERTIFICATE REQUEST-----\nAAAA\n-----END CERTIFICATE REQUEST-----\n",
            &config(&["localhost"]),
            30,
            &serial_path,
        );

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&serial_path).unwrap(), "1000\n");
    }

    #[test]
    fn test_consecutive_signings_increment_serial() {
        let dir = TempDir::new().unwrap();
        let serial_path = dir.path().join("ca.srl");
        std::fs::write(&serial_path, "1000\n").unwrap();
        let ca = ca();
        let config = config(&["localhost"]);
        let key = generate_key(KeyAlgorithm::EcdsaP256).unwrap();
        let request = create_server_request(key, &config).unwrap();

        let pem = sign_request(&ca, request.csr_pem(), &config, 30, &serial_path).unwrap();

        assert_eq!(summarize_pem(&pem).unwrap().serial_hex, "1001");
        assert_eq!(std::fs::read_to_string(&serial_path).unwrap(), "1001\n");
    }
}
