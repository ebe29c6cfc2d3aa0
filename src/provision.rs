//! The provisioning procedure.
//!
//! [`provision`] runs the four steps in order and stops at the first
//! failure:
//!
//! 1. write the request configuration document,
//! 2. generate the CA key and self-signed CA certificate,
//! 3. generate the server key and CSR,
//! 4. sign the CSR with the CA, taking the SAN list from the document
//!    written in step 1.
//!
//! Files from earlier runs are overwritten. Nothing is rolled back when a
//! later step fails.

use crate::cert::ca::{create_root_ca, load_ca};
use crate::cert::request::create_server_request;
use crate::cert::signing::sign_request;
use crate::cert::verify::verify_server_cert;
use crate::config::openssl_conf::RequestConfig;
use crate::config::ProvisionConfig;
use crate::crypto::keys::generate_key;
use crate::error::Result;
use crate::storage::artifacts::{ensure_dir, write_private, write_public, ArtifactPaths};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Result of a successful provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionedChain {
    pub paths: ArtifactPaths,
    pub ca_cert_pem: String,
    pub server_cert_pem: String,
    pub server_key_pem: String,
    pub dns_names: Vec<String>,
}

/// Provision a development certificate chain into `config.output_dir`.
///
/// # Example
///
/// ```rust,no_run
/// use devcert::config::ProvisionConfig;
/// use devcert::provision::provision;
///
/// # fn example() -> devcert::error::Result<()> {
/// let mut config = ProvisionConfig::default();
/// config.output_dir = "certs".into();
/// let chain = provision(&config)?;
/// println!("server certificate: {}", chain.paths.server_cert.display());
/// # Ok(())
/// # }
/// ```
pub fn provision(config: &ProvisionConfig) -> Result<ProvisionedChain> {
    config.validate()?;

    let paths = ArtifactPaths::in_dir(&config.output_dir);
    ensure_dir(&config.output_dir)?;

    let request_config = config.request_config()?;
    write_public(&paths.request_config, &request_config.render())?;
    info!(path = %paths.request_config.display(), "wrote request configuration");

    info!(algorithm = %config.key_algorithm, "generating CA key");
    let ca_key = generate_key(config.key_algorithm)?;
    let ca = create_root_ca(ca_key, &config.ca.subject, config.ca.validity_days)?;
    write_private(&paths.ca_key, &ca.key_pem())?;
    write_public(&paths.ca_cert, ca.cert_pem())?;
    info!(subject = %config.ca.subject, days = config.ca.validity_days, "created CA certificate");

    info!(algorithm = %config.key_algorithm, "generating server key");
    let server_key = generate_key(config.key_algorithm)?;
    let request = create_server_request(server_key, &request_config)?;
    write_private(&paths.server_key, &request.key_pem())?;
    write_public(&paths.server_csr, request.csr_pem())?;
    info!(common_name = %request_config.common_name, "created server CSR");

    let extensions = RequestConfig::load(&paths.request_config)?;
    let server_cert_pem = sign_request(
        &ca,
        request.csr_pem(),
        &extensions,
        config.server.validity_days,
        &paths.ca_serial,
    )?;
    write_public(&paths.server_cert, &server_cert_pem)?;

    verify_server_cert(ca.cert_pem(), &server_cert_pem, None)?;
    info!(path = %paths.server_cert.display(), sans = ?extensions.dns_names, "signed server certificate");

    Ok(ProvisionedChain {
        paths,
        ca_cert_pem: ca.cert_pem().to_string(),
        server_cert_pem,
        server_key_pem: request.key_pem(),
        dns_names: extensions.dns_names,
    })
}

/// Inputs of a standalone signing run against an existing CA.
#[derive(Debug, Clone)]
pub struct SignFiles {
    pub ca_cert: PathBuf,
    pub ca_key: PathBuf,
    pub csr: PathBuf,
    /// Request configuration document supplying the SAN list.
    pub extfile: PathBuf,
    pub output: PathBuf,
    pub serial_file: PathBuf,
    pub validity_days: u32,
}

impl SignFiles {
    /// Serial file next to the CA certificate (`<ca>.srl`).
    pub fn default_serial_file(ca_cert: &std::path::Path) -> PathBuf {
        ca_cert.with_extension("srl")
    }
}

/// Sign a CSR file with an existing CA and write the server certificate.
///
/// Returns the issued certificate in PEM format.
pub fn sign_files(files: &SignFiles) -> Result<String> {
    let ca_cert_pem = fs::read_to_string(&files.ca_cert)?;
    let ca_key_pem = fs::read_to_string(&files.ca_key)?;
    let csr_pem = fs::read_to_string(&files.csr)?;
    let extensions = RequestConfig::load(&files.extfile)?;

    let ca = load_ca(&ca_cert_pem, &ca_key_pem)?;
    let cert_pem = sign_request(
        &ca,
        &csr_pem,
        &extensions,
        files.validity_days,
        &files.serial_file,
    )?;

    verify_server_cert(&ca_cert_pem, &cert_pem, None)?;
    write_public(&files.output, &cert_pem)?;

    info!(path = %files.output.display(), "signed certificate");
    Ok(cert_pem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::inspect::summarize_pem;
    use crate::crypto::keys::KeyAlgorithm;
    use crate::error::DevCertError;
    use tempfile::TempDir;

    fn fast_config(dir: &TempDir) -> ProvisionConfig {
        let mut config = ProvisionConfig::default();
        config.output_dir = dir.path().to_path_buf();
        config.key_algorithm = KeyAlgorithm::EcdsaP256;
        config
    }

    #[test]
    fn test_provision_writes_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let chain = provision(&fast_config(&dir)).unwrap();

        for path in chain.paths.all() {
            assert!(path.is_file(), "missing {}", path.display());
        }
    }

    #[test]
    fn test_provision_sans_match_config() {
        let dir = TempDir::new().unwrap();
        let mut config = fast_config(&dir);
        config.server.dns_names = vec!["api.test".to_string(), "www.api.test".to_string()];

        let chain = provision(&config).unwrap();
        let summary = summarize_pem(&chain.server_cert_pem).unwrap();

        assert_eq!(summary.dns_names, config.server.dns_names);
        assert_eq!(chain.dns_names, config.server.dns_names);
    }

    #[test]
    fn test_provision_invalid_config_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut config = fast_config(&dir);
        config.output_dir = dir.path().join("out");
        config.server.dns_names.clear();

        assert!(matches!(provision(&config), Err(DevCertError::Config(_))));
        assert!(!config.output_dir.exists());
    }

    #[test]
    fn test_provision_ip_literal_generates_no_keys() {
        let dir = TempDir::new().unwrap();
        let mut config = fast_config(&dir);
        config.output_dir = dir.path().join("out");
        config.server.dns_names = vec!["localhost".to_string(), "127.0.0.1".to_string()];

        assert!(matches!(provision(&config), Err(DevCertError::Config(_))));
        assert!(!config.output_dir.join("server.key").exists());
        assert!(!config.output_dir.join("ca.key").exists());
    }

    #[test]
    fn test_sign_files_with_existing_ca() {
        let dir = TempDir::new().unwrap();
        let chain = provision(&fast_config(&dir)).unwrap();

        let output = dir.path().join("resigned.crt");
        let files = SignFiles {
            ca_cert: chain.paths.ca_cert.clone(),
            ca_key: chain.paths.ca_key.clone(),
            csr: chain.paths.server_csr.clone(),
            extfile: chain.paths.request_config.clone(),
            output: output.clone(),
            serial_file: chain.paths.ca_serial.clone(),
            validity_days: 30,
        };

        let pem = sign_files(&files).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), pem);

        let first = summarize_pem(&chain.server_cert_pem).unwrap();
        let second = summarize_pem(&pem).unwrap();
        assert_ne!(first.serial_hex, second.serial_hex);
    }

    #[test]
    fn test_sign_files_rejects_foreign_ca_key() {
        let dir = TempDir::new().unwrap();
        let chain = provision(&fast_config(&dir)).unwrap();

        let other_dir = TempDir::new().unwrap();
        let other = provision(&fast_config(&other_dir)).unwrap();

        let output = dir.path().join("bad.crt");
        let files = SignFiles {
            ca_cert: chain.paths.ca_cert.clone(),
            ca_key: other.paths.ca_key.clone(),
            csr: chain.paths.server_csr.clone(),
            extfile: chain.paths.request_config.clone(),
            output: output.clone(),
            serial_file: chain.paths.ca_serial.clone(),
            validity_days: 30,
        };

        let serial_before = fs::read_to_string(&chain.paths.ca_serial).unwrap();

        assert!(matches!(
            sign_files(&files),
            Err(DevCertError::InvalidKey(_))
        ));
        assert!(!output.exists());
        assert_eq!(
            fs::read_to_string(&chain.paths.ca_serial).unwrap(),
            serial_before
        );
    }

    #[test]
    fn test_default_serial_file() {
        assert_eq!(
            SignFiles::default_serial_file(std::path::Path::new("certs/ca.crt")),
            PathBuf::from("certs/ca.srl")
        );
    }
}
