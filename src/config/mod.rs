//! Provisioning configuration.
//!
//! A [`ProvisionConfig`] describes one run of the provisioning procedure.
//! It can be built from defaults, loaded from a TOML profile, and is then
//! overridden field by field from the command line.
//!
//! ```toml
//! output_dir = "certs"
//! key_algorithm = "rsa4096"
//!
//! [ca]
//! subject = "CN=Development Root CA,O=Local Development"
//! validity_days = 3650
//!
//! [server]
//! common_name = "localhost"
//! dns_names = ["localhost", "dev.localhost"]
//! validity_days = 3650
//! ```

pub mod openssl_conf;

use crate::cert::builder::{parse_subject, validate_dns_name};
use crate::crypto::keys::KeyAlgorithm;
use crate::error::{DevCertError, Result};
use openssl_conf::RequestConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Input of the provisioning procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionConfig {
    /// Directory all artifacts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Algorithm for both the CA and the server key.
    #[serde(default)]
    pub key_algorithm: KeyAlgorithm,

    #[serde(default)]
    pub ca: CaSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

/// Certificate authority settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaSettings {
    /// Distinguished name of the CA (e.g., "CN=My CA,O=My Org").
    #[serde(default = "default_ca_subject")]
    pub subject: String,

    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
}

impl Default for CaSettings {
    fn default() -> Self {
        Self {
            subject: default_ca_subject(),
            validity_days: default_validity_days(),
        }
    }
}

/// Server identity settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    #[serde(default = "default_server_common_name")]
    pub common_name: String,

    /// DNS subject-alternative-names, in the order they appear in the certificate.
    #[serde(default = "default_dns_names")]
    pub dns_names: Vec<String>,

    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            common_name: default_server_common_name(),
            dns_names: default_dns_names(),
            validity_days: default_validity_days(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_ca_subject() -> String {
    "CN=Development Root CA,O=Local Development".to_string()
}

fn default_server_common_name() -> String {
    "localhost".to_string()
}

fn default_dns_names() -> Vec<String> {
    vec!["localhost".to_string(), "localhost.localdomain".to_string()]
}

fn default_validity_days() -> u32 {
    3650 // 10 years
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            key_algorithm: KeyAlgorithm::default(),
            ca: CaSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl ProvisionConfig {
    /// Load a profile from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a profile from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration before any key material is generated.
    pub fn validate(&self) -> Result<()> {
        parse_subject(&self.ca.subject)
            .map_err(|e| DevCertError::Config(format!("Invalid CA subject: {}", e)))?;

        if self.server.common_name.trim().is_empty() {
            return Err(DevCertError::Config(
                "Server common name cannot be empty".to_string(),
            ));
        }
        if self.server.dns_names.is_empty() {
            return Err(DevCertError::Config(
                "At least one DNS name is required".to_string(),
            ));
        }
        for name in &self.server.dns_names {
            validate_dns_name(name).map_err(|e| DevCertError::Config(e.to_string()))?;
        }
        if self.ca.validity_days == 0 || self.server.validity_days == 0 {
            return Err(DevCertError::Config(
                "Validity must be at least one day".to_string(),
            ));
        }

        Ok(())
    }

    /// The request configuration document for the server certificate.
    pub fn request_config(&self) -> Result<RequestConfig> {
        RequestConfig::new(
            self.server.common_name.clone(),
            self.server.dns_names.clone(),
        )
    }
}
