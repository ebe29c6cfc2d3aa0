//! Fixed artifact layout of a provisioned chain.

use crate::error::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const REQUEST_CONFIG_FILENAME: &str = "server.conf";
pub const CA_KEY_FILENAME: &str = "ca.key";
pub const CA_CERT_FILENAME: &str = "ca.crt";
pub const SERVER_KEY_FILENAME: &str = "server.key";
pub const SERVER_CSR_FILENAME: &str = "server.csr";
pub const SERVER_CERT_FILENAME: &str = "server.crt";
pub const CA_SERIAL_FILENAME: &str = "ca.srl";

/// Paths of every file the provisioning procedure writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub request_config: PathBuf,
    pub ca_key: PathBuf,
    pub ca_cert: PathBuf,
    pub server_key: PathBuf,
    pub server_csr: PathBuf,
    pub server_cert: PathBuf,
    pub ca_serial: PathBuf,
}

impl ArtifactPaths {
    /// The artifact layout inside `directory`.
    pub fn in_dir(directory: &Path) -> Self {
        Self {
            request_config: directory.join(REQUEST_CONFIG_FILENAME),
            ca_key: directory.join(CA_KEY_FILENAME),
            ca_cert: directory.join(CA_CERT_FILENAME),
            server_key: directory.join(SERVER_KEY_FILENAME),
            server_csr: directory.join(SERVER_CSR_FILENAME),
            server_cert: directory.join(SERVER_CERT_FILENAME),
            ca_serial: directory.join(CA_SERIAL_FILENAME),
        }
    }

    /// All paths, in the order they are written.
    pub fn all(&self) -> [&Path; 7] {
        [
            &self.request_config,
            &self.ca_key,
            &self.ca_cert,
            &self.server_key,
            &self.server_csr,
            &self.ca_serial,
            &self.server_cert,
        ]
    }
}

/// Create the output directory if needed.
pub fn ensure_dir(directory: &Path) -> Result<()> {
    fs::create_dir_all(directory)?;
    Ok(())
}

/// Write a public artifact, replacing any existing file.
pub fn write_public(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)?;
    debug!(path = %path.display(), "wrote artifact");
    Ok(())
}

/// Write a private key, replacing any existing file.
///
/// On Unix the file is restricted to the owner (mode 0600).
pub fn write_private(path: &Path, contents: &str) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    #[cfg(unix)]
    {
        // mode() only applies on creation; tighten pre-existing files too
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents.as_bytes())?;

    debug!(path = %path.display(), "wrote private key");
    Ok(())
}
