//! Error types for devcert.
//!
//! Every step of the provisioning procedure reports failures through
//! [`DevCertError`]. The first error aborts the whole sequence.

use thiserror::Error;

/// The main error type for devcert operations.
#[derive(Error, Debug)]
pub enum DevCertError {
    /// Key generation failed
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// Invalid key format or content
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Certificate generation or parsing error
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// Certificate signing request could not be built or parsed
    #[error("CSR error: {0}")]
    Csr(String),

    /// The CA failed to sign a request
    #[error("Signing error: {0}")]
    Signing(String),

    /// Chain validation failed
    #[error("Verification failed: {0}")]
    Verification(String),

    /// Invalid provisioning configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input data
    #[error("Parse error: {0}")]
    Parse(String),

    /// PEM encoding/decoding error
    #[error("PEM error: {0}")]
    Pem(String),

    /// Storage I/O error
    #[error("Storage I/O error: {0}")]
    Storage(#[from] std::io::Error),

    /// TOML profile could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TLS configuration or handshake error
    #[error("TLS error: {0}")]
    Tls(String),
}

/// A specialized Result type for devcert operations.
pub type Result<T> = std::result::Result<T, DevCertError>;
