//! devcert: local development certificate chains
//!
//! This library provisions a two-level certificate chain for local TLS
//! development: a self-signed certificate authority and a server
//! certificate it signs. It can:
//!
//! - Generate RSA (4096-bit by default), ECDSA P-256 or Ed25519 keys
//! - Write an OpenSSL-style request configuration carrying the server's
//!   subject-alternative-names
//! - Create a server CSR and sign it with the CA, tracking serials in a
//!   serial file
//! - Validate the resulting chain and run a loopback TLS handshake with it
//!
//! # Architecture
//!
//! Provisioning is one linear procedure ([`provision::provision`]) composed
//! from small functions in [`crypto`], [`cert`] and [`storage`]. Every
//! step returns [`Result`]; the first error aborts the run.
//!
//! # Example
//!
//! ```rust,no_run
//! use devcert::config::ProvisionConfig;
//! use devcert::provision::provision;
//!
//! fn example() -> devcert::Result<()> {
//!     let mut config = ProvisionConfig::default();
//!     config.server.dns_names = vec!["localhost".to_string(), "api.localhost".to_string()];
//!     let chain = provision(&config)?;
//!     println!("CA certificate written to {}", chain.paths.ca_cert.display());
//!     Ok(())
//! }
//! ```

pub mod cert;
pub mod config;
pub mod crypto;
pub mod error;
pub mod net;
pub mod provision;
pub mod storage;

// Re-export commonly used types
pub use config::ProvisionConfig;
pub use error::{DevCertError, Result};
pub use provision::{provision, ProvisionedChain};
