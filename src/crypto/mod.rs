//! Key material for the certificate chain.
//!
//! Both the CA and the server key are produced by [`keys::generate_key`];
//! RSA 4096 is the default, with ECDSA P-256 and Ed25519 as faster options.
//!
//! # Example
//!
//! ```rust
//! use devcert::crypto::keys::{generate_key, load_key_from_pem, KeyAlgorithm};
//!
//! # fn example() -> devcert::error::Result<()> {
//! let key = generate_key(KeyAlgorithm::EcdsaP256)?;
//! let pem = key.to_pem();
//! let reloaded = load_key_from_pem(&pem)?;
//! assert_eq!(reloaded.serialize_pem(), pem);
//! # Ok(())
//! # }
//! ```

pub mod keys;
