//! Private key generation and loading.
//!
//! RSA keys are generated with the `rsa` crate and handed to rcgen as
//! PKCS#8, since rcgen's own backends only generate elliptic-curve keys.

use crate::error::{DevCertError, Result};
use rcgen::{KeyPair, PKCS_ECDSA_P256_SHA256, PKCS_ED25519};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Smallest RSA modulus accepted for any key in the chain.
pub const MIN_RSA_BITS: usize = 2048;

/// Largest RSA modulus the signing backend can handle.
pub const MAX_RSA_BITS: usize = 8192;

/// Key algorithm used for both the CA and the server key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyAlgorithm {
    /// RSA with the given modulus size, signing with SHA-256.
    Rsa { bits: usize },
    /// ECDSA over P-256 with SHA-256.
    EcdsaP256,
    /// Ed25519.
    Ed25519,
}

impl Default for KeyAlgorithm {
    fn default() -> Self {
        KeyAlgorithm::Rsa { bits: 4096 }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Rsa { bits } => write!(f, "rsa{}", bits),
            KeyAlgorithm::EcdsaP256 => f.write_str("ecdsa-p256"),
            KeyAlgorithm::Ed25519 => f.write_str("ed25519"),
        }
    }
}

impl FromStr for KeyAlgorithm {
    type Err = DevCertError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "ecdsa-p256" | "p256" | "ec" => Ok(KeyAlgorithm::EcdsaP256),
            "ed25519" => Ok(KeyAlgorithm::Ed25519),
            "rsa" => Ok(KeyAlgorithm::default()),
            other => {
                let bits = other
                    .strip_prefix("rsa")
                    .map(|b| b.trim_start_matches(['-', ':']))
                    .and_then(|b| b.parse::<usize>().ok())
                    .ok_or_else(|| {
                        DevCertError::Parse(format!("Unknown key algorithm: {}", s))
                    })?;

                if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&bits) {
                    return Err(DevCertError::Parse(format!(
                        "RSA key size must be between {} and {} bits, got {}",
                        MIN_RSA_BITS, MAX_RSA_BITS, bits
                    )));
                }

                Ok(KeyAlgorithm::Rsa { bits })
            }
        }
    }
}

impl TryFrom<String> for KeyAlgorithm {
    type Error = DevCertError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<KeyAlgorithm> for String {
    fn from(value: KeyAlgorithm) -> Self {
        value.to_string()
    }
}

/// A freshly generated private key.
#[derive(Debug)]
pub struct GeneratedKey {
    algorithm: KeyAlgorithm,
    key_pair: KeyPair,
}

impl GeneratedKey {
    /// The algorithm the key was generated for.
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Borrow the rcgen key pair for signing.
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Private key in PKCS#8 PEM format.
    pub fn to_pem(&self) -> String {
        self.key_pair.serialize_pem()
    }

    pub fn into_key_pair(self) -> KeyPair {
        self.key_pair
    }
}

/// Generate a new private key for the given algorithm.
///
/// # Example
///
/// ```
/// use devcert::crypto::keys::{generate_key, KeyAlgorithm};
///
/// let key = generate_key(KeyAlgorithm::EcdsaP256).unwrap();
/// assert!(key.to_pem().contains("BEGIN PRIVATE KEY"));
/// ```
pub fn generate_key(algorithm: KeyAlgorithm) -> Result<GeneratedKey> {
    debug!(%algorithm, "generating private key");

    let key_pair = match algorithm {
        KeyAlgorithm::Rsa { bits } => generate_rsa(bits)?,
        KeyAlgorithm::EcdsaP256 => KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)
            .map_err(|e| DevCertError::KeyGeneration(format!("ECDSA P-256: {}", e)))?,
        KeyAlgorithm::Ed25519 => KeyPair::generate_for(&PKCS_ED25519)
            .map_err(|e| DevCertError::KeyGeneration(format!("Ed25519: {}", e)))?,
    };

    Ok(GeneratedKey {
        algorithm,
        key_pair,
    })
}

fn generate_rsa(bits: usize) -> Result<KeyPair> {
    if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&bits) {
        return Err(DevCertError::KeyGeneration(format!(
            "Unsupported RSA key size: {}",
            bits
        )));
    }

    let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
        .map_err(|e| DevCertError::KeyGeneration(format!("RSA-{}: {}", bits, e)))?;
    let pkcs8_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| DevCertError::KeyGeneration(format!("Failed to encode RSA key: {}", e)))?;

    load_key_from_pem(&pkcs8_pem)
}

/// Load a private key from PKCS#8 PEM.
///
/// The signature algorithm is inferred from the key type.
pub fn load_key_from_pem(pem_str: &str) -> Result<KeyPair> {
    KeyPair::from_pem(pem_str)
        .map_err(|e| DevCertError::InvalidKey(format!("Failed to load private key: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algorithms() {
        assert_eq!(
            "rsa4096".parse::<KeyAlgorithm>().unwrap(),
            KeyAlgorithm::Rsa { bits: 4096 }
        );
        assert_eq!(
            "RSA-2048".parse::<KeyAlgorithm>().unwrap(),
            KeyAlgorithm::Rsa { bits: 2048 }
        );
        assert_eq!(
            "ecdsa-p256".parse::<KeyAlgorithm>().unwrap(),
            KeyAlgorithm::EcdsaP256
        );
        assert_eq!(
            "ed25519".parse::<KeyAlgorithm>().unwrap(),
            KeyAlgorithm::Ed25519
        );
    }

    #[test]
    fn test_parse_rejects_small_rsa() {
        assert!("rsa1024".parse::<KeyAlgorithm>().is_err());
        assert!("rsa16384".parse::<KeyAlgorithm>().is_err());
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("dsa".parse::<KeyAlgorithm>().is_err());
        assert!("rsaxyz".parse::<KeyAlgorithm>().is_err());
    }

    #[test]
    fn test_display_roundtrips() {
        for alg in [
            KeyAlgorithm::Rsa { bits: 3072 },
            KeyAlgorithm::EcdsaP256,
            KeyAlgorithm::Ed25519,
        ] {
            assert_eq!(alg.to_string().parse::<KeyAlgorithm>().unwrap(), alg);
        }
    }

    #[test]
    fn test_default_is_rsa_4096() {
        assert_eq!(KeyAlgorithm::default(), KeyAlgorithm::Rsa { bits: 4096 });
    }

    #[test]
    fn test_generate_ecdsa() {
        let key = generate_key(KeyAlgorithm::EcdsaP256).unwrap();
        assert_eq!(key.algorithm(), KeyAlgorithm::EcdsaP256);
        assert!(key.to_pem().contains("BEGIN PRIVATE KEY"));
    }

    #[test]
    fn test_generate_ed25519() {
        let key = generate_key(KeyAlgorithm::Ed25519).unwrap();
        assert!(key.to_pem().contains("BEGIN PRIVATE KEY"));
    }

    #[test]
    fn test_generate_rsa_2048() {
        let key = generate_key(KeyAlgorithm::Rsa { bits: 2048 }).unwrap();
        let pem = key.to_pem();
        assert!(pem.contains("BEGIN PRIVATE KEY"));

        // PEM reloads into an equivalent signing key
        let reloaded = load_key_from_pem(&pem).unwrap();
        assert_eq!(reloaded.serialize_pem(), pem);
    }

    #[test]
    fn test_generate_rsa_out_of_range() {
        let result = generate_key(KeyAlgorithm::Rsa { bits: 1024 });
        assert!(matches!(result, Err(DevCertError::KeyGeneration(_))));
    }

    #[test]
    fn test_load_invalid_pem() {
        assert!(load_key_from_pem("not a key").is_err());
    }

    #[test]
    fn test_two_keys_differ() {
        let a = generate_key(KeyAlgorithm::EcdsaP256).unwrap();
        let b = generate_key(KeyAlgorithm::EcdsaP256).unwrap();
        assert_ne!(a.to_pem(), b.to_pem());
    }
}
