// provider-crypto/src/lib.rs

//! Cryptographic identity for staked providers
//!
//! This crate provides:
//! - SHA-256 hashing used for address derivation
//! - Public keys tagged with their signature scheme
//! - Provider addresses and their byte-level helpers
//! - Key generation for operators and test fixtures

pub mod hash;
pub mod keys;

pub use hash::{Hash, Hashable};
pub use keys::{Address, KeyPair, KeyScheme, PublicKey, ADDRESS_LEN};

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid public key for scheme {0:?}")]
    InvalidPublicKey(KeyScheme),

    #[error("Invalid hash")]
    InvalidHash,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_is_valid() {
        let keypair = KeyPair::generate(KeyScheme::Ed25519);
        assert!(keypair.public_key().validate().is_ok());
        assert_eq!(keypair.public_key().to_address(), keypair.address());
    }
}
