// provider-crypto/src/keys.rs

use crate::{hash::Hashable, CryptoError, CryptoResult};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Length of a provider address in bytes
pub const ADDRESS_LEN: usize = 20;

/// Supported public key schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScheme {
    /// Ed25519 (consensus default)
    Ed25519,
    /// SECP256k1
    Secp256k1,
}

impl KeyScheme {
    /// Expected encoded key length
    pub fn key_len(&self) -> usize {
        match self {
            KeyScheme::Ed25519 => 32,
            KeyScheme::Secp256k1 => 33,
        }
    }
}

/// Public key wrapper carrying its scheme
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    scheme: KeyScheme,
    #[serde(with = "hex_bytes")]
    bytes: Vec<u8>,
}

impl PublicKey {
    pub fn new(scheme: KeyScheme, bytes: Vec<u8>) -> Self {
        Self { scheme, bytes }
    }

    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn from_hex(scheme: KeyScheme, s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::DeserializationError(e.to_string()))?;
        Ok(Self::new(scheme, bytes))
    }

    /// Check that the bytes decode to a point on the scheme's curve
    pub fn validate(&self) -> CryptoResult<()> {
        match self.scheme {
            KeyScheme::Ed25519 => {
                let bytes: &[u8; 32] = self
                    .bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| CryptoError::InvalidPublicKey(self.scheme))?;
                ed25519_dalek::VerifyingKey::from_bytes(bytes)
                    .map_err(|_| CryptoError::InvalidPublicKey(self.scheme))?;
            }
            KeyScheme::Secp256k1 => {
                secp256k1::PublicKey::from_slice(&self.bytes)
                    .map_err(|_| CryptoError::InvalidPublicKey(self.scheme))?;
            }
        }
        Ok(())
    }

    /// Derive the provider address: first 20 bytes of SHA-256(key)
    pub fn to_address(&self) -> Address {
        Address::from_public_key(self)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicKey({:?}, {}...)",
            self.scheme,
            hex::encode(&self.bytes[..8.min(self.bytes.len())])
        )
    }
}

/// Generated key material. Only the public half is ever persisted.
pub struct KeyPair {
    public_key: PublicKey,
    secret: Vec<u8>,
}

impl KeyPair {
    /// Generate a new random keypair
    pub fn generate(scheme: KeyScheme) -> Self {
        use rand::rngs::OsRng;

        match scheme {
            KeyScheme::Ed25519 => {
                let signing_key = ed25519_dalek::SigningKey::generate(&mut OsRng);
                Self {
                    public_key: PublicKey::new(scheme, signing_key.verifying_key().to_bytes().to_vec()),
                    secret: signing_key.to_bytes().to_vec(),
                }
            }
            KeyScheme::Secp256k1 => {
                let secp = secp256k1::Secp256k1::new();
                let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
                Self {
                    public_key: PublicKey::new(scheme, public_key.serialize().to_vec()),
                    secret: secret_key.secret_bytes().to_vec(),
                }
            }
        }
    }

    /// Deterministic keypair from a 32-byte seed
    pub fn from_seed(scheme: KeyScheme, seed: [u8; 32]) -> CryptoResult<Self> {
        match scheme {
            KeyScheme::Ed25519 => {
                let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
                Ok(Self {
                    public_key: PublicKey::new(scheme, signing_key.verifying_key().to_bytes().to_vec()),
                    secret: seed.to_vec(),
                })
            }
            KeyScheme::Secp256k1 => {
                let secp = secp256k1::Secp256k1::new();
                let secret_key = secp256k1::SecretKey::from_slice(&seed)
                    .map_err(|_| CryptoError::InvalidPublicKey(scheme))?;
                let public_key = secp256k1::PublicKey::from_secret_key(&secp, &secret_key);
                Ok(Self {
                    public_key: PublicKey::new(scheme, public_key.serialize().to_vec()),
                    secret: seed.to_vec(),
                })
            }
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn address(&self) -> Address {
        self.public_key.to_address()
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(&self.secret)
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.secret.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Provider address derived from a public key.
///
/// Ordering is plain byte order, which the staked index relies on for
/// tie-breaking between providers of equal power.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let hash = public_key.as_bytes().to_vec().hash();
        let mut address = [0u8; ADDRESS_LEN];
        address.copy_from_slice(&hash.as_bytes()[..ADDRESS_LEN]);
        Self(address)
    }

    pub fn from_slice(slice: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; ADDRESS_LEN] = slice
            .try_into()
            .map_err(|_| CryptoError::InvalidAddress(format!("expected {} bytes, got {}", ADDRESS_LEN, slice.len())))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn zero() -> Self {
        Self([0u8; ADDRESS_LEN])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// Hex in human-readable formats (genesis JSON, config), raw bytes otherwise.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(de::Error::custom)
        } else {
            <[u8; ADDRESS_LEN]>::deserialize(deserializer).map(Address)
        }
    }
}

mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s).map_err(de::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}
