// provider-store/src/lib.rs

//! Provider storage layer
//!
//! This crate provides:
//! - The ordered key-value store abstraction the staking keeper writes to
//! - In-memory and sled-backed store implementations
//! - Key layout for the provider record, staked index and unstaking queue
//! - Versioned binary encoding of provider records
//! - A per-context cache of decoded providers

pub mod cache;
pub mod codec;
pub mod keys;
pub mod sled_store;
pub mod store;

pub use cache::ProviderCache;
pub use sled_store::{SledConfig, SledStore};
pub use store::{Direction, KvPair, MemoryStore, OrderedStore};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),
}

impl From<sled::Error> for StorageError {
    fn from(e: sled::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(e: bincode::Error) -> Self {
        StorageError::SerializationError(e.to_string())
    }
}
