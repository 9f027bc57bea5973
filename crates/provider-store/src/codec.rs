// provider-store/src/codec.rs

use crate::{StorageError, StorageResult};
use provider_core::Provider;
use provider_crypto::Address;

/// Leading byte of every encoded provider record
pub const PROVIDER_ENCODING_VERSION: u8 = 1;

pub fn encode_provider(provider: &Provider) -> StorageResult<Vec<u8>> {
    let body = bincode::serialize(provider)?;
    let mut bytes = Vec::with_capacity(body.len() + 1);
    bytes.push(PROVIDER_ENCODING_VERSION);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

pub fn decode_provider(bytes: &[u8]) -> StorageResult<Provider> {
    match bytes.split_first() {
        Some((&PROVIDER_ENCODING_VERSION, body)) => Ok(bincode::deserialize(body)?),
        Some((version, _)) => Err(StorageError::SerializationError(format!(
            "unknown provider encoding version {}",
            version
        ))),
        None => Err(StorageError::SerializationError("empty provider record".into())),
    }
}

pub fn encode_addresses(addresses: &[Address]) -> StorageResult<Vec<u8>> {
    Ok(bincode::serialize(addresses)?)
}

pub fn decode_addresses(bytes: &[u8]) -> StorageResult<Vec<Address>> {
    Ok(bincode::deserialize(bytes)?)
}
