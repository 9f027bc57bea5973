// provider-store/src/keys.rs

//! Key layout of the provider keyspaces.
//!
//! | prefix | key                                   | value          |
//! |--------|---------------------------------------|----------------|
//! | `0x01` | address                               | provider       |
//! | `0x02` | be_u64(power) ‖ !address              | address        |
//! | `0x03` | be_u64(completion time)               | address list   |
//!
//! Staked-index keys complement the address so that a reverse scan yields
//! the highest power first and, among equal powers, the lowest address first.

use crate::{StorageError, StorageResult};
use provider_core::{Provider, Timestamp};
use provider_crypto::{Address, ADDRESS_LEN};

pub const ALL_PROVIDERS_PREFIX: &[u8] = &[0x01];
pub const STAKED_INDEX_PREFIX: &[u8] = &[0x02];
pub const UNSTAKING_QUEUE_PREFIX: &[u8] = &[0x03];

pub fn provider_key(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + ADDRESS_LEN);
    key.extend_from_slice(ALL_PROVIDERS_PREFIX);
    key.extend_from_slice(address.as_bytes());
    key
}

pub fn address_from_provider_key(key: &[u8]) -> StorageResult<Address> {
    let body = key
        .strip_prefix(ALL_PROVIDERS_PREFIX)
        .ok_or_else(|| StorageError::Corruption("provider key without prefix".into()))?;
    Address::from_slice(body).map_err(|e| StorageError::Corruption(e.to_string()))
}

pub fn staked_index_key_for(power: u64, address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 8 + ADDRESS_LEN);
    key.extend_from_slice(STAKED_INDEX_PREFIX);
    key.extend_from_slice(&power.to_be_bytes());
    key.extend(address.as_bytes().iter().map(|b| !b));
    key
}

/// Rank key computed from the record's current stake
pub fn staked_index_key(provider: &Provider) -> Vec<u8> {
    staked_index_key_for(provider.consensus_power(), &provider.address)
}

/// Recover `(power, address)` from a staked-index key
pub fn parse_staked_index_key(key: &[u8]) -> StorageResult<(u64, Address)> {
    let body = key
        .strip_prefix(STAKED_INDEX_PREFIX)
        .ok_or_else(|| StorageError::Corruption("staked index key without prefix".into()))?;
    if body.len() != 8 + ADDRESS_LEN {
        return Err(StorageError::Corruption(format!("staked index key of length {}", key.len())));
    }
    let (power_bytes, complemented) = body.split_at(8);
    let mut power = [0u8; 8];
    power.copy_from_slice(power_bytes);
    let mut address = [0u8; ADDRESS_LEN];
    for (dst, src) in address.iter_mut().zip(complemented) {
        *dst = !src;
    }
    Ok((u64::from_be_bytes(power), Address::new(address)))
}

pub fn unstaking_queue_key(time: Timestamp) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 8);
    key.extend_from_slice(UNSTAKING_QUEUE_PREFIX);
    key.extend_from_slice(&time.to_be_bytes());
    key
}

pub fn parse_unstaking_queue_key(key: &[u8]) -> StorageResult<Timestamp> {
    let body = key
        .strip_prefix(UNSTAKING_QUEUE_PREFIX)
        .ok_or_else(|| StorageError::Corruption("unstaking key without prefix".into()))?;
    let bytes: [u8; 8] = body
        .try_into()
        .map_err(|_| StorageError::Corruption(format!("unstaking key of length {}", key.len())))?;
    Ok(Timestamp::from_be_bytes(bytes))
}
