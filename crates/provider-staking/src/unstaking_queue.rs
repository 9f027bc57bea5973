// provider-staking/src/unstaking_queue.rs

//! Completion-time buckets of providers waiting to exit.

use crate::keeper::ProviderKeeper;
use crate::ProviderResult;
use provider_core::{Provider, Timestamp};
use provider_crypto::Address;
use provider_store::{codec, keys, Direction, OrderedStore};

impl<S: OrderedStore> ProviderKeeper<S> {
    /// Addresses maturing at exactly `time`; an undecodable bucket reads as empty
    pub fn unstaking_bucket(&self, time: Timestamp) -> ProviderResult<Vec<Address>> {
        let key = keys::unstaking_queue_key(time);
        match self.store.get(&key)? {
            Some(bytes) => Ok(decode_bucket(&key, &bytes).unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    fn write_bucket(&mut self, time: Timestamp, addresses: &[Address]) -> ProviderResult<()> {
        let key = keys::unstaking_queue_key(time);
        if addresses.is_empty() {
            self.store.delete(&key)?;
        } else {
            self.store.set(&key, &codec::encode_addresses(addresses)?)?;
        }
        Ok(())
    }

    /// Add the provider under its completion time; a no-op if already queued
    pub fn enqueue_unstaking(&mut self, provider: &Provider) -> ProviderResult<()> {
        let time = provider.unstaking_completion_time;
        let mut bucket = self.unstaking_bucket(time)?;
        if bucket.contains(&provider.address) {
            return Ok(());
        }
        bucket.push(provider.address);
        self.write_bucket(time, &bucket)
    }

    /// Remove the provider from its bucket, dropping the bucket once empty
    pub fn dequeue_unstaking(&mut self, provider: &Provider) -> ProviderResult<()> {
        let time = provider.unstaking_completion_time;
        let mut bucket = self.unstaking_bucket(time)?;
        let before = bucket.len();
        bucket.retain(|a| a != &provider.address);
        if bucket.len() == before {
            tracing::debug!("provider {} not queued at {}", provider.address, time);
            return Ok(());
        }
        self.write_bucket(time, &bucket)
    }

    /// Hand every address with completion time `<= time` to `f`, oldest
    /// bucket first, deleting each bucket once visited. Undecodable buckets
    /// are logged and deleted without visiting.
    pub fn drain_unstaking_up_to<F>(&mut self, time: Timestamp, mut f: F) -> ProviderResult<()>
    where
        F: FnMut(&mut Self, Address) -> ProviderResult<()>,
    {
        let end = time.checked_add(1).map(keys::unstaking_queue_key);
        let end = end.unwrap_or_else(|| vec![keys::UNSTAKING_QUEUE_PREFIX[0] + 1]);
        let buckets = self
            .store
            .scan_range(keys::UNSTAKING_QUEUE_PREFIX, Some(&end), Direction::Forward)?;

        for (key, value) in buckets {
            if let Some(addresses) = decode_bucket(&key, &value) {
                for address in addresses {
                    f(self, address)?;
                }
            }
            self.store.delete(&key)?;
        }
        Ok(())
    }

    /// Every queued bucket in completion-time order
    pub fn all_unstaking_entries(&self) -> ProviderResult<Vec<(Timestamp, Vec<Address>)>> {
        let mut entries = Vec::new();
        for (key, value) in self.store.scan_prefix(keys::UNSTAKING_QUEUE_PREFIX, Direction::Forward)? {
            let time = keys::parse_unstaking_queue_key(&key)?;
            if let Some(addresses) = decode_bucket(&key, &value) {
                entries.push((time, addresses));
            }
        }
        Ok(entries)
    }
}

fn decode_bucket(key: &[u8], bytes: &[u8]) -> Option<Vec<Address>> {
    match codec::decode_addresses(bytes) {
        Ok(addresses) => Some(addresses),
        Err(e) => {
            let time = keys::parse_unstaking_queue_key(key).map_or_else(|_| format!("{:?}", key), |t| t.to_string());
            tracing::error!("skipping undecodable unstaking bucket at {}: {}", time, e);
            None
        }
    }
}
