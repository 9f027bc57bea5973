// provider-staking/src/repository.rs

//! Canonical provider records, read through the context cache.

use crate::keeper::{BlockContext, ProviderKeeper};
use crate::ProviderResult;
use provider_core::Provider;
use provider_crypto::Address;
use provider_store::{codec, keys, Direction, OrderedStore};
use std::ops::ControlFlow;

impl<S: OrderedStore> ProviderKeeper<S> {
    /// Look up a provider; undecodable records are logged and reported absent
    pub fn get_provider(&mut self, ctx: &BlockContext, address: &Address) -> ProviderResult<Option<Provider>> {
        if let Some(provider) = self.cache.get(ctx.epoch, address) {
            return Ok(Some(provider));
        }

        let Some(bytes) = self.store.get(&keys::provider_key(address))? else {
            return Ok(None);
        };
        match codec::decode_provider(&bytes) {
            Ok(provider) => {
                self.cache.insert(ctx.epoch, provider.clone());
                Ok(Some(provider))
            }
            Err(e) => {
                tracing::error!("cannot decode provider {}: {}", address, e);
                Ok(None)
            }
        }
    }

    /// Persist a record and keep the secondary indices in step with it.
    ///
    /// Ranked records get a staked-index entry under their current power and
    /// unstaking records get a queue entry under their completion time. Callers
    /// changing a ranked record's stake must remove the old index entry first.
    pub fn set_provider(&mut self, ctx: &BlockContext, provider: &Provider) -> ProviderResult<()> {
        let bytes = codec::encode_provider(provider)
            .unwrap_or_else(|e| panic!("should not happen: cannot encode provider {}: {}", provider.address, e));
        self.store.set(&keys::provider_key(&provider.address), &bytes)?;

        if provider.is_ranked() {
            self.add_to_staked_index(provider)?;
        }
        if provider.is_unstaking() {
            self.enqueue_unstaking(provider)?;
        }

        self.cache.insert(ctx.epoch, provider.clone());
        Ok(())
    }

    /// Remove the canonical record only; index entries are the caller's concern
    pub fn delete_provider(&mut self, ctx: &BlockContext, address: &Address) -> ProviderResult<()> {
        self.store.delete(&keys::provider_key(address))?;
        self.cache.remove(ctx.epoch, address);
        Ok(())
    }

    /// Visit every record in address order until `f` breaks
    pub fn iterate_all<F>(&self, mut f: F) -> ProviderResult<()>
    where
        F: FnMut(&Provider) -> ControlFlow<()>,
    {
        for (key, value) in self.store.scan_prefix(keys::ALL_PROVIDERS_PREFIX, Direction::Forward)? {
            let provider = match codec::decode_provider(&value) {
                Ok(provider) => provider,
                Err(e) => {
                    tracing::error!("skipping undecodable provider record {}: {}", hex_key(&key), e);
                    continue;
                }
            };
            if f(&provider).is_break() {
                break;
            }
        }
        Ok(())
    }

    pub fn all_providers(&self) -> ProviderResult<Vec<Provider>> {
        let mut providers = Vec::new();
        self.iterate_all(|p| {
            providers.push(p.clone());
            ControlFlow::Continue(())
        })?;
        Ok(providers)
    }
}

fn hex_key(key: &[u8]) -> String {
    keys::address_from_provider_key(key)
        .map(|a| a.to_hex())
        .unwrap_or_else(|_| format!("{:?}", key))
}
