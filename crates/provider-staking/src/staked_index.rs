// provider-staking/src/staked_index.rs

//! Power-ranked index of staked, unjailed providers.

use crate::keeper::{BlockContext, ProviderKeeper};
use crate::ProviderResult;
use provider_core::Provider;
use provider_crypto::Address;
use provider_store::{keys, Direction, OrderedStore};
use std::ops::ControlFlow;

impl<S: OrderedStore> ProviderKeeper<S> {
    /// Jailed providers are never ranked
    pub fn add_to_staked_index(&mut self, provider: &Provider) -> ProviderResult<()> {
        if provider.jailed {
            return Ok(());
        }
        self.store
            .set(&keys::staked_index_key(provider), provider.address.as_bytes())?;
        Ok(())
    }

    /// Remove the entry keyed by the record's current power
    pub fn remove_from_staked_index(&mut self, provider: &Provider) -> ProviderResult<()> {
        self.store.delete(&keys::staked_index_key(provider))?;
        Ok(())
    }

    /// Visit staked providers by descending power, ties broken by lowest address.
    ///
    /// Index entries whose record is missing or undecodable are logged and
    /// skipped.
    pub fn iterate_staked<F>(&mut self, ctx: &BlockContext, mut f: F) -> ProviderResult<()>
    where
        F: FnMut(&Provider) -> ControlFlow<()>,
    {
        let entries = self.store.scan_prefix(keys::STAKED_INDEX_PREFIX, Direction::Reverse)?;
        for (key, value) in entries {
            let address = match Address::from_slice(&value) {
                Ok(address) => address,
                Err(e) => {
                    tracing::error!("malformed staked index entry {:?}: {}", key, e);
                    continue;
                }
            };
            let Some(provider) = self.get_provider(ctx, &address)? else {
                tracing::error!("staked index references missing provider {}", address);
                continue;
            };
            if f(&provider).is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Up to `limit` staked providers in rank order
    pub fn providers_by_rank(&mut self, ctx: &BlockContext, limit: usize) -> ProviderResult<Vec<Provider>> {
        let mut ranked = Vec::new();
        if limit == 0 {
            return Ok(ranked);
        }
        self.iterate_staked(ctx, |p| {
            ranked.push(p.clone());
            if ranked.len() >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        Ok(ranked)
    }

    /// Number of entries in the staked index
    pub fn staked_count(&self) -> ProviderResult<u64> {
        Ok(self.store.count_prefix(keys::STAKED_INDEX_PREFIX)?)
    }
}
