// provider-rewards/src/registry.rs

use crate::RewardResult;
use provider_core::Amount;
use provider_crypto::Address;
use provider_staking::{BlockContext, ProviderKeeper};
use provider_store::OrderedStore;
use std::collections::BTreeMap;

/// Lookups the reward engine needs about the servicer that earned a reward
pub trait ServicerRegistry {
    /// Where rewards for `servicer` are paid once non-custodial payouts are active
    fn output_address(&mut self, ctx: &BlockContext, servicer: &Address) -> RewardResult<Option<Address>>;

    fn staked_tokens(&mut self, ctx: &BlockContext, servicer: &Address) -> RewardResult<Option<Amount>>;
}

/// Providers are their own payout destination
impl<S: OrderedStore> ServicerRegistry for ProviderKeeper<S> {
    fn output_address(&mut self, ctx: &BlockContext, servicer: &Address) -> RewardResult<Option<Address>> {
        Ok(self.get_provider(ctx, servicer)?.map(|p| p.address))
    }

    fn staked_tokens(&mut self, ctx: &BlockContext, servicer: &Address) -> RewardResult<Option<Amount>> {
        Ok(self.get_provider(ctx, servicer)?.map(|p| p.staked_tokens))
    }
}

#[derive(Debug, Clone)]
struct ServicerEntry {
    output: Option<Address>,
    stake: Amount,
}

/// Fixed servicer table for tests and standalone nodes
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    servicers: BTreeMap<Address, ServicerEntry>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, servicer: Address, output: Option<Address>, stake: Amount) {
        self.servicers.insert(servicer, ServicerEntry { output, stake });
    }
}

impl ServicerRegistry for MemoryRegistry {
    fn output_address(&mut self, _ctx: &BlockContext, servicer: &Address) -> RewardResult<Option<Address>> {
        Ok(self.servicers.get(servicer).and_then(|e| e.output))
    }

    fn staked_tokens(&mut self, _ctx: &BlockContext, servicer: &Address) -> RewardResult<Option<Amount>> {
        Ok(self.servicers.get(servicer).map(|e| e.stake.clone()))
    }
}
