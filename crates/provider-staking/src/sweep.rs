// provider-staking/src/sweep.rs

use crate::collaborators::AccountLedger;
use crate::keeper::{BlockContext, ProviderKeeper};
use crate::ProviderResult;
use provider_store::OrderedStore;

impl<S: OrderedStore> ProviderKeeper<S> {
    /// End-of-block maturity sweep.
    ///
    /// Every provider whose completion time is at or before the block time is
    /// released. Returns how many providers finished unstaking.
    pub fn end_block<L: AccountLedger>(&mut self, ctx: &BlockContext, ledger: &mut L) -> ProviderResult<usize> {
        let mut matured = 0;
        self.drain_unstaking_up_to(ctx.time, |keeper, address| {
            match keeper.get_provider(ctx, &address)? {
                Some(provider) if provider.is_unstaking() => {
                    keeper.finish_unstaking(ctx, ledger, provider)?;
                    matured += 1;
                }
                Some(provider) => {
                    tracing::warn!("skipping queued provider {} with status {}", address, provider.status);
                }
                None => {
                    tracing::error!("unstaking queue references missing provider {}", address);
                }
            }
            Ok(())
        })?;

        if matured > 0 {
            tracing::info!("{} providers finished unstaking at height {}", matured, ctx.height);
        }
        Ok(matured)
    }
}
