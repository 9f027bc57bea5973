// provider-staking/src/jail.rs

use crate::events::ProviderEvent;
use crate::keeper::{BlockContext, ProviderKeeper};
use crate::{ProviderError, ProviderResult};
use provider_core::Provider;
use provider_crypto::Address;
use provider_store::OrderedStore;

impl<S: OrderedStore> ProviderKeeper<S> {
    /// Pull a provider out of the staked index; its stake stays bonded.
    ///
    /// Unknown or already jailed providers are logged and left untouched.
    pub fn jail(&mut self, ctx: &BlockContext, address: &Address) -> ProviderResult<()> {
        let Some(mut provider) = self.get_provider(ctx, address)? else {
            tracing::error!("cannot jail provider {}: not found", address);
            return Ok(());
        };
        if provider.jailed {
            tracing::error!("cannot jail provider {}: already jailed", address);
            return Ok(());
        }

        // index key does not depend on the jailed flag
        self.remove_from_staked_index(&provider)?;
        provider.jailed = true;
        self.set_provider(ctx, &provider)?;

        tracing::info!("provider {} jailed", address);
        self.emit(ProviderEvent::Jail { address: *address });
        Ok(())
    }

    pub fn validate_unjail(&mut self, ctx: &BlockContext, address: &Address) -> ProviderResult<Provider> {
        let provider = self
            .get_provider(ctx, address)?
            .ok_or(ProviderError::NotFound(*address))?;

        if provider.staked_tokens.is_zero() {
            return Err(ProviderError::NoStake(*address));
        }
        let min_stake = self.params().min_stake;
        if provider.staked_tokens < min_stake {
            return Err(ProviderError::BelowMinimumStake {
                required: min_stake,
                provided: provider.staked_tokens,
            });
        }
        if !provider.jailed {
            return Err(ProviderError::NotJailed(*address));
        }
        Ok(provider)
    }

    /// Clear the jailed flag, re-entering the staked index if still staked
    pub fn unjail(&mut self, ctx: &BlockContext, address: &Address) -> ProviderResult<()> {
        let mut provider = self.validate_unjail(ctx, address)?;
        provider.jailed = false;
        self.set_provider(ctx, &provider)?;

        tracing::info!("provider {} unjailed", address);
        self.emit(ProviderEvent::Unjail { address: *address });
        Ok(())
    }
}
