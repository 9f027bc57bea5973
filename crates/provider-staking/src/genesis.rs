// provider-staking/src/genesis.rs

use crate::collaborators::{AccountLedger, Pool};
use crate::keeper::{BlockContext, ProviderKeeper};
use crate::{ProviderError, ProviderResult};
use provider_core::{Amount, Params, Provider, ProviderStatus};
use provider_store::OrderedStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Initial module state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    pub providers: Vec<Provider>,
}

/// Structural checks on a genesis document
pub fn validate_genesis(state: &GenesisState) -> ProviderResult<()> {
    state
        .params
        .validate()
        .map_err(|e| ProviderError::InvalidGenesis(e.to_string()))?;

    let mut seen = HashSet::new();
    for provider in &state.providers {
        let invalid = |reason: &str| ProviderError::InvalidGenesis(format!("provider {}: {}", provider.address, reason));

        if !seen.insert(provider.address) {
            return Err(invalid("duplicate address"));
        }
        if provider.public_key.to_address() != provider.address {
            return Err(invalid("address does not match public key"));
        }
        if provider.chains.len() as u64 > state.params.max_chains {
            return Err(invalid("too many chains"));
        }
        match provider.status {
            ProviderStatus::Staked => {
                // a jailed provider may sit below minimum until it unjails
                if provider.staked_tokens.is_zero() {
                    return Err(invalid("staked with no tokens"));
                }
                if !provider.jailed && provider.staked_tokens < state.params.min_stake {
                    return Err(invalid("staked below minimum stake"));
                }
                if provider.unstaking_completion_time != 0 {
                    return Err(invalid("staked with a completion time"));
                }
            }
            ProviderStatus::Unstaking => {
                if provider.staked_tokens.is_zero() {
                    return Err(invalid("unstaking with no tokens"));
                }
                if provider.unstaking_completion_time == 0 {
                    return Err(invalid("unstaking without a completion time"));
                }
            }
            ProviderStatus::Unstaked => {
                if !provider.staked_tokens.is_zero() {
                    return Err(invalid("unstaked while holding tokens"));
                }
                if !provider.max_relays.is_zero() {
                    return Err(invalid("unstaked with relay capacity"));
                }
            }
        }
    }
    Ok(())
}

impl<S: OrderedStore> ProviderKeeper<S> {
    /// Load a genesis document into an empty keeper.
    ///
    /// # Panics
    /// If the staking pool balance does not equal the tokens bonded by the
    /// genesis providers.
    pub fn init_genesis<L: AccountLedger>(
        &mut self,
        ctx: &BlockContext,
        ledger: &L,
        state: &GenesisState,
    ) -> ProviderResult<()> {
        validate_genesis(state)?;
        if state.params != self.params() {
            tracing::warn!("genesis params differ from the keeper's parameter source");
        }

        let mut bonded = Amount::zero();
        for provider in &state.providers {
            self.set_provider(ctx, provider)?;
            if provider.is_bonded() {
                bonded = &bonded + &provider.staked_tokens;
            }
        }

        let denom = self.stake_denom();
        let pool_balance = ledger.balance_of(&Pool::Staking.into(), &denom);
        if pool_balance != bonded {
            panic!(
                "staking pool balance {}{} does not match bonded provider tokens {}{}",
                pool_balance, denom, bonded, denom
            );
        }

        tracing::info!("loaded {} providers from genesis, {} bonded", state.providers.len(), bonded);
        Ok(())
    }

    pub fn export_genesis(&self) -> ProviderResult<GenesisState> {
        Ok(GenesisState {
            params: self.params(),
            providers: self.all_providers()?,
        })
    }
}
