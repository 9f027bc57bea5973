// provider-staking/src/msgs.rs

use crate::collaborators::AccountLedger;
use crate::keeper::{BlockContext, ProviderKeeper};
use crate::{ProviderError, ProviderResult};
use provider_core::{Amount, Provider};
use provider_crypto::{Address, PublicKey};
use provider_store::OrderedStore;
use serde::{Deserialize, Serialize};

/// Stake a new provider or, once edit-stake is active, edit a staked one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgStake {
    pub public_key: PublicKey,
    pub chains: Vec<String>,
    #[serde(default)]
    pub geo_zones: Vec<String>,
    #[serde(default)]
    pub num_servicers: i8,
    pub value: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBeginUnstake {
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUnjail {
    pub address: Address,
}

/// Every message the module accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ProviderMsg {
    Stake(MsgStake),
    /// Explicit edit; rejected unless the provider is already staked
    EditStake(MsgStake),
    BeginUnstake(MsgBeginUnstake),
    Unjail(MsgUnjail),
}

impl ProviderMsg {
    /// Stateless checks
    pub fn validate_basic(&self) -> ProviderResult<()> {
        match self {
            ProviderMsg::Stake(msg) | ProviderMsg::EditStake(msg) => {
                if msg.value.is_zero() {
                    return Err(ProviderError::ZeroAmount);
                }
                if msg.chains.is_empty() {
                    return Err(ProviderError::NoChains);
                }
                if let Some(chain) = msg.chains.iter().find(|c| c.trim().is_empty()) {
                    return Err(ProviderError::InvalidChain(chain.clone()));
                }
                Ok(())
            }
            ProviderMsg::BeginUnstake(_) | ProviderMsg::Unjail(_) => Ok(()),
        }
    }

    /// Address that must authorize the message
    pub fn signer(&self) -> Address {
        match self {
            ProviderMsg::Stake(msg) | ProviderMsg::EditStake(msg) => msg.public_key.to_address(),
            ProviderMsg::BeginUnstake(msg) => msg.address,
            ProviderMsg::Unjail(msg) => msg.address,
        }
    }
}

impl<S: OrderedStore> ProviderKeeper<S> {
    /// Validate and apply a message
    pub fn handle_msg<L: AccountLedger>(
        &mut self,
        ctx: &BlockContext,
        ledger: &mut L,
        msg: ProviderMsg,
    ) -> ProviderResult<()> {
        msg.validate_basic()?;
        match msg {
            ProviderMsg::Stake(msg) => {
                let mut provider = Provider::new(msg.public_key, msg.chains, msg.geo_zones, msg.num_servicers);
                if let Some(existing) = self.get_provider(ctx, &provider.address)? {
                    // jail survives an unstake/restake cycle
                    if existing.is_unstaked() {
                        provider.jailed = existing.jailed;
                    }
                }
                self.validate_staking(ctx, &*ledger, &provider, &msg.value)?;
                self.stake(ctx, ledger, provider, msg.value)
            }
            ProviderMsg::EditStake(msg) => {
                let updated = Provider::new(msg.public_key, msg.chains, msg.geo_zones, msg.num_servicers);
                let existing = self
                    .get_provider(ctx, &updated.address)?
                    .ok_or(ProviderError::NotFound(updated.address))?;
                if !existing.is_staked() {
                    return Err(ProviderError::InvalidStatus {
                        address: existing.address,
                        status: existing.status,
                    });
                }
                self.validate_edit_stake(ctx, &*ledger, &existing, &updated, &msg.value)?;
                self.edit_stake(ctx, ledger, existing, updated, msg.value)
            }
            ProviderMsg::BeginUnstake(msg) => {
                let provider = self
                    .get_provider(ctx, &msg.address)?
                    .ok_or(ProviderError::NotFound(msg.address))?;
                self.begin_unstaking(ctx, provider)
            }
            ProviderMsg::Unjail(msg) => self.unjail(ctx, &msg.address),
        }
    }
}
