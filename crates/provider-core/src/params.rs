// provider-core/src/params.rs

use crate::{types::Amount, BlockHeight, CoreError, CoreResult};
use provider_crypto::KeyScheme;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Staking and reward configuration, fixed for the duration of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Seconds between `begin_unstaking` and maturity
    pub unstaking_time: u64,
    /// Cap on the staked index size
    pub max_providers: u64,
    pub min_stake: Amount,
    pub max_chains: u64,
    /// Relays per million staked tokens, in percent
    pub base_relays_per_stake_rate: u64,
    /// Scale relay capacity by network-wide stake participation
    pub participation_rate_on: bool,
    /// Constant added to every relay capacity (may be negative)
    pub staking_adjustment: i64,
    pub stake_denom: String,
    /// Key schemes accepted for newly created providers
    pub allowed_key_schemes: Vec<KeyScheme>,

    /// Tokens minted per relay before scaling
    pub token_reward_factor: Amount,
    /// Percentages of relay rewards routed away from the node
    pub dao_allocation: u64,
    pub proposer_allocation: u64,
    pub platform_allocation: u64,

    /// Stake-bin width used to discretize servicer stake
    pub stake_bin_width: Amount,
    /// Stake above this value earns no extra weight
    pub stake_bin_ceiling: Amount,
    pub stake_bin_exponent: Decimal,
    pub stake_weight_multiplier: Decimal,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            unstaking_time: 21 * 24 * 3600,
            max_providers: 100_000,
            min_stake: Amount::from_u64(1_000_000),
            max_chains: 15,
            base_relays_per_stake_rate: 100,
            participation_rate_on: false,
            staking_adjustment: 0,
            stake_denom: "upokt".into(),
            allowed_key_schemes: vec![KeyScheme::Ed25519],
            token_reward_factor: Amount::from_u64(1000),
            dao_allocation: 10,
            proposer_allocation: 1,
            platform_allocation: 4,
            stake_bin_width: Amount::from_u64(15_000_000_000),
            stake_bin_ceiling: Amount::from_u64(60_000_000_000),
            stake_bin_exponent: Decimal::ONE,
            stake_weight_multiplier: Decimal::ONE,
        }
    }
}

impl Params {
    /// Reject configurations the state machine cannot operate under
    pub fn validate(&self) -> CoreResult<()> {
        if self.unstaking_time == 0 {
            return Err(CoreError::InvalidParams("unstaking_time must be positive".into()));
        }
        if self.max_chains == 0 {
            return Err(CoreError::InvalidParams("max_chains must be positive".into()));
        }
        if self.stake_denom.is_empty() {
            return Err(CoreError::InvalidParams("stake_denom must not be empty".into()));
        }
        if self.allowed_key_schemes.is_empty() {
            return Err(CoreError::InvalidParams("at least one key scheme must be allowed".into()));
        }
        let allocated = self.dao_allocation + self.proposer_allocation + self.platform_allocation;
        if allocated > 100 {
            return Err(CoreError::InvalidParams(format!(
                "reward allocations sum to {}%, above 100%",
                allocated
            )));
        }
        if self.stake_bin_width.is_zero() {
            return Err(CoreError::InvalidParams("stake_bin_width must be positive".into()));
        }
        if self.stake_bin_exponent.is_sign_negative() {
            return Err(CoreError::InvalidParams("stake_bin_exponent must not be negative".into()));
        }
        if self.stake_weight_multiplier <= Decimal::ZERO {
            return Err(CoreError::InvalidParams("stake_weight_multiplier must be positive".into()));
        }
        Ok(())
    }

    /// Sum of the allocation percentages that leave the node's share
    pub fn fee_allocation(&self) -> u64 {
        self.dao_allocation + self.proposer_allocation + self.platform_allocation
    }
}

/// Height-gated behavior changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upgrade {
    /// Re-staking a staked provider edits it; max-providers cap enforced
    EditStake,
    /// Force-unstake branches on the provider's current status
    ForceUnstake,
    /// Rewards route through registered output addresses
    NonCustodial,
    /// Relay rewards scale with the servicer's stake bin
    RewardScaling,
}

/// Activation heights for each upgrade; `None` means never active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeSchedule {
    pub edit_stake: Option<BlockHeight>,
    pub force_unstake: Option<BlockHeight>,
    pub non_custodial: Option<BlockHeight>,
    pub reward_scaling: Option<BlockHeight>,
}

impl Default for UpgradeSchedule {
    fn default() -> Self {
        Self {
            edit_stake: Some(0),
            force_unstake: Some(0),
            non_custodial: Some(0),
            reward_scaling: None,
        }
    }
}

impl UpgradeSchedule {
    /// Every upgrade active from genesis
    pub fn all_active() -> Self {
        Self {
            edit_stake: Some(0),
            force_unstake: Some(0),
            non_custodial: Some(0),
            reward_scaling: Some(0),
        }
    }

    /// No upgrade ever active
    pub fn legacy() -> Self {
        Self {
            edit_stake: None,
            force_unstake: None,
            non_custodial: None,
            reward_scaling: None,
        }
    }

    pub fn is_active(&self, upgrade: Upgrade, height: BlockHeight) -> bool {
        let activation = match upgrade {
            Upgrade::EditStake => self.edit_stake,
            Upgrade::ForceUnstake => self.force_unstake,
            Upgrade::NonCustodial => self.non_custodial,
            Upgrade::RewardScaling => self.reward_scaling,
        };
        activation.map_or(false, |h| height >= h)
    }
}
