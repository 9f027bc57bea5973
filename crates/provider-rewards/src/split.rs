// provider-rewards/src/split.rs

use num_bigint::BigUint;
use provider_core::{Amount, Params};
use serde::{Deserialize, Serialize};

/// Shares of freshly minted relay rewards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRewardSplit {
    pub node: Amount,
    /// DAO and proposer allocations, paid out later by the block reward
    pub fee_collector: Amount,
    pub platform: Amount,
}

impl RelayRewardSplit {
    pub fn total(&self) -> Amount {
        &(&self.node + &self.fee_collector) + &self.platform
    }
}

/// Shares of the fees collected during a block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRewardSplit {
    pub dao: Amount,
    pub platform: Amount,
    pub proposer: Amount,
}

impl BlockRewardSplit {
    pub fn total(&self) -> Amount {
        &(&self.dao + &self.platform) + &self.proposer
    }
}

fn percent_of(amount: &Amount, percent: u64) -> Amount {
    Amount::new(amount.inner() * BigUint::from(percent) / BigUint::from(100u64))
}

/// Percentage cuts are truncated; the node keeps the remainder
pub fn split_relay_reward(coins: &Amount, params: &Params) -> RelayRewardSplit {
    let fee_collector = percent_of(coins, params.dao_allocation + params.proposer_allocation);
    let platform = percent_of(coins, params.platform_allocation);
    let node = coins
        .checked_sub(&(&fee_collector + &platform))
        .unwrap_or_else(Amount::zero);

    RelayRewardSplit {
        node,
        fee_collector,
        platform,
    }
}

/// Divide fees in proportion to the allocations; the proposer keeps the
/// remainder, or everything when no allocation is configured
pub fn split_block_fees(fees: &Amount, params: &Params) -> BlockRewardSplit {
    let total = params.fee_allocation();
    if total == 0 {
        return BlockRewardSplit {
            proposer: fees.clone(),
            ..BlockRewardSplit::default()
        };
    }

    let share = |allocation: u64| Amount::new(fees.inner() * BigUint::from(allocation) / BigUint::from(total));
    let dao = share(params.dao_allocation);
    let platform = share(params.platform_allocation);
    let proposer = fees.checked_sub(&(&dao + &platform)).unwrap_or_else(Amount::zero);

    BlockRewardSplit { dao, platform, proposer }
}
