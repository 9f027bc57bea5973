// provider-rewards/src/lib.rs

//! Relay and block reward distribution
//!
//! This crate implements the reward flow where:
//! - Relays served by a servicer mint new tokens, optionally scaled by the
//!   servicer's stake bin
//! - Minted rewards are split between the node, the fee collector and the platform
//! - Collected fees are paid out each block to the DAO, the platform and the
//!   previous block proposer

pub mod engine;
pub mod registry;
pub mod split;
pub mod weight;

pub use engine::RewardEngine;
pub use registry::{MemoryRegistry, ServicerRegistry};
pub use split::{split_block_fees, split_relay_reward, BlockRewardSplit, RelayRewardSplit};
pub use weight::{relay_coins, stake_weight};

use provider_staking::{LedgerError, ProviderError};

/// Result type for reward operations
pub type RewardResult<T> = Result<T, RewardError>;

/// Errors that can occur while distributing rewards
#[derive(Debug, thiserror::Error)]
pub enum RewardError {
    #[error("Registry error: {0}")]
    Registry(#[from] ProviderError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Weight overflow: {0}")]
    WeightOverflow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_ledger() {
        let err: RewardError = LedgerError::InvalidCoin("x".into()).into();
        assert_eq!(err.to_string(), "Ledger error: Invalid coin: x");
    }
}
