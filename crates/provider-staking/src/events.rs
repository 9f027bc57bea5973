// provider-staking/src/events.rs

use provider_core::{Amount, Timestamp};
use provider_crypto::Address;
use serde::{Deserialize, Serialize};

/// State transitions observable by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderEvent {
    /// New stake or edit; `amount` is the total bonded afterwards
    Stake { address: Address, amount: Amount },
    BeginUnstake { address: Address, completion_time: Timestamp },
    CompleteUnstaking { address: Address, amount: Amount },
    /// Forced exit; the stake was burned
    Unstake { address: Address, amount: Amount },
    Jail { address: Address },
    Unjail { address: Address },
}

impl ProviderEvent {
    pub fn address(&self) -> &Address {
        match self {
            ProviderEvent::Stake { address, .. }
            | ProviderEvent::BeginUnstake { address, .. }
            | ProviderEvent::CompleteUnstaking { address, .. }
            | ProviderEvent::Unstake { address, .. }
            | ProviderEvent::Jail { address }
            | ProviderEvent::Unjail { address } => address,
        }
    }
}
