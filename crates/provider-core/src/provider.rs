// provider-core/src/provider.rs

use crate::types::{Amount, Timestamp};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use provider_crypto::{Address, PublicKey};
use serde::{Deserialize, Serialize};

/// Stake is divided by this before being used as a ranking key
pub const POWER_REDUCTION: u64 = 1_000_000;

/// Provider staking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Tokens bonded, eligible for the staked index
    Staked,
    /// Exit requested, waiting for the completion time
    Unstaking,
    /// No tokens bonded
    Unstaked,
}

impl std::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProviderStatus::Staked => "staked",
            ProviderStatus::Unstaking => "unstaking",
            ProviderStatus::Unstaked => "unstaked",
        };
        f.write_str(s)
    }
}

/// A capacity supplier tracked by the staking ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub address: Address,
    pub public_key: PublicKey,
    pub jailed: bool,
    pub status: ProviderStatus,
    pub chains: Vec<String>,
    pub geo_zones: Vec<String>,
    pub num_servicers: i8,
    pub staked_tokens: Amount,
    /// Derived from stake by the relay capacity calculation
    pub max_relays: Amount,
    pub unstaking_completion_time: Timestamp,
}

impl Provider {
    /// Create an unstaked, unjailed record with no tokens
    pub fn new(
        public_key: PublicKey,
        chains: Vec<String>,
        geo_zones: Vec<String>,
        num_servicers: i8,
    ) -> Self {
        Self {
            address: public_key.to_address(),
            public_key,
            jailed: false,
            status: ProviderStatus::Unstaked,
            chains,
            geo_zones,
            num_servicers,
            staked_tokens: Amount::zero(),
            max_relays: Amount::zero(),
            unstaking_completion_time: 0,
        }
    }

    pub fn is_staked(&self) -> bool {
        self.status == ProviderStatus::Staked
    }

    pub fn is_unstaking(&self) -> bool {
        self.status == ProviderStatus::Unstaking
    }

    pub fn is_unstaked(&self) -> bool {
        self.status == ProviderStatus::Unstaked
    }

    pub fn is_jailed(&self) -> bool {
        self.jailed
    }

    /// Whether the record belongs in the staked index
    pub fn is_ranked(&self) -> bool {
        self.is_staked() && !self.jailed
    }

    /// Whether the pool account currently holds this provider's tokens
    pub fn is_bonded(&self) -> bool {
        matches!(self.status, ProviderStatus::Staked | ProviderStatus::Unstaking)
    }

    /// Stake scaled down by `POWER_REDUCTION`, saturating at `u64::MAX`
    pub fn consensus_power(&self) -> u64 {
        let power: BigUint = self.staked_tokens.inner() / BigUint::from(POWER_REDUCTION);
        power.to_u64().unwrap_or(u64::MAX)
    }

    pub fn add_staked_tokens(&mut self, amount: &Amount) {
        self.staked_tokens = &self.staked_tokens + amount;
    }

    /// Remove tokens from the record.
    ///
    /// # Panics
    /// If `amount` exceeds the held stake: the ledger never subtracts more
    /// than it bonded, so this indicates corrupted state.
    pub fn remove_staked_tokens(&mut self, amount: &Amount) {
        self.staked_tokens = self.staked_tokens.checked_sub(amount).unwrap_or_else(|| {
            panic!(
                "should not happen: removing {} tokens from provider {} holding {}",
                amount, self.address, self.staked_tokens
            )
        });
    }
}
