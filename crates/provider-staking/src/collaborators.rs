// provider-staking/src/collaborators.rs

//! Services the keeper consumes but does not own.

use provider_core::{Amount, Coin, Params};
use provider_crypto::Address;
use serde::{Deserialize, Serialize};

/// Named module accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pool {
    /// Holds every bonded provider token
    Staking,
    /// Accumulates fees and relay-reward cuts until the block reward
    FeeCollector,
    Dao,
    Platform,
    /// Source account for freshly minted relay rewards
    Minter,
}

impl Pool {
    pub const ALL: [Pool; 5] = [Pool::Staking, Pool::FeeCollector, Pool::Dao, Pool::Platform, Pool::Minter];
}

/// Either a user account or a module pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccountId {
    Account(Address),
    Pool(Pool),
}

impl From<Address> for AccountId {
    fn from(address: Address) -> Self {
        AccountId::Account(address)
    }
}

impl From<Pool> for AccountId {
    fn from(pool: Pool) -> Self {
        AccountId::Pool(pool)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountId::Account(address) => write!(f, "{}", address),
            AccountId::Pool(pool) => write!(f, "pool:{:?}", pool),
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Typed failures of the account ledger
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Insufficient funds in {holder}: needed {needed}, available {available}")]
    InsufficientFunds {
        holder: AccountId,
        needed: Coin,
        available: Amount,
    },

    #[error("Unknown pool {0:?}")]
    UnknownPool(Pool),

    #[error("Invalid coin: {0}")]
    InvalidCoin(String),
}

/// Balances, transfers, mint and burn
pub trait AccountLedger {
    fn has_pool(&self, pool: Pool) -> bool;

    fn balance_of(&self, holder: &AccountId, denom: &str) -> Amount;

    fn has_balance(&self, holder: &AccountId, coin: &Coin) -> bool {
        self.balance_of(holder, &coin.denom) >= coin.amount
    }

    /// Atomic move; fails without side effects
    fn transfer(&mut self, from: &AccountId, to: &AccountId, coin: &Coin) -> LedgerResult<()>;

    fn mint(&mut self, pool: Pool, coin: &Coin) -> LedgerResult<()>;

    fn burn(&mut self, pool: Pool, coin: &Coin) -> LedgerResult<()>;

    fn total_supply(&self, denom: &str) -> Amount;
}

/// Current parameter values
pub trait ParamSource {
    fn params(&self) -> Params;
}

impl ParamSource for Params {
    fn params(&self) -> Params {
        self.clone()
    }
}

/// Drops cached session / relay-routing state when served chains change
pub trait SessionInvalidator {
    fn clear_sessions(&mut self);
}

/// Used when no session layer is attached
#[derive(Debug, Default)]
pub struct NoopSessions;

impl SessionInvalidator for NoopSessions {
    fn clear_sessions(&mut self) {}
}

/// Sibling staking module (e.g. the servicer set)
pub trait CompanionPool {
    fn total_staked_tokens(&self) -> Amount;

    fn stake_denom(&self) -> String;
}

/// Stand-in companion with nothing staked
#[derive(Debug, Clone)]
pub struct DetachedCompanion {
    pub denom: String,
}

impl CompanionPool for DetachedCompanion {
    fn total_staked_tokens(&self) -> Amount {
        Amount::zero()
    }

    fn stake_denom(&self) -> String {
        self.denom.clone()
    }
}
