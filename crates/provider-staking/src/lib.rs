// provider-staking/src/lib.rs

//! Provider staking ledger
//!
//! This crate implements the state machine where:
//! - Providers bond tokens into the staking pool and advertise chains
//! - A staked index ranks them by power for selection
//! - Exits wait in a time-ordered unstaking queue until maturity
//! - Jailing pulls a provider out of the index without releasing its stake
//! - Relay capacity is derived from stake and network participation

pub mod collaborators;
pub mod events;
pub mod genesis;
pub mod invariants;
pub mod jail;
pub mod keeper;
pub mod ledger;
pub mod lifecycle;
pub mod msgs;
pub mod relays;
pub mod repository;
pub mod staked_index;
pub mod sweep;
pub mod unstaking_queue;

pub use collaborators::{
    AccountId, AccountLedger, CompanionPool, DetachedCompanion, LedgerError, LedgerResult, NoopSessions,
    ParamSource, Pool, SessionInvalidator,
};
pub use events::ProviderEvent;
pub use genesis::{validate_genesis, GenesisState};
pub use keeper::{BlockContext, ProviderKeeper};
pub use ledger::MemoryLedger;
pub use msgs::{MsgBeginUnstake, MsgStake, MsgUnjail, ProviderMsg};

use provider_core::{Amount, ProviderStatus};
use provider_crypto::{Address, CryptoError, KeyScheme};
use provider_store::StorageError;

/// Result type for staking operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Validation and collaborator failures surfaced to the caller.
///
/// Broken internal invariants are not represented here; they panic.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider not found: {0}")]
    NotFound(Address),

    #[error("Invalid status for provider {address}: {status}")]
    InvalidStatus { address: Address, status: ProviderStatus },

    #[error("Stake below minimum: required {required}, provided {provided}")]
    BelowMinimumStake { required: Amount, provided: Amount },

    #[error("Insufficient funds for {address}: needed {needed}")]
    InsufficientFunds { address: Address, needed: Amount },

    #[error("Too many chains: max {max}, provided {provided}")]
    TooManyChains { max: u64, provided: usize },

    #[error("No chains provided")]
    NoChains,

    #[error("Invalid chain identifier: {0:?}")]
    InvalidChain(String),

    #[error("Zero stake amount")]
    ZeroAmount,

    #[error("Key scheme {0:?} is not accepted")]
    UnsupportedKeyScheme(KeyScheme),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(#[from] CryptoError),

    #[error("Maximum number of staked providers reached: {0}")]
    MaxProvidersReached(u64),

    #[error("Edit stake cannot lower stake: current {current}, requested {requested}")]
    StakeReduction { current: Amount, requested: Amount },

    #[error("Provider {0} is jailed")]
    Jailed(Address),

    #[error("Provider {0} is not jailed")]
    NotJailed(Address),

    #[error("Provider {0} has no stake")]
    NoStake(Address),

    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
