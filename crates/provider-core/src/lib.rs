// provider-core/src/lib.rs

//! Core provider staking data structures
//!
//! This crate provides:
//! - Arbitrary-precision token amounts and coins
//! - The provider record and its lifecycle status
//! - Staking/reward parameters and upgrade activation heights

pub mod params;
pub mod provider;
pub mod types;

pub use params::{Params, Upgrade, UpgradeSchedule};
pub use provider::{Provider, ProviderStatus, POWER_REDUCTION};
pub use types::*;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building or validating core values
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),
}
