// provider-staking/src/relays.rs

use crate::collaborators::{AccountLedger, Pool};
use crate::keeper::ProviderKeeper;
use num_bigint::{BigInt, BigUint};
use num_traits::{ToPrimitive, Zero};
use provider_core::{Amount, Provider, POWER_REDUCTION};
use provider_store::OrderedStore;

impl<S: OrderedStore> ProviderKeeper<S> {
    /// Relay capacity granted by the provider's stake.
    ///
    /// `participation × (base_rate / 100) × (stake / 1e6) + adjustment`,
    /// evaluated exactly and truncated once, then clamped to `[0, u64::MAX]`.
    /// Participation is the share of the token supply bonded in this module
    /// and its companion, or 1 when the toggle is off or the supply is empty.
    pub fn calculate_provider_relays<L: AccountLedger>(&self, ledger: &L, provider: &Provider) -> Amount {
        let params = self.params();

        let (participation_num, participation_den) = if params.participation_rate_on {
            let denom = self.stake_denom();
            let supply = ledger.total_supply(&denom);
            if supply.is_zero() {
                tracing::warn!("total supply of {} is zero, using participation rate 1", denom);
                (BigUint::from(1u8), BigUint::from(1u8))
            } else {
                let bonded = ledger.balance_of(&Pool::Staking.into(), &denom).into_inner()
                    + self.companion().total_staked_tokens().into_inner();
                (bonded, supply.into_inner())
            }
        } else {
            (BigUint::from(1u8), BigUint::from(1u8))
        };

        let numerator = participation_num * params.base_relays_per_stake_rate * provider.staked_tokens.inner();
        let denominator = participation_den * 100u64 * POWER_REDUCTION;
        let throughput = BigInt::from(numerator / denominator) + params.staking_adjustment;

        if throughput <= BigInt::zero() {
            return Amount::zero();
        }
        match throughput.to_u64() {
            Some(relays) => Amount::from_u64(relays),
            None => Amount::from_u64(u64::MAX),
        }
    }
}
