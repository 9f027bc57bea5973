// provider-rewards/src/weight.rs

use crate::{RewardError, RewardResult};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use provider_core::{Amount, Params};
use rust_decimal::{Decimal, MathematicalOps};

/// Reward weight of a servicer stake.
///
/// The stake is floored to a multiple of the bin width and capped at the
/// (equally floored) ceiling; the weight is `bin^exponent / multiplier`.
pub fn stake_weight(stake: &Amount, params: &Params) -> RewardResult<Decimal> {
    let width = params.stake_bin_width.inner();
    if width.is_zero() {
        return Ok(Decimal::ONE);
    }

    let floored_stake = stake.inner() - stake.inner() % width;
    let ceiling = params.stake_bin_ceiling.inner();
    let floored_ceiling = ceiling - ceiling % width;
    let bin = floored_stake.min(floored_ceiling) / width;

    let bin = bin
        .to_i64()
        .map(Decimal::from)
        .ok_or_else(|| RewardError::WeightOverflow(format!("stake bin {} too large", bin)))?;
    let exponent = params.stake_bin_exponent;

    let powered = if exponent.is_zero() {
        Decimal::ONE
    } else if bin.is_zero() {
        Decimal::ZERO
    } else {
        bin.checked_powd(exponent)
            .ok_or_else(|| RewardError::WeightOverflow(format!("{}^{}", bin, exponent)))?
    };

    powered
        .checked_div(params.stake_weight_multiplier)
        .ok_or_else(|| RewardError::WeightOverflow(format!("{} / {}", powered, params.stake_weight_multiplier)))
}

/// `trunc(token_reward_factor × relays × weight)`, exact up to the weight's
/// decimal precision
pub fn relay_coins(params: &Params, relays: u64, weight: Option<Decimal>) -> Amount {
    let base = params.token_reward_factor.inner() * BigUint::from(relays);
    let Some(weight) = weight else {
        return Amount::new(base);
    };
    if weight.is_sign_negative() || weight.is_zero() {
        return Amount::zero();
    }

    let mantissa = BigUint::from(weight.mantissa().unsigned_abs());
    let scale = BigUint::from(10u8).pow(weight.scale());
    Amount::new(base * mantissa / scale)
}
