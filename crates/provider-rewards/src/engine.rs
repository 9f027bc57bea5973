// provider-rewards/src/engine.rs

use crate::registry::ServicerRegistry;
use crate::split::{split_block_fees, split_relay_reward, BlockRewardSplit};
use crate::weight::{relay_coins, stake_weight};
use crate::RewardResult;
use provider_core::{Amount, Coin, Upgrade, UpgradeSchedule};
use provider_crypto::Address;
use provider_staking::{AccountId, AccountLedger, BlockContext, ParamSource, Pool};

/// Mints relay rewards and pays out collected fees
pub struct RewardEngine {
    params: Box<dyn ParamSource>,
    upgrades: UpgradeSchedule,
}

impl RewardEngine {
    pub fn new(params: impl ParamSource + 'static, upgrades: UpgradeSchedule) -> Self {
        Self {
            params: Box::new(params),
            upgrades,
        }
    }

    /// Mint the reward for `relays` served by `servicer`.
    ///
    /// The fee-collector cut is minted into its pool, the platform cut to
    /// `platform` and the rest to the servicer's payout address. Returns the
    /// node's share; zero when the payout address or stake cannot be resolved.
    pub fn reward_for_relays<L, R>(
        &self,
        ctx: &BlockContext,
        ledger: &mut L,
        registry: &mut R,
        relays: u64,
        servicer: &Address,
        platform: &Address,
    ) -> RewardResult<Amount>
    where
        L: AccountLedger,
        R: ServicerRegistry,
    {
        let params = self.params.params();

        let payout = if self.upgrades.is_active(Upgrade::NonCustodial, ctx.height) {
            match registry.output_address(ctx, servicer)? {
                Some(output) => output,
                None => {
                    tracing::error!("no output address for servicer {}, relay reward dropped", servicer);
                    return Ok(Amount::zero());
                }
            }
        } else {
            *servicer
        };

        let weight = if self.upgrades.is_active(Upgrade::RewardScaling, ctx.height) {
            let Some(stake) = registry.staked_tokens(ctx, servicer)? else {
                tracing::error!("no stake for servicer {}, relay reward dropped", servicer);
                return Ok(Amount::zero());
            };
            Some(stake_weight(&stake, &params)?)
        } else {
            None
        };

        let coins = relay_coins(&params, relays, weight);
        let split = split_relay_reward(&coins, &params);
        let denom = params.stake_denom;

        if !split.fee_collector.is_zero() {
            let coin = Coin::new(denom.clone(), split.fee_collector.clone());
            if let Err(e) = ledger.mint(Pool::FeeCollector, &coin) {
                tracing::error!("cannot mint {} to fee collector: {}", coin, e);
            }
        }
        if !split.platform.is_zero() {
            mint_to_account(ledger, *platform, Coin::new(denom.clone(), split.platform.clone()));
        }
        if !split.node.is_zero() {
            mint_to_account(ledger, payout, Coin::new(denom, split.node.clone()));
        }

        tracing::debug!(
            "relay reward for {}: {} relays, node {}, fees {}, platform {}",
            servicer,
            relays,
            split.node,
            split.fee_collector,
            split.platform
        );
        Ok(split.node)
    }

    /// Pay this block's collected fees to the DAO, the platform and the
    /// previous proposer. Transfer failures are logged and skipped.
    pub fn block_reward<L, R>(
        &self,
        ctx: &BlockContext,
        ledger: &mut L,
        registry: &mut R,
        previous_proposer: &Address,
    ) -> RewardResult<BlockRewardSplit>
    where
        L: AccountLedger,
        R: ServicerRegistry,
    {
        let params = self.params.params();
        let denom = params.stake_denom.clone();
        let collector: AccountId = Pool::FeeCollector.into();

        let fees = ledger.balance_of(&collector, &denom);
        if fees.is_zero() {
            return Ok(BlockRewardSplit::default());
        }
        let split = split_block_fees(&fees, &params);

        let recipient = if self.upgrades.is_active(Upgrade::NonCustodial, ctx.height) {
            let output = registry.output_address(ctx, previous_proposer)?;
            if output.is_none() {
                tracing::error!("no output address for proposer {}, proposer cut withheld", previous_proposer);
            }
            output
        } else {
            Some(*previous_proposer)
        };

        let payouts = [
            (AccountId::from(Pool::Dao), Some(&split.dao)),
            (AccountId::from(Pool::Platform), Some(&split.platform)),
            (
                recipient.map(AccountId::from).unwrap_or(collector),
                recipient.map(|_| &split.proposer),
            ),
        ];
        for (to, amount) in payouts {
            let Some(amount) = amount.filter(|a| !a.is_zero()) else {
                continue;
            };
            let coin = Coin::new(denom.clone(), amount.clone());
            if let Err(e) = ledger.transfer(&collector, &to, &coin) {
                tracing::error!("cannot pay block reward {} to {}: {}", coin, to, e);
            }
        }

        tracing::info!(
            "block {} fees {}: dao {}, platform {}, proposer {}",
            ctx.height,
            fees,
            split.dao,
            split.platform,
            split.proposer
        );
        Ok(split)
    }
}

fn mint_to_account<L: AccountLedger>(ledger: &mut L, to: Address, coin: Coin) {
    let result = ledger
        .mint(Pool::Minter, &coin)
        .and_then(|_| ledger.transfer(&Pool::Minter.into(), &to.into(), &coin));
    if let Err(e) = result {
        tracing::error!("cannot mint {} to {}: {}", coin, to, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryRegistry;
    use provider_core::Params;
    use provider_staking::MemoryLedger;
    use rust_decimal::Decimal;

    const DENOM: &str = "upokt";

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    fn balance(ledger: &MemoryLedger, holder: impl Into<AccountId>) -> Amount {
        ledger.balance_of(&holder.into(), DENOM)
    }

    #[test]
    fn test_unscaled_custodial_relay_reward() {
        let engine = RewardEngine::new(Params::default(), UpgradeSchedule::legacy());
        let mut ledger = MemoryLedger::new();
        let mut registry = MemoryRegistry::new();

        let node = engine
            .reward_for_relays(&BlockContext::deliver(1, 0), &mut ledger, &mut registry, 10, &addr(1), &addr(9))
            .unwrap();

        // 10 relays × 1000 = 10_000: 11% fees, 4% platform
        assert_eq!(node, Amount::from_u64(8_500));
        assert_eq!(balance(&ledger, addr(1)), Amount::from_u64(8_500));
        assert_eq!(balance(&ledger, addr(9)), Amount::from_u64(400));
        assert_eq!(balance(&ledger, Pool::FeeCollector), Amount::from_u64(1_100));
        assert_eq!(ledger.total_supply(DENOM), Amount::from_u64(10_000));
    }

    #[test]
    fn test_non_custodial_pays_output_address() {
        let engine = RewardEngine::new(Params::default(), UpgradeSchedule::default());
        let mut ledger = MemoryLedger::new();
        let mut registry = MemoryRegistry::new();
        registry.register(addr(1), Some(addr(2)), Amount::from_u64(1));

        engine
            .reward_for_relays(&BlockContext::deliver(1, 0), &mut ledger, &mut registry, 1, &addr(1), &addr(9))
            .unwrap();
        assert!(balance(&ledger, addr(1)).is_zero());
        assert_eq!(balance(&ledger, addr(2)), Amount::from_u64(850));
    }

    #[test]
    fn test_missing_output_address_yields_nothing() {
        let engine = RewardEngine::new(Params::default(), UpgradeSchedule::default());
        let mut ledger = MemoryLedger::new();
        let mut registry = MemoryRegistry::new();

        let node = engine
            .reward_for_relays(&BlockContext::deliver(1, 0), &mut ledger, &mut registry, 5, &addr(1), &addr(9))
            .unwrap();
        assert!(node.is_zero());
        assert!(ledger.total_supply(DENOM).is_zero());
    }

    #[test]
    fn test_scaled_reward_uses_stake_bin() {
        let params = Params {
            stake_bin_width: Amount::from_u64(100),
            stake_bin_ceiling: Amount::from_u64(400),
            stake_bin_exponent: Decimal::ONE,
            stake_weight_multiplier: Decimal::from(2),
            dao_allocation: 0,
            proposer_allocation: 0,
            platform_allocation: 0,
            ..Params::default()
        };
        let engine = RewardEngine::new(params, UpgradeSchedule::all_active());
        let mut ledger = MemoryLedger::new();
        let mut registry = MemoryRegistry::new();
        registry.register(addr(1), Some(addr(1)), Amount::from_u64(350));

        // bin 3, weight 1.5
        let node = engine
            .reward_for_relays(&BlockContext::deliver(1, 0), &mut ledger, &mut registry, 3, &addr(1), &addr(9))
            .unwrap();
        assert_eq!(node, Amount::from_u64(4_500));
    }

    #[test]
    fn test_block_reward_distribution() {
        let engine = RewardEngine::new(Params::default(), UpgradeSchedule::legacy());
        let mut ledger = MemoryLedger::new();
        let mut registry = MemoryRegistry::new();
        ledger.fund(Pool::FeeCollector.into(), &Coin::new(DENOM, Amount::from_u64(1_500)));

        let split = engine
            .block_reward(&BlockContext::deliver(2, 0), &mut ledger, &mut registry, &addr(5))
            .unwrap();
        assert_eq!(split.total(), Amount::from_u64(1_500));
        assert_eq!(balance(&ledger, Pool::Dao), Amount::from_u64(1_000));
        assert_eq!(balance(&ledger, Pool::Platform), Amount::from_u64(400));
        assert_eq!(balance(&ledger, addr(5)), Amount::from_u64(100));
        assert!(balance(&ledger, Pool::FeeCollector).is_zero());
    }

    #[test]
    fn test_block_reward_withholds_unresolved_proposer_cut() {
        let engine = RewardEngine::new(Params::default(), UpgradeSchedule::default());
        let mut ledger = MemoryLedger::new();
        let mut registry = MemoryRegistry::new();
        ledger.fund(Pool::FeeCollector.into(), &Coin::new(DENOM, Amount::from_u64(1_500)));

        engine
            .block_reward(&BlockContext::deliver(2, 0), &mut ledger, &mut registry, &addr(5))
            .unwrap();
        assert!(balance(&ledger, addr(5)).is_zero());
        assert_eq!(balance(&ledger, Pool::FeeCollector), Amount::from_u64(100));
    }

    #[test]
    fn test_block_reward_noop_without_fees() {
        let engine = RewardEngine::new(Params::default(), UpgradeSchedule::default());
        let mut ledger = MemoryLedger::new();
        let mut registry = MemoryRegistry::new();
        let split = engine
            .block_reward(&BlockContext::deliver(2, 0), &mut ledger, &mut registry, &addr(5))
            .unwrap();
        assert_eq!(split, BlockRewardSplit::default());
    }
}
