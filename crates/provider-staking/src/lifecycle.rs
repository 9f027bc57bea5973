// provider-staking/src/lifecycle.rs

use crate::collaborators::{AccountId, AccountLedger, Pool};
use crate::events::ProviderEvent;
use crate::keeper::{BlockContext, ProviderKeeper};
use crate::{ProviderError, ProviderResult};
use provider_core::{Amount, Coin, Provider, ProviderStatus, Upgrade};
use provider_store::OrderedStore;

impl<S: OrderedStore> ProviderKeeper<S> {
    /// Check that `provider` may bond `amount`.
    ///
    /// Once edit-stake is active, a request for an already staked provider is
    /// validated as an edit instead.
    pub fn validate_staking<L: AccountLedger>(
        &mut self,
        ctx: &BlockContext,
        ledger: &L,
        provider: &Provider,
        amount: &Amount,
    ) -> ProviderResult<()> {
        let params = self.params();
        if provider.chains.len() as u64 > params.max_chains {
            return Err(ProviderError::TooManyChains {
                max: params.max_chains,
                provided: provider.chains.len(),
            });
        }

        let edit_stake_active = self.is_active(Upgrade::EditStake, ctx);
        match self.get_provider(ctx, &provider.address)? {
            Some(existing) => {
                if edit_stake_active && existing.is_staked() {
                    return self.validate_edit_stake(ctx, ledger, &existing, provider, amount);
                }
                if !existing.is_unstaked() {
                    return Err(ProviderError::InvalidStatus {
                        address: existing.address,
                        status: existing.status,
                    });
                }
            }
            None => {
                let scheme = provider.public_key.scheme();
                if !params.allowed_key_schemes.contains(&scheme) {
                    return Err(ProviderError::UnsupportedKeyScheme(scheme));
                }
                provider.public_key.validate()?;
            }
        }

        if amount < &params.min_stake {
            return Err(ProviderError::BelowMinimumStake {
                required: params.min_stake,
                provided: amount.clone(),
            });
        }

        let coin = Coin::new(self.stake_denom(), amount.clone());
        if !ledger.has_balance(&provider.address.into(), &coin) {
            return Err(ProviderError::InsufficientFunds {
                address: provider.address,
                needed: amount.clone(),
            });
        }

        if edit_stake_active {
            let staked = self.staked_count()?;
            if staked >= params.max_providers {
                return Err(ProviderError::MaxProvidersReached(params.max_providers));
            }
        }
        Ok(())
    }

    /// Bond `amount` from the provider's account and mark it staked.
    ///
    /// Routes to `edit_stake` when edit-stake is active and the provider is
    /// already staked.
    pub fn stake<L: AccountLedger>(
        &mut self,
        ctx: &BlockContext,
        ledger: &mut L,
        provider: Provider,
        amount: Amount,
    ) -> ProviderResult<()> {
        if self.is_active(Upgrade::EditStake, ctx) {
            if let Some(existing) = self.get_provider(ctx, &provider.address)? {
                if existing.is_staked() {
                    return self.edit_stake(ctx, ledger, existing, provider, amount);
                }
            }
        }

        let coin = Coin::new(self.stake_denom(), amount.clone());
        ledger.transfer(&provider.address.into(), &Pool::Staking.into(), &coin)?;

        let mut provider = provider;
        provider.add_staked_tokens(&amount);
        provider.status = ProviderStatus::Staked;
        provider.unstaking_completion_time = 0;
        provider.max_relays = self.calculate_provider_relays(&*ledger, &provider);
        self.set_provider(ctx, &provider)?;

        tracing::info!("provider {} staked {}", provider.address, coin);
        self.emit(ProviderEvent::Stake {
            address: provider.address,
            amount: provider.staked_tokens,
        });
        Ok(())
    }

    /// Stake may grow but never shrink; only the increase must be covered
    pub fn validate_edit_stake<L: AccountLedger>(
        &mut self,
        _ctx: &BlockContext,
        ledger: &L,
        existing: &Provider,
        updated: &Provider,
        amount: &Amount,
    ) -> ProviderResult<()> {
        let params = self.params();
        if updated.chains.len() as u64 > params.max_chains {
            return Err(ProviderError::TooManyChains {
                max: params.max_chains,
                provided: updated.chains.len(),
            });
        }

        let increase = amount
            .checked_sub(&existing.staked_tokens)
            .ok_or_else(|| ProviderError::StakeReduction {
                current: existing.staked_tokens.clone(),
                requested: amount.clone(),
            })?;

        if !increase.is_zero() {
            let coin = Coin::new(self.stake_denom(), increase.clone());
            if !ledger.has_balance(&existing.address.into(), &coin) {
                return Err(ProviderError::InsufficientFunds {
                    address: existing.address,
                    needed: increase,
                });
            }
        }
        Ok(())
    }

    /// Raise the stake to `amount` and replace the advertised chains, geo
    /// zones and servicer count.
    ///
    /// The record is re-keyed in the staked index and cached sessions are
    /// dropped.
    pub fn edit_stake<L: AccountLedger>(
        &mut self,
        ctx: &BlockContext,
        ledger: &mut L,
        existing: Provider,
        updated: Provider,
        amount: Amount,
    ) -> ProviderResult<()> {
        let increase = amount
            .checked_sub(&existing.staked_tokens)
            .ok_or_else(|| ProviderError::StakeReduction {
                current: existing.staked_tokens.clone(),
                requested: amount.clone(),
            })?;

        let mut provider = existing.clone();
        if !increase.is_zero() {
            let coin = Coin::new(self.stake_denom(), increase.clone());
            ledger.transfer(&existing.address.into(), &Pool::Staking.into(), &coin)?;
            provider.add_staked_tokens(&increase);
            provider.max_relays = self.calculate_provider_relays(&*ledger, &provider);
        }
        provider.chains = updated.chains;
        provider.geo_zones = updated.geo_zones;
        provider.num_servicers = updated.num_servicers;

        self.remove_from_staked_index(&existing)?;
        self.delete_provider(ctx, &existing.address)?;
        self.set_provider(ctx, &provider)?;
        self.clear_sessions();

        tracing::info!(
            "provider {} edited stake: {} -> {}",
            provider.address,
            existing.staked_tokens,
            provider.staked_tokens
        );
        self.emit(ProviderEvent::Stake {
            address: provider.address,
            amount: provider.staked_tokens,
        });
        Ok(())
    }

    /// Only staked, unjailed providers may begin unstaking
    pub fn validate_begin_unstaking(&self, provider: &Provider) -> ProviderResult<()> {
        if !provider.is_staked() {
            return Err(ProviderError::InvalidStatus {
                address: provider.address,
                status: provider.status,
            });
        }
        if provider.jailed {
            return Err(ProviderError::Jailed(provider.address));
        }
        Ok(())
    }

    /// Leave the staked index and wait `unstaking_time` seconds in the queue
    pub fn begin_unstaking(&mut self, ctx: &BlockContext, provider: Provider) -> ProviderResult<()> {
        self.validate_begin_unstaking(&provider)?;

        let mut provider = provider;
        self.remove_from_staked_index(&provider)?;
        provider.status = ProviderStatus::Unstaking;
        if provider.unstaking_completion_time == 0 {
            provider.unstaking_completion_time = ctx.time.saturating_add(self.params().unstaking_time);
        }
        self.set_provider(ctx, &provider)?;

        tracing::info!(
            "provider {} unstaking until {}",
            provider.address,
            provider.unstaking_completion_time
        );
        self.emit(ProviderEvent::BeginUnstake {
            address: provider.address,
            completion_time: provider.unstaking_completion_time,
        });
        Ok(())
    }

    /// Release a matured provider's stake back to its account. Only the
    /// end-of-block sweep calls this.
    ///
    /// A failed release is logged and the record still transitions to
    /// unstaked.
    pub(crate) fn finish_unstaking<L: AccountLedger>(
        &mut self,
        ctx: &BlockContext,
        ledger: &mut L,
        provider: Provider,
    ) -> ProviderResult<()> {
        self.dequeue_unstaking(&provider)?;

        let released = provider.staked_tokens.clone();
        if !released.is_zero() {
            let coin = Coin::new(self.stake_denom(), released.clone());
            let owner: AccountId = provider.address.into();
            if let Err(e) = ledger.transfer(&Pool::Staking.into(), &owner, &coin) {
                tracing::error!("cannot release {} to provider {}: {}", coin, provider.address, e);
            }
        }

        let mut provider = provider;
        provider.remove_staked_tokens(&released);
        provider.status = ProviderStatus::Unstaked;
        provider.max_relays = Amount::zero();
        provider.unstaking_completion_time = 0;
        self.set_provider(ctx, &provider)?;

        tracing::info!("provider {} finished unstaking {}", provider.address, released);
        self.emit(ProviderEvent::CompleteUnstaking {
            address: provider.address,
            amount: released,
        });
        Ok(())
    }

    /// Burn the provider's whole stake and remove it from service.
    ///
    /// After the force-unstake upgrade an unstaking provider's record is
    /// deleted outright.
    ///
    /// # Panics
    /// After the upgrade, if the provider is already unstaked.
    pub fn force_unstake<L: AccountLedger>(
        &mut self,
        ctx: &BlockContext,
        ledger: &mut L,
        provider: Provider,
    ) -> ProviderResult<()> {
        let burned = provider.staked_tokens.clone();
        let coin = Coin::new(self.stake_denom(), burned.clone());

        if self.is_active(Upgrade::ForceUnstake, ctx) {
            match provider.status {
                ProviderStatus::Staked => {
                    ledger.burn(Pool::Staking, &coin)?;
                    self.remove_from_staked_index(&provider)?;
                }
                ProviderStatus::Unstaking => {
                    ledger.burn(Pool::Staking, &coin)?;
                    self.dequeue_unstaking(&provider)?;
                    self.delete_provider(ctx, &provider.address)?;
                    tracing::info!("provider {} force unstaked while unstaking, burned {}", provider.address, coin);
                    self.emit(ProviderEvent::Unstake {
                        address: provider.address,
                        amount: burned,
                    });
                    return Ok(());
                }
                ProviderStatus::Unstaked => {
                    self.delete_provider(ctx, &provider.address)?;
                    panic!("should not happen: force unstaking already unstaked provider {}", provider.address);
                }
            }
        } else {
            ledger.burn(Pool::Staking, &coin)?;
            match provider.status {
                ProviderStatus::Staked => self.remove_from_staked_index(&provider)?,
                ProviderStatus::Unstaking => self.dequeue_unstaking(&provider)?,
                ProviderStatus::Unstaked => {}
            }
        }

        let mut provider = provider;
        provider.remove_staked_tokens(&burned);
        provider.status = ProviderStatus::Unstaked;
        provider.max_relays = Amount::zero();
        provider.unstaking_completion_time = 0;
        self.set_provider(ctx, &provider)?;

        tracing::info!("provider {} force unstaked, burned {}", provider.address, coin);
        self.emit(ProviderEvent::Unstake {
            address: provider.address,
            amount: burned,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::collaborators::{AccountLedger, Pool, SessionInvalidator};
    use crate::test_utils::{ctx, funded_ledger, keeper, params, provider, DENOM};
    use crate::{ProviderError, ProviderEvent, ProviderKeeper};
    use provider_core::{Amount, Params, ProviderStatus, UpgradeSchedule};
    use provider_crypto::{KeyPair, KeyScheme};
    use provider_store::MemoryStore;
    use std::cell::Cell;
    use std::rc::Rc;

    fn amount(v: u64) -> Amount {
        Amount::from_u64(v)
    }

    #[test]
    fn test_stake_moves_funds_and_indexes() {
        let mut ledger = funded_ledger(&[1], 10_000_000);
        let mut keeper = keeper(&ledger);
        let c = ctx(1, 100);
        let p = provider(1);

        keeper.validate_staking(&c, &ledger, &p, &amount(5_000_000)).unwrap();
        keeper.stake(&c, &mut ledger, p.clone(), amount(5_000_000)).unwrap();

        let stored = keeper.get_provider(&c, &p.address).unwrap().unwrap();
        assert_eq!(stored.status, ProviderStatus::Staked);
        assert_eq!(stored.staked_tokens, amount(5_000_000));
        assert_eq!(stored.max_relays, amount(5));
        assert_eq!(ledger.balance_of(&p.address.into(), DENOM), amount(5_000_000));
        assert_eq!(ledger.balance_of(&Pool::Staking.into(), DENOM), amount(5_000_000));
        assert_eq!(keeper.staked_count().unwrap(), 1);
        assert_eq!(
            keeper.take_events(),
            vec![ProviderEvent::Stake { address: p.address, amount: amount(5_000_000) }]
        );
    }

    #[test]
    fn test_validate_staking_rejections() {
        let ledger = funded_ledger(&[1], 2_000_000);
        let mut keeper = keeper(&ledger);
        let c = ctx(1, 0);

        let err = keeper.validate_staking(&c, &ledger, &provider(1), &amount(999_999)).unwrap_err();
        assert!(matches!(err, ProviderError::BelowMinimumStake { .. }));

        let err = keeper.validate_staking(&c, &ledger, &provider(1), &amount(3_000_000)).unwrap_err();
        assert!(matches!(err, ProviderError::InsufficientFunds { .. }));

        let mut many_chains = provider(1);
        many_chains.chains = (0..16).map(|i| format!("{:04}", i)).collect();
        let err = keeper.validate_staking(&c, &ledger, &many_chains, &amount(1_000_000)).unwrap_err();
        assert!(matches!(err, ProviderError::TooManyChains { max: 15, provided: 16 }));
    }

    #[test]
    fn test_validate_staking_rejects_disallowed_scheme() {
        let ledger = funded_ledger(&[], 0);
        let mut keeper = keeper(&ledger);
        let kp = KeyPair::from_seed(KeyScheme::Secp256k1, [5u8; 32]).unwrap();
        let p = provider_core::Provider::new(kp.public_key().clone(), vec!["0001".into()], vec![], 0);

        let err = keeper.validate_staking(&ctx(1, 0), &ledger, &p, &amount(1_000_000)).unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedKeyScheme(KeyScheme::Secp256k1)));
    }

    #[test]
    fn test_max_providers_enforced_after_upgrade() {
        let mut ledger = funded_ledger(&[1, 2], 5_000_000);
        let mut keeper = ProviderKeeper::new(
            MemoryStore::new(),
            Params { max_providers: 1, ..params() },
            UpgradeSchedule::all_active(),
            16,
            &ledger,
        );
        let c = ctx(1, 0);
        keeper.stake(&c, &mut ledger, provider(1), amount(1_000_000)).unwrap();

        let err = keeper.validate_staking(&c, &ledger, &provider(2), &amount(1_000_000)).unwrap_err();
        assert!(matches!(err, ProviderError::MaxProvidersReached(1)));
    }

    #[test]
    fn test_restake_while_unstaking_rejected() {
        let mut ledger = funded_ledger(&[1], 5_000_000);
        let mut keeper = keeper(&ledger);
        let c = ctx(1, 0);
        keeper.stake(&c, &mut ledger, provider(1), amount(1_000_000)).unwrap();
        let staked = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();
        keeper.begin_unstaking(&c, staked).unwrap();

        let err = keeper.validate_staking(&c, &ledger, &provider(1), &amount(1_000_000)).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidStatus { status: ProviderStatus::Unstaking, .. }));
    }

    #[derive(Clone, Default)]
    struct CountingSessions(Rc<Cell<u32>>);

    impl SessionInvalidator for CountingSessions {
        fn clear_sessions(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_edit_stake_raises_and_rekeys() {
        let mut ledger = funded_ledger(&[1], 10_000_000);
        let sessions = CountingSessions::default();
        let mut keeper = keeper(&ledger).with_sessions(sessions.clone());
        let c = ctx(1, 0);
        keeper.stake(&c, &mut ledger, provider(1), amount(2_000_000)).unwrap();

        let mut updated = provider(1);
        updated.chains = vec!["0002".into(), "0003".into()];
        keeper.validate_staking(&c, &ledger, &updated, &amount(7_000_000)).unwrap();
        keeper.stake(&c, &mut ledger, updated, amount(7_000_000)).unwrap();

        let stored = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();
        assert_eq!(stored.staked_tokens, amount(7_000_000));
        assert_eq!(stored.chains, vec!["0002".to_string(), "0003".to_string()]);
        assert_eq!(stored.max_relays, amount(7));
        assert_eq!(ledger.balance_of(&Pool::Staking.into(), DENOM), amount(7_000_000));
        assert_eq!(keeper.staked_count().unwrap(), 1);
        assert_eq!(keeper.providers_by_rank(&c, 5).unwrap(), vec![stored]);
        assert_eq!(sessions.0.get(), 1);
    }

    #[test]
    fn test_edit_stake_cannot_lower() {
        let mut ledger = funded_ledger(&[1], 10_000_000);
        let mut keeper = keeper(&ledger);
        let c = ctx(1, 0);
        keeper.stake(&c, &mut ledger, provider(1), amount(5_000_000)).unwrap();

        let err = keeper.validate_staking(&c, &ledger, &provider(1), &amount(4_000_000)).unwrap_err();
        assert!(matches!(err, ProviderError::StakeReduction { .. }));
    }

    #[test]
    fn test_edit_same_amount_needs_no_funds() {
        let mut ledger = funded_ledger(&[1], 5_000_000);
        let mut keeper = keeper(&ledger);
        let c = ctx(1, 0);
        keeper.stake(&c, &mut ledger, provider(1), amount(5_000_000)).unwrap();
        assert!(ledger.balance_of(&provider(1).address.into(), DENOM).is_zero());

        keeper.validate_staking(&c, &ledger, &provider(1), &amount(5_000_000)).unwrap();
    }

    #[test]
    fn test_begin_unstaking_sets_completion_once() {
        let mut ledger = funded_ledger(&[1], 5_000_000);
        let mut keeper = keeper(&ledger);
        let c = ctx(1, 1_000);
        keeper.stake(&c, &mut ledger, provider(1), amount(1_000_000)).unwrap();
        let staked = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();

        keeper.begin_unstaking(&c, staked).unwrap();
        let unstaking = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();
        assert_eq!(unstaking.status, ProviderStatus::Unstaking);
        assert_eq!(unstaking.unstaking_completion_time, 1_100);
        assert_eq!(keeper.staked_count().unwrap(), 0);
        assert_eq!(keeper.unstaking_bucket(1_100).unwrap(), vec![unstaking.address]);

        let err = keeper.begin_unstaking(&c, unstaking.clone()).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidStatus { .. }));
        let again = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();
        assert_eq!(again.unstaking_completion_time, 1_100);
    }

    #[test]
    fn test_jailed_provider_cannot_begin_unstaking() {
        let mut ledger = funded_ledger(&[1], 5_000_000);
        let mut keeper = keeper(&ledger);
        let c = ctx(1, 0);
        keeper.stake(&c, &mut ledger, provider(1), amount(1_000_000)).unwrap();
        keeper.jail(&c, &provider(1).address).unwrap();

        let jailed = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();
        assert!(matches!(keeper.begin_unstaking(&c, jailed), Err(ProviderError::Jailed(_))));
    }

    #[test]
    fn test_finish_unstaking_returns_stake() {
        let mut ledger = funded_ledger(&[1], 5_000_000);
        let mut keeper = keeper(&ledger);
        let c = ctx(1, 0);
        keeper.stake(&c, &mut ledger, provider(1), amount(3_000_000)).unwrap();
        let staked = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();
        keeper.begin_unstaking(&c, staked).unwrap();
        let unstaking = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();

        keeper.finish_unstaking(&c, &mut ledger, unstaking).unwrap();
        let done = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();
        assert_eq!(done.status, ProviderStatus::Unstaked);
        assert!(done.staked_tokens.is_zero());
        assert_eq!(done.unstaking_completion_time, 0);
        assert_eq!(ledger.balance_of(&provider(1).address.into(), DENOM), amount(5_000_000));
        assert!(keeper.all_unstaking_entries().unwrap().is_empty());
    }

    #[test]
    fn test_force_unstake_staked_burns() {
        let mut ledger = funded_ledger(&[1], 5_000_000);
        let mut keeper = keeper(&ledger);
        let c = ctx(1, 0);
        keeper.stake(&c, &mut ledger, provider(1), amount(4_000_000)).unwrap();
        let staked = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();

        keeper.force_unstake(&c, &mut ledger, staked).unwrap();
        let record = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();
        assert_eq!(record.status, ProviderStatus::Unstaked);
        assert!(record.staked_tokens.is_zero());
        assert_eq!(ledger.total_supply(DENOM), amount(1_000_000));
        assert_eq!(keeper.staked_count().unwrap(), 0);
    }

    #[test]
    fn test_force_unstake_unstaking_deletes_record() {
        let mut ledger = funded_ledger(&[1], 5_000_000);
        let mut keeper = keeper(&ledger);
        let c = ctx(1, 0);
        keeper.stake(&c, &mut ledger, provider(1), amount(4_000_000)).unwrap();
        let staked = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();
        keeper.begin_unstaking(&c, staked).unwrap();
        let unstaking = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();

        keeper.force_unstake(&c, &mut ledger, unstaking).unwrap();
        assert_eq!(keeper.get_provider(&c, &provider(1).address).unwrap(), None);
        assert!(keeper.all_unstaking_entries().unwrap().is_empty());
        assert!(ledger.balance_of(&Pool::Staking.into(), DENOM).is_zero());
    }

    #[test]
    #[should_panic(expected = "should not happen")]
    fn test_force_unstake_unstaked_is_fatal() {
        let mut ledger = funded_ledger(&[1], 5_000_000);
        let mut keeper = keeper(&ledger);
        let c = ctx(1, 0);
        let p = provider(1);
        keeper.set_provider(&c, &p).unwrap();
        let _ = keeper.force_unstake(&c, &mut ledger, p);
    }

    #[test]
    fn test_force_unstake_before_upgrade_keeps_record() {
        let mut ledger = funded_ledger(&[1], 5_000_000);
        let mut keeper = ProviderKeeper::new(MemoryStore::new(), params(), UpgradeSchedule::legacy(), 16, &ledger);
        let c = ctx(1, 0);
        keeper.stake(&c, &mut ledger, provider(1), amount(4_000_000)).unwrap();
        let staked = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();
        keeper.begin_unstaking(&c, staked).unwrap();
        let unstaking = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();

        keeper.force_unstake(&c, &mut ledger, unstaking).unwrap();
        let record = keeper.get_provider(&c, &provider(1).address).unwrap().unwrap();
        assert_eq!(record.status, ProviderStatus::Unstaked);
        assert!(record.staked_tokens.is_zero());
        assert!(keeper.all_unstaking_entries().unwrap().is_empty());
    }

    #[test]
    fn test_legacy_restake_of_staked_provider_rejected() {
        let mut ledger = funded_ledger(&[1], 5_000_000);
        let mut keeper = ProviderKeeper::new(MemoryStore::new(), params(), UpgradeSchedule::legacy(), 16, &ledger);
        let c = ctx(1, 0);
        keeper.stake(&c, &mut ledger, provider(1), amount(1_000_000)).unwrap();

        let err = keeper.validate_staking(&c, &ledger, &provider(1), &amount(2_000_000)).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidStatus { status: ProviderStatus::Staked, .. }));
    }
}
