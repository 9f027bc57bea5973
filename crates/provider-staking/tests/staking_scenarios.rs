// provider-staking/tests/staking_scenarios.rs

use proptest::prelude::*;
use provider_core::{Amount, Coin, Params, Provider, ProviderStatus, UpgradeSchedule};
use provider_crypto::{Address, KeyPair, KeyScheme};
use provider_staking::{
    AccountLedger, BlockContext, MemoryLedger, MsgBeginUnstake, MsgStake, MsgUnjail, Pool, ProviderError,
    ProviderEvent, ProviderKeeper, ProviderMsg,
};
use provider_store::MemoryStore;

const DENOM: &str = "upokt";
const UNSTAKING_TIME: u64 = 100;

fn params() -> Params {
    Params {
        unstaking_time: UNSTAKING_TIME,
        min_stake: Amount::from_u64(1_000_000),
        ..Params::default()
    }
}

fn keypair(seed: u8) -> KeyPair {
    KeyPair::from_seed(KeyScheme::Ed25519, [seed; 32]).unwrap()
}

fn address(seed: u8) -> Address {
    keypair(seed).address()
}

fn stake_msg(seed: u8, value: u64) -> ProviderMsg {
    ProviderMsg::Stake(MsgStake {
        public_key: keypair(seed).public_key().clone(),
        chains: vec!["0021".into()],
        geo_zones: vec![],
        num_servicers: 1,
        value: Amount::from_u64(value),
    })
}

struct Harness {
    keeper: ProviderKeeper<MemoryStore>,
    ledger: MemoryLedger,
    height: u64,
    time: u64,
}

impl Harness {
    fn new(seeds: &[u8], balance: u64) -> Self {
        let mut ledger = MemoryLedger::new();
        for seed in seeds {
            ledger.fund(address(*seed).into(), &Coin::new(DENOM, Amount::from_u64(balance)));
        }
        let keeper = ProviderKeeper::new(MemoryStore::new(), params(), UpgradeSchedule::all_active(), 32, &ledger);
        Self {
            keeper,
            ledger,
            height: 1,
            time: 1_000,
        }
    }

    fn ctx(&self) -> BlockContext {
        BlockContext::deliver(self.height, self.time)
    }

    fn send(&mut self, msg: ProviderMsg) -> Result<(), ProviderError> {
        let ctx = self.ctx();
        self.keeper.handle_msg(&ctx, &mut self.ledger, msg)
    }

    fn advance(&mut self, seconds: u64) -> usize {
        self.height += 1;
        self.time += seconds;
        let ctx = self.ctx();
        self.keeper.end_block(&ctx, &mut self.ledger).unwrap()
    }

    fn provider(&mut self, seed: u8) -> Option<Provider> {
        let ctx = self.ctx();
        self.keeper.get_provider(&ctx, &address(seed)).unwrap()
    }

    fn balance(&self, holder: impl Into<provider_staking::AccountId>) -> Amount {
        self.ledger.balance_of(&holder.into(), DENOM)
    }

    fn assert_invariants(&self) {
        let violations = self.keeper.check_index_consistency().unwrap();
        assert!(violations.is_empty(), "index violations: {:?}", violations);
        assert_eq!(self.keeper.check_pool_conservation(&self.ledger).unwrap(), None);
    }
}

#[test]
fn below_minimum_stake_is_rejected_without_state_change() {
    let mut h = Harness::new(&[1], 10_000_000);

    let err = h.send(stake_msg(1, 999_999)).unwrap_err();
    assert!(matches!(err, ProviderError::BelowMinimumStake { .. }));
    assert_eq!(h.provider(1), None);
    assert_eq!(h.balance(address(1)), Amount::from_u64(10_000_000));
    assert!(h.keeper.take_events().is_empty());
    h.assert_invariants();
}

#[test]
fn staking_one_chain_indexes_provider_with_capacity() {
    let mut h = Harness::new(&[1], 10_000_000);
    h.send(stake_msg(1, 4_000_000)).unwrap();

    let provider = h.provider(1).unwrap();
    assert_eq!(provider.status, ProviderStatus::Staked);
    assert!(!provider.max_relays.is_zero());

    let ctx = h.ctx();
    assert_eq!(h.keeper.providers_by_rank(&ctx, 10).unwrap(), vec![provider]);
    assert_eq!(h.balance(Pool::Staking), Amount::from_u64(4_000_000));
    h.assert_invariants();
}

#[test]
fn unstake_then_sweep_returns_tokens() {
    let mut h = Harness::new(&[1], 10_000_000);
    h.send(stake_msg(1, 4_000_000)).unwrap();
    h.send(ProviderMsg::BeginUnstake(MsgBeginUnstake { address: address(1) })).unwrap();
    h.assert_invariants();

    assert_eq!(h.advance(UNSTAKING_TIME - 1), 0);
    assert_eq!(h.provider(1).unwrap().status, ProviderStatus::Unstaking);

    assert_eq!(h.advance(1), 1);
    let provider = h.provider(1).unwrap();
    assert_eq!(provider.status, ProviderStatus::Unstaked);
    assert!(provider.staked_tokens.is_zero());
    assert_eq!(h.balance(address(1)), Amount::from_u64(10_000_000));
    assert!(h.balance(Pool::Staking).is_zero());
    h.assert_invariants();

    let events = h.keeper.take_events();
    assert!(matches!(events.last(), Some(ProviderEvent::CompleteUnstaking { .. })));
}

#[test]
fn jail_evicts_from_index_but_keeps_record() {
    let mut h = Harness::new(&[1, 2], 10_000_000);
    h.send(stake_msg(1, 4_000_000)).unwrap();
    h.send(stake_msg(2, 2_000_000)).unwrap();

    let ctx = h.ctx();
    h.keeper.jail(&ctx, &address(1)).unwrap();
    let ranked = h.keeper.providers_by_rank(&ctx, 10).unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].address, address(2));

    let jailed = h.provider(1).unwrap();
    assert!(jailed.jailed);
    assert_eq!(jailed.staked_tokens, Amount::from_u64(4_000_000));
    h.assert_invariants();

    h.send(ProviderMsg::Unjail(MsgUnjail { address: address(1) })).unwrap();
    let ctx = h.ctx();
    assert_eq!(h.keeper.providers_by_rank(&ctx, 1).unwrap()[0].address, address(1));
    h.assert_invariants();
}

#[test]
fn force_unstake_while_unstaking_deletes_and_burns() {
    let mut h = Harness::new(&[1], 10_000_000);
    h.send(stake_msg(1, 4_000_000)).unwrap();
    h.send(ProviderMsg::BeginUnstake(MsgBeginUnstake { address: address(1) })).unwrap();

    let ctx = h.ctx();
    let unstaking = h.provider(1).unwrap();
    h.keeper.force_unstake(&ctx, &mut h.ledger, unstaking).unwrap();

    assert_eq!(h.provider(1), None);
    assert_eq!(h.ledger.total_supply(DENOM), Amount::from_u64(6_000_000));
    assert_eq!(h.advance(UNSTAKING_TIME), 0);
    h.assert_invariants();
}

#[test]
fn ranking_breaks_ties_by_lowest_address() {
    let mut h = Harness::new(&[1, 2, 3], 200_000_000);
    // powers 100, 100, 50
    h.send(stake_msg(1, 100_000_000)).unwrap();
    h.send(stake_msg(2, 100_500_000)).unwrap();
    h.send(stake_msg(3, 50_000_000)).unwrap();

    let (first, second) = if address(1) < address(2) { (address(1), address(2)) } else { (address(2), address(1)) };
    let ctx = h.ctx();
    let order: Vec<_> = h
        .keeper
        .providers_by_rank(&ctx, 10)
        .unwrap()
        .into_iter()
        .map(|p| p.address)
        .collect();
    assert_eq!(order, vec![first, second, address(3)]);
}

#[test]
fn check_context_does_not_leak_into_deliver() {
    let mut h = Harness::new(&[1], 10_000_000);
    h.send(stake_msg(1, 2_000_000)).unwrap();

    // a speculative pass reads and caches the record under its own epoch
    let check = BlockContext::check(h.height, h.time);
    let seen = h.keeper.get_provider(&check, &address(1)).unwrap().unwrap();
    assert_eq!(seen.status, ProviderStatus::Staked);

    h.send(ProviderMsg::BeginUnstake(MsgBeginUnstake { address: address(1) })).unwrap();
    let after = h.keeper.get_provider(&check, &address(1)).unwrap().unwrap();
    assert_eq!(after.status, ProviderStatus::Unstaking);
}

#[derive(Debug, Clone)]
enum Op {
    Stake { who: u8, millions: u64 },
    BeginUnstake { who: u8 },
    Jail { who: u8 },
    Unjail { who: u8 },
    ForceUnstake { who: u8 },
    Advance { seconds: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let who = 1u8..=4;
    prop_oneof![
        (who.clone(), 0u64..6).prop_map(|(who, millions)| Op::Stake { who, millions }),
        who.clone().prop_map(|who| Op::BeginUnstake { who }),
        who.clone().prop_map(|who| Op::Jail { who }),
        who.clone().prop_map(|who| Op::Unjail { who }),
        who.prop_map(|who| Op::ForceUnstake { who }),
        (0u64..150).prop_map(|seconds| Op::Advance { seconds }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_under_random_operations(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let mut h = Harness::new(&[1, 2, 3, 4], 20_000_000);

        for op in ops {
            match op {
                Op::Stake { who, millions } => {
                    let _ = h.send(stake_msg(who, millions * 1_000_000 + 1));
                }
                Op::BeginUnstake { who } => {
                    let _ = h.send(ProviderMsg::BeginUnstake(MsgBeginUnstake { address: address(who) }));
                }
                Op::Jail { who } => {
                    let ctx = h.ctx();
                    h.keeper.jail(&ctx, &address(who)).unwrap();
                }
                Op::Unjail { who } => {
                    let _ = h.send(ProviderMsg::Unjail(MsgUnjail { address: address(who) }));
                }
                Op::ForceUnstake { who } => {
                    if let Some(provider) = h.provider(who).filter(|p| !p.is_unstaked()) {
                        let ctx = h.ctx();
                        h.keeper.force_unstake(&ctx, &mut h.ledger, provider).unwrap();
                    }
                }
                Op::Advance { seconds } => {
                    h.advance(seconds);
                }
            }

            let violations = h.keeper.check_index_consistency().unwrap();
            prop_assert!(violations.is_empty(), "index violations: {:?}", violations);
            prop_assert_eq!(h.keeper.check_pool_conservation(&h.ledger).unwrap(), None);
        }
    }

    #[test]
    fn begin_unstaking_completion_time_is_stable(extra in 0u64..1_000) {
        let mut h = Harness::new(&[1], 10_000_000);
        h.send(stake_msg(1, 2_000_000)).unwrap();
        h.send(ProviderMsg::BeginUnstake(MsgBeginUnstake { address: address(1) })).unwrap();
        let first = h.provider(1).unwrap().unstaking_completion_time;

        h.time += extra.min(UNSTAKING_TIME - 1);
        let _ = h.send(ProviderMsg::BeginUnstake(MsgBeginUnstake { address: address(1) }));
        prop_assert_eq!(h.provider(1).unwrap().unstaking_completion_time, first);
    }
}
