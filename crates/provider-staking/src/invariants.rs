// provider-staking/src/invariants.rs

//! Cross-keyspace consistency checks, run by hosts after genesis and in tests.

use crate::collaborators::{AccountLedger, Pool};
use crate::keeper::ProviderKeeper;
use crate::ProviderResult;
use provider_core::Amount;
use provider_crypto::Address;
use provider_store::{keys, Direction, OrderedStore};
use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;

impl<S: OrderedStore> ProviderKeeper<S> {
    /// Violations of the staked-index and unstaking-queue invariants
    pub fn check_index_consistency(&self) -> ProviderResult<Vec<String>> {
        let mut violations = Vec::new();
        let mut records = HashMap::new();
        self.iterate_all(|p| {
            records.insert(p.address, p.clone());
            ControlFlow::Continue(())
        })?;

        let mut indexed = HashSet::new();
        for (key, value) in self.store.scan_prefix(keys::STAKED_INDEX_PREFIX, Direction::Forward)? {
            let (power, address) = keys::parse_staked_index_key(&key)?;
            if value.as_slice() != address.as_bytes() {
                violations.push(format!("staked index entry for {} stores another address", address));
            }
            match records.get(&address) {
                Some(p) if !p.is_ranked() => violations.push(format!(
                    "provider {} indexed while {} (jailed: {})",
                    address, p.status, p.jailed
                )),
                Some(p) if p.consensus_power() != power => violations.push(format!(
                    "provider {} indexed at power {} but holds power {}",
                    address,
                    power,
                    p.consensus_power()
                )),
                Some(_) => {}
                None => violations.push(format!("staked index references missing provider {}", address)),
            }
            if !indexed.insert(address) {
                violations.push(format!("provider {} indexed more than once", address));
            }
        }

        let mut queued: HashSet<Address> = HashSet::new();
        for (time, addresses) in self.all_unstaking_entries()? {
            for address in addresses {
                match records.get(&address) {
                    Some(p) if !p.is_unstaking() => {
                        violations.push(format!("provider {} queued while {}", address, p.status))
                    }
                    Some(p) if p.unstaking_completion_time != time => violations.push(format!(
                        "provider {} queued at {} but completes at {}",
                        address, time, p.unstaking_completion_time
                    )),
                    Some(_) => {}
                    None => violations.push(format!("unstaking queue references missing provider {}", address)),
                }
                if !queued.insert(address) {
                    violations.push(format!("provider {} queued more than once", address));
                }
            }
        }

        for provider in records.values() {
            if provider.is_ranked() && !indexed.contains(&provider.address) {
                violations.push(format!("staked provider {} missing from the index", provider.address));
            }
            if provider.is_unstaking() && !queued.contains(&provider.address) {
                violations.push(format!("unstaking provider {} missing from the queue", provider.address));
            }
            if provider.is_staked() && provider.unstaking_completion_time != 0 {
                violations.push(format!("staked provider {} has a completion time", provider.address));
            }
        }
        Ok(violations)
    }

    /// The staking pool must hold exactly the tokens of bonded providers
    pub fn check_pool_conservation<L: AccountLedger>(&self, ledger: &L) -> ProviderResult<Option<String>> {
        let mut bonded = Amount::zero();
        self.iterate_all(|p| {
            if p.is_bonded() {
                bonded = &bonded + &p.staked_tokens;
            }
            ControlFlow::Continue(())
        })?;

        let denom = self.stake_denom();
        let pool = ledger.balance_of(&Pool::Staking.into(), &denom);
        if pool == bonded {
            Ok(None)
        } else {
            Ok(Some(format!(
                "staking pool holds {}{} but providers bond {}{}",
                pool, denom, bonded, denom
            )))
        }
    }

    /// Sum of tokens bonded by staked and unstaking providers
    pub fn staked_tokens_total(&self) -> ProviderResult<Amount> {
        let mut total = Amount::zero();
        self.iterate_all(|p| {
            if p.is_bonded() {
                total = &total + &p.staked_tokens;
            }
            ControlFlow::Continue(())
        })?;
        Ok(total)
    }
}
