// provider-staking/src/ledger.rs

use crate::collaborators::{AccountId, AccountLedger, LedgerError, LedgerResult, Pool};
use provider_core::{Amount, Coin};
use std::collections::{BTreeMap, BTreeSet};

/// In-memory account ledger for tests and single-process nodes
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    /// Balances keyed by holder and denomination
    balances: BTreeMap<(AccountId, String), Amount>,
    /// Circulating supply per denomination
    supply: BTreeMap<String, Amount>,
    pools: BTreeSet<Pool>,
}

impl MemoryLedger {
    /// Ledger with every standard pool registered
    pub fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
            supply: BTreeMap::new(),
            pools: Pool::ALL.into_iter().collect(),
        }
    }

    /// Ledger with only the given pools registered
    pub fn with_pools(pools: impl IntoIterator<Item = Pool>) -> Self {
        Self {
            pools: pools.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Create tokens directly in `holder`, growing the supply
    pub fn fund(&mut self, holder: AccountId, coin: &Coin) {
        self.credit(holder, coin);
        let supply = self.supply.entry(coin.denom.clone()).or_default();
        *supply = &*supply + &coin.amount;
    }

    fn check_pool(&self, holder: &AccountId) -> LedgerResult<()> {
        match holder {
            AccountId::Pool(pool) if !self.pools.contains(pool) => Err(LedgerError::UnknownPool(*pool)),
            _ => Ok(()),
        }
    }

    fn credit(&mut self, holder: AccountId, coin: &Coin) {
        let balance = self.balances.entry((holder, coin.denom.clone())).or_default();
        *balance = &*balance + &coin.amount;
    }

    fn debit(&mut self, holder: AccountId, coin: &Coin) -> LedgerResult<()> {
        let available = self.balance_of(&holder, &coin.denom);
        let remaining = available.checked_sub(&coin.amount).ok_or_else(|| LedgerError::InsufficientFunds {
            holder,
            needed: coin.clone(),
            available: available.clone(),
        })?;
        if remaining.is_zero() {
            self.balances.remove(&(holder, coin.denom.clone()));
        } else {
            self.balances.insert((holder, coin.denom.clone()), remaining);
        }
        Ok(())
    }
}

impl AccountLedger for MemoryLedger {
    fn has_pool(&self, pool: Pool) -> bool {
        self.pools.contains(&pool)
    }

    fn balance_of(&self, holder: &AccountId, denom: &str) -> Amount {
        self.balances
            .get(&(*holder, denom.to_string()))
            .cloned()
            .unwrap_or_else(Amount::zero)
    }

    fn transfer(&mut self, from: &AccountId, to: &AccountId, coin: &Coin) -> LedgerResult<()> {
        if coin.denom.is_empty() {
            return Err(LedgerError::InvalidCoin("empty denomination".into()));
        }
        self.check_pool(from)?;
        self.check_pool(to)?;
        if coin.amount.is_zero() {
            return Ok(());
        }
        self.debit(*from, coin)?;
        self.credit(*to, coin);
        Ok(())
    }

    fn mint(&mut self, pool: Pool, coin: &Coin) -> LedgerResult<()> {
        self.check_pool(&pool.into())?;
        self.fund(pool.into(), coin);
        Ok(())
    }

    fn burn(&mut self, pool: Pool, coin: &Coin) -> LedgerResult<()> {
        self.check_pool(&pool.into())?;
        self.debit(pool.into(), coin)?;
        let supply = self.supply.entry(coin.denom.clone()).or_default();
        *supply = supply.checked_sub(&coin.amount).unwrap_or_else(Amount::zero);
        Ok(())
    }

    fn total_supply(&self, denom: &str) -> Amount {
        self.supply.get(denom).cloned().unwrap_or_else(Amount::zero)
    }
}
