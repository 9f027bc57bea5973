// provider-node/src/runtime.rs
use crate::NodeConfig;
use provider_core::{Amount, BlockHeight, Coin, Provider, ProviderStatus, Timestamp};
use provider_crypto::Address;
use provider_staking::{
    validate_genesis, AccountLedger, BlockContext, GenesisState, MemoryLedger, Pool, ProviderKeeper,
};
use provider_store::SledStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Liquid balance of an account at genesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: Address,
    pub balance: Amount,
}

/// Liquid and bonded balances the node's ledger starts from, kept as JSON
/// beside the provider store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub staking_pool: Amount,
}

impl LedgerSnapshot {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn ledger(&self, denom: &str) -> MemoryLedger {
        let mut ledger = MemoryLedger::new();
        for account in &self.accounts {
            ledger.fund(account.address.into(), &Coin::new(denom, account.balance.clone()));
        }
        ledger.fund(Pool::Staking.into(), &Coin::new(denom, self.staking_pool.clone()));
        ledger
    }
}

/// Genesis file accepted by the node: account balances, the staking pool
/// balance and the provider module state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeGenesis {
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub staking_pool: Amount,
    #[serde(flatten)]
    pub providers: GenesisState,
}

impl NodeGenesis {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Tokens held by staked and unstaking providers
    pub fn bonded_tokens(&self) -> Amount {
        self.providers
            .providers
            .iter()
            .filter(|p| p.is_bonded())
            .fold(Amount::zero(), |acc, p| &acc + &p.staked_tokens)
    }

    /// Structural checks plus the pool balance check `init_genesis` would
    /// otherwise panic on
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_genesis(&self.providers)?;
        let bonded = self.bonded_tokens();
        if bonded != self.staking_pool {
            anyhow::bail!(
                "staking pool holds {} but genesis providers bond {}",
                self.staking_pool,
                bonded
            );
        }
        Ok(())
    }

    pub fn balances(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            accounts: self.accounts.clone(),
            staking_pool: self.staking_pool.clone(),
        }
    }
}

/// Provider keeper over the configured sled database
pub struct ProviderNode {
    config: NodeConfig,
    keeper: ProviderKeeper<SledStore>,
    balances: LedgerSnapshot,
    ledger: MemoryLedger,
}

impl ProviderNode {
    /// Open the store and the ledger balances saved beside it; a node
    /// without saved balances starts from an empty ledger
    pub fn open(config: NodeConfig) -> anyhow::Result<Self> {
        let path = config.ledger_path();
        let balances = if path.exists() {
            tracing::debug!("Loading ledger balances from {}", path.display());
            LedgerSnapshot::from_file(&path)?
        } else {
            LedgerSnapshot::default()
        };
        Self::open_with_balances(config, balances)
    }

    pub fn open_with_balances(config: NodeConfig, balances: LedgerSnapshot) -> anyhow::Result<Self> {
        config.params.validate()?;
        let ledger = balances.ledger(&config.params.stake_denom);
        let store_config = config.store_config();
        tracing::info!("Opening provider store at {}", store_config.path);
        let store = SledStore::open(&store_config)?;

        let keeper = ProviderKeeper::new(
            store,
            config.params.clone(),
            config.upgrades.clone(),
            config.cache_capacity,
            &ledger,
        );

        Ok(Self {
            config,
            keeper,
            balances,
            ledger,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn keeper(&self) -> &ProviderKeeper<SledStore> {
        &self.keeper
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    /// Apply `genesis` into an empty store and flush it to disk.
    ///
    /// Replaces the node's ledger with the genesis balances and saves them
    /// beside the store.
    pub fn load_genesis(&mut self, genesis: &NodeGenesis, height: BlockHeight, time: Timestamp) -> anyhow::Result<()> {
        genesis.validate()?;
        if !self.keeper.all_providers()?.is_empty() {
            anyhow::bail!("provider store already holds state, refusing to load genesis");
        }

        self.balances = genesis.balances();
        self.ledger = self.balances.ledger(&self.config.params.stake_denom);
        let ctx = BlockContext::deliver(height, time);
        self.keeper.init_genesis(&ctx, &self.ledger, &genesis.providers)?;

        let violations = self.keeper.check_index_consistency()?;
        if !violations.is_empty() {
            anyhow::bail!("index inconsistent after genesis: {}", violations.join("; "));
        }
        if let Some(violation) = self.keeper.check_pool_conservation(&self.ledger)? {
            anyhow::bail!(violation);
        }

        let flushed = self.keeper.store().flush()?;
        tracing::debug!("Flushed {} bytes", flushed);
        std::fs::create_dir_all(&self.config.data_dir)?;
        self.balances.to_file(self.config.ledger_path())?;
        tracing::info!(
            "Genesis loaded: {} providers, {} staked, {} bonded",
            genesis.providers.providers.len(),
            self.keeper.staked_count()?,
            genesis.bonded_tokens()
        );
        Ok(())
    }

    /// Highest-ranked staked providers
    pub fn ranking(&mut self, height: BlockHeight, time: Timestamp, limit: usize) -> anyhow::Result<Vec<Provider>> {
        let ctx = BlockContext::check(height, time);
        Ok(self.keeper.providers_by_rank(&ctx, limit)?)
    }

    /// Providers waiting in the unstaking queue, soonest first
    pub fn unstaking(&self) -> anyhow::Result<Vec<(Timestamp, Vec<Address>)>> {
        Ok(self.keeper.all_unstaking_entries()?)
    }

    /// Current provider state with the balances the ledger holds for every
    /// account known at genesis
    pub fn export_genesis(&self) -> anyhow::Result<NodeGenesis> {
        let providers = self.keeper.export_genesis()?;
        let denom = self.config.params.stake_denom.clone();
        let staking_pool = self.ledger.balance_of(&Pool::Staking.into(), &denom);
        let accounts = self
            .balances
            .accounts
            .iter()
            .map(|a| GenesisAccount {
                address: a.address,
                balance: self.ledger.balance_of(&a.address.into(), &denom),
            })
            .collect();

        Ok(NodeGenesis {
            accounts,
            staking_pool,
            providers,
        })
    }
}

/// Number of providers per status, in `Staked`, `Unstaking`, `Unstaked` order
pub fn status_counts(providers: &[Provider]) -> [usize; 3] {
    let mut counts = [0; 3];
    for p in providers {
        let slot = match p.status {
            ProviderStatus::Staked => 0,
            ProviderStatus::Unstaking => 1,
            ProviderStatus::Unstaked => 2,
        };
        counts[slot] += 1;
    }
    counts
}
