// provider-staking/src/keeper.rs

use crate::collaborators::{
    AccountLedger, CompanionPool, DetachedCompanion, NoopSessions, ParamSource, Pool, SessionInvalidator,
};
use crate::events::ProviderEvent;
use provider_core::{BlockHeight, Params, Timestamp, Upgrade, UpgradeSchedule};
use provider_store::{OrderedStore, ProviderCache};

/// Execution context for a single state transition.
///
/// `epoch` identifies the context the provider cache belongs to. Hosts must
/// hand out a fresh epoch whenever they start a new block or a speculative
/// (check) pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockContext {
    pub height: BlockHeight,
    /// Block time in seconds
    pub time: Timestamp,
    pub epoch: u64,
}

impl BlockContext {
    /// Context for committing a block
    pub fn deliver(height: BlockHeight, time: Timestamp) -> Self {
        Self {
            height,
            time,
            epoch: height << 1,
        }
    }

    /// Speculative context at the same height; never shares cache entries with `deliver`
    pub fn check(height: BlockHeight, time: Timestamp) -> Self {
        Self {
            height,
            time,
            epoch: (height << 1) | 1,
        }
    }
}

/// Owner of the provider keyspaces.
///
/// Holds the ordered store, the per-context record cache and handles to the
/// collaborators it consults. The account ledger is passed into each
/// operation that moves funds.
pub struct ProviderKeeper<S> {
    pub(crate) store: S,
    pub(crate) cache: ProviderCache,
    params: Box<dyn ParamSource>,
    upgrades: UpgradeSchedule,
    sessions: Box<dyn SessionInvalidator>,
    companion: Box<dyn CompanionPool>,
    events: Vec<ProviderEvent>,
}

impl<S: OrderedStore> ProviderKeeper<S> {
    /// Create a keeper over `store`.
    ///
    /// # Panics
    /// If the ledger has no staking pool account; the module cannot operate
    /// without it.
    pub fn new<P, L>(store: S, params: P, upgrades: UpgradeSchedule, cache_capacity: usize, ledger: &L) -> Self
    where
        P: ParamSource + 'static,
        L: AccountLedger,
    {
        if !ledger.has_pool(Pool::Staking) {
            panic!("staking pool account has not been set");
        }
        let denom = params.params().stake_denom;
        Self {
            store,
            cache: ProviderCache::new(cache_capacity),
            params: Box::new(params),
            upgrades,
            sessions: Box::new(NoopSessions),
            companion: Box::new(DetachedCompanion { denom }),
            events: Vec::new(),
        }
    }

    pub fn with_sessions(mut self, sessions: impl SessionInvalidator + 'static) -> Self {
        self.sessions = Box::new(sessions);
        self
    }

    pub fn with_companion(mut self, companion: impl CompanionPool + 'static) -> Self {
        self.companion = Box::new(companion);
        self
    }

    pub fn params(&self) -> Params {
        self.params.params()
    }

    pub fn upgrades(&self) -> &UpgradeSchedule {
        &self.upgrades
    }

    pub fn is_active(&self, upgrade: Upgrade, ctx: &BlockContext) -> bool {
        self.upgrades.is_active(upgrade, ctx.height)
    }

    pub fn stake_denom(&self) -> String {
        self.companion.stake_denom()
    }

    pub(crate) fn companion(&self) -> &dyn CompanionPool {
        self.companion.as_ref()
    }

    pub(crate) fn clear_sessions(&mut self) {
        self.sessions.clear_sessions();
    }

    pub(crate) fn emit(&mut self, event: ProviderEvent) {
        self.events.push(event);
    }

    /// Drain the events accumulated since the last call
    pub fn take_events(&mut self) -> Vec<ProviderEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
