//! The governance lock.
//!
//! The object store and the trigger registry live behind one mutex so that a
//! registry scan always sees the store it was taken against.

use std::sync::{Mutex, MutexGuard};

use log::{debug, warn};
use rusty_shared_types::{ChainParams, Hash};

use crate::object::GovernanceObjectStore;
use crate::trigger_manager::TriggerManager;

/// Everything guarded by the governance lock.
#[derive(Debug, Default)]
pub struct GovernanceState<S> {
    pub store: S,
    pub triggers: TriggerManager,
}

impl<S: GovernanceObjectStore> GovernanceState<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            triggers: TriggerManager::new(),
        }
    }
}

pub struct Governance<S> {
    params: ChainParams,
    state: Mutex<GovernanceState<S>>,
}

impl<S: GovernanceObjectStore> Governance<S> {
    pub fn new(params: ChainParams, store: S) -> Self {
        Self {
            params,
            state: Mutex::new(GovernanceState::new(store)),
        }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Acquires the governance lock.
    ///
    /// A panic while the lock was held leaves the registry in a state every
    /// operation tolerates, so a poisoned lock is recovered rather than
    /// propagated.
    pub fn lock(&self) -> MutexGuard<'_, GovernanceState<S>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("governance lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Registers a newly accepted trigger object.
    pub fn add_new_trigger(&self, hash: Hash) -> bool {
        let mut state = self.lock();
        let GovernanceState { store, triggers } = &mut *state;
        triggers.add_new_trigger(hash, &*store, &self.params)
    }

    /// Periodic maintenance, run once per new tip.
    pub fn clean_and_remove(&self, chain_height: u64, adjusted_time: i64) {
        debug!(target: "gobject", "clean_and_remove -- chain height {}", chain_height);
        let mut state = self.lock();
        let GovernanceState { store, triggers } = &mut *state;
        triggers.clean_and_remove(store, chain_height, self.params.trigger_expiration_blocks, adjusted_time);
    }
}
