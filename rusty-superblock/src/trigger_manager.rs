//! Registry of superblocks keyed by the hash of their trigger object.
//!
//! Every operation here expects the caller to hold the governance lock; in
//! practice that means going through a [`GovernanceState`] obtained from
//! [`Governance::lock`].
//!
//! [`GovernanceState`]: crate::governance::GovernanceState
//! [`Governance::lock`]: crate::governance::Governance::lock

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info, warn};
use rusty_shared_types::{ChainParams, Hash};

use crate::log_throttle::LogThrottle;
use crate::object::{GovernanceObject, GovernanceObjectStore, GovernanceObjectType};
use crate::superblock::{Superblock, SuperblockStatus};

#[derive(Debug, Default)]
pub struct TriggerManager {
    triggers: BTreeMap<Hash, Arc<Superblock>>,
    throttle: LogThrottle,
}

impl TriggerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the trigger object `hash` as a superblock.
    ///
    /// Returns false if the hash is already registered or the object cannot
    /// be turned into a superblock; construction errors are logged, never
    /// returned.
    pub fn add_new_trigger<S: GovernanceObjectStore>(
        &mut self,
        hash: Hash,
        store: &S,
        params: &ChainParams,
    ) -> bool {
        if self.triggers.contains_key(&hash) {
            debug!(target: "gobject", "add_new_trigger -- already have hash {}, {} triggers",
                   hex::encode(hash), self.triggers.len());
            return false;
        }

        let superblock = match Superblock::new(hash, store, params) {
            Ok(superblock) => superblock,
            Err(e) => {
                debug!(target: "gobject", "add_new_trigger -- error creating superblock: {}", e);
                if self.throttle.should_log("TriggerManager", "add_new_trigger") {
                    warn!("add_new_trigger -- error creating superblock: {}", e);
                }
                return false;
            }
        };

        superblock.set_status(SuperblockStatus::Valid);
        info!("Registered trigger {} for height {} with {} payments",
              hex::encode(hash), superblock.block_start(), superblock.count_payments());
        self.triggers.insert(hash, Arc::new(superblock));
        true
    }

    /// Invalidates triggers whose object changed type and evicts invalid or expired ones.
    ///
    /// Expired triggers also have their backing object marked expired with a
    /// deletion time of `adjusted_time`.
    pub fn clean_and_remove<S: GovernanceObjectStore>(
        &mut self,
        store: &mut S,
        chain_height: u64,
        expiration_blocks: u64,
        adjusted_time: i64,
    ) {
        debug!(target: "gobject", "clean_and_remove -- start, {} triggers", self.triggers.len());

        for (hash, superblock) in &self.triggers {
            let Some(object) = store.find_object(hash) else {
                continue;
            };
            if object.object_type() != GovernanceObjectType::Trigger {
                superblock.set_status(SuperblockStatus::ErrorInvalid);
            }
        }

        self.triggers.retain(|hash, superblock| {
            let status = superblock.status();
            debug!(target: "gobject", "clean_and_remove -- superblock status = {:?}", status);
            let remove = match status {
                SuperblockStatus::ErrorInvalid | SuperblockStatus::Unknown => {
                    debug!(target: "gobject", "clean_and_remove -- unknown or invalid trigger found");
                    true
                }
                SuperblockStatus::Valid | SuperblockStatus::Executed => {
                    let trigger_block = superblock.block_start();
                    let expiration_block = trigger_block.saturating_add(expiration_blocks);
                    debug!(target: "gobject", "clean_and_remove -- trigger_block = {}, expiration_block = {}",
                           trigger_block, expiration_block);
                    if chain_height > expiration_block {
                        debug!(target: "gobject", "clean_and_remove -- outdated trigger found");
                        if let Some(object) = store.find_object_mut(hash) {
                            info!("Expiring outdated trigger object {}", hex::encode(hash));
                            object.mark_expired(adjusted_time);
                        }
                        true
                    } else {
                        false
                    }
                }
            };
            if remove {
                debug!(target: "gobject", "clean_and_remove -- removing trigger {}", hex::encode(hash));
            }
            !remove
        });
    }

    /// Superblocks whose trigger object is still known to the store, in hash order.
    pub fn active_triggers<S: GovernanceObjectStore>(&self, store: &S) -> Vec<Arc<Superblock>> {
        let active: Vec<Arc<Superblock>> = self
            .triggers
            .iter()
            .filter(|(hash, _)| store.find_object(hash).is_some())
            .map(|(_, superblock)| Arc::clone(superblock))
            .collect();
        debug!(target: "gobject", "active_triggers -- {} of {} triggers active", active.len(), self.triggers.len());
        active
    }

    pub fn get(&self, hash: &Hash) -> Option<Arc<Superblock>> {
        self.triggers.get(hash).cloned()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.triggers.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}
