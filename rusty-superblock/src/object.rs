//! Interfaces of the generic governance-object store.
//!
//! The store owns proposal lifecycle, propagation, signatures and collateral.
//! The superblock subsystem only needs to look objects up by hash, read their
//! structured payload and vote tallies, and flag expired triggers.

use rusty_shared_types::Hash;
use serde::{Deserialize, Serialize};

/// Declared type of a governance object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GovernanceObjectType {
    Unknown,
    Proposal,
    Trigger,
    Watchdog,
}

/// What a vote is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteSignal {
    None,
    /// The object should be paid / executed
    Funding,
    Valid,
    Delete,
    Endorsed,
}

pub trait GovernanceObject {
    fn hash(&self) -> Hash;

    fn object_type(&self) -> GovernanceObjectType;

    /// Structured JSON payload the object was submitted with.
    fn payload(&self) -> &serde_json::Value;

    /// Recomputes the cached sentinel flags (funding, validity, deletion).
    fn refresh_cached_funding(&mut self);

    fn is_cached_funding_set(&self) -> bool;

    /// Yes votes minus no votes for `signal`.
    fn absolute_yes_count(&self, signal: VoteSignal) -> i64;

    /// Marks the object expired and schedules its deletion at `deletion_time`.
    fn mark_expired(&mut self, deletion_time: i64);
}

pub trait GovernanceObjectStore {
    type Object: GovernanceObject;

    fn find_object(&self, hash: &Hash) -> Option<&Self::Object>;

    fn find_object_mut(&mut self, hash: &Hash) -> Option<&mut Self::Object>;
}
