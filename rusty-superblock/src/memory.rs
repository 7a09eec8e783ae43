//! In-memory governance object store and DC tally.
//!
//! Used by regtest embeddings and by the test suites; production nodes plug
//! in their own object store.

use std::collections::{BTreeMap, HashMap};

use rusty_shared_types::Hash;
use serde_json::Value;

use crate::chain::{DcProposal, DcProposalTally};
use crate::object::{GovernanceObject, GovernanceObjectStore, GovernanceObjectType, VoteSignal};

/// Absolute FUNDING yes votes needed before the cached funding flag is set.
pub const DEFAULT_FUNDING_THRESHOLD: i64 = 10;

#[derive(Debug, Clone)]
pub struct MemoryObject {
    hash: Hash,
    object_type: GovernanceObjectType,
    payload: Value,
    yes_counts: HashMap<VoteSignal, i64>,
    funding_threshold: i64,
    cached_funding: bool,
    expired: bool,
    deletion_time: Option<i64>,
}

impl MemoryObject {
    /// Creates an object whose hash commits to its type and payload.
    pub fn new(object_type: GovernanceObjectType, payload: Value) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(format!("{:?}", object_type).as_bytes());
        hasher.update(payload.to_string().as_bytes());
        Self {
            hash: hasher.finalize().into(),
            object_type,
            payload,
            yes_counts: HashMap::new(),
            funding_threshold: DEFAULT_FUNDING_THRESHOLD,
            cached_funding: false,
            expired: false,
            deletion_time: None,
        }
    }

    pub fn trigger(payload: Value) -> Self {
        Self::new(GovernanceObjectType::Trigger, payload)
    }

    pub fn with_yes_count(mut self, signal: VoteSignal, count: i64) -> Self {
        self.set_yes_count(signal, count);
        self
    }

    pub fn with_funding_threshold(mut self, threshold: i64) -> Self {
        self.funding_threshold = threshold;
        self
    }

    pub fn set_yes_count(&mut self, signal: VoteSignal, count: i64) {
        self.yes_counts.insert(signal, count);
    }

    pub fn set_object_type(&mut self, object_type: GovernanceObjectType) {
        self.object_type = object_type;
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn deletion_time(&self) -> Option<i64> {
        self.deletion_time
    }
}

impl GovernanceObject for MemoryObject {
    fn hash(&self) -> Hash {
        self.hash
    }

    fn object_type(&self) -> GovernanceObjectType {
        self.object_type
    }

    fn payload(&self) -> &Value {
        &self.payload
    }

    fn refresh_cached_funding(&mut self) {
        self.cached_funding = self.absolute_yes_count(VoteSignal::Funding) >= self.funding_threshold;
    }

    fn is_cached_funding_set(&self) -> bool {
        self.cached_funding
    }

    fn absolute_yes_count(&self, signal: VoteSignal) -> i64 {
        self.yes_counts.get(&signal).copied().unwrap_or(0)
    }

    fn mark_expired(&mut self, deletion_time: i64) {
        self.expired = true;
        self.deletion_time = Some(deletion_time);
    }
}

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: HashMap<Hash, MemoryObject>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an object, returning its hash.
    pub fn insert(&mut self, object: MemoryObject) -> Hash {
        let hash = object.hash;
        self.objects.insert(hash, object);
        hash
    }

    pub fn remove(&mut self, hash: &Hash) -> Option<MemoryObject> {
        self.objects.remove(hash)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl GovernanceObjectStore for MemoryObjectStore {
    type Object = MemoryObject;

    fn find_object(&self, hash: &Hash) -> Option<&MemoryObject> {
        self.objects.get(hash)
    }

    fn find_object_mut(&mut self, hash: &Hash) -> Option<&mut MemoryObject> {
        self.objects.get_mut(hash)
    }
}

/// DC tally backed by a fixed table of proposals per height.
#[derive(Debug, Clone, Default)]
pub struct StaticDcTally {
    proposals: BTreeMap<u64, DcProposal>,
    required_quorum: i64,
}

impl StaticDcTally {
    pub fn new(required_quorum: i64) -> Self {
        Self {
            proposals: BTreeMap::new(),
            required_quorum,
        }
    }

    pub fn insert(&mut self, height: u64, proposal: DcProposal) {
        self.proposals.insert(height, proposal);
    }
}

impl DcProposalTally for StaticDcTally {
    fn best_dc_proposal(&self, height: u64) -> Option<DcProposal> {
        self.proposals.get(&height).cloned()
    }

    fn required_quorum(&self, _height: u64) -> i64 {
        self.required_quorum
    }
}
