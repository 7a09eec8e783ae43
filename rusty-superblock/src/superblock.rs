//! The superblock entity: a payment schedule bound to one target height.

use std::sync::atomic::{AtomicU8, Ordering};

use log::{debug, info, warn};
use rusty_shared_types::{format_money, Amount, ChainParams, Hash, Transaction};

use crate::chain::SubsidySchedule;
use crate::error::SuperblockError;
use crate::heights::{is_dc_superblock, is_valid_block_height, payments_limit};
use crate::object::{GovernanceObject, GovernanceObjectStore, GovernanceObjectType};
use crate::payload::TriggerPayload;
use crate::schedule::{parse_payment_schedule, GovernancePayment};

/// Lifecycle tag of a registered superblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SuperblockStatus {
    Unknown = 0,
    Valid = 1,
    ErrorInvalid = 2,
    Executed = 3,
}

impl SuperblockStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SuperblockStatus::Valid,
            2 => SuperblockStatus::ErrorInvalid,
            3 => SuperblockStatus::Executed,
            _ => SuperblockStatus::Unknown,
        }
    }
}

/// Required payments for one block height, built from a trigger object.
///
/// Everything except the status is fixed at construction. Handles are shared
/// through `Arc`, so the status is an atomic tag.
#[derive(Debug)]
pub struct Superblock {
    source_object_hash: Hash,
    epoch_start: u64,
    payments: Vec<GovernancePayment>,
    status: AtomicU8,
}

impl Superblock {
    /// Builds a superblock from the trigger object stored under `hash`.
    pub fn new<S: GovernanceObjectStore>(
        hash: Hash,
        store: &S,
        params: &ChainParams,
    ) -> Result<Self, SuperblockError> {
        let object = store
            .find_object(&hash)
            .ok_or_else(|| SuperblockError::ObjectNotFound(hex::encode(hash)))?;

        if object.object_type() != GovernanceObjectType::Trigger {
            return Err(SuperblockError::WrongObjectType(hex::encode(hash)));
        }

        let payload = TriggerPayload::from_value(object.payload())?;
        let superblock = Self::from_payload(hash, &payload, params)?;

        debug!(target: "gobject", "Superblock -- epoch_start = {}, addresses = {}, amounts = {}, payments = {}",
               superblock.epoch_start, payload.payment_addresses, payload.payment_amounts,
               superblock.payments.len());
        Ok(superblock)
    }

    pub fn from_payload(
        hash: Hash,
        payload: &TriggerPayload,
        params: &ChainParams,
    ) -> Result<Self, SuperblockError> {
        let payments = parse_payment_schedule(
            &payload.payment_addresses,
            &payload.payment_amounts,
            params.address_version,
        )?;
        Ok(Self {
            source_object_hash: hash,
            epoch_start: payload.event_block_height,
            payments,
            status: AtomicU8::new(SuperblockStatus::Unknown as u8),
        })
    }

    pub fn source_object_hash(&self) -> &Hash {
        &self.source_object_hash
    }

    /// Height at which the payments must appear.
    pub fn block_start(&self) -> u64 {
        self.epoch_start
    }

    pub fn status(&self) -> SuperblockStatus {
        SuperblockStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    pub fn set_status(&self, status: SuperblockStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    pub fn payment(&self, index: usize) -> Option<&GovernancePayment> {
        self.payments.get(index)
    }

    pub fn payments(&self) -> &[GovernancePayment] {
        &self.payments
    }

    pub fn count_payments(&self) -> usize {
        self.payments.len()
    }

    pub fn total_amount(&self) -> Amount {
        self.payments
            .iter()
            .fold(0, |acc: Amount, payment| acc.saturating_add(payment.amount))
    }

    /// The backing trigger object, if the store still has it.
    pub fn governance_object<'s, S: GovernanceObjectStore>(&self, store: &'s S) -> Option<&'s S::Object> {
        store.find_object(&self.source_object_hash)
    }

    /// Concatenated memos of every output of `tx`.
    pub fn block_memo_data(tx: &Transaction) -> String {
        tx.outputs
            .iter()
            .filter_map(|output| output.memo.as_deref())
            .map(String::from_utf8_lossy)
            .collect()
    }

    /// Does the coinbase `tx` pay this superblock at `height`?
    ///
    /// Every scheduled payment must appear with the exact script and amount,
    /// in schedule order. Other outputs may sit before, after or between them.
    pub fn is_valid_superblock(
        &self,
        tx: &Transaction,
        height: u64,
        block_reward: Amount,
        block_time: i64,
        params: &ChainParams,
        subsidy: &dyn SubsidySchedule,
    ) -> bool {
        let regular = is_valid_block_height(params, height);
        if !regular && !is_dc_superblock(params, height) {
            warn!("Superblock::is_valid -- ERROR: Block invalid, incorrect block height {}", height);
            return false;
        }

        let outputs = &tx.outputs;
        let payment_count = self.payments.len();
        debug!(target: "gobject", "Superblock::is_valid -- tx {}, outputs = {}, payments = {}, block_time = {}",
               hex::encode(tx.txid()), outputs.len(), payment_count, block_time);

        if outputs.len() < payment_count {
            warn!("Superblock::is_valid -- ERROR: Block invalid, too few superblock payments");
            return false;
        }

        let total = self.total_amount();
        let limit = payments_limit(params, subsidy, height);
        if total > limit {
            warn!("Superblock::is_valid -- ERROR: Block invalid, payments limit exceeded: payments {}, limit {}",
                  format_money(total), format_money(limit));
            return false;
        }

        // the miner must not take more than the usual reward
        if regular {
            let Some(block_value) = tx.value_out() else {
                warn!("Superblock::is_valid -- ERROR: Block invalid, output value overflow");
                return false;
            };
            let allowed = block_reward.saturating_add(total);
            if block_value > allowed {
                warn!("Superblock::is_valid -- ERROR: Block invalid, block value limit exceeded: block {}, limit {}",
                      format_money(block_value), format_money(allowed));
                return false;
            }
        }

        let mut cursor = 0usize;
        for (index, payment) in self.payments.iter().enumerate() {
            let found = outputs[cursor..].iter().position(|output| {
                output.script_pubkey == payment.script && output.value == payment.amount
            });
            match found {
                // the cursor stays on the matched output
                Some(offset) => cursor += offset,
                None => {
                    warn!("Superblock::is_valid -- ERROR: Block invalid: {} payment {} to {} not found",
                          index, format_money(payment.amount), payment.address);
                    return false;
                }
            }
        }

        info!("Superblock::is_valid -- superblock at height {} accepted", height);
        true
    }
}
