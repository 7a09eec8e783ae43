//! Superblock selection, emission and validation for block assembly and
//! block validation.

use std::sync::Arc;

use log::{debug, info, warn};
use rusty_shared_types::{format_money, Amount, ChainParams, Transaction, TxOutput};

use crate::chain::{DcProposalTally, SubsidySchedule};
use crate::governance::GovernanceState;
use crate::heights::{is_dc_superblock, is_podc_enabled, is_valid_block_height};
use crate::object::{GovernanceObject, GovernanceObjectStore, VoteSignal};
use crate::payload::{TriggerPayload, DEFAULT_PHASE_MEMO};
use crate::superblock::Superblock;

/// Stateless façade over the trigger registry.
///
/// All methods take the locked [`GovernanceState`], so they can only run
/// while the governance lock is held.
pub struct SuperblockManager<'a> {
    params: &'a ChainParams,
    subsidy: &'a dyn SubsidySchedule,
    dc_tally: &'a dyn DcProposalTally,
}

impl<'a> SuperblockManager<'a> {
    pub fn new(
        params: &'a ChainParams,
        subsidy: &'a dyn SubsidySchedule,
        dc_tally: &'a dyn DcProposalTally,
    ) -> Self {
        Self {
            params,
            subsidy,
            dc_tally,
        }
    }

    /// Has the sanctuary quorum agreed on a DC payment set for `height`?
    pub fn is_dc_superblock_triggered(&self, height: u64) -> bool {
        debug!(target: "podc", "is_dc_superblock_triggered -- start height = {}", height);
        if !is_podc_enabled(self.params, height) || !is_dc_superblock(self.params, height) {
            return false;
        }

        let proposal = self.dc_tally.best_dc_proposal(height).unwrap_or_default();
        let required = self.dc_tally.required_quorum(height);
        if proposal.votes < required {
            info!("DC superblock at height {} does not have enough votes: required {}, votes {}",
                  height, required, proposal.votes);
            return false;
        }
        if proposal.payment_addresses.is_empty() || proposal.payment_amounts.is_empty() {
            info!("DC superblock contract empty at height {}", height);
            return false;
        }

        debug!(target: "podc", "is_dc_superblock_triggered -- enough support: votes {}, addresses {}, amounts {}",
               proposal.votes, proposal.payment_addresses, proposal.payment_amounts);
        true
    }

    /// Must the block at `height` carry superblock payments?
    ///
    /// A DC height is decided by the DC quorum alone: if the quorum has not
    /// agreed, the block is an ordinary block.
    pub fn is_superblock_triggered<S: GovernanceObjectStore>(
        &self,
        state: &mut GovernanceState<S>,
        height: u64,
    ) -> bool {
        debug!(target: "gobject", "is_superblock_triggered -- start height = {}", height);
        if is_dc_superblock(self.params, height) && is_podc_enabled(self.params, height) {
            return self.is_dc_superblock_triggered(height);
        }
        if !is_valid_block_height(self.params, height) {
            return false;
        }

        let GovernanceState { store, triggers } = state;
        let active = triggers.active_triggers(&*store);
        debug!(target: "gobject", "is_superblock_triggered -- {} active triggers", active.len());

        for superblock in active {
            if superblock.block_start() != height {
                debug!(target: "gobject", "is_superblock_triggered -- block height doesn't match height = {}, block_start = {}, continuing",
                       height, superblock.block_start());
                continue;
            }
            let Some(object) = store.find_object_mut(superblock.source_object_hash()) else {
                warn!("is_superblock_triggered -- trigger object vanished, continuing");
                continue;
            };

            object.refresh_cached_funding();
            if object.is_cached_funding_set() {
                debug!(target: "gobject", "is_superblock_triggered -- cached funding set, returning true");
                return true;
            }
            debug!(target: "gobject", "is_superblock_triggered -- cached funding not set, continuing");
        }

        false
    }

    /// The superblock for `height` with the most absolute FUNDING yes votes.
    ///
    /// Ties keep the first candidate in registry order. A superblock needs at
    /// least one net yes vote to be selected.
    pub fn best_superblock<S: GovernanceObjectStore>(
        &self,
        state: &GovernanceState<S>,
        height: u64,
    ) -> Option<Arc<Superblock>> {
        if !is_valid_block_height(self.params, height) && !is_dc_superblock(self.params, height) {
            return None;
        }

        let mut best: Option<Arc<Superblock>> = None;
        let mut best_yes_count: i64 = 0;
        for superblock in state.triggers.active_triggers(&state.store) {
            if superblock.block_start() != height {
                continue;
            }
            let Some(object) = superblock.governance_object(&state.store) else {
                continue;
            };
            let yes_count = object.absolute_yes_count(VoteSignal::Funding);
            debug!(target: "gobject", "best_superblock -- yes_count = {}", yes_count);
            if yes_count > best_yes_count {
                best_yes_count = yes_count;
                best = Some(superblock);
            }
        }

        best
    }

    /// Outputs the coinbase at `height` must append, in payment order.
    ///
    /// The first output carries the price/phase memo of the trigger.
    pub fn create_superblock<S: GovernanceObjectStore>(
        &self,
        state: &GovernanceState<S>,
        height: u64,
    ) -> Vec<TxOutput> {
        let Some(superblock) = self.best_superblock(state, height) else {
            debug!(target: "podc", "create_superblock -- can't find superblock for height {}", height);
            return Vec::new();
        };

        info!("Creating superblock with {} payments", superblock.count_payments());
        let mut phase_memo = Some(self.phase_memo(state, &superblock));
        superblock
            .payments()
            .iter()
            .enumerate()
            .map(|(index, payment)| {
                debug!(target: "podc", "NEW Superblock : output {} (addr {}, amount {})",
                       index, payment.address, format_money(payment.amount));
                TxOutput::new_with_memo(
                    payment.amount,
                    payment.script.clone(),
                    phase_memo.take().map(String::into_bytes),
                )
            })
            .collect()
    }

    /// Does coinbase `tx` pay the best superblock for `height`?
    pub fn is_valid_superblock<S: GovernanceObjectStore>(
        &self,
        state: &GovernanceState<S>,
        tx: &Transaction,
        height: u64,
        block_reward: Amount,
        block_time: i64,
    ) -> bool {
        match self.best_superblock(state, height) {
            Some(superblock) => superblock.is_valid_superblock(
                tx,
                height,
                block_reward,
                block_time,
                self.params,
                self.subsidy,
            ),
            None => false,
        }
    }

    /// Comma-separated payee addresses of the best superblock for `height`.
    pub fn required_payments_string<S: GovernanceObjectStore>(
        &self,
        state: &GovernanceState<S>,
        height: u64,
    ) -> String {
        let Some(superblock) = self.best_superblock(state, height) else {
            debug!(target: "gobject", "required_payments_string -- can't find superblock for height {}", height);
            return "error".to_string();
        };

        let payees: Vec<String> = superblock
            .payments()
            .iter()
            .map(|payment| payment.address.to_string())
            .collect();
        if payees.is_empty() {
            "Unknown".to_string()
        } else {
            payees.join(", ")
        }
    }

    fn phase_memo<S: GovernanceObjectStore>(&self, state: &GovernanceState<S>, superblock: &Superblock) -> String {
        superblock
            .governance_object(&state.store)
            .and_then(|object| TriggerPayload::from_value(object.payload()).ok())
            .map(|payload| payload.phase_memo())
            .unwrap_or_else(|| DEFAULT_PHASE_MEMO.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::DcProposal;
    use crate::memory::{MemoryObject, MemoryObjectStore, StaticDcTally};
    use crate::trigger_manager::TriggerManager;
    use rusty_shared_types::{Address, Hash, COIN};
    use serde_json::json;

    struct FixedSubsidy(Amount);

    impl SubsidySchedule for FixedSubsidy {
        fn superblock_portion(&self, _height: u64) -> Amount {
            self.0
        }
    }

    const HEIGHT: u64 = 24_600;

    fn address(byte: u8) -> Address {
        Address::new(ChainParams::main().address_version, [byte; 20])
    }

    fn state() -> GovernanceState<MemoryObjectStore> {
        GovernanceState {
            store: MemoryObjectStore::new(),
            triggers: TriggerManager::new(),
        }
    }

    fn add_trigger(
        state: &mut GovernanceState<MemoryObjectStore>,
        height: u64,
        payee: u8,
        yes: i64,
        extra: serde_json::Value,
    ) -> Hash {
        let mut payload = json!({
            "event_block_height": height,
            "payment_addresses": format!("{}|{}", address(payee), address(payee + 1)),
            "payment_amounts": "100|50",
        });
        if let (Some(map), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
            map.extend(extra.clone());
        }
        let object = MemoryObject::trigger(payload)
            .with_funding_threshold(5)
            .with_yes_count(VoteSignal::Funding, yes);
        let hash = state.store.insert(object);
        assert!(state.triggers.add_new_trigger(hash, &state.store, &ChainParams::main()));
        hash
    }

    #[test]
    fn test_best_superblock_by_yes_count() {
        let params = ChainParams::main();
        let subsidy = FixedSubsidy(1_000 * COIN);
        let tally = StaticDcTally::new(10);
        let manager = SuperblockManager::new(&params, &subsidy, &tally);
        let mut state = state();

        add_trigger(&mut state, HEIGHT, 0x10, 3, json!({}));
        let winner = add_trigger(&mut state, HEIGHT, 0x20, 7, json!({}));
        add_trigger(&mut state, HEIGHT + 6_150, 0x30, 50, json!({}));

        let best = manager.best_superblock(&state, HEIGHT).unwrap();
        assert_eq!(best.source_object_hash(), &winner);
    }

    #[test]
    fn test_best_superblock_tie_keeps_first_in_registry_order() {
        let params = ChainParams::main();
        let subsidy = FixedSubsidy(1_000 * COIN);
        let tally = StaticDcTally::new(10);
        let manager = SuperblockManager::new(&params, &subsidy, &tally);
        let mut state = state();

        let a = add_trigger(&mut state, HEIGHT, 0x10, 4, json!({}));
        let b = add_trigger(&mut state, HEIGHT, 0x20, 4, json!({}));
        let first = if a < b { a } else { b };

        let best = manager.best_superblock(&state, HEIGHT).unwrap();
        assert_eq!(best.source_object_hash(), &first);
    }

    #[test]
    fn test_best_superblock_needs_positive_tally() {
        let params = ChainParams::main();
        let subsidy = FixedSubsidy(1_000 * COIN);
        let tally = StaticDcTally::new(10);
        let manager = SuperblockManager::new(&params, &subsidy, &tally);
        let mut state = state();

        add_trigger(&mut state, HEIGHT, 0x10, 0, json!({}));
        add_trigger(&mut state, HEIGHT, 0x20, -2, json!({}));
        assert!(manager.best_superblock(&state, HEIGHT).is_none());
        assert_eq!(manager.required_payments_string(&state, HEIGHT), "error");
        assert!(manager.create_superblock(&state, HEIGHT).is_empty());
        let tx = Transaction::new(vec![]);
        assert!(!manager.is_valid_superblock(&state, &tx, HEIGHT, 1_000 * COIN, 0));
    }

    #[test]
    fn test_is_superblock_triggered_uses_funding_flag() {
        let params = ChainParams::main();
        let subsidy = FixedSubsidy(1_000 * COIN);
        let tally = StaticDcTally::new(10);
        let manager = SuperblockManager::new(&params, &subsidy, &tally);
        let mut state = state();

        let hash = add_trigger(&mut state, HEIGHT, 0x10, 4, json!({}));
        assert!(!manager.is_superblock_triggered(&mut state, HEIGHT));

        state.store.find_object_mut(&hash).unwrap().set_yes_count(VoteSignal::Funding, 5);
        assert!(manager.is_superblock_triggered(&mut state, HEIGHT));
        // off-schedule heights are never triggered
        assert!(!manager.is_superblock_triggered(&mut state, HEIGHT + 1));
        assert!(!manager.is_superblock_triggered(&mut state, HEIGHT + 6_150));
    }

    #[test]
    fn test_dc_height_defers_to_quorum() {
        let params = ChainParams::main();
        let subsidy = FixedSubsidy(1_000 * COIN);
        let dc_height = 35_065;
        let mut tally = StaticDcTally::new(10);
        tally.insert(dc_height, DcProposal {
            votes: 9,
            object_hash: [4u8; 32],
            payment_addresses: address(1).to_string(),
            payment_amounts: "10".to_string(),
        });
        let mut state = state();

        // a funded regular trigger at a DC height does not make it a superblock
        add_trigger(&mut state, dc_height, 0x10, 50, json!({}));
        {
            let manager = SuperblockManager::new(&params, &subsidy, &tally);
            assert!(!manager.is_superblock_triggered(&mut state, dc_height));
        }

        tally.insert(dc_height, DcProposal {
            votes: 10,
            object_hash: [4u8; 32],
            payment_addresses: address(1).to_string(),
            payment_amounts: "10".to_string(),
        });
        let manager = SuperblockManager::new(&params, &subsidy, &tally);
        assert!(manager.is_dc_superblock_triggered(dc_height));
        assert!(manager.is_superblock_triggered(&mut state, dc_height));
        assert!(!manager.is_dc_superblock_triggered(dc_height + 205));
    }

    #[test]
    fn test_dc_empty_contract_is_not_triggered() {
        let params = ChainParams::main();
        let subsidy = FixedSubsidy(1_000 * COIN);
        let mut tally = StaticDcTally::new(1);
        tally.insert(35_065, DcProposal {
            votes: 100,
            object_hash: [4u8; 32],
            payment_addresses: String::new(),
            payment_amounts: "10".to_string(),
        });
        let manager = SuperblockManager::new(&params, &subsidy, &tally);
        assert!(!manager.is_dc_superblock_triggered(35_065));
    }

    #[test]
    fn test_create_superblock_attaches_memo_to_first_output() {
        let params = ChainParams::main();
        let subsidy = FixedSubsidy(1_000 * COIN);
        let tally = StaticDcTally::new(10);
        let manager = SuperblockManager::new(&params, &subsidy, &tally);
        let mut state = state();

        add_trigger(&mut state, HEIGHT, 0x10, 7, json!({ "price": "0.0031", "qtphase": 4, "sig": "<s>x</s>" }));
        let outputs = manager.create_superblock(&state, HEIGHT);

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].value, 100 * COIN);
        assert_eq!(outputs[0].script_pubkey, address(0x10).script_pubkey());
        assert_eq!(
            outputs[0].memo.as_deref(),
            Some(&b"<price>0.0031</price><qtphase>4</qtphase><s>x</s>"[..])
        );
        assert_eq!(outputs[1].value, 50 * COIN);
        assert_eq!(outputs[1].memo, None);

        // what block assembly emits is what block validation accepts
        let mut coinbase = vec![TxOutput::new(900 * COIN, address(0xEE).script_pubkey())];
        coinbase.extend(outputs);
        let tx = Transaction::new(coinbase);
        assert!(manager.is_valid_superblock(&state, &tx, HEIGHT, 1_000 * COIN, 0));
        assert!(Superblock::block_memo_data(&tx).starts_with("<price>0.0031</price>"));
    }

    #[test]
    fn test_required_payments_string() {
        let params = ChainParams::main();
        let subsidy = FixedSubsidy(1_000 * COIN);
        let tally = StaticDcTally::new(10);
        let manager = SuperblockManager::new(&params, &subsidy, &tally);
        let mut state = state();

        add_trigger(&mut state, HEIGHT, 0x10, 7, json!({}));
        assert_eq!(
            manager.required_payments_string(&state, HEIGHT),
            format!("{}, {}", address(0x10), address(0x11))
        );
    }
}
