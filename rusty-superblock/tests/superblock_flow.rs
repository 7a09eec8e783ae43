use rusty_superblock::{
    Address, ChainParams, DcProposal, Governance, GovernanceObjectStore, HalvingSubsidy, MemoryObject,
    MemoryObjectStore, StaticDcTally, SuperblockManager, SuperblockStatus, Transaction, TxOutput, VoteSignal, COIN,
};
use serde_json::json;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn regtest_subsidy() -> HalvingSubsidy {
    HalvingSubsidy {
        initial_block_reward: 50 * COIN,
        halving_interval: 150,
        superblock_percent: 10,
    }
}

fn payee(params: &ChainParams, byte: u8) -> Address {
    Address::new(params.address_version, [byte; 20])
}

fn funded_trigger(params: &ChainParams, height: u64, payees: &[u8], amounts: &str, yes: i64) -> MemoryObject {
    let addresses: Vec<String> = payees.iter().map(|b| payee(params, *b).to_string()).collect();
    MemoryObject::trigger(json!({
        "event_block_height": height,
        "payment_addresses": addresses.join("|"),
        "payment_amounts": amounts,
        "price": "0.0125",
        "qtphase": "-1.00",
    }))
    .with_funding_threshold(3)
    .with_yes_count(VoteSignal::Funding, yes)
}

#[test]
fn test_regtest_superblock_lifecycle() {
    init_logger();
    let params = ChainParams::regtest();
    let subsidy = regtest_subsidy();
    let tally = StaticDcTally::new(1);

    let mut store = MemoryObjectStore::new();
    let weak = store.insert(funded_trigger(&params, 200, &[0x01], "1", 2));
    let strong = store.insert(funded_trigger(&params, 200, &[0x02, 0x03], "5|2.5", 4));
    let later = store.insert(funded_trigger(&params, 300, &[0x04], "1", 9));
    let governance = Governance::new(params.clone(), store);

    for hash in [weak, strong, later] {
        assert!(governance.add_new_trigger(hash));
    }

    let manager = SuperblockManager::new(governance.params(), &subsidy, &tally);
    {
        let mut state = governance.lock();
        assert!(manager.is_superblock_triggered(&mut state, 200));
        assert!(!manager.is_superblock_triggered(&mut state, 250));

        let best = manager.best_superblock(&state, 200).unwrap();
        assert_eq!(best.source_object_hash(), &strong);
        assert_eq!(best.status(), SuperblockStatus::Valid);
        assert_eq!(
            manager.required_payments_string(&state, 200),
            format!("{}, {}", payee(&params, 0x02), payee(&params, 0x03))
        );

        // block assembly
        let payments = manager.create_superblock(&state, 200);
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[1].value, 250_000_000);

        let mut outputs = vec![TxOutput::new(3 * COIN, payee(&params, 0x99).script_pubkey())];
        outputs.extend(payments.iter().cloned());
        let coinbase = Transaction::new(outputs);
        assert!(manager.is_valid_superblock(&state, &coinbase, 200, 5 * COIN, 1_700_000_000));
        assert_eq!(
            payments[0].memo.as_deref(),
            Some(&b"<price>0.0125</price><qtphase>-1.00</qtphase>"[..])
        );

        // a miner taking too much is rejected
        let mut greedy = coinbase.clone();
        greedy.outputs[0].value = 6 * COIN;
        assert!(!manager.is_valid_superblock(&state, &greedy, 200, 5 * COIN, 1_700_000_000));

        // payments in the wrong order are rejected
        let mut reordered = vec![coinbase.outputs[0].clone()];
        reordered.push(payments[1].clone());
        reordered.push(payments[0].clone());
        assert!(!manager.is_valid_superblock(&state, &Transaction::new(reordered), 200, 5 * COIN, 0));

        // the coinbase does not pay the superblock scheduled for another height
        assert!(!manager.is_valid_superblock(&state, &coinbase, 300, 5 * COIN, 0));
    }

    let expiry = 200 + params.trigger_expiration_blocks;
    governance.clean_and_remove(expiry + 1, 1_700_000_500);

    let state = governance.lock();
    assert!(!state.triggers.contains(&weak));
    assert!(!state.triggers.contains(&strong));
    assert!(state.triggers.contains(&later));
    assert!(state.store.find_object(&strong).unwrap().is_expired());
    assert_eq!(state.store.find_object(&strong).unwrap().deletion_time(), Some(1_700_000_500));
    assert!(manager.best_superblock(&state, 200).is_none());
}

#[test]
fn test_payments_over_limit_are_rejected() {
    init_logger();
    let params = ChainParams::regtest();
    // 5 COIN per block for superblocks, 100 block cycle
    let subsidy = regtest_subsidy();
    let tally = StaticDcTally::new(1);

    let mut store = MemoryObjectStore::new();
    let hash = store.insert(funded_trigger(&params, 100, &[0x01], "500.00000001", 5));
    let governance = Governance::new(params.clone(), store);
    assert!(governance.add_new_trigger(hash));

    let manager = SuperblockManager::new(governance.params(), &subsidy, &tally);
    let state = governance.lock();
    let payments = manager.create_superblock(&state, 100);
    assert_eq!(payments.len(), 1);
    let coinbase = Transaction::new(payments);
    assert!(!manager.is_valid_superblock(&state, &coinbase, 100, 50 * COIN, 0));
}

#[test]
fn test_dc_superblock_needs_quorum() {
    init_logger();
    let params = ChainParams::regtest();
    let subsidy = regtest_subsidy();
    let mut tally = StaticDcTally::new(3);
    tally.insert(110, DcProposal {
        votes: 2,
        object_hash: [7u8; 32],
        payment_addresses: payee(&params, 0x05).to_string(),
        payment_amounts: "1".to_string(),
    });
    let governance = Governance::new(params.clone(), MemoryObjectStore::new());

    {
        let manager = SuperblockManager::new(governance.params(), &subsidy, &tally);
        let mut state = governance.lock();
        assert!(!manager.is_superblock_triggered(&mut state, 110));
    }

    tally.insert(110, DcProposal {
        votes: 3,
        object_hash: [7u8; 32],
        payment_addresses: payee(&params, 0x05).to_string(),
        payment_amounts: "1".to_string(),
    });
    let manager = SuperblockManager::new(governance.params(), &subsidy, &tally);
    let mut state = governance.lock();
    assert!(manager.is_superblock_triggered(&mut state, 110));
    // no trigger object is registered for the DC height, so nothing is emitted
    assert!(manager.create_superblock(&state, 110).is_empty());
}

#[test]
fn test_params_from_json() {
    init_logger();
    let json = serde_json::to_string(&ChainParams::regtest()).unwrap();
    let params = ChainParams::from_json(&json).unwrap();
    assert_eq!(params, ChainParams::regtest());

    let mut broken = ChainParams::regtest();
    broken.superblock_cycle = 0;
    let json = serde_json::to_string(&broken).unwrap();
    assert!(ChainParams::from_json(&json).is_err());
}
