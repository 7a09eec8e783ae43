use serde::{Deserialize, Serialize};

pub mod address;
pub mod amount;
pub mod params;

pub use address::{Address, AddressError};
pub use amount::{format_money, money_range, parse_fixed_point, Amount, AmountError, COIN, MAX_MONEY};
pub use params::{ChainParams, HeightWindow, Network, ParamsError};

pub type Hash = [u8; 32];
pub type PubKeyHash = [u8; 20];

/// Standard P2PKH opcodes.
const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xA9;
const OP_PUSH20: u8 = 0x14;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xAC;

/// Builds the standard pay-to-public-key-hash locking script for `hash`.
pub fn p2pkh_script(hash: &PubKeyHash) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.extend_from_slice(&[OP_DUP, OP_HASH160, OP_PUSH20]);
    script.extend_from_slice(hash);
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}

/// Represents a transaction output, specifying a value and a locking script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// The value of the output in base units.
    pub value: Amount,
    /// The locking script (scriptPubKey) that defines the conditions for spending this output.
    pub script_pubkey: Vec<u8>,
    /// Optional memo field for arbitrary data attached to the output.
    pub memo: Option<Vec<u8>>,
}

impl TxOutput {
    /// Creates a new `TxOutput` without a memo.
    ///
    /// # Arguments
    /// * `value` - The value of the output in base units
    /// * `script_pubkey` - The locking script that defines spending conditions
    pub fn new(value: Amount, script_pubkey: Vec<u8>) -> Self {
        TxOutput { value, script_pubkey, memo: None }
    }

    /// Creates a new `TxOutput` with a memo field.
    pub fn new_with_memo(value: Amount, script_pubkey: Vec<u8>, memo: Option<Vec<u8>>) -> Self {
        TxOutput { value, script_pubkey, memo }
    }

    /// Extracts the public key hash from a P2PKH script, if applicable.
    pub fn extract_public_key_hash(&self) -> Option<PubKeyHash> {
        extract_public_key_hash(&self.script_pubkey)
    }
}

/// Extracts the public key hash from a raw P2PKH locking script.
pub fn extract_public_key_hash(script: &[u8]) -> Option<PubKeyHash> {
    // P2PKH script: OP_DUP OP_HASH160 <20-byte-hash> OP_EQUALVERIFY OP_CHECKSIG
    if script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == OP_PUSH20
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
    {
        let mut public_key_hash = [0u8; 20];
        public_key_hash.copy_from_slice(&script[3..23]);
        Some(public_key_hash)
    } else {
        None
    }
}

/// A coinbase-like transaction as seen by block assembly and block validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The version of the transaction format.
    pub version: u32,
    /// A list of transaction outputs, in serialization order.
    pub outputs: Vec<TxOutput>,
    /// The lock time of the transaction.
    pub lock_time: u32,
}

impl Transaction {
    pub fn new(outputs: Vec<TxOutput>) -> Self {
        Transaction { version: 1, outputs, lock_time: 0 }
    }

    /// Total value paid out by the transaction, or `None` on overflow.
    pub fn value_out(&self) -> Option<Amount> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, output| acc.checked_add(output.value))
    }

    /// BLAKE3 hash of the canonical bincode encoding.
    pub fn txid(&self) -> Hash {
        match bincode::serialize(self) {
            Ok(bytes) => blake3::hash(&bytes).into(),
            Err(_) => [0u8; 32], // Should never happen for in-memory transactions
        }
    }
}
