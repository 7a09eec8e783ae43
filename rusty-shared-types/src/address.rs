//! Network address encoding.
//!
//! An address is the hex encoding of `version || pubkey_hash || checksum`,
//! where the checksum is the first four bytes of the BLAKE3 hash of the
//! version byte and the public key hash.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{extract_public_key_hash, p2pkh_script, PubKeyHash};

const PAYLOAD_LEN: usize = 21;
const CHECKSUM_LEN: usize = 4;
const ENCODED_LEN: usize = PAYLOAD_LEN + CHECKSUM_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("expected {expected} hex characters, got {actual}")]
    BadLength { expected: usize, actual: usize },
    #[error("address is not valid hex")]
    BadHex,
    #[error("address checksum mismatch")]
    BadChecksum,
    #[error("address version {actual:#04x} does not belong to this network (expected {expected:#04x})")]
    WrongNetwork { expected: u8, actual: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    version: u8,
    hash: PubKeyHash,
}

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = blake3::hash(payload);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest.as_bytes()[..CHECKSUM_LEN]);
    out
}

impl Address {
    pub fn new(version: u8, hash: PubKeyHash) -> Self {
        Address { version, hash }
    }

    /// Decodes and validates an address for the network using `version`.
    pub fn parse(encoded: &str, version: u8) -> Result<Self, AddressError> {
        if encoded.len() != ENCODED_LEN * 2 {
            return Err(AddressError::BadLength {
                expected: ENCODED_LEN * 2,
                actual: encoded.len(),
            });
        }
        let raw = hex::decode(encoded).map_err(|_| AddressError::BadHex)?;
        let (payload, check) = raw.split_at(PAYLOAD_LEN);
        if checksum(payload).as_slice() != check {
            return Err(AddressError::BadChecksum);
        }
        if payload[0] != version {
            return Err(AddressError::WrongNetwork { expected: version, actual: payload[0] });
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);
        Ok(Address { version, hash })
    }

    /// Recovers the address paid by a standard P2PKH script.
    pub fn from_script(script: &[u8], version: u8) -> Option<Self> {
        extract_public_key_hash(script).map(|hash| Address { version, hash })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn pubkey_hash(&self) -> &PubKeyHash {
        &self.hash
    }

    pub fn script_pubkey(&self) -> Vec<u8> {
        p2pkh_script(&self.hash)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = Vec::with_capacity(ENCODED_LEN);
        raw.push(self.version);
        raw.extend_from_slice(&self.hash);
        let check = checksum(&raw);
        raw.extend_from_slice(&check);
        write!(f, "{}", hex::encode(raw))
    }
}
