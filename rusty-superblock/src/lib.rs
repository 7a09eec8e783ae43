//! Rusty Coin Superblock Governance
//!
//! This crate turns funded governance trigger objects into superblocks: the
//! periodic blocks whose coinbase pays a voted treasury schedule. It covers
//! height classification, payment schedule parsing, the trigger registry,
//! block assembly and block validation.

pub mod chain;
pub mod error;
pub mod governance;
pub mod heights;
pub mod log_throttle;
pub mod memory;
pub mod object;
pub mod payload;
pub mod schedule;
pub mod superblock;
pub mod superblock_manager;
pub mod trigger_manager;

pub use chain::{DcProposal, DcProposalTally, HalvingSubsidy, SubsidySchedule};
pub use error::SuperblockError;
pub use governance::{Governance, GovernanceState};
pub use heights::{is_dc_superblock, is_podc_enabled, is_pog_superblock, is_valid_block_height, payments_limit};
pub use memory::{MemoryObject, MemoryObjectStore, StaticDcTally};
pub use object::{GovernanceObject, GovernanceObjectStore, GovernanceObjectType, VoteSignal};
pub use payload::{TriggerPayload, DEFAULT_PHASE_MEMO};
pub use schedule::{parse_payment_schedule, GovernancePayment};
pub use superblock::{Superblock, SuperblockStatus};
pub use superblock_manager::SuperblockManager;
pub use trigger_manager::TriggerManager;

// Re-export commonly used types
pub use rusty_shared_types::{Address, Amount, ChainParams, Hash, Transaction, TxOutput, COIN};
