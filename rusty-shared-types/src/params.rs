//! Network parameters consumed by the superblock subsystem.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::{Amount, COIN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Main,
    Testnet,
    Regtest,
}

/// An exclusive height window: `start < height < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightWindow {
    pub start: u64,
    pub end: u64,
}

impl HeightWindow {
    pub const fn new(start: u64, end: u64) -> Self {
        HeightWindow { start, end }
    }

    pub fn contains(&self, height: u64) -> bool {
        height > self.start && height < self.end
    }
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("superblock cycle must be non-zero")]
    ZeroSuperblockCycle,
    #[error("DC superblock cycle {0} must be greater than 20")]
    DcCycleTooShort(u64),
    #[error("superblock cycle {superblock_cycle} is not a multiple of DC cycle {dc_cycle}")]
    OverlappingCycles { superblock_cycle: u64, dc_cycle: u64 },
    #[error("regular superblock height {0} is also a DC superblock height before the phase cutover")]
    PreCutoverOverlap(u64),
    #[error("failed to decode chain parameters: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Consensus parameters of the governance superblock schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub network: Network,
    /// Version byte of pay-to-pubkey-hash addresses on this network
    pub address_version: u8,
    /// First height at which regular superblocks may occur
    pub superblock_start_height: u64,
    /// Regular superblock cycle length (in blocks)
    pub superblock_cycle: u64,
    /// First height at which distributed-computing superblocks may occur
    pub dc_superblock_start_height: u64,
    /// Distributed-computing superblock cycle length (in blocks)
    pub dc_superblock_cycle: u64,
    /// The distributed-computing feature is enabled strictly above this height
    pub podc_cutover_height: u64,
    /// Above this height DC superblocks sit at residue 10 of the DC cycle instead of 0
    pub dc_phase_cutover_height: u64,
    /// Heights of the legacy proof-of-giving track
    pub pog_window: HeightWindow,
    /// Blocks after its target height before a trigger expires
    pub trigger_expiration_blocks: u64,
    /// No payments are allowed below this height
    pub min_payments_limit_height: u64,
    /// DC superblocks inside this window get a 1.75x budget
    pub dc_budget_boost_window: HeightWindow,
    /// Above this height the payments limit is capped at `payments_cap`
    pub payments_cap_height: u64,
    pub payments_cap: Amount,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::main()
    }
}

impl ChainParams {
    pub fn main() -> Self {
        Self {
            network: Network::Main,
            address_version: 0x19,
            superblock_start_height: 21_710,
            superblock_cycle: 6_150, // 30 days of 205 blocks
            dc_superblock_start_height: 21_710,
            dc_superblock_cycle: 205, // daily
            podc_cutover_height: 33_440,
            dc_phase_cutover_height: 35_000,
            pog_window: HeightWindow::new(100_001, 166_000),
            trigger_expiration_blocks: 576,
            min_payments_limit_height: 10,
            dc_budget_boost_window: HeightWindow::new(106_150, 107_001),
            payments_cap_height: 107_000,
            payments_cap: 13_500_000 * COIN,
        }
    }

    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            address_version: 0x8c,
            superblock_start_height: 1_000,
            superblock_cycle: 400,
            dc_superblock_start_height: 1_000,
            dc_superblock_cycle: 40,
            podc_cutover_height: 1_100,
            // before the first regular superblock with PODC enabled (1_200)
            dc_phase_cutover_height: 1_150,
            pog_window: HeightWindow::new(7_000, 20_000),
            ..Self::main()
        }
    }

    pub fn regtest() -> Self {
        Self {
            network: Network::Regtest,
            address_version: 0x6f,
            superblock_start_height: 100,
            superblock_cycle: 100,
            dc_superblock_start_height: 100,
            dc_superblock_cycle: 50,
            podc_cutover_height: 0,
            dc_phase_cutover_height: 0,
            pog_window: HeightWindow::new(0, 0),
            trigger_expiration_blocks: 24,
            ..Self::main()
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self::main(),
            Network::Testnet => Self::testnet(),
            Network::Regtest => Self::regtest(),
        }
    }

    /// Loads and validates parameters from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ParamsError> {
        let params: ChainParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Checks that the regular and DC schedules can never claim the same height.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.superblock_cycle == 0 {
            return Err(ParamsError::ZeroSuperblockCycle);
        }
        if self.dc_superblock_cycle <= 20 {
            return Err(ParamsError::DcCycleTooShort(self.dc_superblock_cycle));
        }
        if self.superblock_cycle % self.dc_superblock_cycle != 0 {
            return Err(ParamsError::OverlappingCycles {
                superblock_cycle: self.superblock_cycle,
                dc_cycle: self.dc_superblock_cycle,
            });
        }
        // Before the phase cutover DC superblocks sit at residue 0, which every
        // regular height shares. No regular height may fall in that window.
        let first_shared = self
            .podc_cutover_height
            .saturating_add(1)
            .max(self.superblock_start_height)
            .max(self.dc_superblock_start_height);
        let first_regular = first_shared
            .div_ceil(self.superblock_cycle)
            .saturating_mul(self.superblock_cycle);
        if first_regular <= self.dc_phase_cutover_height {
            return Err(ParamsError::PreCutoverOverlap(first_regular));
        }
        Ok(())
    }
}
