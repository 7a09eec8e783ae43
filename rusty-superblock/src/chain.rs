//! Chain-side collaborators: block subsidy and the distributed-computing vote tally.

use rusty_shared_types::{Amount, Hash};

/// Source of the per-block amount set aside for superblocks.
pub trait SubsidySchedule {
    /// Superblock share of the block subsidy at `height`.
    fn superblock_portion(&self, height: u64) -> Amount;
}

/// Subsidy that halves every `halving_interval` blocks, with a fixed
/// percentage of each block reserved for superblocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalvingSubsidy {
    pub initial_block_reward: Amount,
    pub halving_interval: u64,
    pub superblock_percent: u64,
}

impl SubsidySchedule for HalvingSubsidy {
    fn superblock_portion(&self, height: u64) -> Amount {
        let halvings = if self.halving_interval == 0 { 0 } else { height / self.halving_interval };
        if halvings >= 64 {
            return 0;
        }
        let reward = self.initial_block_reward >> halvings;
        reward.saturating_mul(self.superblock_percent.min(100)) / 100
    }
}

/// Best-supported distributed-computing payment proposal for a height.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DcProposal {
    pub votes: i64,
    pub object_hash: Hash,
    pub payment_addresses: String,
    pub payment_amounts: String,
}

/// Vote tally of distributed-computing payment proposals.
pub trait DcProposalTally {
    fn best_dc_proposal(&self, height: u64) -> Option<DcProposal>;

    /// Votes a DC proposal needs before its superblock is required.
    fn required_quorum(&self, height: u64) -> i64;
}
