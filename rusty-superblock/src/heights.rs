//! Height classification and the superblock payment ceiling.
//!
//! Every function here is a pure function of the height and the chain
//! parameters so that all nodes reach the same verdict.

use log::debug;
use rusty_shared_types::{format_money, Amount, ChainParams};

use crate::chain::SubsidySchedule;

/// Residue of the DC cycle used by the legacy proof-of-giving track.
const POG_RESIDUE: u64 = 20;
/// Residue of the DC cycle used by DC superblocks after the phase cutover.
const DC_RESIDUE_AFTER_CUTOVER: u64 = 10;

/// Is the distributed-computing feature active at `height`?
pub fn is_podc_enabled(params: &ChainParams, height: u64) -> bool {
    height > params.podc_cutover_height
}

/// Can a regular superblock occur at `height`?
pub fn is_valid_block_height(params: &ChainParams, height: u64) -> bool {
    params.superblock_cycle != 0
        && height >= params.superblock_start_height
        && height % params.superblock_cycle == 0
}

/// Is `height` a distributed-computing superblock height?
pub fn is_dc_superblock(params: &ChainParams, height: u64) -> bool {
    if !is_podc_enabled(params, height) || params.dc_superblock_cycle == 0 {
        return false;
    }
    let residue = if height > params.dc_phase_cutover_height {
        DC_RESIDUE_AFTER_CUTOVER
    } else {
        0
    };
    height >= params.dc_superblock_start_height && height % params.dc_superblock_cycle == residue
}

/// Is `height` a legacy proof-of-giving superblock height?
pub fn is_pog_superblock(params: &ChainParams, height: u64) -> bool {
    params.pog_window.contains(height)
        && params.dc_superblock_cycle != 0
        && height >= params.dc_superblock_start_height
        && height % params.dc_superblock_cycle == POG_RESIDUE
}

/// Maximum total a superblock at `height` may pay out.
///
/// Zero below the minimum height and off schedule. Otherwise the superblock
/// share of the subsidy times the cycle length, boosted by 1.75x for DC
/// superblocks inside the boost window and capped above the cap height.
pub fn payments_limit(params: &ChainParams, subsidy: &dyn SubsidySchedule, height: u64) -> Amount {
    if height < params.min_payments_limit_height {
        return 0;
    }
    let regular = is_valid_block_height(params, height);
    let dc = is_dc_superblock(params, height);
    if !regular && !dc {
        return 0;
    }

    let cycle = if regular { params.superblock_cycle } else { params.dc_superblock_cycle };
    let mut limit = subsidy.superblock_portion(height).saturating_mul(cycle);

    if dc && params.dc_budget_boost_window.contains(height) {
        limit = limit.saturating_mul(7) / 4;
    }
    if height > params.payments_cap_height && limit > params.payments_cap {
        limit = params.payments_cap;
    }

    debug!(target: "gobject", "payments_limit -- valid superblock height {}, payments max {}",
           height, format_money(limit));
    limit
}
