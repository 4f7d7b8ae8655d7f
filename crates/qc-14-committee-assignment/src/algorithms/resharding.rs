//! # Resharding
//!
//! Moves a few slots from the higher-staked half of the shards to the
//! lower-staked half after winners are placed.
//!
//! Each high shard gives up `len / 20` slots (at least one when it holds
//! more than one). Draws come from [`XorshiftPseudorandom`] seeded with the
//! epoch, so the moves are reproducible.

use super::pseudorandom::XorshiftPseudorandom;
use crate::domain::{Committee, Dec, RESHARD_DIVISOR};
use tracing::debug;

/// Rebalance committees for `epoch`.
///
/// The destination of each moved slot is drawn over the number of shards in
/// the lower half and used directly as a committee index.
pub fn rebalance(mut committees: Vec<Committee>, epoch: u64) -> Vec<Committee> {
    let mut ranked: Vec<(usize, Dec)> = committees
        .iter()
        .enumerate()
        .map(|(i, c)| (i, c.raw_stake()))
        .collect();
    // Highest stake first, ties by higher shard index
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    let (highest, lowest) = ranked.split_at(ranked.len() / 2);
    let lowest_count = lowest.len() as u32;
    let mut rnd = XorshiftPseudorandom::for_epoch(epoch);

    for &(source, _) in highest {
        let len = committees[source].slots.len();
        let mut moves = len / RESHARD_DIVISOR;
        if moves == 0 {
            if len > 1 {
                moves = 1;
            } else {
                continue;
            }
        }
        for _ in 0..moves {
            let n = rnd.uint32n(committees[source].slots.len() as u32) as usize;
            let slot = committees[source].slots.remove(n);
            let target = rnd.uint32n(lowest_count) as usize;
            debug!(
                from = source,
                to = target,
                key = %slot.bls_key,
                "[qc-14] Resharding slot"
            );
            committees[target].slots.push(slot);
        }
    }

    committees
}
