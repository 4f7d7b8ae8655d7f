//! # Effective-Stake Auction
//!
//! Reference [`AuctionEngine`]: splits each order's stake evenly over its
//! keys, awards slots to the highest per-key stake, and clamps each
//! winner's effective stake to a band around the winners' median.

use crate::domain::{
    Address, Dec, SlotOrder, SlotPurchase, EPOS_BOUND35_PERCENT, EPOS_BOUND_PERCENT,
};
use crate::ports::AuctionEngine;
use std::collections::BTreeMap;

/// Median-clamped effective-stake auction.
#[derive(Clone, Copy, Debug, Default)]
pub struct EffectiveStakeAuction;

impl AuctionEngine for EffectiveStakeAuction {
    fn apply(
        &self,
        orders: &BTreeMap<Address, SlotOrder>,
        max_slots: usize,
        extended_bound: bool,
    ) -> (Dec, Vec<SlotPurchase>) {
        let (median, mut picks) = compute(orders, max_slots);
        let bound = if extended_bound {
            Dec::with_prec(EPOS_BOUND35_PERCENT, 2)
        } else {
            Dec::with_prec(EPOS_BOUND_PERCENT, 2)
        };
        let upper = (Dec::one() + bound) * median;
        let lower = (Dec::one() - bound) * median;
        for pick in &mut picks {
            pick.epos_stake = effective_stake(lower, upper, pick.raw_stake);
        }
        (median, picks)
    }
}

/// Expand orders into per-key purchases and take the best `pull` of them.
///
/// Returns the median raw stake of the picks alongside the picks.
pub fn compute(orders: &BTreeMap<Address, SlotOrder>, pull: usize) -> (Dec, Vec<SlotPurchase>) {
    let mut slots = Vec::new();
    for (addr, order) in orders {
        let Some(spread) = Dec::from_u256(order.stake).quo_int(order.spread_among.len() as u64)
        else {
            continue;
        };
        for key in &order.spread_among {
            slots.push(SlotPurchase {
                addr: *addr,
                key: *key,
                raw_stake: spread,
                epos_stake: spread,
            });
        }
    }

    // Highest stake first, ties by key bytes
    slots.sort_by(|a, b| b.raw_stake.cmp(&a.raw_stake).then_with(|| a.key.cmp(&b.key)));
    slots.truncate(pull);

    (median(&slots), slots)
}

/// Median raw stake; mean of the two middle values for an even count.
pub fn median(purchases: &[SlotPurchase]) -> Dec {
    if purchases.is_empty() {
        return Dec::zero();
    }
    let mut stakes: Vec<Dec> = purchases.iter().map(|p| p.raw_stake).collect();
    stakes.sort();
    let len = stakes.len();
    if len % 2 == 0 {
        (stakes[len / 2 - 1] + stakes[len / 2])
            .quo_int(2)
            .unwrap_or_default()
    } else {
        stakes[len / 2]
    }
}

fn effective_stake(lower: Dec, upper: Dec, actual: Dec) -> Dec {
    actual.clamp(lower, upper)
}
