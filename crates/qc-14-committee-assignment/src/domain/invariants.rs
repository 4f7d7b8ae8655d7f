//! # Domain Invariants
//!
//! Rules every elected shard state must satisfy.

use super::entities::{ShardState, SlotOrder};
use super::errors::{Address, CommitteeError, CommitteeResult};
use super::value_objects::Dec;
use std::collections::{BTreeMap, HashSet};

/// One slot in `RESHARD_DIVISOR` (5%) leaves each high-stake shard per epoch.
pub const RESHARD_DIVISOR: usize = 20;

/// Effective-stake clamp around the median.
pub const EPOS_BOUND_PERCENT: u64 = 15;

/// Widened effective-stake clamp.
pub const EPOS_BOUND35_PERCENT: u64 = 35;

/// Invariant: a BLS key occupies at most one slot.
pub fn invariant_unique_bls_keys(state: &ShardState) -> CommitteeResult<()> {
    let mut seen = HashSet::with_capacity(state.total_slots());
    for key in state.bls_keys() {
        if !seen.insert(key) {
            return Err(CommitteeError::DuplicateSlotKey { key: key.to_hex() });
        }
    }
    Ok(())
}

/// Invariant: shard ids are unique and below `shard_count`.
pub fn invariant_shard_ids(state: &ShardState, shard_count: u32) -> CommitteeResult<()> {
    let mut seen = HashSet::with_capacity(state.shards.len());
    for committee in &state.shards {
        if committee.shard_id >= shard_count {
            return Err(CommitteeError::UnknownShard {
                shard_id: committee.shard_id,
                shard_count,
            });
        }
        if !seen.insert(committee.shard_id) {
            return Err(CommitteeError::Config(format!(
                "duplicate committee for shard {}",
                committee.shard_id
            )));
        }
    }
    Ok(())
}

/// Invariant: order percentages sum to one within `epsilon` when any stake
/// was placed, and are all zero otherwise.
pub fn invariant_percentage_sum(orders: &BTreeMap<Address, SlotOrder>, epsilon: Dec) -> bool {
    let staked = orders.values().any(|o| !o.stake.is_zero());
    let sum: Dec = orders.values().map(|o| o.percentage).sum();
    if staked {
        sum.abs_diff(Dec::one()) <= epsilon
    } else {
        sum.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlsPublicKey, Committee, Slot};
    use primitive_types::U256;

    fn slot(b: u8) -> Slot {
        Slot::protocol([b; 20], BlsPublicKey([b; 48]))
    }

    fn committee(shard_id: u32, keys: &[u8]) -> Committee {
        Committee {
            shard_id,
            slots: keys.iter().map(|b| slot(*b)).collect(),
        }
    }

    #[test]
    fn test_unique_keys_pass() {
        let state = ShardState::new(Some(1), vec![committee(0, &[1, 2]), committee(1, &[3])]);
        assert!(invariant_unique_bls_keys(&state).is_ok());
    }

    #[test]
    fn test_unique_keys_across_shards_fail() {
        let state = ShardState::new(Some(1), vec![committee(0, &[1, 2]), committee(1, &[2])]);
        assert!(matches!(
            invariant_unique_bls_keys(&state),
            Err(CommitteeError::DuplicateSlotKey { .. })
        ));
    }

    #[test]
    fn test_shard_ids() {
        let ok = ShardState::new(None, vec![committee(0, &[]), committee(1, &[])]);
        assert!(invariant_shard_ids(&ok, 2).is_ok());

        let out_of_range = ShardState::new(None, vec![committee(0, &[]), committee(2, &[])]);
        assert!(matches!(
            invariant_shard_ids(&out_of_range, 2),
            Err(CommitteeError::UnknownShard { shard_id: 2, .. })
        ));

        let duplicate = ShardState::new(None, vec![committee(1, &[]), committee(1, &[])]);
        assert!(invariant_shard_ids(&duplicate, 2).is_err());
    }

    #[test]
    fn test_percentage_sum() {
        let mut orders = BTreeMap::new();
        orders.insert(
            [1u8; 20],
            SlotOrder {
                stake: U256::from(1),
                spread_among: vec![],
                percentage: "0.25".parse().unwrap(),
            },
        );
        orders.insert(
            [2u8; 20],
            SlotOrder {
                stake: U256::from(3),
                spread_among: vec![],
                percentage: "0.75".parse().unwrap(),
            },
        );
        assert!(invariant_percentage_sum(&orders, Dec::zero()));

        orders.get_mut(&[2u8; 20]).unwrap().percentage = "0.7".parse().unwrap();
        assert!(!invariant_percentage_sum(&orders, Dec::with_prec(1, 12)));
    }
}
