//! # Auction Candidate Orders
//!
//! Turns staking state into auction orders: filters ineligible validators,
//! disqualifies validators reusing an already-seen key, caps keys per shard
//! bucket, and computes each validator's share of total stake.

use super::eligibility::is_eligible_for_epos_auction;
use crate::domain::{
    Address, BlsPublicKey, CandidateOrder, CommitteeError, CommitteeResult, CompletedEposRound,
    Dec, ShardingInstance, SlotOrder,
};
use crate::ports::{AuctionEngine, ScheduleProvider, StakingCandidatesReader};
use primitive_types::U256;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Protocol-operated keys of an instance.
///
/// Entries that fail to parse are skipped: the set only guards against
/// candidates reusing protocol identities.
pub fn protocol_keys(instance: &ShardingInstance) -> HashSet<BlsPublicKey> {
    instance
        .hmy_accounts()
        .iter()
        .filter_map(|account| match BlsPublicKey::from_hex(&account.bls_public_key) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(
                    account = %account.address,
                    error = %e,
                    "[qc-14] Skipping unparsable protocol key"
                );
                None
            }
        })
        .collect()
}

/// Build auction orders from the current staking state.
///
/// `protocol_instance` is the sharding instance of the current block's
/// epoch; its keys seed the duplicate check.
pub fn prepare_orders<R: StakingCandidatesReader>(
    reader: &R,
    protocol_instance: &ShardingInstance,
    slots_limit: usize,
    shard_count: u32,
) -> CommitteeResult<BTreeMap<Address, SlotOrder>> {
    if shard_count == 0 {
        return Err(CommitteeError::Config("shard count must be positive".into()));
    }
    let candidates = reader.validator_candidates();
    let mut seen_keys = protocol_keys(protocol_instance);
    let mut essentials: BTreeMap<Address, SlotOrder> = BTreeMap::new();
    let mut total_staked = U256::zero();

    let block = reader.current_block();
    let state = reader
        .state_at(&block.root)
        .map_err(|e| CommitteeError::StateUnavailable {
            root: block.root,
            epoch: block.epoch,
            source: Some(e),
        })?;

    for candidate in &candidates {
        let validator = reader
            .read_validator_information_at_state(candidate, &state)
            .map_err(|source| CommitteeError::ValidatorRead {
                address: *candidate,
                source,
            })?;
        let snapshot = reader.read_validator_snapshot(candidate).map_err(|source| {
            CommitteeError::ValidatorRead {
                address: *candidate,
                source,
            }
        })?;
        if !is_eligible_for_epos_auction(&snapshot, &validator) {
            debug!(
                validator = %hex::encode(candidate),
                "[qc-14] Validator not eligible for auction"
            );
            continue;
        }

        for key in &validator.slot_pub_keys {
            key.validate().map_err(|e| CommitteeError::KeyDeserialization {
                address: validator.address,
                key: key.to_hex(),
                reason: e.to_string(),
            })?;
        }

        let mut limited = Vec::with_capacity(validator.slot_pub_keys.len());
        let mut bucket_counts = vec![0usize; shard_count as usize];
        let mut reused_key = false;
        for key in &validator.slot_pub_keys {
            if !seen_keys.insert(*key) {
                reused_key = true;
                continue;
            }
            let bucket = key.shard_bucket(shard_count) as usize;
            if slots_limit == 0 || bucket_counts[bucket] < slots_limit {
                limited.push(*key);
            }
            bucket_counts[bucket] += 1;
        }

        if reused_key {
            debug!(
                validator = %hex::encode(validator.address),
                "[qc-14] Validator disqualified for reusing a slot key"
            );
            continue;
        }

        let stake = validator.total_delegation();
        total_staked = total_staked.saturating_add(stake);
        essentials.insert(
            validator.address,
            SlotOrder {
                stake,
                spread_among: limited,
                percentage: Dec::zero(),
            },
        );
    }

    // A zero total leaves every percentage at zero
    let total = Dec::from_u256(total_staked);
    if !total.is_zero() {
        for order in essentials.values_mut() {
            order.percentage = Dec::from_u256(order.stake).quo(total).unwrap_or_default();
        }
    }

    Ok(essentials)
}

/// Run a fresh EPoS round for `epoch` against the latest staking state.
///
/// Protocol keys come from the instance of the current block's epoch; the
/// external slot budget comes from the instance of `epoch`.
pub fn new_epos_round<R, S, A>(
    epoch: u64,
    reader: &R,
    schedule: &S,
    auction: &A,
    is_extended_bound: bool,
    slots_limit: usize,
    shard_count: u32,
) -> CommitteeResult<CompletedEposRound>
where
    R: StakingCandidatesReader,
    S: ScheduleProvider + ?Sized,
    A: AuctionEngine + ?Sized,
{
    let protocol_instance = schedule.instance_for_epoch(reader.current_block().epoch);
    let orders = prepare_orders(reader, protocol_instance, slots_limit, shard_count)?;
    let max_external_slots = schedule.instance_for_epoch(epoch).external_slots_available();
    let (median, winners) = auction.apply(&orders, max_external_slots, is_extended_bound);

    let auction_candidates = orders
        .into_iter()
        .map(|(validator, slot_order)| {
            let stake_per_key = match slot_order.spread_among.len() {
                0 => U256::zero(),
                n => slot_order.stake / U256::from(n),
            };
            CandidateOrder {
                slot_order,
                stake_per_key,
                validator,
            }
        })
        .collect();

    Ok(CompletedEposRound {
        median_stake: median,
        maximum_external_slot: max_external_slots,
        auction_winners: winners,
        auction_candidates,
    })
}
