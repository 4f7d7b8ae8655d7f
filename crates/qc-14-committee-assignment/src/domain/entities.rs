//! # Domain Entities
//!
//! Validator records read from staking state, auction bookkeeping, and the
//! committee structure produced for an epoch.

use super::errors::{Address, Hash, ShardId};
use super::value_objects::{BlsPublicKey, Dec, Delegation, SigningCounters, ValidatorStatus};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

// =============================================================================
// Chain
// =============================================================================

/// Minimal block header view needed for assignment.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Block number.
    pub number: u64,
    /// Epoch the block belongs to.
    pub epoch: u64,
    /// State root after applying this block.
    #[serde_as(as = "Hex")]
    pub root: Hash,
    /// Block hash.
    #[serde_as(as = "Hex")]
    pub hash: Hash,
}

// =============================================================================
// Staking state
// =============================================================================

/// Validator record as stored in staking state.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    /// Validator address.
    #[serde_as(as = "Hex")]
    pub address: Address,
    /// Slot keys, one per committee seat the validator bids for.
    pub slot_pub_keys: Vec<BlsPublicKey>,
    /// Delegations, including the validator's self-delegation.
    pub delegations: Vec<Delegation>,
    /// Current status.
    pub status: ValidatorStatus,
    /// Last epoch in which the validator was a committee member.
    pub last_epoch_in_committee: u64,
    /// Running signing counters.
    pub counters: SigningCounters,
}

impl ValidatorRecord {
    /// Create an active validator with no committee history.
    pub fn new(address: Address, slot_pub_keys: Vec<BlsPublicKey>) -> Self {
        Self {
            address,
            slot_pub_keys,
            delegations: Vec::new(),
            status: ValidatorStatus::Active,
            last_epoch_in_committee: 0,
            counters: SigningCounters::default(),
        }
    }

    /// Builder: add a delegation.
    pub fn with_delegation(mut self, delegation: Delegation) -> Self {
        self.delegations.push(delegation);
        self
    }

    /// Builder: set status.
    pub fn with_status(mut self, status: ValidatorStatus) -> Self {
        self.status = status;
        self
    }

    /// Total delegated stake.
    pub fn total_delegation(&self) -> U256 {
        self.delegations
            .iter()
            .fold(U256::zero(), |acc, d| acc.saturating_add(d.amount))
    }
}

/// Signing counters of a validator captured at the end of an epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidatorSnapshot {
    /// Epoch the snapshot was taken in.
    pub epoch: u64,
    /// Counters as of that epoch.
    pub counters: SigningCounters,
}

// =============================================================================
// Auction
// =============================================================================

/// Auction input for one validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOrder {
    /// Total delegated stake.
    pub stake: U256,
    /// Keys the stake is spread across, after dedup and per-shard capping.
    #[serde(rename = "keys-at-auction")]
    pub spread_among: Vec<BlsPublicKey>,
    /// Share of total eligible stake, in [0, 1].
    #[serde(rename = "percentage-of-total-auction-stake")]
    pub percentage: Dec,
}

/// Auction candidate bookkeeping (diagnostics, not winners).
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateOrder {
    /// The candidate's order.
    #[serde(flatten)]
    pub slot_order: SlotOrder,
    /// Stake divided evenly across the order's keys.
    #[serde(rename = "stake-per-key")]
    pub stake_per_key: U256,
    /// Owning validator.
    #[serde_as(as = "Hex")]
    pub validator: Address,
}

/// A slot won in the auction.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPurchase {
    /// Owning validator.
    #[serde(rename = "slot-owner")]
    #[serde_as(as = "Hex")]
    pub addr: Address,
    /// Key bound to the slot.
    #[serde(rename = "bls-public-key")]
    pub key: BlsPublicKey,
    /// Stake before the auction's effective-stake clamp.
    #[serde(rename = "raw-stake")]
    pub raw_stake: Dec,
    /// Stake after the clamp.
    #[serde(rename = "eposed-stake")]
    pub epos_stake: Dec,
}

/// Outcome of one EPoS auction round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedEposRound {
    /// Median raw stake among winners.
    #[serde(rename = "epos-median-stake")]
    pub median_stake: Dec,
    /// Slot budget available to external validators.
    #[serde(rename = "max-external-slots")]
    pub maximum_external_slot: usize,
    /// Winning slots, in award order.
    #[serde(rename = "epos-slot-winners")]
    pub auction_winners: Vec<SlotPurchase>,
    /// All orders that entered the auction, by ascending address.
    #[serde(rename = "epos-slot-candidates")]
    pub auction_candidates: Vec<CandidateOrder>,
}

// =============================================================================
// Committees
// =============================================================================

/// A committee seat.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Owner address.
    #[serde(rename = "ecdsa-address")]
    #[serde_as(as = "Hex")]
    pub address: Address,
    /// Key bound to the seat.
    #[serde(rename = "bls-pubkey")]
    pub bls_key: BlsPublicKey,
    /// Effective stake; absent for protocol-operated seats.
    #[serde(rename = "effective-stake", skip_serializing_if = "Option::is_none", default)]
    pub effective_stake: Option<Dec>,
    /// Raw stake; absent for protocol-operated seats.
    #[serde(rename = "raw-stake", skip_serializing_if = "Option::is_none", default)]
    pub raw_stake: Option<Dec>,
}

impl Slot {
    /// Protocol-operated seat without stake.
    pub fn protocol(address: Address, bls_key: BlsPublicKey) -> Self {
        Self {
            address,
            bls_key,
            effective_stake: None,
            raw_stake: None,
        }
    }

    /// Seat won in the auction.
    pub fn purchased(purchase: &SlotPurchase) -> Self {
        Self {
            address: purchase.addr,
            bls_key: purchase.key,
            effective_stake: Some(purchase.epos_stake),
            raw_stake: Some(purchase.raw_stake),
        }
    }
}

/// Slots assigned to one shard for one epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committee {
    /// Shard served by this committee.
    #[serde(rename = "shard-id")]
    pub shard_id: ShardId,
    /// Seats, in insertion order.
    #[serde(rename = "subcommittee")]
    pub slots: Vec<Slot>,
}

impl Committee {
    /// Empty committee for a shard.
    pub fn new(shard_id: ShardId) -> Self {
        Self {
            shard_id,
            slots: Vec::new(),
        }
    }

    /// Sum of raw stake; seats without raw stake count as zero.
    pub fn raw_stake(&self) -> Dec {
        self.slots.iter().filter_map(|s| s.raw_stake).sum()
    }
}

/// Committees for every shard of an epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShardState {
    /// Epoch; absent for pre-staking and shard-reduction states.
    pub epoch: Option<u64>,
    /// One committee per shard, ordered by shard id.
    pub shards: Vec<Committee>,
}

impl ShardState {
    /// Create a shard state.
    pub fn new(epoch: Option<u64>, shards: Vec<Committee>) -> Self {
        Self { epoch, shards }
    }

    /// Committee for a shard.
    pub fn committee(&self, shard_id: ShardId) -> Option<&Committee> {
        self.shards.iter().find(|c| c.shard_id == shard_id)
    }

    /// Total number of seats across all shards.
    pub fn total_slots(&self) -> usize {
        self.shards.iter().map(|c| c.slots.len()).sum()
    }

    /// Iterate over every slot key, shard by shard.
    pub fn bls_keys(&self) -> impl Iterator<Item = &BlsPublicKey> {
        self.shards
            .iter()
            .flat_map(|c| c.slots.iter().map(|s| &s.bls_key))
    }
}
