//! # QC-14 Committee Assignment
//!
//! Epoch committee assignment for the sharded chain.
//!
//! **Subsystem ID:** 14
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Decide which validator keys sit on which shard's committee for an epoch:
//! - Eligibility filter over signing availability and status
//! - Effective proof-of-stake (EPoS) auction for external seats
//! - Protocol-operated seats placed first, winners by `key mod shard_count`
//! - Deterministic resharding from high-stake to low-stake shards
//!
//! Every node computes the same result for the same epoch and chain state.
//! Candidate maps are ordered, arithmetic is fixed-point, and the resharding
//! generator is seeded from the epoch.
//!
//! ## Fallbacks
//!
//! | Situation | Result |
//! |-----------|--------|
//! | No reader, or staking not active | Pre-staking slate, no epoch |
//! | Epoch before current header | `ComputeForEpochInPast` |
//! | No winners, testnet shard count change | New committees, no epoch |
//! | No winners otherwise | Previous epoch's state, unchanged |
//!
//! ## Module Structure
//!
//! ```text
//! qc-14-committee-assignment/
//! ├── domain/          # Keys, Dec, committees, config, errors, invariants
//! ├── algorithms/      # Eligibility, orders, auction, placement, resharding
//! ├── ports/           # API traits + dependency traits
//! ├── adapters/        # In-memory chain
//! └── service.rs       # CommitteeComputer
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_14_committee_assignment::{CommitteeComputer, CommitteeConfig, EpochSchedule};
//! use qc_14_committee_assignment::ValidatorListProvider;
//!
//! let schedule = Arc::new(EpochSchedule::from_json(&json)?);
//! let computer = CommitteeComputer::new(schedule, CommitteeConfig::from_env());
//! let state = computer.compute(epoch, Some(&chain))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(test)]
mod test_utils;

// Re-exports
pub use adapters::InMemoryChain;
pub use algorithms::{
    assign_shards, compute_current_signing, is_eligible_for_epos_auction, new_epos_round,
    pre_staking_committee, prepare_orders, rebalance, ComputedSigning, EffectiveStakeAuction,
    XorshiftPseudorandom,
};
pub use domain::{
    invariant_percentage_sum, invariant_shard_ids, invariant_unique_bls_keys, Address,
    BlockHeader, BlsKeyError, BlsPublicKey, CandidateOrder, ChainConfig, Committee,
    CommitteeConfig, CommitteeError, CommitteeResult, CompletedEposRound, Dec, Delegation,
    DeployAccount, EpochSchedule, ErrorKind, Hash, NetworkType, ReadError, ScheduleEntry,
    ShardId, ShardState, ShardingInstance, SigningCounters, Slot, SlotOrder, SlotPurchase,
    ValidatorRecord, ValidatorSnapshot, ValidatorStatus,
};
pub use ports::{
    AuctionEngine, ChainReader, DataProvider, ScheduleProvider, StakingCandidatesReader,
    ValidatorListProvider,
};
pub use service::{CommitteeComputer, Strategy};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
