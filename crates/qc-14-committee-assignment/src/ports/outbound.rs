//! # Outbound Ports
//!
//! Read-only collaborators committee assignment depends on: chain reader,
//! staking state reader, schedule lookup and the auction engine.

use crate::domain::{
    Address, BlockHeader, ChainConfig, Dec, EpochSchedule, Hash, ReadError, ShardState,
    ShardingInstance, SlotOrder, SlotPurchase, ValidatorRecord, ValidatorSnapshot,
};
use std::collections::BTreeMap;

/// Chain reader - outbound port.
///
/// Subset of the blockchain needed to compute assignments.
pub trait ChainReader: Send + Sync {
    /// Persisted shard state of an epoch.
    fn read_shard_state(&self, epoch: u64) -> Result<ShardState, ReadError>;

    /// Header by hash.
    fn header_by_hash(&self, hash: &Hash) -> Option<BlockHeader>;

    /// Chain fork configuration.
    fn config(&self) -> &ChainConfig;

    /// Current head.
    fn current_header(&self) -> BlockHeader;
}

/// Staking candidates reader - outbound port.
///
/// All reads at a given state must come from the same consistent snapshot.
pub trait StakingCandidatesReader: Send + Sync {
    /// Opaque state snapshot.
    type State;

    /// Current block header.
    fn current_block(&self) -> BlockHeader;

    /// Open the state at `root`.
    fn state_at(&self, root: &Hash) -> Result<Self::State, ReadError>;

    /// Validator record at the head state.
    fn read_validator_information(&self, addr: &Address) -> Result<ValidatorRecord, ReadError>;

    /// Validator record at a specific state.
    fn read_validator_information_at_state(
        &self,
        addr: &Address,
        state: &Self::State,
    ) -> Result<ValidatorRecord, ReadError>;

    /// Last end-of-epoch snapshot of a validator.
    fn read_validator_snapshot(&self, addr: &Address) -> Result<ValidatorSnapshot, ReadError>;

    /// Candidate addresses, in state order.
    fn validator_candidates(&self) -> Vec<Address>;
}

/// Everything committee computation reads.
pub trait DataProvider: StakingCandidatesReader + ChainReader {}

impl<T: StakingCandidatesReader + ChainReader> DataProvider for T {}

/// Sharding schedule - outbound port.
pub trait ScheduleProvider: Send + Sync {
    /// Instance in force at `epoch`.
    fn instance_for_epoch(&self, epoch: u64) -> &ShardingInstance;
}

impl ScheduleProvider for EpochSchedule {
    fn instance_for_epoch(&self, epoch: u64) -> &ShardingInstance {
        EpochSchedule::instance_for_epoch(self, epoch)
    }
}

/// Auction engine - outbound port.
///
/// Given orders and a slot budget, returns the median stake and the
/// winning slots, at most `max_slots` of them.
pub trait AuctionEngine: Send + Sync {
    /// Run the auction.
    fn apply(
        &self,
        orders: &BTreeMap<Address, SlotOrder>,
        max_slots: usize,
        extended_bound: bool,
    ) -> (Dec, Vec<SlotPurchase>);
}
