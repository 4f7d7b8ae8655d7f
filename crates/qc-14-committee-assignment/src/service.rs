//! # Committee Computer
//!
//! Entry point that turns chain and staking state into the shard state of
//! an epoch.
//!
//! ## Flow
//!
//! 1. Before staking (or without a reader): fixed pre-staking slate.
//! 2. Reject epochs before the current header's epoch.
//! 3. Protocol slate, EPoS round, winner placement, resharding.
//! 4. No winners: reuse the previous epoch's state, except on testnet
//!    when the shard count changed.
//! 5. Check invariants and stamp the epoch.

use crate::algorithms::{
    assign_shards, new_epos_round, pre_staking_committee, rebalance, EffectiveStakeAuction,
};
use crate::domain::{
    invariant_shard_ids, invariant_unique_bls_keys, CommitteeConfig, CommitteeError,
    CommitteeResult, NetworkType, ShardState, ShardingInstance,
};
use crate::ports::{AuctionEngine, DataProvider, ScheduleProvider, ValidatorListProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Assignment strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Effective proof-of-stake auction with protocol-operated seats.
    #[default]
    EPoS,
}

/// Computes committees for an epoch.
///
/// Holds only immutable configuration; one instance can serve concurrent
/// callers.
pub struct CommitteeComputer<S: ScheduleProvider, A: AuctionEngine = EffectiveStakeAuction> {
    strategy: Strategy,
    config: CommitteeConfig,
    schedule: Arc<S>,
    auction: A,
}

impl<S: ScheduleProvider> CommitteeComputer<S, EffectiveStakeAuction> {
    /// Create a computer using the reference auction.
    pub fn new(schedule: Arc<S>, config: CommitteeConfig) -> Self {
        Self::with_auction(schedule, EffectiveStakeAuction, config)
    }
}

impl<S: ScheduleProvider, A: AuctionEngine> CommitteeComputer<S, A> {
    /// Create a computer with a custom auction engine.
    pub fn with_auction(schedule: Arc<S>, auction: A, config: CommitteeConfig) -> Self {
        Self {
            strategy: Strategy::EPoS,
            config,
            schedule,
            auction,
        }
    }

    /// Assignment strategy in use.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Process configuration.
    pub fn config(&self) -> &CommitteeConfig {
        &self.config
    }

    /// Sharding schedule.
    pub fn schedule(&self) -> &S {
        &self.schedule
    }

    fn epos_staked_committee<R: DataProvider>(
        &self,
        epoch: u64,
        instance: &ShardingInstance,
        reader: &R,
    ) -> CommitteeResult<ShardState> {
        let shard_count = instance.num_shards();
        let round = new_epos_round(
            epoch,
            reader,
            self.schedule.as_ref(),
            &self.auction,
            reader.config().is_epos_bound35(epoch),
            instance.slots_limit(),
            shard_count,
        )?;
        info!(
            epoch,
            winners = round.auction_winners.len(),
            candidates = round.auction_candidates.len(),
            median = %round.median_stake,
            "[qc-14] EPoS round completed"
        );

        let shards = assign_shards(instance, &round.auction_winners, shard_count)?;
        let shards = rebalance(shards, epoch);

        if !round.auction_winners.is_empty() {
            let state = ShardState::new(Some(epoch), shards);
            invariant_unique_bls_keys(&state)?;
            invariant_shard_ids(&state, shard_count)?;
            return Ok(state);
        }

        let previous = epoch.saturating_sub(1);
        let shard_count_changed =
            self.schedule.instance_for_epoch(previous).num_shards() != shard_count;
        if self.config.network == NetworkType::Testnet && shard_count_changed {
            warn!(
                epoch,
                shard_count,
                "[qc-14] No elected validators; using new committee after shard reduction"
            );
            return Ok(ShardState::new(None, shards));
        }

        warn!(epoch, "[qc-14] No elected validators; reusing previous shard state");
        if epoch == 0 {
            return Err(CommitteeError::PreviousStateUnavailable {
                epoch,
                source: None,
            });
        }
        reader
            .read_shard_state(previous)
            .map_err(|e| CommitteeError::PreviousStateUnavailable {
                epoch: previous,
                source: Some(e),
            })
    }
}

impl<S: ScheduleProvider, A: AuctionEngine> ValidatorListProvider for CommitteeComputer<S, A> {
    #[instrument(skip(self, reader), fields(strategy = ?self.strategy))]
    fn compute<R: DataProvider>(
        &self,
        epoch: u64,
        reader: Option<&R>,
    ) -> CommitteeResult<ShardState> {
        let instance = self.schedule.instance_for_epoch(epoch);
        let reader = match reader {
            Some(reader) if reader.config().is_staking(epoch) => reader,
            _ => return pre_staking_committee(instance),
        };

        let current = reader.current_header().epoch;
        if epoch < current {
            error!(
                header_epoch = current,
                compute_epoch = epoch,
                "[qc-14] Tried to compute committee for epoch in past"
            );
            return Err(CommitteeError::ComputeForEpochInPast {
                requested: epoch,
                current,
            });
        }

        let state = self.epos_staked_committee(epoch, instance, reader)?;
        info!(
            computed_for_epoch = epoch,
            stamped = state.epoch.is_some(),
            slots = state.total_slots(),
            "[qc-14] Computed new super committee"
        );
        Ok(state)
    }

    #[instrument(skip(self, reader))]
    fn read_from_db<R: DataProvider>(&self, epoch: u64, reader: &R) -> CommitteeResult<ShardState> {
        reader
            .read_shard_state(epoch)
            .map_err(|e| CommitteeError::PreviousStateUnavailable {
                epoch,
                source: Some(e),
            })
    }
}
