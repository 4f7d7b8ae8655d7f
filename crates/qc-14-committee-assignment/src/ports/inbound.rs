//! # Inbound Ports
//!
//! API trait defining what committee assignment offers.

use super::outbound::DataProvider;
use crate::domain::{CommitteeResult, ShardState};

/// Validator list provider - inbound port.
pub trait ValidatorListProvider {
    /// Compute the shard state for `epoch`.
    ///
    /// Without a reader the pre-staking slate is produced.
    fn compute<R: DataProvider>(&self, epoch: u64, reader: Option<&R>)
        -> CommitteeResult<ShardState>;

    /// Read the persisted shard state for `epoch`.
    fn read_from_db<R: DataProvider>(&self, epoch: u64, reader: &R)
        -> CommitteeResult<ShardState>;
}
