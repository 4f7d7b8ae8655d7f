//! # Algorithms Module
//!
//! Eligibility, auction, shard placement and resharding.

pub mod auction;
pub mod candidate_orders;
pub mod eligibility;
pub mod pseudorandom;
pub mod resharding;
pub mod shard_assignment;

pub use auction::EffectiveStakeAuction;
pub use candidate_orders::{new_epos_round, prepare_orders, protocol_keys};
pub use eligibility::{compute_current_signing, is_eligible_for_epos_auction, ComputedSigning};
pub use pseudorandom::XorshiftPseudorandom;
pub use resharding::rebalance;
pub use shard_assignment::{assign_shards, pre_staking_committee, protocol_slate};
