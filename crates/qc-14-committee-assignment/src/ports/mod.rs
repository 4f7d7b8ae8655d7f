//! # Ports Module
//!
//! Inbound API and outbound dependency traits.

pub mod inbound;
pub mod outbound;

pub use inbound::ValidatorListProvider;
pub use outbound::{
    AuctionEngine, ChainReader, DataProvider, ScheduleProvider, StakingCandidatesReader,
};
