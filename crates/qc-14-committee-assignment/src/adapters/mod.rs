//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for committee assignment.

mod in_memory;

pub use in_memory::{InMemoryChain, ValidatorSet};
