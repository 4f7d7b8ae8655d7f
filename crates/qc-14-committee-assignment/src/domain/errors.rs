//! # Domain Errors
//!
//! Error types for committee assignment.
//!
//! Every variant carries the context (epoch, root, address, key) needed to
//! diagnose a failed epoch transition without re-running the computation.

use thiserror::Error;

/// Shard identifier.
pub type ShardId = u32;

/// Hash type (32-byte keccak256).
pub type Hash = [u8; 32];

/// Address type (20-byte Ethereum-style).
pub type Address = [u8; 20];

/// Error returned by the chain and staking collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backing store failed.
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Coarse classification of [`CommitteeError`] so callers can branch on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// State snapshot at a required root could not be loaded.
    StateUnavailable,
    /// Reading a validator record or snapshot failed.
    ValidatorReadFailure,
    /// A BLS key or protocol account failed to parse.
    KeyDeserializationFailure,
    /// Requested epoch predates the chain's current epoch.
    EpochInPast,
    /// The previous epoch's persisted shard state could not be read.
    PreviousStateUnavailable,
    /// The computed shard state violates a structural invariant.
    InvariantViolation,
    /// The sharding configuration is unusable.
    Config,
}

/// Committee assignment errors.
#[derive(Debug, Error)]
pub enum CommitteeError {
    /// State snapshot at the current block root is unavailable.
    #[error("no state found at root 0x{} (epoch {epoch})", hex::encode(root))]
    StateUnavailable {
        /// State root that was requested
        root: Hash,
        /// Epoch of the block carrying the root
        epoch: u64,
        /// Collaborator error, if any
        #[source]
        source: Option<ReadError>,
    },

    /// Reading a validator's information or snapshot failed.
    #[error("failed to read validator 0x{}: {source}", hex::encode(address))]
    ValidatorRead {
        /// Validator address
        address: Address,
        /// Collaborator error
        #[source]
        source: ReadError,
    },

    /// A BLS public key failed to deserialize.
    #[error("invalid BLS key {key} for 0x{}: {reason}", hex::encode(address))]
    KeyDeserialization {
        /// Owning address
        address: Address,
        /// Hex form of the offending key
        key: String,
        /// Parser diagnostic
        reason: String,
    },

    /// A protocol-operated account entry failed to parse.
    #[error("invalid protocol account {account}: {reason}")]
    AccountParse {
        /// Account as written in the sharding configuration
        account: String,
        /// Parser diagnostic
        reason: String,
    },

    /// Committees may only be computed for the current or a future epoch.
    #[error("cannot compute for epoch in past: requested {requested}, current {current}")]
    ComputeForEpochInPast {
        /// Requested epoch
        requested: u64,
        /// Epoch of the current header
        current: u64,
    },

    /// The previous epoch's shard state is needed but could not be read.
    #[error("shard state for epoch {epoch} unavailable")]
    PreviousStateUnavailable {
        /// Epoch whose state was requested
        epoch: u64,
        /// Collaborator error, if any
        #[source]
        source: Option<ReadError>,
    },

    /// The same BLS key landed in more than one slot.
    #[error("BLS key {key} assigned to more than one slot")]
    DuplicateSlotKey {
        /// Hex form of the duplicated key
        key: String,
    },

    /// A committee carries a shard id outside the configured range.
    #[error("unknown shard {shard_id} (shard count {shard_count})")]
    UnknownShard {
        /// Offending shard id
        shard_id: ShardId,
        /// Configured shard count
        shard_count: u32,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CommitteeError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StateUnavailable { .. } => ErrorKind::StateUnavailable,
            Self::ValidatorRead { .. } => ErrorKind::ValidatorReadFailure,
            Self::KeyDeserialization { .. } | Self::AccountParse { .. } => {
                ErrorKind::KeyDeserializationFailure
            }
            Self::ComputeForEpochInPast { .. } => ErrorKind::EpochInPast,
            Self::PreviousStateUnavailable { .. } => ErrorKind::PreviousStateUnavailable,
            Self::DuplicateSlotKey { .. } | Self::UnknownShard { .. } => {
                ErrorKind::InvariantViolation
            }
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result type for committee assignment operations.
pub type CommitteeResult<T> = Result<T, CommitteeError>;
