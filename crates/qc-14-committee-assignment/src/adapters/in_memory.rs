//! # In-Memory Chain
//!
//! [`DataProvider`](crate::ports::DataProvider) backed by in-memory maps.
//! Each committed block records a Keccak-256 commitment of the validator
//! set as its state root; `state_at` only opens roots that were committed
//! and not pruned.

use crate::domain::{
    Address, BlockHeader, ChainConfig, Hash, ReadError, ShardState, ValidatorRecord,
    ValidatorSnapshot, ValidatorStatus,
};
use crate::ports::{ChainReader, StakingCandidatesReader};
use parking_lot::RwLock;
use sha3::{Digest, Keccak256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Validator set as of one state root.
pub type ValidatorSet = Arc<BTreeMap<Address, ValidatorRecord>>;

#[derive(Default)]
struct ChainData {
    head: BlockHeader,
    headers: HashMap<Hash, BlockHeader>,
    /// Uncommitted validator set.
    pending: BTreeMap<Address, ValidatorRecord>,
    candidates: Vec<Address>,
    snapshots: HashMap<Address, ValidatorSnapshot>,
    states: HashMap<Hash, ValidatorSet>,
    shard_states: HashMap<u64, ShardState>,
}

/// In-memory chain and staking store.
pub struct InMemoryChain {
    config: ChainConfig,
    inner: RwLock<ChainData>,
}

impl InMemoryChain {
    /// Create a chain with an empty genesis block at epoch 0.
    pub fn new(config: ChainConfig) -> Self {
        let chain = Self {
            config,
            inner: RwLock::new(ChainData::default()),
        };
        chain.seal(0, 0);
        chain
    }

    /// Insert or replace a validator in the pending set.
    ///
    /// New validators are appended to the candidate list immediately, before
    /// the next commit.
    pub fn upsert_validator(&self, record: ValidatorRecord) {
        let mut inner = self.inner.write();
        if !inner.pending.contains_key(&record.address) {
            inner.candidates.push(record.address);
        }
        inner.pending.insert(record.address, record);
    }

    /// Record the end-of-epoch snapshot of a validator.
    pub fn set_snapshot(&self, address: Address, snapshot: ValidatorSnapshot) {
        self.inner.write().snapshots.insert(address, snapshot);
    }

    /// Insert a validator together with its snapshot.
    pub fn add_validator(&self, record: ValidatorRecord, snapshot: ValidatorSnapshot) {
        let address = record.address;
        self.upsert_validator(record);
        self.set_snapshot(address, snapshot);
    }

    /// Persist the shard state of an epoch.
    pub fn write_shard_state(&self, epoch: u64, state: ShardState) {
        self.inner.write().shard_states.insert(epoch, state);
    }

    /// Commit the pending validator set in a new head block at `epoch`.
    pub fn commit_block(&self, epoch: u64) -> BlockHeader {
        let number = self.inner.read().head.number + 1;
        self.seal(number, epoch)
    }

    /// Drop every committed state, as a pruning node would.
    pub fn prune_states(&self) {
        self.inner.write().states.clear();
    }

    fn seal(&self, number: u64, epoch: u64) -> BlockHeader {
        let mut inner = self.inner.write();
        let root = state_root(&inner.pending);
        let header = BlockHeader {
            number,
            epoch,
            root,
            hash: header_hash(number, epoch, &root, &inner.head.hash),
        };
        let set = Arc::new(inner.pending.clone());
        inner.states.insert(root, set);
        inner.headers.insert(header.hash, header.clone());
        inner.head = header.clone();
        debug!(
            number,
            epoch,
            root = %hex::encode(root),
            "[qc-14] Committed in-memory block"
        );
        header
    }
}

impl ChainReader for InMemoryChain {
    fn read_shard_state(&self, epoch: u64) -> Result<ShardState, ReadError> {
        self.inner
            .read()
            .shard_states
            .get(&epoch)
            .cloned()
            .ok_or_else(|| ReadError::NotFound(format!("shard state for epoch {}", epoch)))
    }

    fn header_by_hash(&self, hash: &Hash) -> Option<BlockHeader> {
        self.inner.read().headers.get(hash).cloned()
    }

    fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn current_header(&self) -> BlockHeader {
        self.inner.read().head.clone()
    }
}

impl StakingCandidatesReader for InMemoryChain {
    type State = ValidatorSet;

    fn current_block(&self) -> BlockHeader {
        self.current_header()
    }

    fn state_at(&self, root: &Hash) -> Result<ValidatorSet, ReadError> {
        self.inner
            .read()
            .states
            .get(root)
            .cloned()
            .ok_or_else(|| ReadError::NotFound(format!("state 0x{}", hex::encode(root))))
    }

    fn read_validator_information(&self, addr: &Address) -> Result<ValidatorRecord, ReadError> {
        let root = self.inner.read().head.root;
        let state = self.state_at(&root)?;
        self.read_validator_information_at_state(addr, &state)
    }

    fn read_validator_information_at_state(
        &self,
        addr: &Address,
        state: &ValidatorSet,
    ) -> Result<ValidatorRecord, ReadError> {
        state
            .get(addr)
            .cloned()
            .ok_or_else(|| ReadError::NotFound(format!("validator 0x{}", hex::encode(addr))))
    }

    fn read_validator_snapshot(&self, addr: &Address) -> Result<ValidatorSnapshot, ReadError> {
        self.inner
            .read()
            .snapshots
            .get(addr)
            .copied()
            .ok_or_else(|| ReadError::NotFound(format!("snapshot of 0x{}", hex::encode(addr))))
    }

    fn validator_candidates(&self) -> Vec<Address> {
        self.inner.read().candidates.clone()
    }
}

/// Keccak-256 commitment of a validator set, in address order.
fn state_root(validators: &BTreeMap<Address, ValidatorRecord>) -> Hash {
    let mut hasher = Keccak256::new();
    for v in validators.values() {
        hasher.update(v.address);
        hasher.update((v.slot_pub_keys.len() as u64).to_be_bytes());
        for key in &v.slot_pub_keys {
            hasher.update(key.0);
        }
        hasher.update((v.delegations.len() as u64).to_be_bytes());
        for d in &v.delegations {
            let mut amount = [0u8; 32];
            d.amount.to_big_endian(&mut amount);
            hasher.update(d.delegator);
            hasher.update(amount);
        }
        hasher.update([status_byte(v.status)]);
        hasher.update(v.last_epoch_in_committee.to_be_bytes());
        hasher.update(v.counters.num_blocks_to_sign.to_be_bytes());
        hasher.update(v.counters.num_blocks_signed.to_be_bytes());
    }
    finalize(hasher)
}

fn header_hash(number: u64, epoch: u64, root: &Hash, parent: &Hash) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(number.to_be_bytes());
    hasher.update(epoch.to_be_bytes());
    hasher.update(root);
    hasher.update(parent);
    finalize(hasher)
}

fn status_byte(status: ValidatorStatus) -> u8 {
    match status {
        ValidatorStatus::Active => 0,
        ValidatorStatus::Inactive => 1,
        ValidatorStatus::Banned => 2,
    }
}

fn finalize(hasher: Keccak256) -> Hash {
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}
