//! Shared fixtures for unit tests.

use crate::domain::{Address, BlsPublicKey, DeployAccount, ShardingInstance};
use blst::min_pk::SecretKey;

/// Valid BLS public key derived from `seed`.
pub fn bls_key(seed: u64) -> BlsPublicKey {
    let mut ikm = [0u8; 32];
    ikm[..8].copy_from_slice(&seed.to_le_bytes());
    ikm[31] = 0x5a;
    let sk = SecretKey::key_gen(&ikm, &[]).expect("32-byte ikm");
    BlsPublicKey(sk.sk_to_pk().to_bytes())
}

/// First valid key at or after `seed` whose bucket is `bucket`.
pub fn key_in_bucket(bucket: u32, shard_count: u32, seed: u64) -> BlsPublicKey {
    (seed..)
        .map(bls_key)
        .find(|k| k.shard_bucket(shard_count) == bucket)
        .expect("bucket reachable")
}

/// `count` distinct valid keys at or after `seed` whose bucket is `bucket`.
pub fn keys_in_bucket(bucket: u32, shard_count: u32, seed: u64, count: usize) -> Vec<BlsPublicKey> {
    (seed..)
        .map(bls_key)
        .filter(|k| k.shard_bucket(shard_count) == bucket)
        .take(count)
        .collect()
}

/// Address derived from `seed`.
pub fn address(seed: u64) -> Address {
    let mut addr = [0u8; 20];
    addr[12..].copy_from_slice(&seed.to_be_bytes());
    addr
}

/// Deploy account with a valid key and address for `seed`.
pub fn account(seed: u64) -> DeployAccount {
    DeployAccount::new(
        format!("0x{}", hex::encode(address(seed))),
        bls_key(seed).to_hex(),
    )
}

/// Instance with `num_shards * protocol_nodes` valid protocol accounts.
pub fn test_instance(
    num_shards: u32,
    protocol_nodes: usize,
    nodes_per_shard: usize,
) -> ShardingInstance {
    ShardingInstance {
        num_shards,
        num_nodes_per_shard: nodes_per_shard,
        num_harmony_operated_nodes_per_shard: protocol_nodes,
        hmy_accounts: (0..num_shards as u64 * protocol_nodes as u64)
            .map(account)
            .collect(),
        fn_accounts: Vec::new(),
        slots_limit: 0,
    }
}
